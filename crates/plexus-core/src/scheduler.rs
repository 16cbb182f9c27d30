//! Execution ordering and register assignment for a dataflow graph.
//!
//! A [`Scheduler`] walks a [`GraphView`] once and produces a [`Schedule`]:
//! a serial number per module and a register per live output. The pass
//! has three phases:
//!
//! 1. **Reset**: every module gets fresh [`SchedulingState`] and joins the
//!    pending set.
//! 2. **Depth relaxation**: a fixed-point scan pulls each module's depth
//!    one below its lowest consumer. Depth only biases traversal order;
//!    cycles are tolerated and the scan is capped at one pass per module.
//! 3. **Walk**: modules are queued depth-first, "fire when ready": once a
//!    module is scheduled, each consumer with no pending producers is
//!    scheduled next. Registers are allocated as outputs are produced and
//!    pruned as soon as their last reader has been scheduled.
//!
//! The walk keeps its own frame stack instead of recursing, so auxiliary
//! memory is bounded by the module count rather than the call stack.

#[cfg(not(feature = "std"))]
use alloc::{
    collections::{BTreeMap, BTreeSet},
    vec::Vec,
};
#[cfg(feature = "std")]
use std::collections::{BTreeMap, BTreeSet};

use crate::error::ScheduleError;
use crate::graph::{DataType, GraphView, ModuleId, OutputId};
use crate::register::{RegisterAllocationContext, RegisterBlock, RegisterRef};
use crate::schedule::{Assignment, Schedule};

/// Per-module scheduling state, kept beside the graph rather than in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulingState {
    /// Traversal heuristic; more negative means farther from a sink.
    pub depth: i32,
    /// Position in execution order, `-1` until scheduled.
    pub serial: i32,
    /// `-(number of outputs)`; breaks depth ties so modules with more
    /// outputs go first.
    pub modifier: i32,
}

impl SchedulingState {
    fn reset(outputs: usize) -> Self {
        Self {
            depth: 0,
            serial: -1,
            modifier: -(outputs as i32),
        }
    }
}

/// Knobs for a scheduling pass.
#[derive(Clone, Debug)]
pub struct SchedulerOptions {
    /// Inputs of this type fed by their own module do not block readiness.
    pub feedback_type: DataType,
    /// Modules whose registers outlive their last reader (probes).
    pub exempt: BTreeSet<ModuleId>,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            feedback_type: DataType::scalar(),
            exempt: BTreeSet::new(),
        }
    }
}

impl SchedulerOptions {
    /// Pins `module`'s registers past their liveness end.
    pub fn with_exempt(mut self, module: ModuleId) -> Self {
        self.exempt.insert(module);
        self
    }

    /// Overrides the same-module feedback type.
    pub fn with_feedback_type(mut self, data_type: DataType) -> Self {
        self.feedback_type = data_type;
        self
    }
}

/// A module being expanded by the walk.
struct Frame {
    module: ModuleId,
    /// Consumers to try once this module's outputs are live, in plug order.
    candidates: Vec<ModuleId>,
    next: usize,
}

/// One scheduling pass over a graph.
///
/// Construct with [`new()`](Self::new), then either call
/// [`run()`](Self::run) for a complete pass or drive it by hand with
/// [`que_module()`](Self::que_module).
pub struct Scheduler<'a, G: GraphView + ?Sized> {
    graph: &'a G,
    ctx: &'a mut RegisterAllocationContext,
    options: SchedulerOptions,
    /// Modules in graph order.
    modules: Vec<ModuleId>,
    states: BTreeMap<ModuleId, SchedulingState>,
    assignments: BTreeMap<OutputId, RegisterRef>,
    pending: BTreeSet<ModuleId>,
    stack: Vec<Frame>,
    order: Vec<ModuleId>,
    next_serial: i32,
    relax_passes: usize,
}

impl<'a, G: GraphView + ?Sized> Scheduler<'a, G> {
    /// Prepares a pass: resets every module and relaxes depths.
    ///
    /// All blocks in `ctx` are cleared so a reused context starts empty.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::ModuleNotFound`] if an exempt module is not in `graph`.
    pub fn new(
        graph: &'a G,
        ctx: &'a mut RegisterAllocationContext,
        options: SchedulerOptions,
    ) -> Result<Self, ScheduleError> {
        if let Some(&missing) = options.exempt.iter().find(|&&m| !graph.contains_module(m)) {
            return Err(ScheduleError::ModuleNotFound(missing));
        }
        ctx.clear();
        ctx.reset_peaks();

        let modules = graph.module_ids();
        let mut scheduler = Self {
            graph,
            ctx,
            options,
            modules: Vec::with_capacity(modules.len()),
            states: BTreeMap::new(),
            assignments: BTreeMap::new(),
            pending: BTreeSet::new(),
            stack: Vec::new(),
            order: Vec::with_capacity(modules.len()),
            next_serial: 0,
            relax_passes: 0,
        };
        for module in modules {
            scheduler.add_module(module);
        }
        scheduler.relax_depths();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "sched_init: {} modules, depths settled after {} passes",
            scheduler.modules.len(),
            scheduler.relax_passes
        );
        Ok(scheduler)
    }

    /// Resets `module`'s state and marks it pending.
    fn add_module(&mut self, module: ModuleId) {
        let outputs = self.graph.outputs(module).len();
        self.states.insert(module, SchedulingState::reset(outputs));
        for out in self.graph.outputs(module) {
            self.assignments.remove(out);
        }
        self.pending.insert(module);
        self.modules.push(module);
    }

    fn depth(&self, module: ModuleId) -> Option<i32> {
        self.states.get(&module).map(|s| s.depth)
    }

    /// Fixed-point depth relaxation.
    ///
    /// An acyclic graph settles within one pass per module; a cycle would
    /// keep lowering depths forever, so the scan stops there.
    fn relax_depths(&mut self) {
        let limit = self.modules.len().max(1);
        loop {
            self.relax_passes += 1;
            let mut changed = 0usize;
            for &module in &self.modules {
                let mut lowest = 0;
                for &out in self.graph.outputs(module) {
                    for consumer in self.graph.consumer_modules(out) {
                        if consumer == module {
                            continue;
                        }
                        if let Some(depth) = self.depth(consumer) {
                            lowest = lowest.min(depth - 1);
                        }
                    }
                }
                let Some(state) = self.states.get_mut(&module) else {
                    continue;
                };
                if lowest != 0 && lowest < state.depth {
                    state.depth = lowest;
                    changed += 1;
                }
            }
            if changed == 0 {
                break;
            }
            if self.relax_passes >= limit {
                #[cfg(feature = "tracing")]
                tracing::warn!("sched_depth: still changing after {limit} passes, graph has a cycle");
                break;
            }
        }
    }

    /// Returns true if any input of `module` waits on a pending producer.
    ///
    /// An input of the feedback type fed by `module` itself never blocks.
    pub fn has_pending_inputs(&self, module: ModuleId) -> bool {
        self.graph.inputs(module).iter().any(|&input| {
            let Some(producer) = self.graph.producer_module(input) else {
                return false;
            };
            if producer == module
                && self.graph.input_type(input) == Some(&self.options.feedback_type)
            {
                return false;
            }
            self.pending.contains(&producer)
        })
    }

    /// Schedules `module`, then every consumer that becomes ready because
    /// of it, depth first. Does nothing if `module` is not pending.
    pub fn que_module(&mut self, module: ModuleId) -> Result<(), ScheduleError> {
        let result = self.walk(module);
        if result.is_err() {
            self.stack.clear();
        }
        result
    }

    fn walk(&mut self, module: ModuleId) -> Result<(), ScheduleError> {
        self.enter(module)?;
        loop {
            let Some(frame) = self.stack.last_mut() else {
                break;
            };
            if let Some(&candidate) = frame.candidates.get(frame.next) {
                frame.next += 1;
                if !self.has_pending_inputs(candidate) {
                    self.enter(candidate)?;
                }
                continue;
            }
            let done = frame.module;
            if !self.pending.is_empty() {
                self.prune(done);
            }
            self.stack.pop();
        }
        Ok(())
    }

    /// Assigns `module` its serial and registers, and pushes its frame.
    fn enter(&mut self, module: ModuleId) -> Result<(), ScheduleError> {
        if !self.pending.contains(&module) {
            return Ok(());
        }
        if let Some(prev) = self.stack.last().map(|f| f.module) {
            self.prune(prev);
        }

        let serial = self.next_serial;
        self.next_serial += 1;
        if let Some(state) = self.states.get_mut(&module) {
            state.serial = serial;
        }
        self.pending.remove(&module);
        self.order.push(module);
        #[cfg(feature = "tracing")]
        tracing::debug!("sched_que: {module} serial {serial} (stack depth {})", self.stack.len());

        let graph = self.graph;
        let has_connected_inputs = graph
            .inputs(module)
            .iter()
            .any(|&input| graph.producer(input).is_some());

        let mut candidates = Vec::new();
        for &out in graph.outputs(module) {
            if !(graph.output_is_connected(out) || has_connected_inputs) {
                continue;
            }
            let Some(data_type) = graph.output_type(out) else {
                continue;
            };
            let Some(reg) = self.ctx.alloc(module, data_type)? else {
                continue;
            };
            self.assignments.insert(out, reg);
            for consumer in graph.consumer_modules(out) {
                if consumer != module {
                    self.ctx.add_child(reg, consumer);
                    candidates.push(consumer);
                }
            }
        }

        self.stack.push(Frame {
            module,
            candidates,
            next: 0,
        });
        Ok(())
    }

    fn prune(&mut self, module: ModuleId) {
        let _freed = self.ctx.prune(module, &self.options.exempt);
        #[cfg(feature = "tracing")]
        if _freed > 0 {
            tracing::trace!("sched_prune: {module} released {_freed} registers");
        }
    }

    /// Runs the whole pass.
    ///
    /// Modules are seeded by ascending `(depth, modifier, graph order)`. The
    /// first ready pending module is queued each round; if none is ready
    /// (every pending module sits on a cycle) the first pending one is
    /// queued anyway. Once everything is scheduled, every module is pruned
    /// again in serial order so all non-exempt registers return to their
    /// blocks.
    pub fn run(mut self) -> Result<Schedule, ScheduleError> {
        let seed = self.seed_order();
        while !self.pending.is_empty() {
            let ready = seed
                .iter()
                .copied()
                .find(|&m| self.pending.contains(&m) && !self.has_pending_inputs(m));
            let next = match ready {
                Some(m) => m,
                None => {
                    let Some(forced) = seed.iter().copied().find(|m| self.pending.contains(m))
                    else {
                        break;
                    };
                    #[cfg(feature = "tracing")]
                    tracing::debug!("sched_cycle: no ready module, forcing {forced}");
                    forced
                }
            };
            self.que_module(next)?;
        }

        for module in self.order.clone() {
            self.prune(module);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "sched_done: {} modules, {} registers still held",
            self.order.len(),
            self.ctx.allocated_count()
        );
        Ok(self.finish())
    }

    /// Modules sorted by `(depth, modifier, graph order)`.
    pub fn seed_order(&self) -> Vec<ModuleId> {
        let mut seed: Vec<(usize, ModuleId)> = self.modules.iter().copied().enumerate().collect();
        seed.sort_by_key(|&(pos, m)| {
            let s = self.states.get(&m).copied().unwrap_or(SchedulingState::reset(0));
            (s.depth, s.modifier, pos)
        });
        seed.into_iter().map(|(_, m)| m).collect()
    }

    fn finish(self) -> Schedule {
        let mut assignments = BTreeMap::new();
        for (&output, &reg) in &self.assignments {
            let (Some(block), Some(module)) =
                (self.ctx.block(reg.block), self.graph.output_module(output))
            else {
                continue;
            };
            assignments.insert(
                output,
                Assignment {
                    output,
                    module,
                    data_type: block.data_type().clone(),
                    block: reg.block,
                    block_name: block.name().into(),
                    index: reg.index,
                },
            );
        }
        let peak_usage = self
            .ctx
            .blocks()
            .map(|(_, b)| (b.data_type().clone(), b.peak()))
            .collect();
        Schedule::new(
            self.order,
            self.states,
            assignments,
            peak_usage,
            self.relax_passes,
        )
    }

    // --- Inspection ---

    /// Scheduling state of `module`.
    pub fn state(&self, module: ModuleId) -> Option<SchedulingState> {
        self.states.get(&module).copied()
    }

    /// Returns true if `module` has not been scheduled yet.
    pub fn is_pending(&self, module: ModuleId) -> bool {
        self.pending.contains(&module)
    }

    /// Number of modules still pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Register currently recorded for `output`.
    pub fn register(&self, output: OutputId) -> Option<RegisterRef> {
        self.assignments.get(&output).copied()
    }

    /// The allocation context driven by this pass.
    pub fn context(&self) -> &RegisterAllocationContext {
        self.ctx
    }

    /// Modules scheduled so far, in serial order.
    pub fn order(&self) -> &[ModuleId] {
        &self.order
    }

    /// Number of depth relaxation passes performed.
    pub fn relaxation_passes(&self) -> usize {
        self.relax_passes
    }
}

/// Dry run that reports the smallest block capacity per data type that
/// schedules `graph` without exhaustion.
///
/// Each type gets a block as large as its number of outputs, which no pass
/// can exceed, and the returned value is that block's high-water mark.
pub fn plan_capacities<G: GraphView + ?Sized>(
    graph: &G,
    options: &SchedulerOptions,
) -> Result<BTreeMap<DataType, usize>, ScheduleError> {
    let mut counts: BTreeMap<DataType, usize> = BTreeMap::new();
    for module in graph.module_ids() {
        for &out in graph.outputs(module) {
            if let Some(data_type) = graph.output_type(out) {
                *counts.entry(data_type.clone()).or_default() += 1;
            }
        }
    }

    let mut ctx = RegisterAllocationContext::new();
    for (data_type, count) in &counts {
        ctx.set_registers(RegisterBlock::new(data_type.name(), data_type.clone(), *count));
    }
    let schedule = Scheduler::new(graph, &mut ctx, options.clone())?.run()?;
    Ok(schedule.peak_usage().clone())
}

//! Result of a scheduling pass.
//!
//! A [`Schedule`] is an immutable snapshot produced by
//! [`Scheduler::run()`](crate::Scheduler::run): execution order, the
//! per-module [`SchedulingState`] and the register assigned to each live
//! output. It holds no borrow of the graph or the allocation context.

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, string::String, vec::Vec};
#[cfg(feature = "std")]
use std::collections::BTreeMap;

use core::fmt::Write;

use crate::graph::{DataType, GraphView, ModuleId, OutputId};
use crate::register::BlockId;
use crate::scheduler::SchedulingState;

/// Register assigned to one output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    /// The output holding the value.
    pub output: OutputId,
    /// Module owning the output.
    pub module: ModuleId,
    /// Type of the block the register came from.
    pub data_type: DataType,
    /// Block the register came from.
    pub block: BlockId,
    /// Name of that block.
    pub block_name: String,
    /// Register index within the block.
    pub index: usize,
}

/// Execution order and register assignments for one graph topology.
#[derive(Clone, Debug)]
pub struct Schedule {
    order: Vec<ModuleId>,
    states: BTreeMap<ModuleId, SchedulingState>,
    assignments: BTreeMap<OutputId, Assignment>,
    peak_usage: BTreeMap<DataType, usize>,
    relax_passes: usize,
}

impl Schedule {
    pub(crate) fn new(
        order: Vec<ModuleId>,
        states: BTreeMap<ModuleId, SchedulingState>,
        assignments: BTreeMap<OutputId, Assignment>,
        peak_usage: BTreeMap<DataType, usize>,
        relax_passes: usize,
    ) -> Self {
        Self {
            order,
            states,
            assignments,
            peak_usage,
            relax_passes,
        }
    }

    /// Modules in execution order.
    pub fn order(&self) -> &[ModuleId] {
        &self.order
    }

    /// Position of `module` in execution order.
    pub fn serial(&self, module: ModuleId) -> Option<i32> {
        self.states
            .get(&module)
            .map(|s| s.serial)
            .filter(|&s| s >= 0)
    }

    /// Final scheduling state of `module`.
    pub fn state(&self, module: ModuleId) -> Option<SchedulingState> {
        self.states.get(&module).copied()
    }

    /// Register assigned to `output`, if it was live.
    pub fn register(&self, output: OutputId) -> Option<&Assignment> {
        self.assignments.get(&output)
    }

    /// Every assignment, ordered by output id.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    /// Most registers of each type live at once during the pass.
    pub fn peak_usage(&self) -> &BTreeMap<DataType, usize> {
        &self.peak_usage
    }

    /// Depth relaxation passes the pass needed.
    pub fn relaxation_passes(&self) -> usize {
        self.relax_passes
    }

    /// Human-readable listing of every module's outputs and connected
    /// inputs with their registers, in execution order. Diagnostic only.
    ///
    /// ```text
    /// [0] osc depth=-1
    ///   mod<osc> out<0> reg<float:7>
    /// [1] gain depth=0
    ///   mod<gain> inp<0> -< module<osc> reg<float:7>
    /// ```
    pub fn dump<G: GraphView + ?Sized>(&self, graph: &G) -> String {
        let mut text = String::new();
        for &module in &self.order {
            let name = graph.module_name(module).unwrap_or("?");
            let depth = self.states.get(&module).map_or(0, |s| s.depth);
            let serial = self.serial(module).unwrap_or(-1);
            let _ = writeln!(text, "[{serial}] {name} depth={depth}");

            for (i, &input) in graph.inputs(module).iter().enumerate() {
                let Some(producer) = graph.producer(input) else {
                    continue;
                };
                let Some(reg) = self.assignments.get(&producer) else {
                    continue;
                };
                let source = graph
                    .output_module(producer)
                    .and_then(|m| graph.module_name(m))
                    .unwrap_or("?");
                let _ = writeln!(
                    text,
                    "  mod<{name}> inp<{i}> -< module<{source}> reg<{}:{}>",
                    reg.block_name, reg.index
                );
            }
            for (i, output) in graph.outputs(module).iter().enumerate() {
                let (block, index) = self
                    .assignments
                    .get(output)
                    .map_or(("", -1), |r| (r.block_name.as_str(), r.index as i64));
                let _ = writeln!(text, "  mod<{name}> out<{i}> reg<{block}:{index}>");
            }
        }
        text
    }
}

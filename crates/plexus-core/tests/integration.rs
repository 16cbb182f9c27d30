//! Integration tests for plexus-core scheduling.
//!
//! Each test builds a small graph, installs register pools, runs a full
//! pass and checks execution order, register assignment, liveness and the
//! typed failure modes (pool exhaustion, unregistered types).

use plexus_core::{
    DataType, Graph, InputId, ModuleId, OutputId, RegisterAllocationContext, RegisterBlock,
    RegisterError, ScheduleError, Scheduler, SchedulerOptions, UnregisteredTypePolicy,
    plan_capacities,
};

fn float() -> DataType {
    DataType::scalar()
}

fn vec3() -> DataType {
    DataType::new("vec3")
}

/// Scalar-only pool of the given capacity, named "float".
fn pool(capacity: usize) -> RegisterAllocationContext {
    let mut ctx = RegisterAllocationContext::new();
    ctx.set_registers(RegisterBlock::new("float", float(), capacity));
    ctx
}

struct Builder {
    graph: Graph,
}

impl Builder {
    fn new() -> Self {
        Self {
            graph: Graph::new(),
        }
    }

    fn module(&mut self, name: &str) -> ModuleId {
        self.graph.add_module(name)
    }

    fn output(&mut self, m: ModuleId, ty: DataType) -> OutputId {
        let n = self.graph.module(m).unwrap().outputs().len();
        self.graph.add_output(m, format!("out{n}"), ty).unwrap()
    }

    fn input(&mut self, m: ModuleId, ty: DataType) -> InputId {
        let n = self.graph.module(m).unwrap().inputs().len();
        self.graph.add_input(m, format!("in{n}"), ty).unwrap()
    }

    /// New scalar input on `to`, fed by `from`.
    fn wire(&mut self, from: OutputId, to: ModuleId) -> InputId {
        let ty = self.graph.output(from).unwrap().data_type().clone();
        let inp = self.input(to, ty);
        self.graph.connect(from, inp).unwrap();
        inp
    }
}

// ============================================================================
// Ordering and liveness
// ============================================================================

#[test]
fn two_module_chain_reuses_single_register() {
    let mut b = Builder::new();
    let a = b.module("a");
    let m = b.module("b");
    let out = b.output(a, float());
    b.wire(out, m);

    let mut ctx = pool(1);
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(schedule.serial(a), Some(0));
    assert_eq!(schedule.serial(m), Some(1));
    let reg = schedule.register(out).unwrap();
    assert_eq!(reg.block_name, "float");
    assert_eq!(reg.index, 0);
    assert_eq!(ctx.allocated_count(), 0);
}

#[test]
fn fan_out_register_lives_until_every_reader_ran() {
    // a feeds b and c; c also waits on d, which is scheduled by hand later.
    let mut b = Builder::new();
    let a = b.module("a");
    let rb = b.module("b");
    let rc = b.module("c");
    let d = b.module("d");
    let a_out = b.output(a, float());
    let d_out = b.output(d, float());
    b.wire(a_out, rb);
    b.wire(a_out, rc);
    b.wire(d_out, rc);

    let mut ctx = pool(2);
    let mut s = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default()).unwrap();
    s.que_module(a).unwrap();

    assert!(!s.is_pending(rb));
    assert!(s.is_pending(rc));
    let reg = s.register(a_out).unwrap();
    let children: Vec<ModuleId> = s
        .context()
        .register(reg)
        .unwrap()
        .children()
        .iter()
        .copied()
        .collect();
    assert_eq!(children, vec![rc], "b has run, c still needs the value");
    assert_eq!(s.context().allocated_count(), 1);

    s.que_module(d).unwrap();
    assert_eq!(s.pending_count(), 0);
    let schedule = s.run().unwrap();
    assert!(schedule.serial(rc) > schedule.serial(d));
    assert_eq!(ctx.allocated_count(), 0);
}

#[test]
fn fan_out_with_second_live_value_exhausts_single_register() {
    // a feeds b and c; b produces its own value while a's is still needed by c.
    let mut b = Builder::new();
    let a = b.module("a");
    let rb = b.module("b");
    let rc = b.module("c");
    let sink = b.module("sink");
    let a_out = b.output(a, float());
    b.wire(a_out, rb);
    b.wire(a_out, rc);
    let b_out = b.output(rb, float());
    b.wire(b_out, sink);

    let mut ctx = pool(1);
    let err = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap_err();
    assert_eq!(
        err,
        ScheduleError::Register(RegisterError::Exhausted {
            block: "float".to_string(),
            capacity: 1,
        })
    );

    let mut ctx = pool(2);
    assert!(
        Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
            .unwrap()
            .run()
            .is_ok()
    );
}

#[test]
fn same_module_scalar_feedback_schedules() {
    let mut b = Builder::new();
    let d = b.module("d");
    let out = b.output(d, float());
    b.wire(out, d);

    let mut ctx = pool(1);
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(schedule.serial(d), Some(0));
    assert!(schedule.register(out).is_some());
    assert_eq!(ctx.allocated_count(), 0);
}

#[test]
fn feedback_type_is_configurable() {
    let mut b = Builder::new();
    let d = b.module("d");
    let out = b.output(d, vec3());
    b.wire(out, d);

    let mut ctx = RegisterAllocationContext::new();
    ctx.set_registers(RegisterBlock::new("v", vec3(), 1));
    let options = SchedulerOptions::default().with_feedback_type(vec3());
    let s = Scheduler::new(&b.graph, &mut ctx, options).unwrap();
    assert!(!s.has_pending_inputs(d));
}

#[test]
fn three_live_values_exhaust_pool_of_two() {
    let mut b = Builder::new();
    let sink = b.module("sink");
    for name in ["s1", "s2", "s3"] {
        let src = b.module(name);
        let out = b.output(src, float());
        b.wire(out, sink);
    }

    let mut ctx = pool(2);
    let err = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::Register(RegisterError::Exhausted { capacity: 2, .. })
    ));

    let mut ctx = pool(3);
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(schedule.serial(sink), Some(3));
    assert_eq!(schedule.peak_usage().get(&float()), Some(&3));
}

#[test]
fn cycle_without_feedback_exemption_terminates() {
    let mut b = Builder::new();
    let a = b.module("a");
    let c = b.module("b");
    let a_out = b.output(a, float());
    let c_out = b.output(c, float());
    b.wire(a_out, c);
    b.wire(c_out, a);

    let mut ctx = pool(2);
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    let mut serials = vec![schedule.serial(a).unwrap(), schedule.serial(c).unwrap()];
    serials.sort_unstable();
    assert_eq!(serials, vec![0, 1]);
    assert_eq!(ctx.allocated_count(), 0);
}

#[test]
fn diamond_orders_producers_first() {
    let mut b = Builder::new();
    let src = b.module("src");
    let left = b.module("left");
    let right = b.module("right");
    let merge = b.module("merge");
    let s_out = b.output(src, float());
    b.wire(s_out, left);
    b.wire(s_out, right);
    let l_out = b.output(left, float());
    let r_out = b.output(right, float());
    b.wire(l_out, merge);
    b.wire(r_out, merge);

    let mut ctx = pool(3);
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    let serial = |m| schedule.serial(m).unwrap();
    assert_eq!(serial(src), 0);
    assert!(serial(left) < serial(merge));
    assert!(serial(right) < serial(merge));
    assert_eq!(schedule.order().len(), 4);
    assert_eq!(ctx.allocated_count(), 0);
}

#[test]
fn deep_chain_needs_two_registers() {
    let mut b = Builder::new();
    let mut prev = None;
    let mut modules = Vec::new();
    for i in 0..200 {
        let m = b.module(&format!("m{i}"));
        if let Some(out) = prev {
            b.wire(out, m);
        }
        prev = Some(b.output(m, float()));
        modules.push(m);
    }

    let plan = plan_capacities(&b.graph, &SchedulerOptions::default()).unwrap();
    assert_eq!(plan.get(&float()), Some(&2));

    let mut ctx = pool(2);
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    for (i, m) in modules.iter().enumerate() {
        assert_eq!(schedule.serial(*m), Some(i as i32));
    }
}

// ============================================================================
// Pools and types
// ============================================================================

#[test]
fn types_route_to_separate_blocks() {
    let mut b = Builder::new();
    let a = b.module("a");
    let sink = b.module("sink");
    let f = b.output(a, float());
    let v = b.output(a, vec3());
    b.wire(f, sink);
    b.wire(v, sink);

    let mut ctx = pool(1);
    ctx.set_registers(RegisterBlock::new("vec3", vec3(), 1));
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(schedule.register(f).unwrap().block_name, "float");
    assert_eq!(schedule.register(v).unwrap().block_name, "vec3");
    assert_eq!(schedule.register(v).unwrap().data_type, vec3());
}

#[test]
fn unregistered_type_is_reported() {
    let mut b = Builder::new();
    let a = b.module("a");
    let sink = b.module("sink");
    let v = b.output(a, vec3());
    b.wire(v, sink);

    let mut ctx = pool(1);
    let err = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap_err();
    assert_eq!(
        err,
        ScheduleError::UnregisteredType {
            data_type: vec3(),
            module: a,
        }
    );
}

#[test]
fn unregistered_type_skipped_under_skip_policy() {
    let mut b = Builder::new();
    let a = b.module("a");
    let sink = b.module("sink");
    let v = b.output(a, vec3());
    b.wire(v, sink);

    let mut ctx = pool(1).with_policy(UnregisteredTypePolicy::Skip);
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    assert!(schedule.register(v).is_none());
    // Without a register the consumer is never fired by the producer, but
    // the driver still schedules it after its producer.
    assert!(schedule.serial(a) < schedule.serial(sink));
}

#[test]
fn probe_module_keeps_its_register() {
    let mut b = Builder::new();
    let probe = b.module("probe");
    let sink = b.module("sink");
    let out = b.output(probe, float());
    b.wire(out, sink);

    let mut ctx = pool(1);
    let options = SchedulerOptions::default().with_exempt(probe);
    let schedule = Scheduler::new(&b.graph, &mut ctx, options)
        .unwrap()
        .run()
        .unwrap();

    let index = schedule.register(out).unwrap().index;
    let block = ctx.registers(&float()).unwrap();
    assert!(block.is_allocated(index));
    assert!(block.register(index).unwrap().children().is_empty());
    assert_eq!(block.register(index).unwrap().owner(), Some(probe));
}

#[test]
fn context_is_reset_between_passes() {
    let mut b = Builder::new();
    let probe = b.module("probe");
    let sink = b.module("sink");
    let out = b.output(probe, float());
    b.wire(out, sink);

    let mut ctx = pool(1);
    let options = SchedulerOptions::default().with_exempt(probe);
    Scheduler::new(&b.graph, &mut ctx, options).unwrap().run().unwrap();
    assert_eq!(ctx.allocated_count(), 1);

    // Pinned register from the first pass must not starve the second.
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    assert!(schedule.register(out).is_some());
    assert_eq!(ctx.allocated_count(), 0);
}

// ============================================================================
// Determinism and diagnostics
// ============================================================================

#[test]
fn repeated_passes_are_identical() {
    let mut b = Builder::new();
    let src = b.module("src");
    let mid = b.module("mid");
    let side = b.module("side");
    let sink = b.module("sink");
    let s_out = b.output(src, float());
    b.wire(s_out, mid);
    b.wire(s_out, side);
    let m_out = b.output(mid, float());
    let x_out = b.output(side, float());
    b.wire(m_out, sink);
    b.wire(x_out, sink);

    let run = || {
        let mut ctx = pool(4);
        Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
            .unwrap()
            .run()
            .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.order(), second.order());
    let a: Vec<_> = first.assignments().cloned().collect();
    let z: Vec<_> = second.assignments().cloned().collect();
    assert_eq!(a, z);
}

#[test]
fn dump_lists_registers() {
    let mut b = Builder::new();
    let osc = b.module("osc");
    let gain = b.module("gain");
    let out = b.output(osc, float());
    b.wire(out, gain);

    let mut ctx = pool(2);
    let schedule = Scheduler::new(&b.graph, &mut ctx, SchedulerOptions::default())
        .unwrap()
        .run()
        .unwrap();
    let text = schedule.dump(&b.graph);
    assert!(text.contains("[0] osc depth=-1"), "got:\n{text}");
    assert!(text.contains("mod<osc> out<0> reg<float:1>"), "got:\n{text}");
    assert!(
        text.contains("mod<gain> inp<0> -< module<osc> reg<float:1>"),
        "got:\n{text}"
    );
}

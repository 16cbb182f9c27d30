//! Plexus Core - dataflow graph scheduling and typed register allocation
//!
//! Given a graph of modules connected through typed plugs, this crate
//! computes an execution order that respects every producer→consumer edge
//! and assigns each live output a register from a fixed-size pool for its
//! data type, reclaiming registers as soon as their last reader has run.
//!
//! # Core Abstractions
//!
//! ## Graph
//!
//! - [`Graph`] - Arena of modules, input plugs and output plugs
//! - [`GraphView`] - Read-only contract the scheduler consumes
//! - [`DataType`] - Type tag that routes an output to a register pool
//!
//! ## Registers
//!
//! - [`RegisterBlock`] - Fixed-capacity pool for one data type
//! - [`RegisterAllocationContext`] - One block per type, liveness pruning
//!
//! ## Scheduling
//!
//! - [`Scheduler`] - One pass: depth relaxation plus depth-first walk
//! - [`Schedule`] - Serials and register assignments produced by a pass
//! - [`plan_capacities`] - Dry run that sizes pools for a graph
//!
//! # Example
//!
//! ```rust
//! use plexus_core::{
//!     DataType, Graph, RegisterAllocationContext, RegisterBlock, Scheduler, SchedulerOptions,
//! };
//!
//! let mut graph = Graph::new();
//! let a = graph.add_module("a");
//! let b = graph.add_module("b");
//! let out = graph.add_output(a, "out", DataType::scalar())?;
//! let inp = graph.add_input(b, "in", DataType::scalar())?;
//! graph.connect(out, inp)?;
//!
//! let mut ctx = RegisterAllocationContext::new();
//! ctx.set_registers(RegisterBlock::new("float", DataType::scalar(), 1));
//!
//! let schedule = Scheduler::new(&graph, &mut ctx, SchedulerOptions::default())?.run()?;
//! assert_eq!(schedule.serial(a), Some(0));
//! assert_eq!(schedule.serial(b), Some(1));
//! assert_eq!(schedule.register(out).map(|r| r.index), Some(0));
//! assert_eq!(ctx.allocated_count(), 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! plexus-core = { version = "0.1", default-features = false }
//! ```
//!
//! Enable the `tracing` feature for debug events at each scheduling
//! milestone.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod error;
pub mod graph;
pub mod register;
pub mod schedule;
pub mod scheduler;

// Re-export main types at crate root
pub use error::{RegisterError, ScheduleError};
pub use graph::{
    DataType, Graph, GraphError, GraphView, InputId, ModuleData, ModuleId, OutputId,
};
pub use register::{
    BlockId, Register, RegisterAllocationContext, RegisterBlock, RegisterRef,
    UnregisteredTypePolicy,
};
pub use schedule::{Assignment, Schedule};
pub use scheduler::{Scheduler, SchedulerOptions, SchedulingState, plan_capacities};

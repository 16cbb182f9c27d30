//! Module/plug graph for the dataflow scheduler.
//!
//! A graph is a flat set of modules, each exposing typed input and output
//! plugs. An input references at most one producing output; an output keeps
//! back-references to the inputs reading it. All references are arena ids
//! owned by [`Graph`], never pointers.
//!
//! # Architecture
//!
//! - [`Graph`]: owns the topology and performs mutations (add, remove,
//!   connect, disconnect). Carries no scheduling state.
//! - [`GraphView`]: the read-only contract the scheduler consumes. `Graph`
//!   implements it; hosts with their own object model can too.
//!
//! # Example
//!
//! ```rust
//! use plexus_core::graph::{DataType, Graph};
//!
//! let mut graph = Graph::new();
//! let osc = graph.add_module("osc");
//! let gain = graph.add_module("gain");
//! let out = graph.add_output(osc, "out", DataType::scalar())?;
//! let inp = graph.add_input(gain, "in", DataType::scalar())?;
//! graph.connect(out, inp)?;
//! assert_eq!(graph.connection_count(), 1);
//! # Ok::<(), plexus_core::graph::GraphError>(())
//! ```

mod model;
pub mod node;
pub mod plug;
pub mod view;

pub use model::{Graph, GraphError};
pub use node::{ModuleData, ModuleId};
pub use plug::{DataType, InputId, InputPlug, OutputId, OutputPlug};
pub use view::GraphView;

//! Typed register pools.
//!
//! - [`RegisterBlock`]: fixed-capacity pool for one data type
//! - [`RegisterAllocationContext`]: one block per data type, routes
//!   requests and prunes dead registers

pub mod block;
pub mod context;

pub use block::{Register, RegisterBlock};
pub use context::{BlockId, RegisterAllocationContext, RegisterRef, UnregisteredTypePolicy};

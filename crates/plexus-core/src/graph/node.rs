//! Module (graph node) types for the dataflow graph.
//!
//! Each module in the graph has a [`ModuleId`] and owns two ordered lists of
//! plugs: its inputs and its outputs. The `ModuleData` struct bundles the
//! display name with those plug lists; scheduling state is deliberately not
//! stored here (see [`SchedulingState`](crate::SchedulingState)).

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use super::plug::{InputId, OutputId};

/// Unique identifier for a module in the dataflow graph.
///
/// Module IDs are assigned sequentially and never reused within a graph instance.
/// They remain stable across graph mutations and scheduling passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub(crate) u32);

impl ModuleId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

/// A module as stored in the graph arena.
#[derive(Debug, Clone)]
pub struct ModuleData {
    pub(crate) id: ModuleId,
    pub(crate) name: String,
    pub(crate) inputs: Vec<InputId>,
    pub(crate) outputs: Vec<OutputId>,
}

impl ModuleData {
    pub(crate) fn new(id: ModuleId, name: String) -> Self {
        Self {
            id,
            name,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Returns this module's identifier.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Returns the display name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input plugs in declaration order.
    pub fn inputs(&self) -> &[InputId] {
        &self.inputs
    }

    /// Output plugs in declaration order.
    pub fn outputs(&self) -> &[OutputId] {
        &self.outputs
    }
}

//! Plug types for the dataflow graph.
//!
//! A plug is a typed port on a module. An [`InputPlug`] references at most
//! one producing [`OutputPlug`]; an output keeps the ordered list of inputs
//! that read it. Both directions are stored as arena indices, so removing a
//! module never leaves a dangling reference behind: a stale id simply fails
//! lookup.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use super::node::ModuleId;

/// Identifier of an input plug.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputId(pub(crate) u32);

/// Identifier of an output plug.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputId(pub(crate) u32);

impl InputId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl OutputId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for InputId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "InputId({})", self.0)
    }
}

impl core::fmt::Display for OutputId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

/// Data-type tag carried by every plug.
///
/// The tag selects which [`RegisterBlock`](crate::RegisterBlock) serves an
/// output. Tags compare by name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataType(String);

impl DataType {
    /// Name of the conventional scalar type.
    pub const SCALAR: &'static str = "float";

    /// Creates a tag with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The scalar type, used by default for same-module feedback plugs.
    pub fn scalar() -> Self {
        Self::new(Self::SCALAR)
    }

    /// Returns the tag name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An input port. Connected to zero or one producer output.
#[derive(Debug, Clone)]
pub struct InputPlug {
    pub(crate) module: ModuleId,
    pub(crate) name: String,
    pub(crate) data_type: DataType,
    pub(crate) producer: Option<OutputId>,
}

impl InputPlug {
    /// Module owning this plug.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Plug name, unique within its module's inputs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data-type tag.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// The output feeding this input, if connected.
    pub fn producer(&self) -> Option<OutputId> {
        self.producer
    }

    /// Returns true if a producer is attached.
    pub fn is_connected(&self) -> bool {
        self.producer.is_some()
    }
}

/// An output port. Holds back-references to every input reading it.
#[derive(Debug, Clone)]
pub struct OutputPlug {
    pub(crate) module: ModuleId,
    pub(crate) name: String,
    pub(crate) data_type: DataType,
    /// Lookup only; the consumers belong to their own modules.
    pub(crate) consumers: Vec<InputId>,
    /// Set whenever a connection to this output is made or broken.
    pub(crate) dirty: bool,
}

impl OutputPlug {
    /// Module owning this plug.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Plug name, unique within its module's outputs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data-type tag.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Inputs reading this output, in connection order.
    pub fn consumers(&self) -> &[InputId] {
        &self.consumers
    }

    /// Returns true if at least one input reads this output.
    pub fn is_connected(&self) -> bool {
        !self.consumers.is_empty()
    }

    /// Returns true if the connection set changed since the last
    /// [`Graph::mark_scheduled`](super::Graph::mark_scheduled).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

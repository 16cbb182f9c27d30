//! Error types for register allocation and scheduling.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::graph::{DataType, ModuleId};

/// Errors raised by a [`RegisterBlock`](crate::RegisterBlock).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Every register in the block is allocated.
    Exhausted {
        /// Block name.
        block: String,
        /// Fixed capacity of the block.
        capacity: usize,
    },
    /// The slot is not currently allocated (double free or foreign slot).
    NotAllocated {
        /// Block name.
        block: String,
        /// Register index within the block.
        index: usize,
    },
}

impl core::fmt::Display for RegisterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Exhausted { block, capacity } => {
                write!(f, "register block '{block}' exhausted (capacity {capacity})")
            }
            Self::NotAllocated { block, index } => {
                write!(f, "register {block}:{index} is not allocated")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegisterError {}

/// Errors that abort a scheduling pass.
///
/// There is no partial result: a pass either produces a complete
/// [`Schedule`](crate::Schedule) or one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A register operation failed, most often pool exhaustion.
    Register(RegisterError),
    /// An output needs a register but no block serves its data type.
    UnregisteredType {
        /// The unserved type.
        data_type: DataType,
        /// Module owning the output.
        module: ModuleId,
    },
    /// An exempt module is not part of the graph.
    ModuleNotFound(ModuleId),
}

impl core::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Register(err) => write!(f, "{err}"),
            Self::UnregisteredType { data_type, module } => write!(
                f,
                "no register block for type '{data_type}' (needed by {module})"
            ),
            Self::ModuleNotFound(id) => write!(f, "module {id} not found"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Register(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegisterError> for ScheduleError {
    fn from(err: RegisterError) -> Self {
        Self::Register(err)
    }
}

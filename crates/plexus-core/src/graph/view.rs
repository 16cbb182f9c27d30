//! Read-only graph contract consumed by the scheduler.
//!
//! The scheduler never walks [`Graph`](super::Graph) directly; it asks a
//! [`GraphView`] for modules, plugs and connections. Hosts with their own
//! module object model implement this trait instead of copying into a
//! `Graph`.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use super::node::ModuleId;
use super::plug::{DataType, InputId, OutputId};

/// Minimal view of a module/plug graph.
///
/// Lookups of ids that are not part of the graph return `None` or an empty
/// slice rather than panicking.
pub trait GraphView {
    /// All modules, in a stable order (the scheduler's tie-break order).
    fn module_ids(&self) -> Vec<ModuleId>;

    /// Display name of a module, used by diagnostics.
    fn module_name(&self, module: ModuleId) -> Option<&str>;

    /// Input plugs of a module, in declaration order.
    fn inputs(&self, module: ModuleId) -> &[InputId];

    /// Output plugs of a module, in declaration order.
    fn outputs(&self, module: ModuleId) -> &[OutputId];

    /// Module owning an input.
    fn input_module(&self, input: InputId) -> Option<ModuleId>;

    /// Data type of an input.
    fn input_type(&self, input: InputId) -> Option<&DataType>;

    /// Output feeding an input.
    fn producer(&self, input: InputId) -> Option<OutputId>;

    /// Module owning an output.
    fn output_module(&self, output: OutputId) -> Option<ModuleId>;

    /// Data type of an output.
    fn output_type(&self, output: OutputId) -> Option<&DataType>;

    /// Inputs reading an output, in connection order.
    fn consumers(&self, output: OutputId) -> &[InputId];

    /// Returns true if the module exists.
    fn contains_module(&self, module: ModuleId) -> bool {
        self.module_name(module).is_some()
    }

    /// Returns true if at least one input reads `output`.
    fn output_is_connected(&self, output: OutputId) -> bool {
        !self.consumers(output).is_empty()
    }

    /// Module owning the output that feeds `input`.
    fn producer_module(&self, input: InputId) -> Option<ModuleId> {
        self.producer(input).and_then(|out| self.output_module(out))
    }

    /// Modules reading `output`, one entry per consuming input, in
    /// connection order. Duplicates are kept.
    fn consumer_modules(&self, output: OutputId) -> Vec<ModuleId> {
        self.consumers(output)
            .iter()
            .filter_map(|&input| self.input_module(input))
            .collect()
    }
}

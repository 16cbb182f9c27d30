//! Dataflow graph: module/plug arena and mutation API.
//!
//! [`Graph`] owns every module, input plug and output plug in three
//! slot arrays. Removal empties a slot without shifting the others, so ids
//! stay valid for the lifetime of the graph and stale ids fail lookup with
//! a [`GraphError`] instead of aliasing a newer entry.
//!
//! Unlike an audio routing DAG, a dataflow graph may legitimately contain
//! cycles (same-module feedback plugs in particular), so `connect` does not
//! reject them. The scheduler tolerates cycles when ordering.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use super::node::{ModuleData, ModuleId};
use super::plug::{DataType, InputId, InputPlug, OutputId, OutputPlug};
use super::view::GraphView;

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The specified module was not found in the graph.
    ModuleNotFound(ModuleId),
    /// The specified input plug was not found in the graph.
    InputNotFound(InputId),
    /// The specified output plug was not found in the graph.
    OutputNotFound(OutputId),
    /// The output and input carry different data types.
    TypeMismatch {
        /// Type of the producing output.
        output: DataType,
        /// Type of the consuming input.
        input: DataType,
    },
    /// The input has no producer to disconnect.
    NotConnected(InputId),
}

impl core::fmt::Display for GraphError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ModuleNotFound(id) => write!(f, "module {id} not found"),
            Self::InputNotFound(id) => write!(f, "input {id} not found"),
            Self::OutputNotFound(id) => write!(f, "output {id} not found"),
            Self::TypeMismatch { output, input } => {
                write!(f, "cannot connect output of type '{output}' to input of type '{input}'")
            }
            Self::NotConnected(id) => write!(f, "input {id} is not connected"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GraphError {}

/// Arena of modules and plugs.
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add modules: [`add_module()`](Self::add_module)
/// 3. Declare plugs: [`add_input()`](Self::add_input), [`add_output()`](Self::add_output)
/// 4. Wire them: [`connect()`](Self::connect)
/// 5. Schedule: [`Scheduler::new()`](crate::Scheduler::new)
#[derive(Debug, Default, Clone)]
pub struct Graph {
    modules: Vec<Option<ModuleData>>,
    inputs: Vec<Option<InputPlug>>,
    outputs: Vec<Option<OutputPlug>>,
}

impl Graph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Module mutations ---

    /// Adds a module with no plugs. Returns the new module's ID.
    pub fn add_module(&mut self, name: impl Into<String>) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Some(ModuleData::new(id, name.into())));
        #[cfg(feature = "tracing")]
        tracing::trace!("graph_add: module {id}");
        id
    }

    /// Declares a new input plug on `module`.
    pub fn add_input(
        &mut self,
        module: ModuleId,
        name: impl Into<String>,
        data_type: DataType,
    ) -> Result<InputId, GraphError> {
        let id = InputId(self.inputs.len() as u32);
        self.module_data_mut(module)?.inputs.push(id);
        self.inputs.push(Some(InputPlug {
            module,
            name: name.into(),
            data_type,
            producer: None,
        }));
        Ok(id)
    }

    /// Declares a new output plug on `module`.
    pub fn add_output(
        &mut self,
        module: ModuleId,
        name: impl Into<String>,
        data_type: DataType,
    ) -> Result<OutputId, GraphError> {
        let id = OutputId(self.outputs.len() as u32);
        self.module_data_mut(module)?.outputs.push(id);
        self.outputs.push(Some(OutputPlug {
            module,
            name: name.into(),
            data_type,
            consumers: Vec::new(),
            dirty: false,
        }));
        Ok(id)
    }

    /// Removes a module, disconnecting every plug that touches it.
    pub fn remove_module(&mut self, id: ModuleId) -> Result<(), GraphError> {
        let module = self.module(id)?;
        let inputs = module.inputs.clone();
        let outputs = module.outputs.clone();

        for input in &inputs {
            if self.input(*input)?.producer.is_some() {
                self.disconnect(*input)?;
            }
        }
        for output in &outputs {
            let consumers = self.output(*output)?.consumers.clone();
            for consumer in consumers {
                self.disconnect(consumer)?;
            }
        }

        for input in inputs {
            self.inputs[input.0 as usize] = None;
        }
        for output in outputs {
            self.outputs[output.0 as usize] = None;
        }
        self.modules[id.0 as usize] = None;
        #[cfg(feature = "tracing")]
        tracing::trace!("graph_remove: module {id}");
        Ok(())
    }

    // --- Connections ---

    /// Connects `output` to `input`.
    ///
    /// An input already fed by another output is disconnected first. Both
    /// plugs must carry the same data type. Cycles and self connections are
    /// permitted.
    pub fn connect(&mut self, output: OutputId, input: InputId) -> Result<(), GraphError> {
        let out_type = self.output(output)?.data_type.clone();
        let in_plug = self.input(input)?;
        if in_plug.data_type != out_type {
            return Err(GraphError::TypeMismatch {
                output: out_type,
                input: in_plug.data_type.clone(),
            });
        }
        if in_plug.producer == Some(output) {
            return Ok(());
        }
        if in_plug.producer.is_some() {
            self.disconnect(input)?;
        }

        self.input_mut(input)?.producer = Some(output);
        let out_plug = self.output_mut(output)?;
        out_plug.consumers.push(input);
        out_plug.dirty = true;

        #[cfg(feature = "tracing")]
        tracing::trace!("graph_connect: {output} → {input}");
        Ok(())
    }

    /// Detaches `input` from its producer.
    pub fn disconnect(&mut self, input: InputId) -> Result<(), GraphError> {
        let producer = self
            .input_mut(input)?
            .producer
            .take()
            .ok_or(GraphError::NotConnected(input))?;
        let out_plug = self.output_mut(producer)?;
        out_plug.consumers.retain(|&c| c != input);
        out_plug.dirty = true;
        #[cfg(feature = "tracing")]
        tracing::trace!("graph_disconnect: {producer} ↛ {input}");
        Ok(())
    }

    // --- Queries ---

    /// Returns the module with the given ID.
    pub fn module(&self, id: ModuleId) -> Result<&ModuleData, GraphError> {
        self.modules
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(GraphError::ModuleNotFound(id))
    }

    /// Returns the input plug with the given ID.
    pub fn input(&self, id: InputId) -> Result<&InputPlug, GraphError> {
        self.inputs
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(GraphError::InputNotFound(id))
    }

    /// Returns the output plug with the given ID.
    pub fn output(&self, id: OutputId) -> Result<&OutputPlug, GraphError> {
        self.outputs
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(GraphError::OutputNotFound(id))
    }

    /// Iterates over live modules in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleData> {
        self.modules.iter().filter_map(Option::as_ref)
    }

    /// Returns the number of live modules.
    pub fn module_count(&self) -> usize {
        self.modules().count()
    }

    /// Returns the number of connected inputs (edges).
    pub fn connection_count(&self) -> usize {
        self.inputs
            .iter()
            .flatten()
            .filter(|i| i.producer.is_some())
            .count()
    }

    /// Finds the first module with the given name.
    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules().find(|m| m.name == name).map(|m| m.id)
    }

    /// Finds an input of `module` by name.
    pub fn find_input(&self, module: ModuleId, name: &str) -> Option<InputId> {
        let data = self.module(module).ok()?;
        data.inputs
            .iter()
            .copied()
            .find(|&i| self.input(i).is_ok_and(|p| p.name == name))
    }

    /// Finds an output of `module` by name.
    pub fn find_output(&self, module: ModuleId, name: &str) -> Option<OutputId> {
        let data = self.module(module).ok()?;
        data.outputs
            .iter()
            .copied()
            .find(|&o| self.output(o).is_ok_and(|p| p.name == name))
    }

    // --- Dirty tracking ---

    /// Returns true if any connection changed since the last
    /// [`mark_scheduled()`](Self::mark_scheduled).
    pub fn needs_schedule(&self) -> bool {
        self.outputs.iter().flatten().any(|o| o.dirty)
    }

    /// Clears every output's dirty flag.
    pub fn mark_scheduled(&mut self) {
        for out in self.outputs.iter_mut().flatten() {
            out.dirty = false;
        }
    }

    // --- Internal helpers ---

    fn module_data_mut(&mut self, id: ModuleId) -> Result<&mut ModuleData, GraphError> {
        self.modules
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::ModuleNotFound(id))
    }

    fn input_mut(&mut self, id: InputId) -> Result<&mut InputPlug, GraphError> {
        self.inputs
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::InputNotFound(id))
    }

    fn output_mut(&mut self, id: OutputId) -> Result<&mut OutputPlug, GraphError> {
        self.outputs
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::OutputNotFound(id))
    }
}

impl GraphView for Graph {
    fn module_ids(&self) -> Vec<ModuleId> {
        self.modules().map(|m| m.id).collect()
    }

    fn module_name(&self, module: ModuleId) -> Option<&str> {
        self.module(module).ok().map(|m| m.name.as_str())
    }

    fn inputs(&self, module: ModuleId) -> &[InputId] {
        self.module(module)
            .map(|m| m.inputs.as_slice())
            .unwrap_or_default()
    }

    fn outputs(&self, module: ModuleId) -> &[OutputId] {
        self.module(module)
            .map(|m| m.outputs.as_slice())
            .unwrap_or_default()
    }

    fn input_module(&self, input: InputId) -> Option<ModuleId> {
        self.input(input).ok().map(|p| p.module)
    }

    fn input_type(&self, input: InputId) -> Option<&DataType> {
        self.input(input).ok().map(|p| &p.data_type)
    }

    fn producer(&self, input: InputId) -> Option<OutputId> {
        self.input(input).ok().and_then(|p| p.producer)
    }

    fn output_module(&self, output: OutputId) -> Option<ModuleId> {
        self.output(output).ok().map(|p| p.module)
    }

    fn output_type(&self, output: OutputId) -> Option<&DataType> {
        self.output(output).ok().map(|p| &p.data_type)
    }

    fn consumers(&self, output: OutputId) -> &[InputId] {
        self.output(output)
            .map(|p| p.consumers.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float() -> DataType {
        DataType::scalar()
    }

    /// `src.out → dst.in`, both scalar.
    fn pair() -> (Graph, ModuleId, ModuleId, OutputId, InputId) {
        let mut g = Graph::new();
        let src = g.add_module("src");
        let dst = g.add_module("dst");
        let out = g.add_output(src, "out", float()).unwrap();
        let inp = g.add_input(dst, "in", float()).unwrap();
        (g, src, dst, out, inp)
    }

    #[test]
    fn test_add_modules_and_plugs() {
        let (g, src, dst, out, inp) = pair();
        assert_eq!(g.module_count(), 2);
        assert_eq!(g.module(src).unwrap().outputs(), &[out]);
        assert_eq!(g.module(dst).unwrap().inputs(), &[inp]);
        assert_eq!(g.output(out).unwrap().module(), src);
        assert_eq!(g.input(inp).unwrap().module(), dst);
        assert_eq!(g.connection_count(), 0);
    }

    #[test]
    fn test_add_plug_to_missing_module() {
        let mut g = Graph::new();
        let err = g.add_input(ModuleId(7), "in", float()).unwrap_err();
        assert_eq!(err, GraphError::ModuleNotFound(ModuleId(7)));
    }

    #[test]
    fn test_connect_sets_both_directions() {
        let (mut g, _, _, out, inp) = pair();
        g.connect(out, inp).unwrap();
        assert_eq!(g.input(inp).unwrap().producer(), Some(out));
        assert_eq!(g.output(out).unwrap().consumers(), &[inp]);
        assert_eq!(g.connection_count(), 1);
    }

    #[test]
    fn test_connect_twice_is_idempotent() {
        let (mut g, _, _, out, inp) = pair();
        g.connect(out, inp).unwrap();
        g.connect(out, inp).unwrap();
        assert_eq!(g.output(out).unwrap().consumers().len(), 1);
    }

    #[test]
    fn test_connect_type_mismatch_rejected() {
        let mut g = Graph::new();
        let a = g.add_module("a");
        let b = g.add_module("b");
        let out = g.add_output(a, "out", DataType::new("vec3")).unwrap();
        let inp = g.add_input(b, "in", float()).unwrap();
        let err = g.connect(out, inp).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));
        assert_eq!(g.connection_count(), 0);
    }

    #[test]
    fn test_reconnect_replaces_previous_producer() {
        let (mut g, _, _, out, inp) = pair();
        let other = g.add_module("other");
        let out2 = g.add_output(other, "out", float()).unwrap();
        g.connect(out, inp).unwrap();
        g.connect(out2, inp).unwrap();
        assert_eq!(g.input(inp).unwrap().producer(), Some(out2));
        assert!(g.output(out).unwrap().consumers().is_empty());
        assert_eq!(g.output(out2).unwrap().consumers(), &[inp]);
    }

    #[test]
    fn test_self_connection_allowed() {
        let mut g = Graph::new();
        let m = g.add_module("loop");
        let out = g.add_output(m, "out", float()).unwrap();
        let inp = g.add_input(m, "rate", float()).unwrap();
        g.connect(out, inp).unwrap();
        assert_eq!(g.producer_module(inp), Some(m));
    }

    #[test]
    fn test_disconnect() {
        let (mut g, _, _, out, inp) = pair();
        g.connect(out, inp).unwrap();
        g.disconnect(inp).unwrap();
        assert!(!g.input(inp).unwrap().is_connected());
        assert!(!g.output(out).unwrap().is_connected());
        assert_eq!(g.disconnect(inp), Err(GraphError::NotConnected(inp)));
    }

    #[test]
    fn test_remove_module_detaches_neighbours() {
        let (mut g, src, dst, out, inp) = pair();
        g.connect(out, inp).unwrap();
        g.remove_module(src).unwrap();
        assert_eq!(g.module_count(), 1);
        assert!(!g.input(inp).unwrap().is_connected());
        assert_eq!(g.output(out).unwrap_err(), GraphError::OutputNotFound(out));
        assert!(g.module(dst).is_ok());
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut g = Graph::new();
        let a = g.add_module("a");
        g.remove_module(a).unwrap();
        let b = g.add_module("b");
        assert_ne!(a, b);
        assert_eq!(g.module(a).unwrap_err(), GraphError::ModuleNotFound(a));
    }

    #[test]
    fn test_find_by_name() {
        let (g, src, dst, out, inp) = pair();
        assert_eq!(g.find_module("dst"), Some(dst));
        assert_eq!(g.find_output(src, "out"), Some(out));
        assert_eq!(g.find_input(dst, "in"), Some(inp));
        assert_eq!(g.find_input(dst, "nope"), None);
    }

    #[test]
    fn test_dirty_tracking() {
        let (mut g, _, _, out, inp) = pair();
        assert!(!g.needs_schedule());
        g.connect(out, inp).unwrap();
        assert!(g.output(out).unwrap().is_dirty());
        assert!(g.needs_schedule());
        g.mark_scheduled();
        assert!(!g.needs_schedule());
        g.disconnect(inp).unwrap();
        assert!(g.needs_schedule());
    }

    #[test]
    fn test_view_on_stale_ids() {
        let (mut g, src, _, out, _) = pair();
        g.remove_module(src).unwrap();
        assert!(GraphView::outputs(&g, src).is_empty());
        assert!(GraphView::consumers(&g, out).is_empty());
        assert_eq!(g.output_module(out), None);
    }
}

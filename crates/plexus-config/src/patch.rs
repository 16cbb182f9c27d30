//! Patch file format: a named description of a dataflow graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use plexus_core::{DataType, Graph, InputId, ModuleId, OutputId};

use crate::error::ConfigError;

/// A plug declaration inside a [`ModuleSpec`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlugSpec {
    /// Plug name, unique among the module's inputs (or outputs).
    pub name: String,
    /// Data type carried by the plug.
    #[serde(rename = "type", default = "default_type")]
    pub data_type: String,
}

fn default_type() -> String {
    DataType::SCALAR.to_string()
}

impl PlugSpec {
    /// Create a plug declaration.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A module declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleSpec {
    /// Module name, unique within the patch.
    pub name: String,
    /// Input plugs in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<PlugSpec>,
    /// Output plugs in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PlugSpec>,
}

impl ModuleSpec {
    /// Create a module with no plugs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add an input plug.
    pub fn with_input(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.inputs.push(PlugSpec::new(name, data_type));
        self
    }

    /// Add an output plug.
    pub fn with_output(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.outputs.push(PlugSpec::new(name, data_type));
        self
    }
}

/// A wire from `module.output` to `module.input`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionSpec {
    /// Producing end, `"module.plug"`.
    pub from: String,
    /// Consuming end, `"module.plug"`.
    pub to: String,
}

impl ConnectionSpec {
    /// Create a connection.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Splits `"module.plug"` at its last dot.
pub fn split_plug_path(path: &str) -> Option<(&str, &str)> {
    let (module, plug) = path.rsplit_once('.')?;
    (!module.is_empty() && !plug.is_empty()).then_some((module, plug))
}

/// Graph description file.
///
/// # TOML Format
///
/// ```toml
/// name = "lfo-chain"
///
/// [[modules]]
/// name = "lfo"
/// outputs = [{ name = "out", type = "float" }]
///
/// [[modules]]
/// name = "gain"
/// inputs = [{ name = "in", type = "float" }]
/// outputs = [{ name = "out", type = "float" }]
///
/// [[connections]]
/// from = "lfo.out"
/// to = "gain.in"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patch {
    /// Optional patch name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Modules in insertion order.
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,

    /// Wires between plugs.
    #[serde(default)]
    pub connections: Vec<ConnectionSpec>,
}

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module.
    pub fn with_module(mut self, module: ModuleSpec) -> Self {
        self.modules.push(module);
        self
    }

    /// Add a connection.
    pub fn with_connection(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.connections.push(ConnectionSpec::new(from, to));
        self
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the patch to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find a module declaration by name.
    pub fn module(&self, name: &str) -> Option<&ModuleSpec> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Builds the graph described by this patch.
    ///
    /// Modules are added in declaration order, so graph order (and with it
    /// the scheduler's tiebreak) follows the file.
    pub fn build(&self) -> Result<PatchGraph, ConfigError> {
        let mut graph = Graph::new();
        let mut index = BTreeMap::new();

        for spec in &self.modules {
            if index.contains_key(&spec.name) {
                return Err(ConfigError::DuplicateModule(spec.name.clone()));
            }
            let id = graph.add_module(spec.name.as_str());
            for plug in &spec.inputs {
                graph.add_input(id, plug.name.as_str(), DataType::new(plug.data_type.as_str()))?;
            }
            for plug in &spec.outputs {
                graph.add_output(id, plug.name.as_str(), DataType::new(plug.data_type.as_str()))?;
            }
            index.insert(spec.name.clone(), id);
        }

        let mut patch = PatchGraph { graph, index };
        for conn in &self.connections {
            let output = patch.resolve_output(&conn.from)?;
            let input = patch.resolve_input(&conn.to)?;
            patch.graph.connect(output, input)?;
        }
        patch.graph.mark_scheduled();
        Ok(patch)
    }
}

/// A built [`Patch`]: the graph plus a name index into it.
#[derive(Debug, Clone)]
pub struct PatchGraph {
    graph: Graph,
    index: BTreeMap<String, ModuleId>,
}

impl PatchGraph {
    /// The built graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access for further edits.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Module id for `name`.
    pub fn module(&self, name: &str) -> Option<ModuleId> {
        self.index.get(name).copied()
    }

    /// Module id for `name`, or [`ConfigError::UnknownModule`].
    pub fn resolve_module(&self, name: &str) -> Result<ModuleId, ConfigError> {
        self.module(name)
            .ok_or_else(|| ConfigError::UnknownModule(name.to_string()))
    }

    /// Resolves `"module.plug"` to an output.
    pub fn resolve_output(&self, path: &str) -> Result<OutputId, ConfigError> {
        let (module, plug) = split_path(path)?;
        let id = self.resolve_module(module)?;
        self.graph
            .find_output(id, plug)
            .ok_or_else(|| unknown_plug(module, plug))
    }

    /// Resolves `"module.plug"` to an input.
    pub fn resolve_input(&self, path: &str) -> Result<InputId, ConfigError> {
        let (module, plug) = split_path(path)?;
        let id = self.resolve_module(module)?;
        self.graph
            .find_input(id, plug)
            .ok_or_else(|| unknown_plug(module, plug))
    }

    /// Module names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graph.modules().map(|m| m.name())
    }
}

fn split_path(path: &str) -> Result<(&str, &str), ConfigError> {
    split_plug_path(path).ok_or_else(|| {
        crate::validation::ValidationError::BadPlugPath(path.to_string()).into()
    })
}

fn unknown_plug(module: &str, plug: &str) -> ConfigError {
    ConfigError::UnknownPlug {
        module: module.to_string(),
        plug: plug.to_string(),
    }
}

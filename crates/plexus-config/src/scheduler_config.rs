//! Scheduler configuration: register pools, probes and type policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use plexus_core::{
    DataType, RegisterAllocationContext, RegisterBlock, SchedulerOptions, UnregisteredTypePolicy,
};

use crate::error::ConfigError;
use crate::patch::PatchGraph;

/// What to do when an output's type has no pool.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnregisteredType {
    /// Fail the pass.
    #[default]
    Error,
    /// Leave the output without storage.
    Skip,
}

impl From<UnregisteredType> for UnregisteredTypePolicy {
    fn from(value: UnregisteredType) -> Self {
        match value {
            UnregisteredType::Error => UnregisteredTypePolicy::Error,
            UnregisteredType::Skip => UnregisteredTypePolicy::Skip,
        }
    }
}

/// One register pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolConfig {
    /// Data type served by the pool.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Block name used in diagnostics; defaults to the type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Number of registers.
    pub capacity: usize,
}

impl PoolConfig {
    /// Create a pool named after its type.
    pub fn new(data_type: impl Into<String>, capacity: usize) -> Self {
        Self {
            data_type: data_type.into(),
            name: None,
            capacity,
        }
    }

    /// Name shown in dumps and errors.
    pub fn block_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.data_type)
    }
}

/// Scheduler settings file.
///
/// # TOML Format
///
/// ```toml
/// feedback_type = "float"
/// unregistered_type = "error"
/// exempt = ["scope"]
///
/// [[pools]]
/// type = "float"
/// name = "float-regs"
/// capacity = 8
///
/// [[pools]]
/// type = "vec3"
/// capacity = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Inputs of this type fed by their own module never block readiness.
    #[serde(default = "default_feedback_type")]
    pub feedback_type: String,

    /// Policy for outputs whose type has no pool.
    #[serde(default)]
    pub unregistered_type: UnregisteredType,

    /// Names of modules whose registers are kept after their last reader.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exempt: Vec<String>,

    /// Register pools, one per data type.
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

fn default_feedback_type() -> String {
    DataType::SCALAR.to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            feedback_type: default_feedback_type(),
            unregistered_type: UnregisteredType::default(),
            exempt: Vec::new(),
            pools: Vec::new(),
        }
    }
}

impl SchedulerConfig {
    /// Create a config with no pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pools sized exactly to a capacity plan.
    pub fn from_capacities(plan: &BTreeMap<DataType, usize>) -> Self {
        Self {
            pools: plan
                .iter()
                .map(|(data_type, &capacity)| PoolConfig::new(data_type.name(), capacity))
                .collect(),
            ..Self::default()
        }
    }

    /// Add a pool.
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pools.push(pool);
        self
    }

    /// Add an exempt module name.
    pub fn with_exempt(mut self, name: impl Into<String>) -> Self {
        self.exempt.push(name.into());
        self
    }

    /// Set the unregistered-type policy.
    pub fn with_unregistered_type(mut self, policy: UnregisteredType) -> Self {
        self.unregistered_type = policy;
        self
    }

    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the config to a TOML file.
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

    /// Convert the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Builds a fresh allocation context with one block per pool.
    ///
    /// A later pool for the same type replaces an earlier one.
    pub fn context(&self) -> RegisterAllocationContext {
        let mut ctx = RegisterAllocationContext::new().with_policy(self.unregistered_type.into());
        for pool in &self.pools {
            ctx.set_registers(RegisterBlock::new(
                pool.block_name(),
                DataType::new(pool.data_type.as_str()),
                pool.capacity,
            ));
        }
        ctx
    }

    /// Scheduler options with exempt names resolved against `patch`.
    pub fn options(&self, patch: &PatchGraph) -> Result<SchedulerOptions, ConfigError> {
        let mut options = SchedulerOptions::default()
            .with_feedback_type(DataType::new(self.feedback_type.as_str()));
        for name in &self.exempt {
            options = options.with_exempt(patch.resolve_module(name)?);
        }
        Ok(options)
    }

    /// Resolves everything a scheduling pass over `patch` needs.
    pub fn apply(
        &self,
        patch: &PatchGraph,
    ) -> Result<(SchedulerOptions, RegisterAllocationContext), ConfigError> {
        Ok((self.options(patch)?, self.context()))
    }
}

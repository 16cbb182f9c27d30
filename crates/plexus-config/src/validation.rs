//! Patch and scheduler-config validation.
//!
//! [`Patch::build`](crate::Patch::build) stops at the first problem; the
//! functions here walk the whole file and report everything at once, which
//! is what `plexus check` prints.
//!
//! # Example
//!
//! ```rust
//! use plexus_config::{ModuleSpec, Patch, validate_patch};
//!
//! let patch = Patch::new()
//!     .with_module(ModuleSpec::new("osc").with_output("out", "float"))
//!     .with_module(ModuleSpec::new("gain").with_input("in", "float"))
//!     .with_connection("osc.out", "gain.in");
//! validate_patch(&patch).expect("patch should be valid");
//! ```

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use plexus_core::DataType;

use crate::patch::{ModuleSpec, Patch, split_plug_path};
use crate::scheduler_config::{SchedulerConfig, UnregisteredType};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two modules share a name.
    #[error("duplicate module name: {0}")]
    DuplicateModule(String),

    /// Two inputs (or two outputs) of one module share a name.
    #[error("module '{module}' declares plug '{plug}' twice")]
    DuplicatePlug {
        /// Module name.
        module: String,
        /// Repeated plug name.
        plug: String,
    },

    /// A connection endpoint is not of the form `module.plug`.
    #[error("malformed plug path '{0}', expected 'module.plug'")]
    BadPlugPath(String),

    /// A connection or exempt entry names an undeclared module.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// A connection names an undeclared plug.
    #[error("unknown plug '{plug}' on module '{module}'")]
    UnknownPlug {
        /// Module name.
        module: String,
        /// Plug name.
        plug: String,
    },

    /// The two ends of a connection carry different types.
    #[error("type mismatch on '{from}' -> '{to}': {output} vs {input}")]
    TypeMismatch {
        /// Producing end.
        from: String,
        /// Consuming end.
        to: String,
        /// Output type.
        output: String,
        /// Input type.
        input: String,
    },

    /// More than one connection targets the same input.
    #[error("input '{0}' is connected more than once")]
    InputFedTwice(String),

    /// Two pools serve the same data type.
    #[error("duplicate pool for type '{0}'")]
    DuplicatePool(String),

    /// A type the graph allocates has no pool.
    #[error("no pool for type '{0}'")]
    MissingPool(String),

    /// A pool is smaller than the graph's peak demand.
    #[error("pool for type '{data_type}' has {capacity} registers, {required} required")]
    InsufficientPool {
        /// Data type of the pool.
        data_type: String,
        /// Configured capacity.
        capacity: usize,
        /// Peak simultaneous registers.
        required: usize,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn check_plug_names(module: &ModuleSpec, errors: &mut Vec<ValidationError>) {
    for plugs in [&module.inputs, &module.outputs] {
        let mut seen = BTreeSet::new();
        for plug in plugs {
            if !seen.insert(plug.name.as_str()) {
                errors.push(ValidationError::DuplicatePlug {
                    module: module.name.clone(),
                    plug: plug.name.clone(),
                });
            }
        }
    }
}

/// Resolves one end of a connection to its plug type.
fn endpoint_type<'a>(
    modules: &BTreeMap<&str, &'a ModuleSpec>,
    path: &str,
    output: bool,
) -> Result<&'a str, ValidationError> {
    let (module, plug) =
        split_plug_path(path).ok_or_else(|| ValidationError::BadPlugPath(path.to_string()))?;
    let spec: &'a ModuleSpec = modules
        .get(module)
        .copied()
        .ok_or_else(|| ValidationError::UnknownModule(module.to_string()))?;
    let plugs = if output { &spec.outputs } else { &spec.inputs };
    plugs
        .iter()
        .find(|p| p.name == plug)
        .map(|p| p.data_type.as_str())
        .ok_or_else(|| ValidationError::UnknownPlug {
            module: module.to_string(),
            plug: plug.to_string(),
        })
}

/// Checks names, endpoints, types and input fan-in of a patch.
pub fn validate_patch(patch: &Patch) -> ValidationResult<()> {
    let mut errors = Vec::new();
    let mut modules = BTreeMap::new();
    for module in &patch.modules {
        if modules.insert(module.name.as_str(), module).is_some() {
            errors.push(ValidationError::DuplicateModule(module.name.clone()));
        }
        check_plug_names(module, &mut errors);
    }

    let mut fed = BTreeSet::new();
    for conn in &patch.connections {
        let output = endpoint_type(&modules, &conn.from, true);
        let input = endpoint_type(&modules, &conn.to, false);
        match (output, input) {
            (Ok(output), Ok(input)) if output != input => {
                errors.push(ValidationError::TypeMismatch {
                    from: conn.from.clone(),
                    to: conn.to.clone(),
                    output: output.to_string(),
                    input: input.to_string(),
                });
            }
            (Ok(_), Ok(_)) => {}
            (output, input) => errors.extend(output.err().into_iter().chain(input.err())),
        }
        if !fed.insert(conn.to.as_str()) {
            errors.push(ValidationError::InputFedTwice(conn.to.clone()));
        }
    }
    collect(errors)
}

/// Checks a config on its own, or against `patch` when given.
pub fn validate_config(config: &SchedulerConfig, patch: Option<&Patch>) -> ValidationResult<()> {
    let mut errors = Vec::new();
    let mut types = BTreeSet::new();
    for pool in &config.pools {
        if !types.insert(pool.data_type.as_str()) {
            errors.push(ValidationError::DuplicatePool(pool.data_type.clone()));
        }
    }
    if let Some(patch) = patch {
        for name in &config.exempt {
            if patch.module(name).is_none() {
                errors.push(ValidationError::UnknownModule(name.clone()));
            }
        }
    }
    collect(errors)
}

/// Checks configured pools against a capacity plan.
///
/// Under [`UnregisteredType::Skip`] a type without a pool is left without
/// storage on purpose and is not reported.
pub fn validate_capacities(
    config: &SchedulerConfig,
    plan: &BTreeMap<DataType, usize>,
) -> ValidationResult<()> {
    let mut errors = Vec::new();
    for (data_type, &required) in plan {
        if required == 0 {
            continue;
        }
        let pool = config
            .pools
            .iter()
            .rev()
            .find(|p| p.data_type == data_type.name());
        match pool {
            None if config.unregistered_type == UnregisteredType::Skip => {}
            None => errors.push(ValidationError::MissingPool(data_type.to_string())),
            Some(pool) if pool.capacity < required => {
                errors.push(ValidationError::InsufficientPool {
                    data_type: data_type.to_string(),
                    capacity: pool.capacity,
                    required,
                });
            }
            Some(_) => {}
        }
    }
    collect(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler_config::PoolConfig;

    fn chain() -> Patch {
        Patch::new()
            .with_module(ModuleSpec::new("osc").with_output("out", "float"))
            .with_module(ModuleSpec::new("gain").with_input("in", "float"))
            .with_connection("osc.out", "gain.in")
    }

    #[test]
    fn valid_patch_passes() {
        assert!(validate_patch(&chain()).is_ok());
    }

    #[test]
    fn single_error_is_not_wrapped() {
        let patch = chain().with_module(ModuleSpec::new("osc"));
        assert_eq!(
            validate_patch(&patch),
            Err(ValidationError::DuplicateModule("osc".to_string()))
        );
    }

    #[test]
    fn every_problem_is_reported() {
        let patch = chain()
            .with_module(
                ModuleSpec::new("mix")
                    .with_input("a", "vec3")
                    .with_input("a", "vec3"),
            )
            .with_connection("osc.out", "mix.a")
            .with_connection("osc.out", "gain.in")
            .with_connection("lfo.out", "gain.gain")
            .with_connection("osc", "gain.in");

        let Err(ValidationError::Multiple(errors)) = validate_patch(&patch) else {
            panic!("expected multiple errors");
        };
        assert!(errors.contains(&ValidationError::DuplicatePlug {
            module: "mix".to_string(),
            plug: "a".to_string(),
        }));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::TypeMismatch { .. })));
        assert!(errors.contains(&ValidationError::InputFedTwice("gain.in".to_string())));
        assert!(errors.contains(&ValidationError::UnknownModule("lfo".to_string())));
        assert!(errors.contains(&ValidationError::UnknownPlug {
            module: "gain".to_string(),
            plug: "gain".to_string(),
        }));
        assert!(errors.contains(&ValidationError::BadPlugPath("osc".to_string())));
    }

    #[test]
    fn config_duplicate_pool() {
        let config = SchedulerConfig::new()
            .with_pool(PoolConfig::new("float", 2))
            .with_pool(PoolConfig::new("float", 4));
        assert_eq!(
            validate_config(&config, None),
            Err(ValidationError::DuplicatePool("float".to_string()))
        );
    }

    #[test]
    fn config_exempt_checked_against_patch() {
        let config = SchedulerConfig::new().with_exempt("scope");
        assert!(validate_config(&config, None).is_ok());
        assert_eq!(
            validate_config(&config, Some(&chain())),
            Err(ValidationError::UnknownModule("scope".to_string()))
        );
    }

    #[test]
    fn capacities_against_plan() {
        let mut plan = BTreeMap::new();
        plan.insert(DataType::scalar(), 3);
        plan.insert(DataType::new("vec3"), 1);
        plan.insert(DataType::new("mat4"), 0);

        let config = SchedulerConfig::new().with_pool(PoolConfig::new("float", 2));
        let Err(ValidationError::Multiple(errors)) = validate_capacities(&config, &plan) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::MissingPool("vec3".to_string())));
        assert!(errors.contains(&ValidationError::InsufficientPool {
            data_type: "float".to_string(),
            capacity: 2,
            required: 3,
        }));

        let config = SchedulerConfig::from_capacities(&plan);
        assert!(validate_capacities(&config, &plan).is_ok());
    }

    #[test]
    fn skip_policy_tolerates_missing_pool() {
        let mut plan = BTreeMap::new();
        plan.insert(DataType::scalar(), 1);
        plan.insert(DataType::new("vec3"), 1);

        let config = SchedulerConfig::new().with_pool(PoolConfig::new("float", 1));
        assert_eq!(
            validate_capacities(&config, &plan),
            Err(ValidationError::MissingPool("vec3".to_string()))
        );

        let config = config.with_unregistered_type(UnregisteredType::Skip);
        assert!(validate_capacities(&config, &plan).is_ok());

        // Pools that do exist are still sized.
        plan.insert(DataType::scalar(), 2);
        assert!(matches!(
            validate_capacities(&config, &plan),
            Err(ValidationError::InsufficientPool { required: 2, .. })
        ));
    }

    #[test]
    fn multiple_display_joins_messages() {
        let err = ValidationError::Multiple(vec![
            ValidationError::MissingPool("vec3".to_string()),
            ValidationError::DuplicateModule("osc".to_string()),
        ]);
        assert_eq!(
            err.to_string(),
            "multiple validation errors: no pool for type 'vec3'; duplicate module name: osc"
        );
    }
}

//! Patch files and scheduler configuration for plexus.
//!
//! A [`Patch`] describes a dataflow graph in TOML: named modules with typed
//! plugs and `module.plug` connections. A [`SchedulerConfig`] describes the
//! register pools, probe modules and type policy for a scheduling pass.
//!
//! # Example
//!
//! ```rust
//! use plexus_config::{ModuleSpec, Patch, PoolConfig, SchedulerConfig};
//! use plexus_core::Scheduler;
//!
//! let patch = Patch::new()
//!     .with_module(ModuleSpec::new("osc").with_output("out", "float"))
//!     .with_module(ModuleSpec::new("gain").with_input("in", "float"))
//!     .with_connection("osc.out", "gain.in");
//! let built = patch.build().unwrap();
//!
//! let config = SchedulerConfig::new().with_pool(PoolConfig::new("float", 2));
//! let (options, mut ctx) = config.apply(&built).unwrap();
//! let schedule = Scheduler::new(built.graph(), &mut ctx, options)
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert_eq!(schedule.order().len(), 2);
//! ```

mod error;
mod patch;
mod scheduler_config;

/// Platform-specific configuration paths.
pub mod paths;

/// Patch and config validation.
pub mod validation;

pub use error::ConfigError;
pub use patch::{ConnectionSpec, ModuleSpec, Patch, PatchGraph, PlugSpec, split_plug_path};
pub use scheduler_config::{PoolConfig, SchedulerConfig, UnregisteredType};
pub use validation::{
    ValidationError, ValidationResult, validate_capacities, validate_config, validate_patch,
};

//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use plexus_config::{Patch, PatchGraph, SchedulerConfig, paths};
use plexus_core::plan_capacities;

/// Output format for report commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document on stdout
    Json,
}

/// Load and build a patch file.
pub fn load_patch(path: &Path) -> anyhow::Result<PatchGraph> {
    Patch::load(path)?
        .build()
        .with_context(|| format!("failed to build patch '{}'", path.display()))
}

/// Where the scheduler config came from.
pub enum ConfigSource {
    /// Loaded from this file.
    File(PathBuf),
    /// Sized from a dry run because no file was found.
    Planned,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Planned => f.write_str("planned pools"),
        }
    }
}

/// Load the scheduler config and add `probes` to its exempt list.
///
/// Searches in this order:
/// 1. `explicit` (an error if it does not exist)
/// 2. The user config directory
/// 3. Pools sized by a dry run over `patch`
pub fn load_config(
    explicit: Option<&Path>,
    patch: &PatchGraph,
    probes: &[String],
) -> anyhow::Result<(SchedulerConfig, ConfigSource)> {
    if let Some(path) = paths::find_scheduler_config(explicit) {
        let mut config = SchedulerConfig::load(&path)?;
        config.exempt.extend(probes.iter().cloned());
        return Ok((config, ConfigSource::File(path)));
    }
    if let Some(path) = explicit {
        anyhow::bail!("config file '{}' not found", path.display());
    }

    tracing::debug!("no scheduler config found, sizing pools from a dry run");
    let mut config = SchedulerConfig::new();
    config.exempt.extend(probes.iter().cloned());
    // Pinned probe registers count toward the plan.
    let plan = plan_capacities(patch.graph(), &config.options(patch)?)?;
    let mut planned = SchedulerConfig::from_capacities(&plan);
    planned.exempt = config.exempt;
    Ok((planned, ConfigSource::Planned))
}

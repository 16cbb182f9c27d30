//! Validate a patch and its scheduler config.

use std::path::PathBuf;

use clap::Args;
use plexus_config::{validate_capacities, validate_config, validate_patch};
use plexus_core::plan_capacities;

use super::common::{ConfigSource, load_config};

/// Validate a patch, its config and pool sizes.
#[derive(Args)]
pub struct CheckArgs {
    /// Patch file (TOML)
    pub patch: PathBuf,

    /// Scheduler config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run the check command.
pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let patch = plexus_config::Patch::load(&args.patch)?;
    validate_patch(&patch)?;
    println!(
        "patch:  ok ({} modules, {} connections)",
        patch.modules.len(),
        patch.connections.len()
    );

    let built = patch.build()?;
    let (config, source) = load_config(args.config.as_deref(), &built, &[])?;
    validate_config(&config, Some(&patch))?;
    println!("config: ok ({source})");

    if let ConfigSource::Planned = source {
        println!("pools:  ok (sized to fit)");
        return Ok(());
    }
    let plan = plan_capacities(built.graph(), &config.options(&built)?)?;
    validate_capacities(&config, &plan)?;
    println!("pools:  ok");
    for pool in &config.pools {
        let peak = plan
            .iter()
            .find(|(t, _)| t.name() == pool.data_type)
            .map_or(0, |(_, &n)| n);
        println!("  {:12}  {peak}/{}", pool.block_name(), pool.capacity);
    }
    Ok(())
}

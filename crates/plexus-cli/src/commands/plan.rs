//! Size register pools for a patch.

use std::path::PathBuf;

use clap::Args;
use plexus_config::{SchedulerConfig, paths};
use plexus_core::plan_capacities;

use super::common::{OutputFormat, load_patch};

/// Report the smallest pool size per data type.
#[derive(Args)]
pub struct PlanArgs {
    /// Patch file (TOML)
    pub patch: PathBuf,

    /// Treat this module as a probe while planning (repeatable)
    #[arg(long = "probe", value_name = "NAME")]
    pub probes: Vec<String>,

    /// Write a scheduler config with the planned pools
    #[arg(short, long, value_name = "FILE", conflicts_with = "install")]
    pub write: Option<PathBuf>,

    /// Write the planned config to the user config directory
    #[arg(long)]
    pub install: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Run the plan command.
pub fn run(args: PlanArgs) -> anyhow::Result<()> {
    let patch = load_patch(&args.patch)?;

    let mut config = SchedulerConfig::new();
    config.exempt = args.probes;
    let plan = plan_capacities(patch.graph(), &config.options(&patch)?)?;

    match args.format {
        OutputFormat::Json => {
            let by_name: std::collections::BTreeMap<String, usize> =
                plan.iter().map(|(t, &n)| (t.to_string(), n)).collect();
            println!("{}", serde_json::to_string_pretty(&by_name)?);
        }
        OutputFormat::Text => {
            println!("Type          Registers");
            for (data_type, capacity) in &plan {
                println!("{:12}  {capacity}", data_type.name());
            }
        }
    }

    let target = if args.install {
        Some(paths::ensure_user_config_dir()?.join(paths::SCHEDULER_CONFIG_FILE))
    } else {
        args.write
    };
    if let Some(path) = &target {
        let mut planned = SchedulerConfig::from_capacities(&plan);
        planned.exempt = config.exempt;
        planned.save(path)?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

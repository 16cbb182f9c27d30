//! Schedule a patch and print its execution order and registers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use plexus_config::PatchGraph;
use plexus_core::{GraphView, ModuleId, Schedule, Scheduler};
use serde::Serialize;

use super::common::{OutputFormat, load_config, load_patch};

/// Compute execution order and register assignment.
#[derive(Args)]
pub struct ScheduleArgs {
    /// Patch file (TOML)
    pub patch: PathBuf,

    /// Scheduler config file (defaults to the user config, then planned pools)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep this module's registers after their last reader (repeatable)
    #[arg(long = "probe", value_name = "NAME")]
    pub probes: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Append the per-plug register dump (text format only)
    #[arg(long)]
    pub dump: bool,
}

#[derive(Serialize)]
struct ModuleReport {
    serial: i32,
    name: String,
    depth: i32,
}

#[derive(Serialize)]
struct RegisterReport {
    module: String,
    output: String,
    #[serde(rename = "type")]
    data_type: String,
    block: String,
    index: usize,
}

#[derive(Serialize)]
struct ScheduleReport {
    modules: Vec<ModuleReport>,
    registers: Vec<RegisterReport>,
    peak_usage: BTreeMap<String, usize>,
    relaxation_passes: usize,
}

impl ScheduleReport {
    fn new(schedule: &Schedule, patch: &PatchGraph) -> Self {
        let graph = patch.graph();
        let name = |m: ModuleId| graph.module_name(m).unwrap_or("?").to_string();

        let modules = schedule
            .order()
            .iter()
            .map(|&m| ModuleReport {
                serial: schedule.serial(m).unwrap_or(-1),
                name: name(m),
                depth: schedule.state(m).map_or(0, |s| s.depth),
            })
            .collect();

        let mut registers: Vec<RegisterReport> = schedule
            .assignments()
            .map(|a| RegisterReport {
                module: name(a.module),
                output: graph
                    .output(a.output)
                    .map(|o| o.name().to_string())
                    .unwrap_or_default(),
                data_type: a.data_type.to_string(),
                block: a.block_name.clone(),
                index: a.index,
            })
            .collect();
        registers.sort_by_key(|r| {
            patch
                .module(&r.module)
                .and_then(|m| schedule.serial(m))
                .unwrap_or(i32::MAX)
        });

        let peak_usage = schedule
            .peak_usage()
            .iter()
            .map(|(t, &n)| (t.to_string(), n))
            .collect();

        Self {
            modules,
            registers,
            peak_usage,
            relaxation_passes: schedule.relaxation_passes(),
        }
    }

    fn print_text(&self) {
        println!("Execution order:");
        for m in &self.modules {
            println!("  {:>4}  {:20}  depth {}", m.serial, m.name, m.depth);
        }
        println!();
        println!("Registers:");
        for r in &self.registers {
            println!(
                "  {:20}  {:8}  {}:{}",
                format!("{}.{}", r.module, r.output),
                r.data_type,
                r.block,
                r.index
            );
        }
        println!();
        println!("Peak usage:");
        for (data_type, peak) in &self.peak_usage {
            println!("  {data_type}: {peak}");
        }
    }
}

/// Run the schedule command.
pub fn run(args: ScheduleArgs) -> anyhow::Result<()> {
    let patch = load_patch(&args.patch)?;
    let (config, source) = load_config(args.config.as_deref(), &patch, &args.probes)?;
    tracing::info!("scheduling {} with {source}", args.patch.display());

    let (options, mut ctx) = config.apply(&patch)?;
    let schedule = Scheduler::new(patch.graph(), &mut ctx, options)?.run()?;
    let report = ScheduleReport::new(&schedule, &patch);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            report.print_text();
            if args.dump {
                println!();
                print!("{}", schedule.dump(patch.graph()));
            }
        }
    }
    Ok(())
}

//! Command-line surface of the `regmap-gen` binary.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use regmap_core::{GenerationPlan, PartitionConfig, PlanConfig, DEFAULT_SOC_VERSION};
use tracing::{error, info, warn};

use crate::errors::GenError;
use crate::load_tree;
use crate::manifest::Manifest;

/// Exit code for a run in which some nodes were rejected.
pub const EXIT_REJECTED: i32 = 1;

/// Parsed command line.
#[derive(Debug, Parser)]
#[command(name = "regmap-gen")]
#[command(about = "Validate and partition an elaborated register tree")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate, partition, and write the generation manifest.
    Plan(PlanArgs),
    /// Validate the tree and report rejected nodes.
    Check(CheckArgs),
}

/// Arguments of `plan`.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Elaborated tree as JSON.
    pub tree: PathBuf,

    /// Module name; defaults to the root node's name.
    #[arg(long)]
    pub soc_name: Option<String>,

    /// Module version.
    #[arg(long, default_value = DEFAULT_SOC_VERSION)]
    pub soc_version: String,

    /// Registers per unit before splitting; 0 disables splitting.
    #[arg(long, default_value_t = PartitionConfig::default().split_threshold)]
    pub split_threshold: usize,

    /// One unit per register group, overriding the threshold.
    #[arg(long)]
    pub split_by_hierarchy: bool,

    /// Manifest output path; defaults to `<tree stem>.manifest.json`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments of `check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Elaborated tree as JSON.
    pub tree: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Whether the selected subcommand asked for debug logging.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        match &self.command {
            Command::Plan(args) => args.verbose,
            Command::Check(args) => args.verbose,
        }
    }
}

impl PlanArgs {
    /// Generator settings selected on the command line.
    #[must_use]
    pub fn plan_config(&self) -> PlanConfig {
        PlanConfig {
            soc_name: self.soc_name.clone(),
            soc_version: self.soc_version.clone(),
            partition: PartitionConfig {
                split_threshold: self.split_threshold,
                split_by_hierarchy: self.split_by_hierarchy,
            },
        }
    }

    /// Where the manifest is written.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.tree))
    }
}

/// `<dir>/<stem>.manifest.json` next to the input tree.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("tree");
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}.manifest.json"))
}

/// Runs the selected subcommand and returns the process exit code.
///
/// # Errors
///
/// Returns [`GenError`] when the tree cannot be loaded or the manifest cannot
/// be written. Rejected nodes are not errors; they yield [`EXIT_REJECTED`].
pub fn run(cli: &Cli) -> Result<i32, GenError> {
    match &cli.command {
        Command::Plan(args) => run_plan(args),
        Command::Check(args) => run_check(args),
    }
}

fn run_plan(args: &PlanArgs) -> Result<i32, GenError> {
    let root = load_tree(&args.tree)?;
    let plan = GenerationPlan::build(&root, &args.plan_config());
    report_rejections(&plan);

    let output = args.output_path();
    let manifest = Manifest::from(&plan);
    let json = serde_json::to_string_pretty(&manifest).map_err(|source| GenError::Json {
        path: output.clone(),
        source,
    })?;
    fs::write(&output, json + "\n").map_err(|source| GenError::Io {
        path: output.clone(),
        source,
    })?;

    info!(
        units = manifest.units.len(),
        output = %output.display(),
        "manifest written"
    );
    println!(
        "Planned {} ({} registers in {} units) -> {}",
        args.tree.display(),
        plan.register_count(),
        plan.units.len(),
        output.display()
    );
    Ok(exit_code(&plan))
}

fn run_check(args: &CheckArgs) -> Result<i32, GenError> {
    let root = load_tree(&args.tree)?;
    let plan = GenerationPlan::build(&root, &PlanConfig::default());
    report_rejections(&plan);

    let counts = plan.counts;
    println!(
        "{}: {} registers, {} fields, {} memories, {} rejected",
        args.tree.display(),
        counts.registers,
        counts.fields,
        counts.memories,
        plan.errors.len()
    );
    Ok(exit_code(&plan))
}

fn report_rejections(plan: &GenerationPlan<'_>) {
    for rejected in &plan.errors {
        error!(path = %rejected.path, kind = ?rejected.kind, "{}", rejected.error);
        eprintln!("error: {rejected}");
    }
    if !plan.is_success() {
        warn!(rejected = plan.errors.len(), "some nodes were left out of the plan");
    }
}

fn exit_code(plan: &GenerationPlan<'_>) -> i32 {
    if plan.is_success() {
        0
    } else {
        EXIT_REJECTED
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{default_output_path, Cli, Command};

    #[test]
    fn plan_flags_map_onto_the_plan_config() {
        let cli = Cli::try_parse_from([
            "regmap-gen",
            "plan",
            "soc.json",
            "--soc-name",
            "board",
            "--split-threshold",
            "25",
            "--split-by-hierarchy",
            "-o",
            "out.json",
            "-v",
        ])
        .expect("valid plan args");

        assert!(cli.verbose());
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        let config = args.plan_config();
        assert_eq!(config.soc_name.as_deref(), Some("board"));
        assert_eq!(config.soc_version, "0.1.0");
        assert_eq!(config.partition.split_threshold, 25);
        assert!(config.partition.split_by_hierarchy);
        assert_eq!(args.output_path(), PathBuf::from("out.json"));
    }

    #[test]
    fn plan_defaults_follow_the_partition_defaults() {
        let cli = Cli::try_parse_from(["regmap-gen", "plan", "maps/soc.json"]).expect("valid");
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.plan_config().partition.split_threshold, 100);
        assert!(!args.plan_config().partition.split_by_hierarchy);
        assert_eq!(args.output_path(), PathBuf::from("maps/soc.manifest.json"));
    }

    #[test]
    fn check_rejects_plan_only_flags() {
        assert!(Cli::try_parse_from(["regmap-gen", "check", "soc.json", "--split-threshold", "3"]).is_err());
        assert!(Cli::try_parse_from(["regmap-gen", "frobnicate"]).is_err());
    }

    #[test]
    fn default_output_sits_next_to_the_input() {
        assert_eq!(
            default_output_path(&PathBuf::from("tree")),
            PathBuf::from("tree.manifest.json")
        );
    }
}

//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use koaton_core::{
    BuildContext, BuildOptions, BuildOutcome, BuildReport, ProgressReporter, TargetReport,
};
use koaton_shared::{BundleTarget, ProjectConfig, init_project_config, load_project_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// koaton: bundle stylesheets and scripts for deployment.
#[derive(Parser)]
#[command(
    name = "koaton",
    version,
    about = "Compile CSS and JS bundles into public/ and record them in .koaton_bundle.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project root (defaults to the current directory).
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build every bundle declared in the bundle definitions.
    Build {
        /// Bundle definitions file (defaults to config/bundles.js).
        config_file: Option<PathBuf>,

        /// Production build: one minified, hashed file per bundle.
        #[arg(short = 'p', long = "prod")]
        prod: bool,

        /// Print the resolved source and dependency paths as JSON and exit
        /// without writing anything.
        #[arg(long)]
        paths_only: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a koaton.toml with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "koaton=info",
        1 => "koaton=debug",
        _ => "koaton=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = project_root(cli.project.as_deref())?;

    match cli.command {
        Command::Build {
            config_file,
            prod,
            paths_only,
        } => {
            if paths_only {
                cmd_paths(&root, config_file.as_deref()).await
            } else {
                cmd_build(&root, config_file, prod).await
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(&root),
        },
    }
}

fn project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.is_dir() => Ok(path.to_path_buf()),
        Some(path) => Err(eyre!("project root '{}' is not a directory", path.display())),
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}")),
    }
}

fn context(root: &Path) -> Result<BuildContext> {
    let config: ProjectConfig = load_project_config(root)?;
    Ok(BuildContext::from_config(root, &config))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(root: &Path, config_file: Option<PathBuf>, prod: bool) -> Result<()> {
    let ctx = context(root)?;
    let options = BuildOptions {
        config_file,
        production: prod,
    };

    info!(
        project = %root.display(),
        mode = if prod { "production" } else { "development" },
        "building bundles"
    );

    let reporter = CliProgress::new();
    let outcome = koaton_core::build(&ctx, &options, &reporter).await;
    reporter.spinner.finish_and_clear();

    match outcome? {
        BuildOutcome::Empty { config_file } => {
            println!("Nothing to compile on: {}", config_file.display());
        }
        BuildOutcome::Built(report) => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    println!();
    for target in &report.targets {
        match &target.entry {
            Some(entry) => {
                let outputs: Vec<_> = entry.outputs().iter().map(|o| o.as_str()).collect();
                println!("  {:<24} {}", target.name, outputs.join(", "));
            }
            None => println!("  {:<24} (no sources matched)", target.name),
        }
    }
    for name in &report.skipped {
        println!("  {name:<24} (skipped: neither css nor js)");
    }
    println!();
    println!(
        "  Cleaned: {} removed, {} missing",
        report.cleanup.removed, report.cleanup.missing
    );
    println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

async fn cmd_paths(root: &Path, config_file: Option<&Path>) -> Result<()> {
    let ctx = context(root)?;
    let paths = koaton_core::collect_paths(&ctx, config_file).await?;
    println!("{}", serde_json::to_string_pretty(&paths)?);
    Ok(())
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_project_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path) -> Result<()> {
    let config = load_project_config(root)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn target_started(&self, target: &BundleTarget, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Building [{current}/{total}] {}", target.name));
    }

    fn target_finished(&self, report: &TargetReport) {
        self.spinner.println(format!("  ✓ {} ({})", report.name, report.kind));
    }

    fn done(&self, _report: &BuildReport) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn build_flags_parse() {
        let cli = Cli::try_parse_from(["koaton", "build", "assets/bundles.json", "-p"]).unwrap();
        match cli.command {
            Command::Build {
                config_file,
                prod,
                paths_only,
            } => {
                assert_eq!(config_file, Some(PathBuf::from("assets/bundles.json")));
                assert!(prod);
                assert!(!paths_only);
            }
            Command::Config { .. } => panic!("expected build"),
        }

        let cli = Cli::try_parse_from(["koaton", "-vv", "build", "--paths-only"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Build { prod: false, paths_only: true, .. }));
    }

    #[test]
    fn project_root_must_be_a_directory() {
        let err = project_root(Some(Path::new("/nonexistent/koaton/project"))).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }
}

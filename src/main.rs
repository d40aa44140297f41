use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use sanity_suite::admin;
use sanity_suite::config;
use sanity_suite::exec::{AsyncCommandRunner, CommandResult, CommandRunner};
use sanity_suite::tools::ToolRegistry;
use sanity_suite::workflow::{
    load_workflow_file, WorkflowEngine, WorkflowError, WorkflowReport, WorkflowStatus,
    WorkflowStep,
};

/// Sanity Suite - OS diagnostics and quick fixes
#[derive(Parser)]
#[command(name = "sanity")]
#[command(about = "Sanity Suite - OS diagnostics and quick fixes", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered tools and their actions
    List,
    /// Run a single action by dotted reference (e.g. network.flush_dns)
    Run {
        /// Dotted tool.action reference
        action: String,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Execute a workflow file (TOML or JSON)
    Workflow {
        /// Path to the workflow definition
        file: PathBuf,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Internal module dispatch, the target of module-invocation specs
    Module {
        #[command(subcommand)]
        module: ModuleCommands,
    },
}

#[derive(Subcommand)]
enum ModuleCommands {
    /// Print version, user and elevation state
    Selfcheck,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::List => list_actions(),
        Commands::Run { action, json } => run_action(&action, json).await,
        Commands::Workflow { file, json } => run_workflow(&file, json).await,
        Commands::Module { module } => run_module(module),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine() -> WorkflowEngine {
    let registry = ToolRegistry::with_builtin_tools();
    let runner = AsyncCommandRunner::new(CommandRunner::production());
    WorkflowEngine::new(registry, runner)
}

fn list_actions() -> Result<()> {
    let registry = ToolRegistry::with_builtin_tools();
    for (tool, action) in registry.list() {
        let admin_mark = if action.requires_admin { " [admin]" } else { "" };
        println!("{tool}.{: <16}{}{admin_mark}", action.id, action.description);
    }
    Ok(())
}

async fn run_action(action_ref: &str, json: bool) -> Result<()> {
    let engine = build_engine();
    let is_admin = admin::is_user_admin();

    let action = engine.registry().resolve(action_ref)?;
    if action.requires_admin && !is_admin {
        warn!("'{action_ref}' expects elevation; run from an elevated shell");
    }

    let steps = vec![WorkflowStep::new(action_ref)];
    let report = execute_and_render(&engine, &steps, is_admin, json).await?;
    finish(report)
}

async fn run_workflow(file: &PathBuf, json: bool) -> Result<()> {
    let engine = build_engine();
    let is_admin = admin::is_user_admin();

    let workflow = load_workflow_file(file)?;
    if let Some(name) = &workflow.name {
        tracing::info!("running workflow '{name}'");
    }
    let report = execute_and_render(&engine, &workflow.steps, is_admin, json).await?;
    finish(report)
}

async fn execute_and_render(
    engine: &WorkflowEngine,
    steps: &[WorkflowStep],
    is_admin: bool,
    json: bool,
) -> Result<WorkflowReport> {
    match engine.execute(steps, is_admin).await {
        Ok(report) => {
            print_results(&report.results, json);
            Ok(report)
        }
        Err(WorkflowError::Aborted { completed, source }) => {
            print_results(&completed, json);
            Err(source.into())
        }
        Err(other) => Err(other.into()),
    }
}

fn print_results(results: &[CommandResult], json: bool) {
    if json {
        match serde_json::to_string_pretty(results) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => eprintln!("failed to render results: {error}"),
        }
        return;
    }

    for result in results {
        let status = if result.succeeded() { "ok" } else { "FAILED" };
        println!(
            "[{status}] {} (exit {}, {:.1}s)",
            result.spec.display(),
            result.exit_code,
            result.duration_seconds()
        );
        let stdout = result.stdout.trim_end();
        if !stdout.is_empty() {
            println!("{stdout}");
        }
        let stderr = result.stderr.trim_end();
        if !stderr.is_empty() {
            eprintln!("{stderr}");
        }
    }
}

fn finish(report: WorkflowReport) -> Result<()> {
    match report.status {
        WorkflowStatus::Completed if report.results.iter().all(CommandResult::succeeded) => Ok(()),
        WorkflowStatus::Completed => {
            // Completed under a continue policy with failures along the way.
            std::process::exit(1);
        }
        WorkflowStatus::Halted => {
            eprintln!(
                "workflow halted after step {}/{}",
                report.steps_completed, report.steps_total
            );
            std::process::exit(1);
        }
    }
}

fn run_module(module: ModuleCommands) -> Result<()> {
    match module {
        ModuleCommands::Selfcheck => {
            println!("sanity-suite {}", env!("CARGO_PKG_VERSION"));
            println!("user: {}", whoami::username());
            println!("admin: {}", admin::is_user_admin());
            println!(
                "data dir: {}",
                config::app_root()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|_| "<unavailable>".to_string())
            );
            Ok(())
        }
    }
}

//! Rolelock - dependency lock files for role projects
//!
//! Usage:
//!   rolelock lock             # Resolve and write the lock file
//!   rolelock lock --dry-run   # Resolve and print without writing
//!   rolelock check            # Verify the lock matches the declarations
//!   rolelock show             # Print the persisted lock

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rolelock_core::commands::{
    CheckCommand, CheckReport, Freshness, LockCommand, LockOptions, LockReport, ShowCommand,
    ShowReport,
};
use rolelock_core::context::ProjectContext;
use rolelock_core::error::ResolveError;
use rolelock_core::lockfile::LockDocument;
use rolelock_core::resolve::cancellation;

#[derive(Parser)]
#[command(name = "rolelock")]
#[command(about = "Dependency resolution and lock files for role projects", long_about = None)]
struct Cli {
    /// Project directory containing rolelock.toml
    #[arg(long, short, global = true, default_value = ".")]
    project: PathBuf,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve declarations and write the lock file
    Lock {
        /// Resolve without writing the lock file
        #[arg(long)]
        dry_run: bool,

        /// Abort resolution after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Check whether the lock file matches the declarations
    Check,

    /// Show the persisted lock file
    Show {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "rolelock=debug,info"
    } else {
        "rolelock=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = ProjectContext::new(cli.project);

    let result = match cli.command {
        Commands::Lock { dry_run, timeout } => {
            let mut options = LockOptions::default().with_dry_run(dry_run);
            if let Some(secs) = timeout {
                options = options.with_timeout(Duration::from_secs(secs));
            }
            run_lock(ctx, options)
        }
        Commands::Check => run_check(ctx),
        Commands::Show { format } => run_show(ctx, format),
    };

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(e) => {
            let code = exit_code_for(&e);
            debug!(code, error = ?e, "Command failed");
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            std::process::exit(code);
        }
    }
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ResolveError>() {
        Some(ResolveError::Cancelled(_)) => 130,
        Some(ResolveError::StaleLock { .. }) => 2,
        _ => 1,
    }
}

fn run_lock(ctx: ProjectContext, options: LockOptions) -> Result<i32> {
    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(async move {
        let (canceller, token) = cancellation();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; cancelling resolution");
                canceller.cancel();
            }
        });
        LockCommand::new(ctx).execute(&options, token).await
    })?;

    print_warnings(&report.warnings);
    if report.written {
        print_lock_summary(&report);
    } else {
        print!("{}", report.document.to_json_pretty()?);
    }
    Ok(0)
}

fn run_check(ctx: ProjectContext) -> Result<i32> {
    let report = CheckCommand::new(ctx).execute()?;
    print_check(&report);
    Ok(if report.status.is_fresh() { 0 } else { 2 })
}

fn run_show(ctx: ProjectContext, format: OutputFormat) -> Result<i32> {
    let report = ShowCommand::new(ctx).execute()?;
    match format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => print!("{}", report.document.to_json_pretty()?),
    }
    Ok(if report.integrity_error.is_some() { 1 } else { 0 })
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }
}

fn print_lock_summary(report: &LockReport) {
    let doc = &report.document;
    println!(
        "{} {} (python {}, {} tools, {} collections, {} roles)",
        style("Locked").green().bold(),
        report.lock_path.display(),
        doc.python.pinned,
        doc.tools.len(),
        doc.collections.len(),
        doc.roles.len()
    );
}

fn print_check(report: &CheckReport) {
    match &report.status {
        Freshness::Fresh => {
            println!(
                "{} {} is up to date",
                style("ok:").green().bold(),
                report.lock_path.display()
            );
        }
        Freshness::Stale { persisted, current } => {
            println!(
                "{} {} is out of date (run 'rolelock lock' to refresh)",
                style("stale:").red().bold(),
                report.lock_path.display()
            );
            println!("  Persisted hash: {}", persisted);
            println!("  Current hash:   {}", current);
        }
        Freshness::Missing => {
            println!(
                "{} {} does not exist (run 'rolelock lock' to create it)",
                style("missing:").red().bold(),
                report.lock_path.display()
            );
        }
    }
}

fn print_table(report: &ShowReport) {
    let doc = &report.document;
    println!("Lock file: {}", report.lock_path.display());
    println!("Generated: {}", doc.generated_at.to_rfc3339());
    println!("Hash: {}", doc.content_hash);
    if let Some(err) = &report.integrity_error {
        println!("{} {}", style("integrity:").red().bold(), err);
    }
    println!();

    println!(
        "Python: {} (min {}, max {})",
        style(&doc.python.pinned).green(),
        doc.python.min,
        doc.python.max
    );
    if !doc.python.additional.is_empty() {
        println!("  Additional: {}", doc.python.additional.join(", "));
    }
    println!();

    print_entries("Tools", tool_rows(doc));
    print_entries("Collections", collection_rows(doc));
    print_entries("Roles", role_rows(doc));
}

struct Row {
    name: String,
    constraint: String,
    resolved: String,
    source: String,
}

fn tool_rows(doc: &LockDocument) -> Vec<Row> {
    doc.tools
        .iter()
        .map(|t| Row {
            name: t.name.clone(),
            constraint: t.constraint.clone(),
            resolved: t.resolved_version.clone(),
            source: t.source.clone(),
        })
        .collect()
}

fn collection_rows(doc: &LockDocument) -> Vec<Row> {
    doc.collections
        .iter()
        .map(|c| Row {
            name: c.name.clone(),
            constraint: c.constraint.clone(),
            resolved: c.resolved_version.clone(),
            source: c.source.clone(),
        })
        .collect()
}

fn role_rows(doc: &LockDocument) -> Vec<Row> {
    doc.roles
        .iter()
        .map(|r| Row {
            name: r.name.clone(),
            constraint: r.constraint.clone(),
            resolved: r.resolved_version.clone(),
            source: r.src.clone().unwrap_or_else(|| r.source.clone()),
        })
        .collect()
}

fn print_entries(title: &str, rows: Vec<Row>) {
    if rows.is_empty() {
        return;
    }
    println!("{} ({}):", title, rows.len());
    println!(
        "  {:<30} {:<14} {:<14} Source",
        "Name", "Constraint", "Resolved"
    );
    println!("  {}", "-".repeat(70));
    for row in rows {
        println!(
            "  {:<30} {:<14} {:<14} {}",
            row.name, row.constraint, row.resolved, row.source
        );
    }
    println!();
}

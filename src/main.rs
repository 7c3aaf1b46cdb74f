use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vault_sync::config::Config;
use vault_sync::git::{parse_changes, CommandResult, GitCommandRunner, GitOperation};
use vault_sync::logging;
use vault_sync::reporting::ReporterSet;

/// Check that a git executable is on PATH
fn check_git_available() -> Result<PathBuf, which::Error> {
    let path = which::which("git")?;
    tracing::debug!(path = %path.display(), "git available");
    Ok(path)
}

/// Print a helpful error message when git is missing
fn print_git_missing(err: &which::Error) {
    eprintln!("Error: git not found ({})", err);
    eprintln!();
    eprintln!("vault-sync drives the git command-line tool.");
    eprintln!();
    eprintln!("Install git:");
    eprintln!("  macOS:         brew install git");
    eprintln!("  Ubuntu/Debian: sudo apt install git");
    eprintln!("  Fedora/RHEL:   sudo dnf install git");
    eprintln!("  Windows:       winget install Git.Git");
}

#[derive(Parser)]
#[command(name = "vault-sync")]
#[command(about = "Pull, commit and push a notes vault through git")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Vault directory (overrides git.working_dir)
    #[arg(long)]
    dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull from the tracking branch
    Pull,

    /// Stage everything and commit
    Commit,

    /// Push to the configured remote
    Push,

    /// Stage everything, commit and push
    Sync,

    /// Show the checked-out branch
    Branch,

    /// Count pending changes
    Changes {
        /// List each changed file
        #[arg(short, long)]
        detail: bool,
    },

    /// Show branch and pending change count
    Status,

    /// Write the effective configuration to .vault-sync/config.toml
    InitConfig,
}

/// Process exit code for an operation result.
///
/// No-ops succeed, user-actionable outcomes exit 1, configuration errors exit 2.
fn exit_code(result: &CommandResult) -> i32 {
    match result {
        Ok(_) => 0,
        Err(kind) if kind.is_benign() => 0,
        Err(kind) if kind.is_fatal() => 2,
        Err(_) => 1,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.dir {
        config.git.working_dir = dir;
    }

    let logging_handle = logging::init_logging(&config, cli.debug)?;

    if let Commands::InitConfig = cli.command {
        return cmd_init_config(&config);
    }

    if let Err(err) = check_git_available() {
        print_git_missing(&err);
        std::process::exit(1);
    }

    let runner = GitCommandRunner::new(config.runner_config());
    let reporters = ReporterSet::from_config(&config.reporting);

    let code = match cli.command {
        Commands::Pull => cmd_operation(&runner, &reporters, GitOperation::Pull).await,
        Commands::Commit => cmd_operation(&runner, &reporters, GitOperation::Commit).await,
        Commands::Push => cmd_operation(&runner, &reporters, GitOperation::Push).await,
        Commands::Sync => cmd_operation(&runner, &reporters, GitOperation::CommitAndPush).await,
        Commands::Branch => cmd_operation(&runner, &reporters, GitOperation::Branch).await,
        Commands::Changes { detail: false } => {
            cmd_operation(&runner, &reporters, GitOperation::ChangeCount).await
        }
        Commands::Changes { detail: true } => cmd_changes_detail(&runner, &reporters).await,
        Commands::Status => cmd_status(&runner).await,
        Commands::InitConfig => 0,
    };

    if let Some(log_path) = &logging_handle.log_file_path {
        tracing::debug!(path = %log_path.display(), "Session log");
    }

    // Flush buffered logs before exiting with the operation's status
    drop(logging_handle);
    std::process::exit(code);
}

async fn cmd_operation(runner: &GitCommandRunner, reporters: &ReporterSet, op: GitOperation) -> i32 {
    let result = runner.run_and_report(op, reporters).await;
    exit_code(&result)
}

async fn cmd_changes_detail(runner: &GitCommandRunner, reporters: &ReporterSet) -> i32 {
    let result = runner
        .run_and_report(GitOperation::ChangesDetail, reporters)
        .await;

    if let Ok(payload) = &result {
        for entry in parse_changes(payload) {
            match &entry.orig_path {
                Some(orig) => println!("  {} {} -> {}", entry.code, orig, entry.path),
                None => println!("  {} {}", entry.code, entry.path),
            }
        }
    }

    exit_code(&result)
}

async fn cmd_status(runner: &GitCommandRunner) -> i32 {
    let status = runner.status().await;
    println!("{}", status.summary());

    if status.branch.is_some() && status.changes.is_some() {
        0
    } else {
        1
    }
}

fn cmd_init_config(config: &Config) -> Result<()> {
    let path = config.save()?;
    println!("Wrote {}", path.display());
    Ok(())
}

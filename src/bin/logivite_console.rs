//! LogiVite console driver
//!
//! Drives the client core from a terminal against a live backend. Session
//! state is kept in a JSON file between invocations.
//!
//! Usage:
//!   cargo run --features cli --bin logivite_console -- login --email ops@logivite.in
//!   cargo run --features cli --bin logivite_console -- context
//!   cargo run --features cli --bin logivite_console -- select-branch 3
//!   cargo run --features cli --bin logivite_console -- logout
//!
//! `LOGIVITE_API_BASE_URL` must be set (a `.env` file works).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use logivite_client::models::{BranchId, FinancialYearId};
use logivite_client::shell::BootstrapReport;
use logivite_client::validation::LoginForm;
use logivite_client::{
    telemetry, ClientConfig, ConsoleShell, ContextCommit, FileStorage, Navigator, RefreshOutcome,
    ReqwestTransport, TracingNotifier,
};

#[derive(Parser, Debug)]
#[command(name = "logivite_console", about = "Drive the LogiVite client core from a terminal")]
struct Args {
    /// File holding tokens and the persisted context.
    #[arg(long, env = "LOGIVITE_STATE_FILE", default_value = ".logivite-state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and load the session context.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LOGIVITE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Reload session data and print the active context.
    Context,
    SelectBranch { id: String },
    SelectYear { id: String },
    /// Print the menu entry for a route.
    Route { path: String },
    Logout,
}

/// Navigation target printed for the operator.
struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: &str) {
        println!("→ {route}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    // RUST_LOG may come from .env, so load it before the subscriber.
    dotenvy::dotenv().ok();
    telemetry::init(telemetry::DEFAULT_DIRECTIVE)?;

    let config = ClientConfig::from_env()?;
    let storage = FileStorage::open(&args.state)
        .with_context(|| format!("Failed to open state file {}", args.state.display()))?;
    let transport = ReqwestTransport::new(config.clone())?;
    let mut shell = ConsoleShell::open(
        &config,
        transport,
        Arc::new(storage),
        Arc::new(TracingNotifier),
        Arc::new(PrintNavigator),
    )?;

    match args.command {
        Command::Login { email, password } => {
            let report = shell.login(&LoginForm::new(email, password)).await?;
            print_report(&report);
            print_context(&shell);
        }
        Command::Context => {
            let report = shell.bootstrap().await?;
            print_report(&report);
            print_context(&shell);
        }
        Command::SelectBranch { id } => {
            shell.bootstrap().await?;
            let commit = shell.select_branch(BranchId::new(id)).await?;
            print_commit(&commit);
            print_context(&shell);
        }
        Command::SelectYear { id } => {
            shell.bootstrap().await?;
            let commit = shell.select_financial_year(FinancialYearId::new(id)).await?;
            print_commit(&commit);
            print_context(&shell);
        }
        Command::Route { path } => {
            shell.bootstrap().await?;
            shell.route_changed(&path)?;
            match shell.store().selected_menu() {
                Some(menu) => println!("{} ({})", menu.title, menu.route),
                None => println!("no menu entry for {path}"),
            }
        }
        Command::Logout => shell.logout()?,
    }
    Ok(())
}

fn print_report(report: &BootstrapReport) {
    for (step, err) in &report.failed {
        eprintln!("{step}: {err}");
    }
}

fn print_commit(commit: &ContextCommit) {
    match (&commit.refresh, commit.changed) {
        (_, false) => println!("unchanged"),
        (RefreshOutcome::Refreshed, true) => println!("saved, token refreshed"),
        (RefreshOutcome::NotNeeded, true) => println!("saved"),
        (RefreshOutcome::Failed(err), true) => println!("saved, token refresh failed: {err}"),
    }
}

fn print_context<T: logivite_client::Transport>(shell: &ConsoleShell<T>) {
    let store = shell.store();
    let flow = shell.flow();
    println!("user:      {}", store.document_title());
    println!("branch:    {}", flow.branch_label());
    println!("year:      {}", flow.financial_year_label());
    if let Some(period) = flow.selected_period() {
        println!("period:    {period}");
    }
    if let Some(tz) = store.time_zone_name() {
        println!("time zone: {tz}");
    }
}

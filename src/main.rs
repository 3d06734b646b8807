use budget_tracker::args::{Args, Command};
use budget_tracker::{commands, App, Config, ErrorType, IntoResult, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with {} error: {e}", e.error_type());
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Add(add_args) => {
            let mut app = load_app(home).await?;
            commands::add(&mut app, add_args.clone()).await?.print()
        }

        Command::Delete(delete_args) => {
            let mut app = load_app(home).await?;
            commands::delete(&mut app, delete_args.clone())
                .await?
                .print()
        }

        Command::List => {
            let app = load_app(home).await?;
            let out = commands::list(&app).await?;
            println!("{}", out.message());
        }

        Command::Summary => commands::summary(&load_app(home).await?).await?.print(),

        Command::Remind => commands::remind(&load_app(home).await?).await?.print(),
    };
    Ok(())
}

async fn load_app(home: &Path) -> Result<App> {
    let config = Config::load(home).await.pub_result(ErrorType::Config)?;
    Ok(App::load(config).await)
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for the library and binary only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use curls::{App, OutputFmt, config::Config};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

const LOG_ENV: &str = "CURLS_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let fmt = OutputFmt::from_flag(cli.json);

    let config_path = Config::default_path()?;
    let config = Config::load(&config_path)?;
    init_tracing(&config);

    match cli.cmd {
        Commands::Config(cmd) => commands::config::handle(cmd, config, &config_path)?,
        cmd => {
            let mut app = App::open(&config).await?;
            let unit = config.unit();

            match cmd {
                Commands::Session(cmd) => commands::session::handle(cmd, &mut app, fmt, unit).await?,
                Commands::Exercise(cmd) => commands::exercise::handle(cmd, &mut app, fmt, unit).await?,
                Commands::Template(cmd) => commands::template::handle(cmd, &mut app, fmt, unit).await?,
                Commands::History(cmd) => commands::history::handle(cmd, &mut app, fmt, unit)?,
                Commands::Calendar { year, month } => commands::calendar::handle(&app, fmt, year, month)?,
                Commands::Config(_) => unreachable!("config is handled before opening the database"),
            }
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(config.log_filter()))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

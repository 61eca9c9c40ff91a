//! `metabaker` command line entry point

mod cli;
mod tasks;

use anyhow::Context as _;
use metabaker_core::MetabakerConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tasks::{TaskContext, TaskRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let matches = cli::build_cli().get_matches();
    let Some((name, sub)) = matches.subcommand() else {
        return ExitCode::FAILURE;
    };

    match run(name, sub).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{} failed: {:#}", name, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(name: &str, matches: &clap::ArgMatches) -> anyhow::Result<ExitCode> {
    let root = matches
        .get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let explicit = matches.get_one::<PathBuf>("config");

    let config = MetabakerConfig::load(&root, explicit.map(PathBuf::as_path))
        .context("loading configuration")?
        .with_env_overrides(|key| std::env::var(key).ok());
    tracing::debug!("Project root {}", root.display());

    let ctx = TaskContext { root, config };
    TaskRegistry::new().dispatch(name, &ctx, matches).await
}

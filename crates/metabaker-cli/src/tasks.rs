//! Task registry
//!
//! Maps each subcommand to a handler taking the parsed arguments and the
//! shared [`TaskContext`].

use anyhow::Context as _;
use clap::ArgMatches;
use futures::future::BoxFuture;
use metabaker_chain::JsonRpcChainReader;
use metabaker_core::{
    DownloadArgs, DownloadReport, Downloader, MetabakerConfig, PublishArgs, PublishOutcome,
    PublishReport, Publisher,
};
use metabaker_storage::{HttpFetcher, NftStorageClient};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Settings shared by every task
#[derive(Debug, Clone)]
pub(crate) struct TaskContext {
    pub(crate) root: PathBuf,
    pub(crate) config: MetabakerConfig,
}

impl TaskContext {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    fn chain_reader(&self) -> anyhow::Result<JsonRpcChainReader> {
        Ok(JsonRpcChainReader::new(
            self.config.rpc_url.clone(),
            self.config.artifacts_dir(&self.root),
            self.timeout(),
        )?)
    }
}

type Handler = for<'a> fn(&'a TaskContext, &'a ArgMatches) -> BoxFuture<'a, anyhow::Result<ExitCode>>;

/// Registered tasks by subcommand name
pub(crate) struct TaskRegistry {
    handlers: BTreeMap<&'static str, Handler>,
}

impl TaskRegistry {
    pub(crate) fn new() -> Self {
        let mut handlers: BTreeMap<&'static str, Handler> = BTreeMap::new();
        handlers.insert("init", init);
        handlers.insert("clean", clean);
        handlers.insert("publish", publish);
        handlers.insert("download", download);
        Self { handlers }
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub(crate) async fn dispatch(
        &self,
        name: &str,
        ctx: &TaskContext,
        matches: &ArgMatches,
    ) -> anyhow::Result<ExitCode> {
        let handler = self
            .handlers
            .get(name)
            .with_context(|| format!("unknown task '{name}'"))?;
        handler(ctx, matches).await
    }
}

fn string_arg(matches: &ArgMatches, name: &str) -> anyhow::Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing --{name}"))
}

pub(crate) fn publish_args(matches: &ArgMatches) -> anyhow::Result<PublishArgs> {
    Ok(PublishArgs {
        contract: string_arg(matches, "contract")?,
        address: matches.get_one::<String>("address").cloned().unwrap_or_default(),
        count: string_arg(matches, "count")?,
        scaffold_metadata: matches.get_flag("scaffold-metadata"),
    })
}

pub(crate) fn download_args(matches: &ArgMatches) -> anyhow::Result<DownloadArgs> {
    Ok(DownloadArgs {
        contract: string_arg(matches, "contract")?,
        address: string_arg(matches, "address")?,
        count: string_arg(matches, "count")?,
    })
}

fn init<'a>(ctx: &'a TaskContext, _matches: &'a ArgMatches) -> BoxFuture<'a, anyhow::Result<ExitCode>> {
    Box::pin(async move {
        let layout = ctx.config.layout(&ctx.root);
        layout.ensure_dirs()?;
        if layout.ensure_template()? {
            println!("Created {}", layout.template_path().display());
        }
        println!("Images directory:   {}", layout.images_dir().display());
        println!("Metadata directory: {}", layout.metadata_dir().display());
        Ok(ExitCode::SUCCESS)
    })
}

fn clean<'a>(ctx: &'a TaskContext, _matches: &'a ArgMatches) -> BoxFuture<'a, anyhow::Result<ExitCode>> {
    Box::pin(async move {
        let layout = ctx.config.layout(&ctx.root);
        if layout.clean_staging()? {
            println!("Removed {}", layout.upload_dir().display());
        }
        Ok(ExitCode::SUCCESS)
    })
}

fn publish<'a>(ctx: &'a TaskContext, matches: &'a ArgMatches) -> BoxFuture<'a, anyhow::Result<ExitCode>> {
    Box::pin(async move {
        let args = publish_args(matches)?;
        let key = ctx.config.require_storage_key()?;
        let chain = ctx.chain_reader()?;
        let store = NftStorageClient::new(ctx.config.storage_endpoint.clone(), key, ctx.timeout())?;

        let outcome = Publisher::new(&ctx.config, &ctx.root, &chain, &store)
            .run(&args)
            .await
            .with_context(|| format!("publish {}", args.contract))?;

        match outcome {
            PublishOutcome::Published(report) => print_publish(&report),
            PublishOutcome::Empty(set) => println!("Nothing to publish: no {set} staged"),
        }
        Ok(ExitCode::SUCCESS)
    })
}

fn download<'a>(ctx: &'a TaskContext, matches: &'a ArgMatches) -> BoxFuture<'a, anyhow::Result<ExitCode>> {
    Box::pin(async move {
        let args = download_args(matches)?;
        let chain = ctx.chain_reader()?;
        let fetcher = HttpFetcher::new(ctx.config.ipfs_gateway.clone(), ctx.timeout())?;

        let report = Downloader::new(&ctx.config, &ctx.root, &chain, &fetcher)
            .run(&args)
            .await
            .with_context(|| format!("download {}", args.contract))?;

        print_download(&report);
        Ok(if report.is_complete() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    })
}

fn print_publish(report: &PublishReport) {
    println!("Published {} tokens", report.count);
    println!("Image CID: {} ({})", report.image_cid, report.image_pin);
    println!("Meta CID:  {} ({})", report.metadata_cid, report.metadata_pin);
    println!("Set your nft base uri to: {}", report.base_uri());
    println!("(you may need a trailing slash depending on your smart contract)");
}

fn print_download(report: &DownloadReport) {
    println!(
        "Downloaded {} of {} tokens",
        report.downloaded.len(),
        report.count
    );
    for failed in &report.failed {
        eprintln!("  token {}: {}", failed.index, failed.error);
    }
}

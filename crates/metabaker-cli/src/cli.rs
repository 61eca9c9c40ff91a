use clap::{value_parser, Arg, ArgAction, Command};
use metabaker_core::CONTRACT_SENTINEL;
use std::path::PathBuf;

pub(crate) fn build_cli() -> Command {
    Command::new("metabaker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stage, template and publish NFT metadata to content-addressed storage")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Project root directory"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (default: <root>/metabaker.toml)"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the images/metadata directories and the default template"),
        )
        .subcommand(Command::new("clean").about("Remove the upload staging directory"))
        .subcommand(
            Command::new("publish")
                .about("Upload images and metadata to the content store")
                .arg(contract_arg())
                .arg(
                    Arg::new("address")
                        .long("address")
                        .help("Address of the deployed contract"),
                )
                .arg(count_arg("The number of tokens to reveal"))
                .arg(
                    Arg::new("scaffold-metadata")
                        .long("scaffold-metadata")
                        .action(ArgAction::SetTrue)
                        .help("Render metadata from template.json instead of patching metadata/"),
                ),
        )
        .subcommand(
            Command::new("download")
                .about("Download minted metadata and images of a deployed contract")
                .arg(contract_arg())
                .arg(
                    Arg::new("address")
                        .long("address")
                        .required(true)
                        .help("Address of the deployed contract"),
                )
                .arg(count_arg("The number of tokens to download")),
        )
}

fn contract_arg() -> Arg {
    Arg::new("contract")
        .long("contract")
        .required(true)
        .help("Contract artifact name")
}

fn count_arg(help: &'static str) -> Arg {
    Arg::new("count")
        .long("count")
        .default_value(CONTRACT_SENTINEL)
        .help(format!(
            "{help}, or '{CONTRACT_SENTINEL}' to use the contract's totalSupply()"
        ))
}

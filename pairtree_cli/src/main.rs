use crate::cmd::Overrides;
use crate::init_config::CmdConfig;
use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use clap_verbosity_flag::WarnLevel;
use directories::ProjectDirs;
use std::path::PathBuf;

mod cmd;
mod init_config;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// config file describing the storage root
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// directory holding pairtree_root and its marker files (overrides the config file)
    #[arg(long, value_name = "DIR")]
    parent: Option<PathBuf>,

    /// shared prefix stripped from every identifier (overrides the config file)
    #[arg(long)]
    prefix: Option<String>,

    /// separator used when printing and parsing pair paths
    #[arg(long, value_name = "CHAR")]
    separator: Option<char>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<WarnLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Modify the pairtree config file
    Config {
        #[command(subcommand)]
        cmd: CmdConfig,
    },
    /// Print the clean form of an identifier
    Clean { identifier: String },
    /// Print the identifier behind a clean identifier
    Unclean { clean_id: String },
    /// Print the pair path of an identifier
    Path {
        identifier: String,
        /// Root to prepend to the pair path
        #[arg(long)]
        root: Option<String>,
        /// Append the clean identifier as encapsulating directory
        #[arg(short, long, action = ArgAction::SetTrue)]
        encapsulate: bool,
    },
    /// Print the identifier stored at a pair path
    Id {
        path: String,
        /// Root the path starts with
        #[arg(long)]
        root: Option<String>,
    },
    /// Print the encapsulating directory at the end of a pair path, if any
    Extract { path: String },
    /// Create the storage root, or check an existing one
    Init,
    /// Create the directory of an identifier and print its path
    Object { identifier: String },
    /// Print whether an identifier has an object directory
    Contains { identifier: String },
    /// List every identifier stored below the root
    List,
    /// Delete the storage root with all objects and marker files
    Delete,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    // Config lives under the platform config dir unless --config is given:
    // - Linux: ~/.config/pairtree/config.toml
    // Default storage parent for `config init`: ~/.local/share/pairtree/store
    let dirs = ProjectDirs::from("", "", "pairtree");

    let config_file = match cli.config {
        Some(path) => path,
        None => dirs
            .as_ref()
            .context("failed to determine config directory path")?
            .config_dir()
            .join("config.toml"),
    };
    let default_parent = dirs.map(|dirs| dirs.data_dir().join("store"));

    let overrides = Overrides {
        parent: cli.parent,
        prefix: cli.prefix,
        separator: cli.separator,
    };

    cmd::run_command(config_file, default_parent, &overrides, cli.cmd)
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use pairtree_core::{PairtreeCodec, PairtreeConfig};
use pairtree_fs_local::LocalFsConfig;
use serde::Deserialize;

mod codec;
mod root;

pub use codec::run_codec;
pub use root::run_root;

/// Settings given on the command line; they win over the config file.
pub struct Overrides {
    pub parent: Option<PathBuf>,
    pub prefix: Option<String>,
    pub separator: Option<char>,
}

/// Layout of the config file: the storage root at the top level and the
/// local filesystem settings under `[local]`.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub root: PairtreeConfig,
    #[serde(default)]
    pub local: LocalFsConfig,
}

pub fn run_command(
    config_file: PathBuf,
    default_parent: Option<PathBuf>,
    overrides: &Overrides,
    cmd: crate::Commands,
) -> Result<()> {
    match cmd {
        crate::Commands::Config { cmd } => cmd.run(config_file, default_parent, overrides),
        crate::Commands::Init
        | crate::Commands::Object { .. }
        | crate::Commands::Contains { .. }
        | crate::Commands::List
        | crate::Commands::Delete => {
            let config = resolve_config(&config_file, overrides)?;
            run_root(cmd, &config)
        }
        _ => {
            let codec = resolve_codec(&config_file, overrides)?;
            run_codec(cmd, codec)
        }
    }
}

fn read_config_file(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let toml_content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read config file {path:?}"))?;
    let config = toml::from_str(&toml_content)
        .with_context(|| format!("could not parse config file {path:?}"))?;
    Ok(Some(config))
}

fn resolve_config(config_file: &Path, overrides: &Overrides) -> Result<ConfigFile> {
    let mut config = match (overrides.parent.clone(), read_config_file(config_file)?) {
        (Some(parent_dir), Some(file)) => ConfigFile {
            root: PairtreeConfig {
                parent_dir,
                ..file.root
            },
            local: file.local,
        },
        (Some(parent_dir), None) => ConfigFile {
            root: PairtreeConfig::new(parent_dir),
            local: LocalFsConfig::default(),
        },
        (None, Some(file)) => file,
        (None, None) => {
            bail!("no storage root configured; pass --parent or run `pairtree config init`")
        }
    };
    if let Some(prefix) = &overrides.prefix {
        config.root.prefix = Some(prefix.clone());
    }
    if let Some(separator) = overrides.separator {
        config.root.separator = separator;
    }
    Ok(config)
}

fn resolve_codec(config_file: &Path, overrides: &Overrides) -> Result<PairtreeCodec> {
    if let Some(separator) = overrides.separator {
        return Ok(PairtreeCodec::new(separator));
    }
    Ok(read_config_file(config_file)?
        .map(|config| config.root.codec())
        .unwrap_or_default())
}

use std::{fs, io::Write, path::PathBuf};

use anyhow::Context;
use clap::Subcommand;
use toml_edit::{DocumentMut, value};
use tracing::info;

use crate::cmd::Overrides;

#[derive(Subcommand)]
pub enum CmdConfig {
    /// Creates the config file if it doesn't exist; --parent, --prefix and
    /// --separator are written into it
    Init,
}

impl CmdConfig {
    pub fn run(
        self,
        config_file: PathBuf,
        default_parent: Option<PathBuf>,
        overrides: &Overrides,
    ) -> anyhow::Result<()> {
        let mut doc = if config_file.exists() {
            fs::read_to_string(&config_file)?
        } else {
            if let Some(dir) = config_file.parent() {
                fs::create_dir_all(dir)?;
            }
            "".to_owned()
        }
        .parse::<DocumentMut>()
        .context("could not parse config file")?;

        match self {
            Self::Init => {
                if overrides.parent.is_some() || !doc.contains_key("parent_dir") {
                    let parent = overrides
                        .parent
                        .clone()
                        .or(default_parent)
                        .context("no default data directory; pass --parent")?;
                    let parent = parent
                        .to_str()
                        .context("parent directory is not valid UTF-8")?
                        .to_owned();
                    doc.insert("parent_dir", value(parent));
                }
                if let Some(prefix) = &overrides.prefix {
                    doc.insert("prefix", value(prefix.as_str()));
                }
                if let Some(separator) = overrides.separator {
                    doc.insert("separator", value(separator.to_string()));
                }
            }
        }

        info!("writing to config file {config_file:?}");

        let tmp_path = config_file.with_extension("tmp");
        let mut tmp = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(doc.to_string().as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, config_file)?;
        Ok(())
    }
}

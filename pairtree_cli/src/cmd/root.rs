use anyhow::{Context, Result, bail};
use pairtree_fs_local::LocalFs;
use tracing::info;

use super::ConfigFile;
use crate::Commands;

pub fn run_root(cmd: Commands, config: &ConfigFile) -> Result<()> {
    let root = LocalFs::create(config.local.clone())
        .open_root(&config.root)
        .with_context(|| {
            format!(
                "could not open storage root in {}",
                config.root.parent_dir.display()
            )
        })?;

    match cmd {
        Commands::Init => println!("{}", root.path().display()),
        Commands::Object { identifier } => {
            let object = root.object(&identifier)?;
            println!("{}", object.path().display());
        }
        Commands::Contains { identifier } => println!("{}", root.contains(&identifier)?),
        Commands::List => {
            for identifier in root.identifiers()? {
                println!("{identifier}");
            }
        }
        Commands::Delete => {
            let path = root.path().to_path_buf();
            if !root.delete() {
                bail!("storage root {} was only partially deleted", path.display());
            }
            info!("deleted storage root {}", path.display());
        }
        _ => unreachable!("not a storage root command"),
    }
    Ok(())
}

use anyhow::Result;
use pairtree_core::codec::{PairtreeCodec, clean, unclean};

use crate::Commands;

pub fn run_codec(cmd: Commands, codec: PairtreeCodec) -> Result<()> {
    match cmd {
        Commands::Clean { identifier } => println!("{}", clean(&identifier)),
        Commands::Unclean { clean_id } => println!("{}", unclean(&clean_id)?),
        Commands::Path {
            identifier,
            root,
            encapsulate,
        } => {
            let encapsulating = encapsulate.then(|| clean(&identifier));
            let path =
                codec.pair_path_for(root.as_deref(), &identifier, encapsulating.as_deref())?;
            println!("{path}");
        }
        Commands::Id { path, root } => {
            println!("{}", codec.id_from_pair_path(&path, root.as_deref())?);
        }
        Commands::Extract { path } => {
            if let Some(name) = codec.extract_encapsulating_directory(&path)? {
                println!("{name}");
            }
        }
        _ => unreachable!("not a codec command"),
    }
    Ok(())
}

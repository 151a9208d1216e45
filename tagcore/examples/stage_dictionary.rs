//! Stages a dictionary from a bundle directory and drives a tagger over it.
//!
//! ```text
//! cargo run --example stage_dictionary -- <bundle-dir> <documents-dir> [dictionary]
//! ```
//!
//! The engine is the in-memory one from `tagcore-memory`, so the tagger
//! output is empty; the point is the staged directory and the engine
//! arguments it produces.

use std::env;

use tagcore::{DictionaryId, DirectoryBundle, LocalFilesystem, StagerConfig, TagcoreError, Tagger};
use tagcore_memory::InMemoryEngine;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = env::args().skip(1);
    let (Some(bundle_dir), Some(documents_dir)) = (args.next(), args.next()) else {
        return Err("usage: stage_dictionary <bundle-dir> <documents-dir> [dictionary]".into());
    };
    let raw_dictionary = args.next().unwrap_or_else(|| "ipadic".to_string());
    let dictionary = DictionaryId::try_new(raw_dictionary.as_str())
        .map_err(|_| format!("invalid dictionary identifier {raw_dictionary:?}"))?;

    let config = StagerConfig::directory_bundle(&documents_dir);
    let engine_args = config.engine_args(&config.staged_dir(&dictionary));

    let tagger = Tagger::builder()
        .config(config)
        .bundle(DirectoryBundle::new(LocalFilesystem::new(), bundle_dir))
        .filesystem(LocalFilesystem::new())
        .engine(InMemoryEngine::new())
        .build()?;

    match tagger.initialize(dictionary.as_ref()).await {
        Ok(()) => {}
        Err(TagcoreError::IncompleteManifest { missing }) => {
            return Err(format!("dictionary is incomplete, missing {missing:?}").into());
        }
        Err(other) => return Err(other.into()),
    }

    info!(args = %engine_args.to_param_string(), "Dictionary staged");

    let output = tagger.tokenize("これは猫です。").await?;
    info!(bytes = output.len(), "Tokenized sample sentence");

    tagger.dispose().await?;
    Ok(())
}

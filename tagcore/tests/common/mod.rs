//! Shared fixtures for tagcore scenario tests.

#![allow(dead_code)]

use tagcore::{StagerConfig, Tagger};
use tagcore_memory::{InMemoryBundle, InMemoryEngine, InMemoryFilesystem};

/// Writable root every in-memory scenario stages into.
pub const DOCUMENTS: &str = "/documents";

/// Raw engine output for the reference sentence.
pub const NEKO_QUERY: &str = "これは猫です。";
pub const NEKO_OUTPUT: &str = "これ: 名詞,代名詞,一般,*,*,*,これ,コレ,コレ\n\
は: 助詞,係助詞,*,*,*,*,は,ハ,ワ\n\
猫: 名詞,一般,*,*,*,*,猫,ネコ,ネコ\n\
です: 助動詞,*,*,*,特殊・デス,基本形,です,デス,デス\n\
。: 記号,句点,*,*,*,*,。,。,。\n";

pub type MemoryTagger = Tagger<InMemoryBundle, InMemoryFilesystem, InMemoryEngine>;

/// In-memory collaborators with an `ipadic` dictionary in the bundle.
pub struct Harness {
    pub filesystem: InMemoryFilesystem,
    pub bundle: InMemoryBundle,
    pub engine: InMemoryEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_engine(InMemoryEngine::new())
    }

    pub fn with_engine(engine: InMemoryEngine) -> Self {
        let filesystem = InMemoryFilesystem::new();
        let bundle = InMemoryBundle::with_dictionary(filesystem.clone(), "ipadic");
        engine.respond_with(NEKO_QUERY, NEKO_OUTPUT);
        Self {
            filesystem,
            bundle,
            engine,
        }
    }

    pub fn tagger(&self) -> MemoryTagger {
        self.tagger_with(StagerConfig::asset_bundle(DOCUMENTS))
    }

    pub fn tagger_with(&self, config: StagerConfig) -> MemoryTagger {
        Tagger::builder()
            .config(config)
            .bundle(self.bundle.clone())
            .filesystem(self.filesystem.clone())
            .engine(self.engine.clone())
            .build()
            .unwrap()
    }
}

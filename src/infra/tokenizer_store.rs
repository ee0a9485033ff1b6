// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Keeps a copy of the HuggingFace tokenizer.json used at
// training time inside the checkpoint directory, so `inspect`
// encodes text with exactly the same vocabulary.

use anyhow::{anyhow, Context, Result};
use std::{fs, path::{Path, PathBuf}};
use tokenizers::Tokenizer;

const FILE_NAME: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn exists(&self) -> bool {
        self.dir.join(FILE_NAME).exists()
    }

    /// Copy `source` into the store and load it.
    pub fn install(&self, source: impl AsRef<Path>) -> Result<Tokenizer> {
        let source = source.as_ref();
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let target = self.dir.join(FILE_NAME);
        if source != target {
            fs::copy(source, &target).with_context(|| {
                format!("Cannot copy tokenizer '{}' to '{}'", source.display(), target.display())
            })?;
        }
        tracing::info!("Tokenizer stored at '{}'", target.display());
        self.load()
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(FILE_NAME);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal word-level tokenizer in HuggingFace format
    fn write_word_level_tokenizer(path: &Path) {
        let json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": { "[PAD]": 0, "[UNK]": 1, "good": 2, "film": 3 },
                "unk_token": "[UNK]"
            }
        });
        fs::write(path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    }

    #[test]
    fn test_install_then_load() {
        let root = std::env::temp_dir().join("ssa_tokenizer_tests");
        fs::remove_dir_all(&root).ok();
        fs::create_dir_all(&root).unwrap();
        let source = root.join("source.json");
        write_word_level_tokenizer(&source);

        let store = TokenizerStore::new(root.join("ckpt"));
        assert!(!store.exists());

        let tokenizer = store.install(&source).unwrap();
        assert!(store.exists());

        let ids = tokenizer.encode("good film bad", false).unwrap().get_ids().to_vec();
        assert_eq!(ids, vec![2, 3, 1]);

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.get_vocab_size(true), tokenizer.get_vocab_size(true));
    }

    #[test]
    fn test_load_missing_tokenizer_fails() {
        let store = TokenizerStore::new("/definitely/not/a/checkpoint");
        assert!(store.load().is_err());
    }
}

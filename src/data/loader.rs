// ============================================================
// Layer 4 — JSONL Sequence Loader
// ============================================================
// Reads one labelled example per line:
//
//   {"label": 1, "tokens": [12, 7, 431, 9]}
//   {"label": 0, "text": "the film was dull"}
//
// `text` records are encoded with the tokenizer handed to the
// loader; without one they are rejected. Every label and token
// id is range-checked here so a bad corpus fails with a line
// number instead of an out-of-bounds embedding lookup later.

use anyhow::{anyhow, bail, ensure, Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tokenizers::Tokenizer;

use crate::domain::labeled_sequence::LabeledSequence;
use crate::domain::traits::SequenceSource;

#[derive(Debug, Deserialize)]
struct RawRecord {
    label: usize,
    #[serde(default)]
    tokens: Option<Vec<u32>>,
    #[serde(default)]
    text: Option<String>,
}

pub struct JsonlLoader {
    path:       PathBuf,
    tokenizer:  Option<Tokenizer>,
    vocab_size: usize,
    nb_classes: usize,
}

impl JsonlLoader {
    pub fn new(path: impl Into<PathBuf>, vocab_size: usize, nb_classes: usize) -> Self {
        Self { path: path.into(), tokenizer: None, vocab_size, nb_classes }
    }

    /// Encode `text` records with this tokenizer
    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    fn parse_line(&self, line_no: usize, line: &str) -> Result<LabeledSequence> {
        let record: RawRecord = serde_json::from_str(line)
            .with_context(|| format!("line {line_no}: malformed record"))?;

        let tokens = match (record.tokens, record.text) {
            (Some(tokens), _) => tokens,
            (None, Some(text)) => {
                let tokenizer = self.tokenizer.as_ref().ok_or_else(|| {
                    anyhow!("line {line_no}: text record but no tokenizer was provided")
                })?;
                tokenizer
                    .encode(text.as_str(), false)
                    .map_err(|e| anyhow!("line {line_no}: tokenisation error: {e}"))?
                    .get_ids()
                    .to_vec()
            }
            (None, None) => bail!("line {line_no}: record has neither 'tokens' nor 'text'"),
        };

        let sample = LabeledSequence::new(tokens, record.label);
        ensure!(
            sample.label < self.nb_classes,
            "line {line_no}: label {} out of range (nb_classes = {})",
            sample.label,
            self.nb_classes
        );
        if let Some(max) = sample.max_token() {
            ensure!(
                (max as usize) < self.vocab_size,
                "line {line_no}: token id {max} out of range (vocab_size = {})",
                self.vocab_size
            );
        }
        Ok(sample)
    }
}

impl SequenceSource for JsonlLoader {
    fn load_all(&self) -> Result<Vec<LabeledSequence>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let mut samples = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            samples.push(self.parse_line(idx + 1, line)?);
        }

        let empty = samples.iter().filter(|s| s.is_empty()).count();
        if empty > 0 {
            tracing::warn!("{} of {} sequences are empty", empty, samples.len());
        }
        tracing::debug!("Loaded {} sequences from '{}'", samples.len(), self.path.display());
        Ok(samples)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("ssa_loader_tests");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_loads_token_records_and_skips_blank_lines() {
        let path = write_temp(
            "ok.jsonl",
            "{\"label\": 1, \"tokens\": [1, 2, 3]}\n\n{\"label\": 0, \"tokens\": [9]}\n",
        );
        let samples = JsonlLoader::new(&path, 10, 2).load_all().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], LabeledSequence::new(vec![1, 2, 3], 1));
        assert_eq!(samples[1], LabeledSequence::new(vec![9], 0));
    }

    #[test]
    fn test_rejects_out_of_range_token() {
        let path = write_temp("bad_token.jsonl", "{\"label\": 0, \"tokens\": [3, 10]}\n");
        let err = JsonlLoader::new(&path, 10, 2).load_all().unwrap_err();
        assert!(err.to_string().contains("line 1"));
        assert!(err.to_string().contains("token id 10"));
    }

    #[test]
    fn test_rejects_out_of_range_label() {
        let path = write_temp("bad_label.jsonl", "{\"label\": 0, \"tokens\": [1]}\n{\"label\": 5, \"tokens\": [1]}\n");
        let err = JsonlLoader::new(&path, 10, 2).load_all().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_text_record_without_tokenizer_fails() {
        let path = write_temp("text.jsonl", "{\"label\": 0, \"text\": \"hello\"}\n");
        assert!(JsonlLoader::new(&path, 10, 2).load_all().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = JsonlLoader::new("/definitely/not/here.jsonl", 10, 2);
        assert!(loader.load_all().is_err());
    }
}

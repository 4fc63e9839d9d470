//! Shared fixtures: deterministic embedders and scripted generation backends.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use risk_rag::{ChatMessage, EmbeddingProvider, GenerationBackend, RagError, Result};
use serde_json::Value;

pub const DIM: usize = 32;

/// Hash-based embeddings that count how often each entry point is used and
/// can be switched into a failing mode.
#[derive(Default)]
pub struct CountingEmbedder {
    pub batch_calls: AtomicUsize,
    pub single_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingEmbedder {
    pub fn batches(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn vector(text: &str) -> Vec<f32> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut v = vec![0.0f32; DIM];
        for (i, x) in v.iter_mut().enumerate() {
            *x = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        v
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RagError::EmbeddingError {
                provider: "counting".into(),
                message: "model unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn name(&self) -> &str {
        "counting"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Records every prompt and replies with a fixed answer.
#[derive(Default)]
pub struct RecordingBackend {
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, _system: &str, messages: &[ChatMessage]) -> Result<Option<String>> {
        let prompt = messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n");
        self.prompts.lock().unwrap().push(prompt);
        Ok(Some("generated answer".to_string()))
    }
}

pub fn write_records(path: &Path, records: &Value) {
    std::fs::write(path, serde_json::to_vec_pretty(records).unwrap()).unwrap();
}

pub fn data_file(dir: &tempfile::TempDir, records: &Value) -> PathBuf {
    let path = dir.path().join("data.json");
    write_records(&path, records);
    path
}

//! # risk-rag
//!
//! Question answering over deficiency/risk registers.
//!
//! Raw JSON records are normalised into [`CanonicalDocument`]s, embedded and
//! kept in an in-memory [`FlatL2Index`] that is rebuilt only when the source
//! file's fingerprint changes. Questions either name record identifiers
//! (answered by exact lookup) or are answered by nearest-neighbour search.
//! "How many points ended" questions are counted locally; everything else is
//! handed with its context to a [`GenerationBackend`].
//!
//! ## Features
//!
//! - `ollama` – [`OllamaEmbeddingProvider`](ollama::OllamaEmbeddingProvider)
//!   and [`OllamaChatBackend`](ollama::OllamaChatBackend) over `reqwest`.

pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod normalize;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod retriever;
pub mod source;
pub mod synthesizer;

pub use config::{AssistantConfig, AssistantConfigBuilder};
pub use corpus::{CorpusIndex, CorpusSnapshot};
pub use document::{CanonicalDocument, RetrievedItem};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::{ChatMessage, GenerationBackend, Role};
pub use index::{FlatL2Index, Neighbor};
pub use normalize::{extract_year, latest_note, normalize};
pub use pipeline::{Answer, RiskAssistant, RiskAssistantBuilder};
pub use query::{FilterSet, RetrievalPlan, classify, extract_filters, extract_identifiers};
pub use record::{Field, RawRecord, resolve_field};
pub use retriever::Retriever;
pub use source::{JsonFileSource, RecordSource, fingerprint, parse_records};
pub use synthesizer::AnswerSynthesizer;

//! Answer synthesis: a deterministic count for "how many points ended"
//! questions, otherwise a grounded answer from the generation backend.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, error, info};

use crate::document::{CanonicalDocument, RetrievedItem};
use crate::error::Result;
use crate::generation::{ChatMessage, GenerationBackend};
use crate::query::{FilterSet, is_count_question};

/// Instruction sent with every delegated question.
pub const SYSTEM_PROMPT: &str = "\
You are an assistant that answers questions about information security risks and deficiencies \
using only the structured records provided.

Mandatory rules:
- Use only the information explicitly present in the context.
- Never invent, deduce or speculate about statuses, dates or responsible parties.
- Do not combine or cross data from different points. Treat each point on its own.";

/// Answer used when there is no usable context.
pub const CONTEXT_NOT_FOUND: &str = "Context not found.";

/// Answer used when the backend replies without any text.
pub const GENERATION_FALLBACK: &str = "Error generating answer.";

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}/\d{2}/(\d{4})\b").expect("valid date token pattern"));

/// Turns retrieved context into an answer.
pub struct AnswerSynthesizer {
    backend: Arc<dyn GenerationBackend>,
}

impl AnswerSynthesizer {
    /// Create a synthesizer delegating free-form questions to `backend`.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Answer `question` from `retrieved`.
    ///
    /// Counting questions are answered locally using `filters`; everything
    /// else goes to the generation backend.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationError`](crate::RagError::GenerationError) if the backend call fails.
    pub async fn synthesize(
        &self,
        retrieved: &[RetrievedItem],
        question: &str,
        filters: &FilterSet,
    ) -> Result<String> {
        if is_count_question(question) {
            let total = count_matching(retrieved, filters);
            info!(total, ?filters, "answered count question locally");
            return Ok(count_sentence(total, filters));
        }
        self.delegate(retrieved, question).await
    }

    async fn delegate(&self, retrieved: &[RetrievedItem], question: &str) -> Result<String> {
        let texts: Vec<String> = retrieved.iter().map(RetrievedItem::text).collect();
        if texts.iter().all(|text| text.trim().is_empty()) {
            return Ok(CONTEXT_NOT_FOUND.to_string());
        }

        let messages = [ChatMessage::user(format!("{}\n\nQuestion: {question}", build_context(&texts)))];
        debug!(backend = self.backend.name(), context_blocks = texts.len(), "delegating question");

        let reply = self.backend.generate(SYSTEM_PROMPT, &messages).await.map_err(|e| {
            error!(backend = self.backend.name(), error = %e, "generation failed");
            e
        })?;

        Ok(reply.unwrap_or_else(|| GENERATION_FALLBACK.to_string()))
    }
}

/// Number the context blocks so the model can refer to each point.
pub fn build_context(texts: &[String]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[Context for point {}]\n{text}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Count retrieved documents satisfying every present filter.
pub fn count_matching(retrieved: &[RetrievedItem], filters: &FilterSet) -> usize {
    retrieved
        .iter()
        .filter_map(RetrievedItem::document)
        .filter(|document| matches_filters(document, filters))
        .count()
}

/// Whether one document satisfies every present filter.
pub fn matches_filters(document: &CanonicalDocument, filters: &FilterSet) -> bool {
    let year_ok = filters.year.as_deref().is_none_or(|year| {
        DATE_TOKEN
            .captures_iter(&document.ended)
            .any(|c| c.get(1).is_some_and(|m| m.as_str() == year))
    });
    let area_ok = filters.area.as_deref().is_none_or(|area| same_text(&document.area, area));
    let responsible_ok =
        filters.responsible.as_deref().is_none_or(|name| same_text(&document.responsible, name));
    year_ok && area_ok && responsible_ok
}

fn same_text(field: &str, wanted: &str) -> bool {
    field.trim().to_lowercase() == wanted.trim().to_lowercase()
}

/// Phrase the count answer, echoing each applied filter.
pub fn count_sentence(total: usize, filters: &FilterSet) -> String {
    let mut sentence = format!("Found {total} ended points");
    if let Some(year) = &filters.year {
        sentence.push_str(&format!(" in {year}"));
    }
    if let Some(area) = &filters.area {
        sentence.push_str(&format!(" in area {}", title_case(area)));
    }
    if let Some(name) = &filters.responsible {
        sentence.push_str(&format!(" with responsible {}", title_case(name)));
    }
    sentence.push('.');
    sentence
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::RagError;
    use crate::generation::Role;

    struct EchoBackend {
        calls: AtomicUsize,
        reply: Option<String>,
    }

    #[async_trait]
    impl GenerationBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, system: &str, messages: &[ChatMessage]) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(system, SYSTEM_PROMPT);
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].role, Role::User);
            Ok(self.reply.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl GenerationBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _system: &str, _messages: &[ChatMessage]) -> Result<Option<String>> {
            Err(RagError::GenerationError {
                backend: "failing".into(),
                message: "connection refused".into(),
            })
        }
    }

    fn doc(area: &str, responsible: &str, ended: &str) -> RetrievedItem {
        RetrievedItem::Document {
            document: CanonicalDocument {
                id: "1".into(),
                area: area.into(),
                responsible: responsible.into(),
                risk: "r".into(),
                status: "s".into(),
                criticality: "c".into(),
                opened: "01/01/2020".into(),
                opened_year: "2020".into(),
                ended: ended.into(),
                ended_year: "".into(),
                note: "n".into(),
            },
            distance: None,
        }
    }

    fn echo(reply: Option<&str>) -> Arc<EchoBackend> {
        Arc::new(EchoBackend { calls: AtomicUsize::new(0), reply: reply.map(str::to_string) })
    }

    #[test]
    fn filters_use_document_fields() {
        let items = vec![
            doc("A", "Ana Lima", "10/05/2023"),
            doc("b", "ana lima", "11/06/2023"),
            doc("a", "Bruno", "01/01/2024"),
            RetrievedItem::NotFound { id: "9".into() },
        ];
        let year = FilterSet { year: Some("2023".into()), ..FilterSet::default() };
        assert_eq!(count_matching(&items, &year), 2);

        let year_area = FilterSet { area: Some("a".into()), ..year.clone() };
        assert_eq!(count_matching(&items, &year_area), 1);

        let responsible = FilterSet { responsible: Some("ana lima".into()), ..FilterSet::default() };
        assert_eq!(count_matching(&items, &responsible), 2);

        assert_eq!(count_matching(&items, &FilterSet::default()), 3);
    }

    #[test]
    fn year_filter_ignores_placeholder_dates() {
        let items = vec![doc("A", "x", "Not informed")];
        let year = FilterSet { year: Some("2023".into()), ..FilterSet::default() };
        assert_eq!(count_matching(&items, &year), 0);
    }

    #[test]
    fn sentence_echoes_filters_title_cased() {
        let filters = FilterSet {
            year: Some("2023".into()),
            area: Some("finance".into()),
            responsible: Some("ana lima".into()),
        };
        assert_eq!(
            count_sentence(4, &filters),
            "Found 4 ended points in 2023 in area Finance with responsible Ana Lima."
        );
        assert_eq!(count_sentence(0, &FilterSet::default()), "Found 0 ended points.");
    }

    #[test]
    fn context_blocks_are_numbered() {
        let context = build_context(&["first".to_string(), "second".to_string()]);
        assert_eq!(context, "[Context for point 1]\nfirst\n\n[Context for point 2]\nsecond");
    }

    #[tokio::test]
    async fn empty_context_short_circuits() {
        let backend = echo(Some("unused"));
        let synthesizer = AnswerSynthesizer::new(backend.clone());
        let answer =
            synthesizer.synthesize(&[], "what is open?", &FilterSet::default()).await.unwrap();
        assert_eq!(answer, CONTEXT_NOT_FOUND);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn count_question_never_calls_backend() {
        let backend = echo(Some("unused"));
        let synthesizer = AnswerSynthesizer::new(backend.clone());
        let answer = synthesizer
            .synthesize(
                &[doc("A", "x", "01/02/2023")],
                "how many points were ended in 2023",
                &FilterSet { year: Some("2023".into()), ..FilterSet::default() },
            )
            .await
            .unwrap();
        assert_eq!(answer, "Found 1 ended points in 2023.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delegated_answer_and_fallback() {
        let items = [doc("A", "x", "01/02/2023")];
        let backend = echo(Some("The point is ended."));
        let synthesizer = AnswerSynthesizer::new(backend.clone());
        let answer =
            synthesizer.synthesize(&items, "what is point 1?", &FilterSet::default()).await.unwrap();
        assert_eq!(answer, "The point is ended.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let silent = AnswerSynthesizer::new(echo(None));
        let answer =
            silent.synthesize(&items, "what is point 1?", &FilterSet::default()).await.unwrap();
        assert_eq!(answer, GENERATION_FALLBACK);
    }

    #[tokio::test]
    async fn backend_failure_surfaces_as_error() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(FailingBackend));
        let err = synthesizer
            .synthesize(&[doc("A", "x", "")], "summarise", &FilterSet::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::GenerationError { .. }));
    }
}

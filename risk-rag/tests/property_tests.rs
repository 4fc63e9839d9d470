//! Property tests for note selection and nearest-neighbour ordering.

use proptest::prelude::*;
use risk_rag::{FlatL2Index, latest_note};

/// Distinct (year, month, day) keys, each paired with a short lowercase note,
/// in arbitrary order.
fn arb_dated_entries() -> impl Strategy<Value = Vec<((u32, u32, u32), String)>> {
    proptest::collection::btree_map(
        (2000u32..2030, 1u32..=12, 1u32..=28),
        "[a-z]{1,8}( [a-z]{1,8}){0,3}",
        1..8,
    )
    .prop_map(|entries| entries.into_iter().collect::<Vec<_>>())
    .prop_shuffle()
}

fn render((year, month, day): (u32, u32, u32), text: &str) -> String {
    format!("{day:02}/{month:02}/{year} {text}")
}

/// *For any* note made of distinctly dated entries in any order, the latest
/// dated entry is the one selected, with its date prefix kept.
mod prop_latest_note {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn selects_latest_dated_entry(entries in arb_dated_entries()) {
            let note = entries
                .iter()
                .map(|(date, text)| render(*date, text))
                .collect::<Vec<_>>()
                .join("\n");

            let (latest_date, latest_text) =
                entries.iter().max_by_key(|(date, _)| *date).unwrap();

            prop_assert_eq!(latest_note(&note), render(*latest_date, latest_text));
        }

        #[test]
        fn undated_text_is_returned_trimmed(text in "[a-z]{1,8}( [a-z]{1,8}){0,3}") {
            let padded = format!("  {text}\n");
            prop_assert_eq!(latest_note(&padded), text);
        }
    }
}

/// *For any* set of vectors stored in a [`FlatL2Index`], searching returns
/// neighbours ordered by ascending squared L2 distance, with at most `k`
/// results and never more than the number of stored vectors.
mod prop_flat_index_search_ordering {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_ascending_and_bounded_by_k(
            vectors in proptest::collection::vec(
                proptest::collection::vec(-1.0f32..1.0f32, DIM),
                0..20,
            ),
            query in proptest::collection::vec(-1.0f32..1.0f32, DIM),
            k in 0usize..25,
        ) {
            let count = vectors.len();
            let index = FlatL2Index::build(DIM, vectors.clone()).unwrap();
            let results = index.search(&query, k).unwrap();

            prop_assert_eq!(results.len(), k.min(count));

            for pair in results.windows(2) {
                prop_assert!(
                    pair[0].distance <= pair[1].distance,
                    "results not in ascending distance order: {} > {}",
                    pair[0].distance,
                    pair[1].distance,
                );
            }

            for neighbor in &results {
                let expected: f32 = vectors[neighbor.position]
                    .iter()
                    .zip(&query)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                prop_assert!((neighbor.distance - expected).abs() < 1e-4);
            }
        }
    }
}

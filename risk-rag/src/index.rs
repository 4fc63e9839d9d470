//! In-memory flat nearest-neighbour index using squared Euclidean distance.
//!
//! This module provides [`FlatL2Index`], an exhaustive index over a fixed set
//! of vectors. It answers with corpus positions, so callers must keep their
//! documents in the same order as the vectors the index was built from.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// A search hit: a corpus position and its distance to the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Neighbor {
    /// Position of the vector in build order.
    pub position: usize,
    /// Squared Euclidean distance (lower is closer).
    pub distance: f32,
}

/// An exhaustive squared-L2 index.
///
/// Vectors are stored contiguously; search scores every vector, so cost is
/// linear in corpus size. Suitable for corpora that fit in memory.
#[derive(Debug, Clone, Default)]
pub struct FlatL2Index {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build an index over `vectors`, all of which must have `dimensions`
    /// components.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexError`] if `dimensions` is zero or any vector
    /// has a different length.
    pub fn build(dimensions: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::IndexError("dimensions must be greater than zero".into()));
        }
        let mut data = Vec::with_capacity(dimensions * vectors.len());
        for (position, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(RagError::IndexError(format!(
                    "vector {position} has {} dimensions, expected {dimensions}",
                    vector.len()
                )));
            }
            data.extend(vector);
        }
        Ok(Self { dimensions, data })
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        if self.dimensions == 0 { 0 } else { self.data.len() / self.dimensions }
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the indexed vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Return up to `k` nearest positions ordered by ascending distance.
    ///
    /// Equal distances are ordered by position. Asking for more than
    /// [`len`](Self::len) returns every vector.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexError`] if the query has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(RagError::IndexError(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: squared_l2(vector, query),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        scored.truncate(k);
        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

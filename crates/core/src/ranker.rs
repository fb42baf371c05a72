//! Cosine-similarity ranking over an aligned (entries, matrix) pair.
//!
//! Everything here is pure: no I/O, no shared state.

use crate::error::DataAccessError;
use crate::models::Entry;
use std::num::NonZeroUsize;

/// Row-major `n x D` matrix with cached row norms.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatrix {
    dimensions: usize,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl VectorMatrix {
    pub fn empty(dimensions: usize) -> Self {
        Self {
            dimensions,
            data: Vec::new(),
            norms: Vec::new(),
        }
    }

    /// Builds the matrix for `entries`, row `i` holding `entries[i].vector`.
    /// Every row must have `dimensions` finite components.
    pub fn from_entries(dimensions: usize, entries: &[Entry]) -> Result<Self, DataAccessError> {
        let mut matrix = Self {
            dimensions,
            data: Vec::with_capacity(entries.len() * dimensions),
            norms: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            if entry.vector.len() != dimensions {
                return Err(DataAccessError::DimensionMismatch {
                    classifier_type: entry.classifier_type.clone(),
                    code: entry.code.clone(),
                    expected: dimensions,
                    got: entry.vector.len(),
                });
            }
            if entry.vector.iter().any(|x| !x.is_finite()) {
                return Err(DataAccessError::NonFiniteVector {
                    classifier_type: entry.classifier_type.clone(),
                    code: entry.code.clone(),
                });
            }
            matrix.data.extend_from_slice(&entry.vector);
            matrix.norms.push(l2_norm(&entry.vector));
        }
        Ok(matrix)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    pub fn row(&self, index: usize) -> &[f32] {
        let start = index * self.dimensions;
        &self.data[start..start + self.dimensions]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.len()).map(move |i| self.row(i))
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.rows().map(<[f32]>::to_vec).collect()
    }
}

/// An entry paired with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked<'a> {
    pub entry: &'a Entry,
    pub score: f32,
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt() as f32
}

/// Cosine similarity of `a` and `b`. Zero when either vector has zero norm,
/// including a zero vector compared with itself.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}

fn cosine_with_norms(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    // Adding 0.0 folds -0.0 into 0.0 so total_cmp sees them as equal.
    ((dot / (f64::from(a_norm) * f64::from(b_norm))).clamp(-1.0, 1.0) + 0.0) as f32
}

/// Scores every row against `query`, keeps rows whose category equals
/// `category` exactly, and returns the best `top_k` in descending score order.
///
/// Scoring covers the whole scope before the category filter applies. Equal
/// scores keep their original entry order.
pub fn rank<'a>(
    query: &[f32],
    entries: &'a [Entry],
    matrix: &VectorMatrix,
    category: Option<&str>,
    top_k: NonZeroUsize,
) -> Result<Vec<Ranked<'a>>, DataAccessError> {
    if entries.len() != matrix.len() {
        return Err(DataAccessError::Misaligned {
            entries: entries.len(),
            rows: matrix.len(),
        });
    }
    if query.len() != matrix.dimensions() {
        return Err(DataAccessError::QueryDimension {
            expected: matrix.dimensions(),
            got: query.len(),
        });
    }

    let query_norm = l2_norm(query);
    let mut scored: Vec<Ranked<'a>> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| Ranked {
            entry,
            score: cosine_with_norms(query, query_norm, matrix.row(i), matrix.norms[i]),
        })
        .collect();

    if let Some(category) = category {
        scored.retain(|r| r.entry.category == category);
    }

    // sort_by is stable, so ties stay in entry order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k.get());
    Ok(scored)
}

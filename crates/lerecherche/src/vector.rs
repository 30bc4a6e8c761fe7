// Vector Similarity
//
// *Le Vector* (The Vector) - Sparse term vectors, cosine similarity and ranking

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Sparse term-weighted vector
///
/// Entries are kept sorted by term index with no explicit zeros, so two
/// vectors over the same vocabulary can be compared with a single merge pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Build a vector from `(term index, weight)` pairs
    ///
    /// Pairs may arrive in any order; repeated indices are summed and zero
    /// weights are dropped.
    pub fn from_pairs(mut pairs: Vec<(usize, f32)>) -> Self {
        pairs.sort_by_key(|&(idx, _)| idx);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f32> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            match indices.last() {
                Some(&last) if last == idx => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(idx);
                    values.push(value);
                }
            }
        }

        let (indices, values): (Vec<usize>, Vec<f32>) = indices
            .into_iter()
            .zip(values)
            .filter(|&(_, v)| v != 0.0)
            .unzip();
        Self { indices, values }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Whether every weight is zero
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate `(term index, weight)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Weight of one term
    pub fn get(&self, index: usize) -> f32 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    /// Euclidean norm
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scale to unit length; the zero vector is returned unchanged
    pub fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
        self
    }

    /// Dot product over the shared vocabulary
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Cosine similarity between two sparse vectors
///
/// Returns 0.0 if either vector is zero.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let norm_a = a.norm();
    let norm_b = b.norm();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    a.dot(b) / (norm_a * norm_b)
}

/// Cosine similarity of `query` against every document, in corpus order
pub fn similarities(query: &SparseVector, documents: &[SparseVector]) -> Vec<f32> {
    if query.is_empty() {
        return vec![0.0; documents.len()];
    }
    documents
        .par_iter()
        .map(|doc| cosine_similarity(query, doc))
        .collect()
}

/// Rank scored rows
///
/// Sorts by score descending (ties keep corpus order), keeps the first
/// `limit` rows, then drops every row scoring `<= min_score`.
pub fn rank(scores: &[f32], limit: usize, min_score: f32) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(limit);
    ranked.retain(|&(_, score)| score > min_score);
    ranked
}

/// Dense pairwise cosine similarity for one vector space
///
/// Stored row-major; row `i` holds the similarity of document `i` to every
/// document, itself included.
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatrix {
    size: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute every pairwise similarity
    ///
    /// Rows are accumulated through an inverted posting list so that only
    /// documents sharing a term are touched, and are filled in parallel.
    pub fn compute(vectors: &[SparseVector]) -> Self {
        let size = vectors.len();
        if size == 0 {
            return Self::default();
        }

        let dimension = vectors
            .iter()
            .flat_map(|v| v.indices.last().copied())
            .max()
            .map_or(0, |max| max + 1);

        let mut postings: Vec<Vec<(usize, f32)>> = vec![Vec::new(); dimension];
        for (doc, vector) in vectors.iter().enumerate() {
            for (term, weight) in vector.iter() {
                postings[term].push((doc, weight));
            }
        }

        let norms: Vec<f32> = vectors.iter().map(SparseVector::norm).collect();

        let mut data = vec![0.0f32; size * size];
        data.par_chunks_mut(size)
            .enumerate()
            .for_each(|(row, out)| {
                let norm_row = norms[row];
                if norm_row == 0.0 {
                    return;
                }
                for (term, weight) in vectors[row].iter() {
                    for &(col, other) in &postings[term] {
                        out[col] += weight * other;
                    }
                }
                for (col, value) in out.iter_mut().enumerate() {
                    let norm_col = norms[col];
                    *value = if norm_col == 0.0 {
                        0.0
                    } else {
                        *value / (norm_row * norm_col)
                    };
                }
            });

        Self { size, data }
    }

    /// Number of documents (rows and columns)
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Similarities of document `index` to every document
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.size {
            return None;
        }
        let start = index * self.size;
        Some(&self.data[start..start + self.size])
    }

    /// Similarity between two documents
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.row(row).and_then(|r| r.get(col).copied())
    }
}

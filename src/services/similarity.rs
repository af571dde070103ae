use std::hash::Hash;

use crate::models::{LabeledMatrix, SimilarityMatrix};

/// Cosine similarity of two equal-length vectors
///
/// Formula: cos(A, B) = (A · B) / (||A|| × ||B||), 0 when either norm is 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    cosine_with_norms(a, b, norm(a), norm(b))
}

fn cosine_with_norms(a: &[f64], b: &[f64], norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Pairwise cosine similarity between the rows of `matrix`
///
/// The result is labeled by the row labels on both axes. Only the upper
/// triangle is computed and mirrored, so the matrix is exactly symmetric.
/// The diagonal is 1 for non-zero rows and 0 for zero rows.
pub fn pairwise_row_similarity<R, C>(matrix: &LabeledMatrix<R, C>) -> SimilarityMatrix<R>
where
    R: Clone + Eq + Hash,
    C: Clone + Eq + Hash,
{
    let n = matrix.rows();
    let norms: Vec<f64> = (0..n).map(|i| norm(matrix.row(i))).collect();
    let mut similarity =
        SimilarityMatrix::zeros(matrix.row_labels().to_vec(), matrix.row_labels().to_vec());

    for i in 0..n {
        if norms[i] == 0.0 {
            continue;
        }
        similarity.set(i, i, 1.0);

        let row_i = matrix.row(i);
        for j in (i + 1)..n {
            let value = cosine_with_norms(row_i, matrix.row(j), norms[i], norms[j]);
            similarity.set(i, j, value);
            similarity.set(j, i, value);
        }
    }

    similarity
}

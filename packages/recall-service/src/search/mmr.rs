//! Maximal marginal relevance selection.
//!
//! Each step picks the candidate maximizing `lambda * relevance - (1 - lambda) * redundancy`,
//! where redundancy is the highest cosine similarity to anything already picked (zero before the
//! first pick). Similarities are computed once over unit vectors.

use std::collections::HashSet;

use crate::Candidate;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MmrPick {
	/// Position in the input slice.
	pub index: usize,
	pub mmr_score: f32,
}

/// Picks up to `top_k` candidates in selection order. Deterministic; ties go to the lower index.
pub fn select(candidates: &[Candidate], top_k: usize, lambda: f32) -> Vec<MmrPick> {
	let n = candidates.len();

	if n == 0 || top_k == 0 {
		return Vec::new();
	}

	let mut blocked = exact_duplicate_mask(candidates);
	let similarity = similarity_matrix(&unit_vectors(candidates));
	let relevance = candidates
		.iter()
		.map(|c| if c.base_relevance.is_finite() { c.base_relevance } else { 0.0 })
		.collect::<Vec<_>>();
	let mut max_sim = vec![f32::NEG_INFINITY; n];
	let mut picks = Vec::with_capacity(top_k.min(n));

	while picks.len() < top_k {
		let mut best: Option<MmrPick> = None;

		for i in 0..n {
			if blocked[i] {
				continue;
			}

			let redundancy = if picks.is_empty() { 0.0 } else { max_sim[i] };
			let mmr_score = lambda * relevance[i] - (1.0 - lambda) * redundancy;

			if best.is_none_or(|current| mmr_score > current.mmr_score) {
				best = Some(MmrPick { index: i, mmr_score });
			}
		}

		let Some(pick) = best else {
			break;
		};

		blocked[pick.index] = true;

		for (i, slot) in max_sim.iter_mut().enumerate() {
			*slot = slot.max(similarity[i * n + pick.index]);
		}

		picks.push(pick);
	}

	picks
}

/// Masks every candidate whose text repeats an earlier candidate's text byte for byte.
fn exact_duplicate_mask(candidates: &[Candidate]) -> Vec<bool> {
	let mut seen = HashSet::with_capacity(candidates.len());

	candidates.iter().map(|c| !seen.insert(c.raw_text.as_str())).collect()
}

// Missing, empty, mismatched or degenerate embeddings become the zero vector. The reference
// dimension is that of the first usable embedding.
fn unit_vectors(candidates: &[Candidate]) -> Vec<Vec<f32>> {
	let dim = candidates
		.iter()
		.filter_map(|c| c.embedding.as_deref())
		.find(|vec| !vec.is_empty())
		.map_or(0, <[f32]>::len);

	candidates
		.iter()
		.map(|c| match c.embedding.as_deref() {
			Some(vec) if vec.len() == dim && dim > 0 => normalize(vec, dim),
			_ => vec![0.0; dim],
		})
		.collect()
}

fn normalize(vec: &[f32], dim: usize) -> Vec<f32> {
	let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();

	if !norm.is_finite() || norm <= f32::EPSILON {
		return vec![0.0; dim];
	}

	vec.iter().map(|v| v / norm).collect()
}

// Row-major `n x n` matrix of pairwise dot products.
fn similarity_matrix(units: &[Vec<f32>]) -> Vec<f32> {
	let n = units.len();
	let mut matrix = vec![0.0; n * n];

	for i in 0..n {
		for j in i..n {
			let dot = units[i].iter().zip(&units[j]).map(|(a, b)| a * b).sum::<f32>();

			matrix[i * n + j] = dot;
			matrix[j * n + i] = dot;
		}
	}

	matrix
}

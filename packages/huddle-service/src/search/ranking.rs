pub mod keyword;
pub mod similarity;

pub use keyword::{KeywordMatch, KeywordRules, contains_ignore_case, keyword_match};
pub use similarity::cosine_similarity;

use std::cmp::Ordering;

use crate::search::ScoredMessage;

#[derive(Debug, Clone)]
pub struct RankedMessages {
	pub results: Vec<ScoredMessage>,
	/// Best `similarity` over every scored candidate, before thresholding. `0` when empty.
	pub max_score: f32,
}

/// `semantic` plus `boost` on a keyword hit, bounded to `[0, 1]`.
///
/// The floor at `0` means a keyword hit on a negative semantic score does not equal
/// `min(semantic + boost, 1.0)`: `-0.8` with a `0.25` boost gives `0`, not `-0.55`. Every
/// candidate stays inside `[0, 1]` instead.
pub fn combine_scores(semantic: f32, keyword_hit: bool, boost: f32) -> f32 {
	let combined = if keyword_hit { semantic + boost } else { semantic };

	if !combined.is_finite() {
		return 0.0;
	}

	combined.min(1.0).max(0.0)
}

/// Keeps candidates strictly above `threshold`, best first, at most `max_results`.
///
/// The sort is stable, so equal scores keep the order the store returned them in.
pub fn rank_candidates(
	scored: Vec<ScoredMessage>,
	threshold: f32,
	max_results: usize,
) -> RankedMessages {
	let max_score = scored.iter().map(|candidate| candidate.similarity).fold(0.0_f32, f32::max);
	let mut results: Vec<ScoredMessage> =
		scored.into_iter().filter(|candidate| candidate.similarity > threshold).collect();

	results.sort_by(|a, b| cmp_f32_desc(a.similarity, b.similarity));
	results.truncate(max_results);

	RankedMessages { results, max_score }
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

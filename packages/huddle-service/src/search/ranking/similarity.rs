/// Rounding slack tolerated around the `[-1, 1]` cosine bounds before a score is treated as
/// garbage.
pub const COSINE_TOLERANCE: f64 = 1e-5;

/// Cosine similarity in `[-1, 1]`, accumulated in `f64`.
///
/// Mismatched or empty inputs, zero-magnitude vectors and non-finite results score `0`. A result
/// just outside the bounds is clamped; anything further out also scores `0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.is_empty() || a.len() != b.len() {
		return 0.0;
	}

	let mut dot = 0.0_f64;
	let mut norm_a = 0.0_f64;
	let mut norm_b = 0.0_f64;

	for (x, y) in a.iter().zip(b) {
		let (x, y) = (f64::from(*x), f64::from(*y));

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	bound_cosine(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

fn bound_cosine(score: f64) -> f32 {
	if !score.is_finite() {
		return 0.0;
	}
	if (-1.0..=1.0).contains(&score) {
		return score as f32;
	}
	if score > 1.0 && score - 1.0 <= COSINE_TOLERANCE {
		return 1.0;
	}
	if score < -1.0 && -1.0 - score <= COSINE_TOLERANCE {
		return -1.0;
	}

	0.0
}

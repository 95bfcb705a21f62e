//! Cosine similarity and brute-force top-k ranking.
//!
//! Candidates whose embedding is empty or has a different length than the
//! query are not comparable and are excluded from ranking entirely, rather
//! than being scored as zero.

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ, when either vector has zero magnitude,
/// or when the inputs contain non-finite values. The result is clamped to
/// `[-1, 1]` to absorb floating-point drift.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !similarity.is_finite() {
        return 0.0;
    }
    similarity.clamp(-1.0, 1.0) as f32
}

/// Whether `candidate` can be compared against `query`.
pub fn is_comparable(query: &[f32], candidate: &[f32]) -> bool {
    !query.is_empty() && candidate.len() == query.len()
}

/// Rank comparable candidates by descending similarity to `query`.
///
/// Ties keep the order in which candidates were supplied (stable sort), so
/// callers that feed candidates in insertion order get deterministic results.
/// Returns at most `limit` `(similarity, item)` pairs.
pub fn rank_by_similarity<'a, T, I>(query: &[f32], candidates: I, limit: usize) -> Vec<(f32, T)>
where
    I: IntoIterator<Item = (&'a [f32], T)>,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f32, T)> = candidates
        .into_iter()
        .filter(|(embedding, _)| is_comparable(query, embedding))
        .map(|(embedding, item)| (cosine_similarity(query, embedding), item))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(limit);
    scored
}

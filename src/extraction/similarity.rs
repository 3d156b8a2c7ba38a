//! Fuzzy string similarity.
//!
//! Similarity is the normalized indel ratio: `200 * lcs / (len_a + len_b)`,
//! where `lcs` is the length of the longest common subsequence. It ranges
//! from 0 (nothing in common) to 100 (identical) and is symmetric.

/// Similarity of two strings on a 0-100 scale.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Highest similarity two strings of these lengths could reach.
pub fn max_similarity(len_a: usize, len_b: usize) -> f64 {
    let total = len_a + len_b;
    if total == 0 {
        return 100.0;
    }
    200.0 * len_a.min(len_b) as f64 / total as f64
}

/// Best-scoring candidate whose similarity is strictly above `threshold`.
/// Ties keep the earliest candidate.
pub fn best_match<'a, I>(needle: &str, candidates: I, threshold: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle_len = needle.chars().count();
    let mut best: Option<(&'a str, f64)> = None;

    for candidate in candidates {
        let floor = best.map(|(_, score)| score).unwrap_or(threshold);
        if max_similarity(needle_len, candidate.chars().count()) <= floor {
            continue;
        }
        let score = similarity(needle, candidate);
        if score > floor {
            best = Some((candidate, score));
        }
    }

    best
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

//! Statement similarity.

/// Normalized Levenshtein similarity of two statements, in `0.0..=1.0`.
///
/// Comparison is case-insensitive and character based. The result is rounded
/// to two decimals; an empty side scores `0.0`.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let longest = a.len().max(b.len());
    let ratio = 1.0 - levenshtein(&a, &b) as f64 / longest as f64;
    (ratio * 100.0).round() / 100.0
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_ignoring_case() {
        assert_eq!(levenshtein_ratio("Good morning", "good MORNING"), 1.0);
    }

    #[test]
    fn empty_scores_zero() {
        assert_eq!(levenshtein_ratio("", "hello"), 0.0);
        assert_eq!(levenshtein_ratio("hello", ""), 0.0);
        assert_eq!(levenshtein_ratio("", ""), 0.0);
    }

    #[test]
    fn known_distances() {
        assert_eq!(levenshtein(&['k', 'i', 't', 't', 'e', 'n'], &['s', 'i', 't', 't', 'i', 'n', 'g']), 3);
        // kitten -> sitting: 1 - 3/7
        assert_eq!(levenshtein_ratio("kitten", "sitting"), 0.57);
        assert_eq!(levenshtein_ratio("Hello", "Hello!"), 0.83);
    }

    #[test]
    fn unrelated_text_scores_low() {
        assert!(levenshtein_ratio("Tell me a joke", "What time is it?") < 0.5);
    }
}

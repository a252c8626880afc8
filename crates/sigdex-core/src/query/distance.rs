//! Levenshtein edit distance over canonical signature strings.

/// Unit-cost Levenshtein distance between `a` and `b`, counted in chars.
///
/// Keeps a single working row sized to the shorter input, so memory stays
/// `O(min(|a|, |b|))` however long the signatures get.
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let (long, short) = if a.chars().count() >= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short: Vec<char> = short.chars().collect();
    if short.is_empty() {
        return long.chars().count();
    }

    // row[j] holds d(i, j) for the current prefix length i of `long`.
    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, lc) in long.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[short.len()]
}

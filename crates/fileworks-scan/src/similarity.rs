//! Ratcliff/Obershelp string similarity.

/// Similarity ratio in `0.0..=1.0`: twice the number of characters in the
/// recursively found longest common blocks, divided by the total length.
///
/// Two empty strings are identical (1.0).
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Best ratio between `query` and a candidate file name.
///
/// The name is compared whole, without its extension, and segment by segment
/// (split on anything that is not alphanumeric), so `reprot` is close to
/// `report_final.txt` through its `report` segment.
pub fn name_similarity(query: &str, name: &str) -> f64 {
    let mut best = ratio(query, name);

    if let Some((stem, _)) = name.rsplit_once('.') {
        if !stem.is_empty() {
            best = best.max(ratio(query, stem));
        }
    }

    for segment in name.split(|c: char| !c.is_alphanumeric()) {
        if !segment.is_empty() && segment.len() != name.len() {
            best = best.max(ratio(query, segment));
        }
    }

    best
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(&a[alo..ahi], &b[blo..bhi]);
        if k == 0 {
            continue;
        }
        total += k;
        let (i, j) = (alo + i, blo + j);
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    total
}

/// Longest common block `(start_a, start_b, len)`, earliest in `a` and then
/// in `b` on ties.
fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let k = cur[j + 1];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert!(approx(ratio("report", "report"), 1.0));
        assert!(approx(ratio("abc", "xyz"), 0.0));
        assert!(approx(ratio("", ""), 1.0));
        assert!(approx(ratio("abc", ""), 0.0));
    }

    #[test]
    fn test_ratio_matches_reference_values() {
        // Reference values from the classic SequenceMatcher examples.
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        assert!(approx(ratio("reprot", "report.txt"), 0.625));
        assert!(approx(ratio("reprot", "report"), 10.0 / 12.0));
    }

    #[test]
    fn test_name_similarity_uses_segments() {
        assert!(name_similarity("reprot", "report_final.txt") >= 0.6);
        assert!(name_similarity("reprot", "report.txt") >= 0.6);
        assert!(name_similarity("reprot", "image.png") < 0.6);
    }
}

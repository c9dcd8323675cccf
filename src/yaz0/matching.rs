// Back-reference search for the Yaz0 encoder.
//
// Greedy and nearest-first: candidates are scanned from the byte just
// behind the cursor backwards to the window edge, and a candidate only
// replaces the current best when it is strictly longer. The search works
// on the input slice directly and allocates nothing per position.

use super::config::{MAX_MATCH, MIN_MATCH};

/// A back-reference from the cursor into already-emitted data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Bytes back from the cursor, `1..=window`.
    pub distance: usize,
    pub length: usize,
}

/// Number of equal leading bytes of `s1[..n]` and `s2[..n]`.
///
/// Compares 8 bytes at a time, then finishes byte by byte.
#[inline]
pub fn forward_match(s1: &[u8], s2: &[u8], n: usize) -> usize {
    let n = n.min(s1.len()).min(s2.len());
    let (s1, s2) = (&s1[..n], &s2[..n]);
    let mut i = 0;
    for (a, b) in s1.chunks_exact(8).zip(s2.chunks_exact(8)) {
        if a != b {
            break;
        }
        i += 8;
    }
    i + s1[i..]
        .iter()
        .zip(&s2[i..])
        .take_while(|(a, b)| a == b)
        .count()
}

/// Longest match for `data[pos..]` starting within `window` bytes behind
/// `pos`. Ties go to the nearest candidate.
///
/// Matches may run past `pos` (overlap); the decoder copies byte by byte,
/// so that is sound. Returns `None` when nothing of at least
/// [`MIN_MATCH`] bytes exists.
pub fn find_longest(data: &[u8], pos: usize, window: usize) -> Option<Match> {
    let max_len = MAX_MATCH.min(data.len().saturating_sub(pos));
    if max_len < MIN_MATCH {
        return None;
    }
    let target = &data[pos..pos + max_len];
    let lowest = pos.saturating_sub(window);

    let mut best: Option<Match> = None;
    let mut best_len = MIN_MATCH - 1;
    for cand in (lowest..pos).rev() {
        // A candidate can only be strictly longer if it agrees at both the
        // first byte and the byte just past the current best.
        if data[cand] != target[0] || data[cand + best_len] != target[best_len] {
            continue;
        }
        let len = forward_match(&data[cand..], target, max_len);
        if len > best_len {
            best_len = len;
            best = Some(Match {
                distance: pos - cand,
                length: len,
            });
            if len == max_len {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_match_lengths() {
        assert_eq!(forward_match(b"abcdefghijk", b"abcdefghijX", 11), 10);
        assert_eq!(forward_match(b"abc", b"abd", 3), 2);
        assert_eq!(forward_match(b"abc", b"abc", 2), 2);
        assert_eq!(forward_match(b"", b"abc", 3), 0);
    }

    #[test]
    fn no_match_at_start() {
        assert_eq!(find_longest(b"abcabc", 0, 4096), None);
    }

    #[test]
    fn finds_repeat() {
        let m = find_longest(b"abcdabcd", 4, 4096).unwrap();
        assert_eq!(m, Match { distance: 4, length: 4 });
    }

    #[test]
    fn overlapping_run() {
        // A single literal followed by a run copies from distance 1.
        let data = [7u8; 40];
        let m = find_longest(&data, 1, 4096).unwrap();
        assert_eq!(m, Match { distance: 1, length: 39 });
    }

    #[test]
    fn nearest_wins_ties() {
        let m = find_longest(b"xyzQxyzRxyz", 8, 4096).unwrap();
        assert_eq!(m, Match { distance: 4, length: 3 });
    }

    #[test]
    fn longer_far_match_beats_near_short_one() {
        let m = find_longest(b"abcdeXabcYabcde", 10, 4096).unwrap();
        assert_eq!(m, Match { distance: 10, length: 5 });
    }

    #[test]
    fn respects_window() {
        let mut data = b"abcdef".to_vec();
        data.extend_from_slice(&[0u8; 300]);
        data.extend_from_slice(b"abcdef");
        let pos = data.len() - 6;
        assert_eq!(find_longest(&data, pos, 256), None);
        assert_eq!(find_longest(&data, pos, 4096).unwrap().distance, 306);
    }

    #[test]
    fn length_capped() {
        let data = vec![1u8; 1000];
        assert_eq!(find_longest(&data, 1, 4096).unwrap().length, MAX_MATCH);
        // Clamped to what is left.
        assert_eq!(find_longest(&data, 996, 4096).unwrap().length, 4);
        assert_eq!(find_longest(&data, 998, 4096), None);
    }
}

//! String similarity scoring on a `[0, 100]` scale.
//!
//! The match engine is written against the [`Similarity`] trait so the
//! scorer can be swapped. The default, [`WeightedRatio`], is a token-aware
//! fuzzy ratio: it tolerates reordered words and extra inserted words much
//! better than a plain character edit distance would.
//!
//! # Scoring
//!
//! Both strings are first preprocessed: lower-cased, every non-alphanumeric
//! character turned into a separator, tokens re-joined by single spaces.
//! Then:
//!
//! - [`ratio`]: `200 × LCS(a, b) / (|a| + |b|)`, the indel-normalized
//!   similarity of the two character sequences.
//! - [`token_sort_ratio`]: [`ratio`] after sorting each side's tokens.
//! - [`token_set_ratio`]: compares the shared tokens against each side's
//!   leftovers; one side's tokens being a subset of the other's scores 100.
//! - [`partial_ratio`]: best [`ratio`] of the shorter string against every
//!   same-length window of the longer one.
//!
//! [`WeightedRatio`] takes the best of these, discounting the token-based
//! scores by 5% and, when one string is at least 1.5× longer than the
//! other, the window-based scores by a further 10% (30% past 8×). An
//! exact substring of a much longer candidate therefore still scores 70.

use std::collections::{BTreeSet, HashMap};

/// A pluggable similarity function.
///
/// Implementations must be deterministic and return values in `[0, 100]`,
/// with 100 for strings that are identical after normalization.
pub trait Similarity: Send + Sync {
    fn score(&self, query: &str, candidate: &str) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn score(&self, query: &str, candidate: &str) -> f64 {
        self(query, candidate)
    }
}

/// Token-aware weighted fuzzy ratio. See the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRatio;

const TOKEN_SCALE: f64 = 0.95;
const PARTIAL_LEN_RATIO: f64 = 1.5;
const PARTIAL_SCALE: f64 = 0.9;
const FAR_LEN_RATIO: f64 = 8.0;
const FAR_PARTIAL_SCALE: f64 = 0.7;

/// Longer strings up to this many characters get every window scored in
/// [`partial_ratio`]; past it only token-aligned windows are.
const EXHAUSTIVE_PARTIAL_CHARS: usize = 512;

impl Similarity for WeightedRatio {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        let a = preprocess(query);
        let b = preprocess(candidate);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let base = ratio(&a, &b);
        if base >= 100.0 {
            return 100.0;
        }

        let len_a = a.chars().count() as f64;
        let len_b = b.chars().count() as f64;
        let len_ratio = len_a.max(len_b) / len_a.min(len_b);

        let token_best = token_sort_ratio(&a, &b).max(token_set_ratio(&a, &b));

        let best = if len_ratio < PARTIAL_LEN_RATIO {
            base.max(token_best * TOKEN_SCALE)
        } else {
            let partial_scale = if len_ratio < FAR_LEN_RATIO {
                PARTIAL_SCALE
            } else {
                FAR_PARTIAL_SCALE
            };
            base.max(partial_ratio(&a, &b) * partial_scale)
                .max(token_best * TOKEN_SCALE * partial_scale)
        };
        best.clamp(0.0, 100.0)
    }
}

/// Lower-case, split on anything that is not alphanumeric, re-join tokens
/// with single spaces.
pub fn preprocess(s: &str) -> String {
    tokens(s).join(" ")
}

fn tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Bit-parallel LCS (Hyyrö) against a fixed pattern.
///
/// One pass over the text costs `O(text × ⌈pattern / 64⌉)`.
struct Pattern {
    len: usize,
    words: usize,
    masks: HashMap<char, Vec<u64>>,
}

impl Pattern {
    fn new(pattern: &[char]) -> Self {
        let words = pattern.len().div_ceil(64);
        let mut masks: HashMap<char, Vec<u64>> = HashMap::new();
        for (i, &c) in pattern.iter().enumerate() {
            masks.entry(c).or_insert_with(|| vec![0; words])[i / 64] |= 1 << (i % 64);
        }
        Self {
            len: pattern.len(),
            words,
            masks,
        }
    }

    fn lcs(&self, text: &[char]) -> usize {
        if self.len == 0 {
            return 0;
        }
        let mut state = vec![u64::MAX; self.words];
        for c in text {
            let Some(mask) = self.masks.get(c) else {
                continue;
            };
            let mut carry = false;
            for (s, &m) in state.iter_mut().zip(mask) {
                let u = *s & m;
                let (sum, c1) = s.overflowing_add(u);
                let (sum, c2) = sum.overflowing_add(carry as u64);
                carry = c1 || c2;
                *s = sum | (*s & !m);
            }
        }

        // Zero bits within the pattern length count matched characters.
        state
            .iter()
            .enumerate()
            .map(|(w, s)| {
                let bits = (self.len - w * 64).min(64);
                let valid = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
                (!s & valid).count_ones() as usize
            })
            .sum()
    }

    fn ratio(&self, text: &[char]) -> f64 {
        let total = self.len + text.len();
        if total == 0 {
            return 100.0;
        }
        200.0 * self.lcs(text) as f64 / total as f64
    }
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    Pattern::new(short).ratio(long)
}

/// Indel-normalized similarity of two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] of the shorter string against windows of the longer.
///
/// When the longer string is short enough every window is scored. Past
/// that, windows are aligned so that a token of the shorter string sits
/// on an equal token of the longer one, plus the two end windows.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }

    let width = short.len();
    let last = long.len() - width;
    let starts: Vec<usize> = if long.len() <= EXHAUSTIVE_PARTIAL_CHARS {
        (0..=last).collect()
    } else {
        aligned_starts(&short, &long)
    };

    let pattern = Pattern::new(&short);
    let mut best = 0.0f64;
    for start in starts {
        let r = pattern.ratio(&long[start..start + width]);
        if r > best {
            best = r;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// `(char offset, token)` for every space-separated token.
fn token_offsets(chars: &[char]) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, &c) in chars.iter().enumerate() {
        match (c == ' ', start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                out.push((s, chars[s..i].iter().collect()));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, chars[s..].iter().collect()));
    }
    out
}

fn aligned_starts(short: &[char], long: &[char]) -> Vec<usize> {
    let last = long.len() - short.len();
    let mut offsets: HashMap<String, Vec<usize>> = HashMap::new();
    for (offset, token) in token_offsets(short) {
        offsets.entry(token).or_default().push(offset);
    }

    let mut starts = BTreeSet::from([0, last]);
    for (pos, token) in token_offsets(long) {
        if let Some(in_short) = offsets.get(&token) {
            for &offset in in_short {
                starts.insert(pos.saturating_sub(offset).min(last));
            }
        }
    }
    starts.into_iter().collect()
}

/// [`ratio`] after sorting both sides' tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sort = |s: &str| {
        let mut t = tokens(s);
        t.sort();
        t.join(" ")
    };
    ratio(&sort(a), &sort(b))
}

/// Set-based token comparison; a token subset scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<String> = tokens(a).into_iter().collect();
    let set_b: BTreeSet<String> = tokens(b).into_iter().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let join = |it: Vec<&String>| {
        it.into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let sect = join(set_a.intersection(&set_b).collect());
    let only_a = join(set_a.difference(&set_b).collect());
    let only_b = join(set_b.difference(&set_a).collect());

    if !sect.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let combine = |rest: &str| {
        if sect.is_empty() {
            rest.to_string()
        } else {
            format!("{} {}", sect, rest)
        }
    };
    let with_a = combine(&only_a);
    let with_b = combine(&only_b);

    let mut best = ratio(&with_a, &with_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &with_a)).max(ratio(&sect, &with_b));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(a: &str, b: &str) -> f64 {
        WeightedRatio.score(a, b)
    }

    fn lcs_table(a: &[char], b: &[char]) -> usize {
        let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
        for i in 0..a.len() {
            for j in 0..b.len() {
                dp[i + 1][j + 1] = if a[i] == b[j] {
                    dp[i][j] + 1
                } else {
                    dp[i][j + 1].max(dp[i + 1][j])
                };
            }
        }
        dp[a.len()][b.len()]
    }

    fn keyword_blob(words: usize) -> String {
        (0..words)
            .map(|i| format!("term{}x{}", i, "abcdefghij".repeat(i % 3 + 1)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[test]
    fn identical_after_normalization_is_100() {
        assert_eq!(score("Fever", "  fever "), 100.0);
        assert_eq!(score("What is fever?", "what is FEVER"), 100.0);
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(score("", "fever"), 0.0);
        assert_eq!(score("fever", "?!"), 0.0);
    }

    #[test]
    fn ratio_matches_indel_definition() {
        // LCS("fever", "feverr") = 5, lengths 5 + 6.
        assert!((ratio("fever", "feverr") - 1000.0 / 11.0).abs() < 1e-9);
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn reordered_tokens_score_high() {
        let plain = ratio("high fever at night", "at night high fever");
        let weighted = score("high fever at night", "at night high fever");
        assert!(weighted >= 95.0, "weighted = {weighted}");
        assert!(weighted > plain);
    }

    #[test]
    fn inserted_words_score_above_plain_ratio() {
        let plain = ratio("what should i do about a fever", "fever");
        let weighted = score("what should i do about a fever", "fever");
        assert!(weighted > 60.0, "weighted = {weighted}");
        assert!(weighted > plain);
    }

    #[test]
    fn token_set_subset_is_100() {
        assert_eq!(token_set_ratio("fever", "i have a fever"), 100.0);
    }

    #[test]
    fn bit_parallel_lcs_agrees_with_table() {
        let cases = [
            ("fever".to_string(), "feverr".to_string()),
            ("kitten".to_string(), "sitting".to_string()),
            (String::new(), "abc".to_string()),
            ("abc".to_string(), "abc".to_string()),
            ("a".repeat(70), "ba".repeat(40)),
            (
                "the quick brown fox jumps over the lazy dog and keeps running far away".to_string(),
                "quick brown dogs jump over lazy foxes".to_string(),
            ),
        ];
        for (a, b) in &cases {
            let a: Vec<char> = a.chars().collect();
            let b: Vec<char> = b.chars().collect();
            let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
            assert_eq!(Pattern::new(short).lcs(long), lcs_table(&a, &b), "{a:?} / {b:?}");
        }
    }

    #[test]
    fn exact_phrase_in_far_longer_text_clears_threshold() {
        let text = format!("jane doe jane example com {}", "backend engineer ".repeat(40));
        let s = score("backend engineer", &text);
        assert!(s > 60.0, "score = {s}");
        assert!(score("jane doe", &text) > 60.0);
    }

    #[test]
    fn long_candidates_use_aligned_windows() {
        let blob = preprocess(&keyword_blob(6000));
        assert!(blob.chars().count() > EXHAUSTIVE_PARTIAL_CHARS * 100);
        assert_eq!(partial_ratio("term4321xabcdefghijabcdefghij", &blob), 100.0);
    }

    #[test]
    fn long_candidates_score_quickly() {
        let blob = keyword_blob(6000);
        let query = "senior backend engineer with rust postgres kubernetes and term42 experience";
        let started = std::time::Instant::now();
        for _ in 0..5 {
            let s = score(query, &blob);
            assert!((0.0..=100.0).contains(&s));
        }
        let elapsed = started.elapsed();
        assert!(
            elapsed < std::time::Duration::from_secs(3),
            "scoring took {elapsed:?}"
        );
    }

    #[test]
    fn partial_ratio_finds_window() {
        assert_eq!(partial_ratio("fever", "xxfeverxx"), 100.0);
    }

    #[test]
    fn unrelated_strings_score_low() {
        assert!(score("quantum chromodynamics", "fever") < 60.0);
    }

    #[test]
    fn scores_stay_in_range() {
        let pairs = [
            ("a", "a very long candidate string with many words"),
            ("x y z", "z y x"),
            ("héllo wörld", "hello world"),
            ("123", "1234567890123"),
        ];
        for (a, b) in pairs {
            let s = score(a, b);
            assert!((0.0..=100.0).contains(&s), "{a:?} vs {b:?} = {s}");
        }
    }

    #[test]
    fn closures_are_similarity_functions() {
        let exact = |a: &str, b: &str| if a == b { 100.0 } else { 0.0 };
        assert_eq!(exact.score("x", "x"), 100.0);
        assert_eq!(exact.score("x", "y"), 0.0);
    }
}

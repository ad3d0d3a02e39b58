//! Textual similarity between a typed query and a prompt's searchable text.
//!
//! The score is a weighted-ratio blend in the style of `WRatio`: plain edit
//! similarity, best-window (partial) similarity when the lengths differ a lot,
//! token-sorted and token-set similarity so word order does not matter, and a
//! directional token-coverage term that rewards query words which start or
//! occur inside candidate words (`"plan trip"` vs `"Trip Planning"`).
//!
//! Both inputs are normalized first: lowercased, every non-alphanumeric
//! character turned into a space, whitespace collapsed. Identical normalized
//! strings score 100 and nothing else does; strings with no characters in
//! common score 0.

use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

use crate::record::PromptRecord;

pub const MAX_SCORE: u8 = 100;

/// Length ratio below which the full strings are compared directly.
const PARTIAL_THRESHOLD: f64 = 1.5;
/// Length ratio above which partial matches are heavily discounted.
const LONG_CANDIDATE_THRESHOLD: f64 = 8.0;
const TOKEN_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

const TOKEN_EXACT: f64 = 1.0;
const TOKEN_PREFIX: f64 = 0.9;
const TOKEN_INFIX: f64 = 0.75;
/// Query words shorter than this only earn credit as exact words or prefixes.
const MIN_INFIX_LEN: usize = 3;

/// Searchable text of a record: its name followed by its tags, space-joined.
pub fn searchable_text(record: &PromptRecord) -> String {
    let mut text = record.name.clone();
    for tag in &record.tags {
        text.push(' ');
        text.push_str(tag);
    }
    text
}

/// Score `candidate` against `query` on a 0..=100 scale.
pub fn score(query: &str, candidate: &str) -> u8 {
    let query = normalize(query);
    let candidate = normalize(candidate);
    if query.is_empty() || candidate.is_empty() {
        return 0;
    }
    if query == candidate {
        return MAX_SCORE;
    }

    let query_len = query.chars().count();
    let candidate_len = candidate.chars().count();
    let len_ratio = query_len.max(candidate_len) as f64 / query_len.min(candidate_len) as f64;

    let mut best = ratio(&query, &candidate);
    if len_ratio < PARTIAL_THRESHOLD {
        best = best
            .max(token_sort_ratio(&query, &candidate) * TOKEN_SCALE)
            .max(token_set_ratio(&query, &candidate) * TOKEN_SCALE);
    } else {
        let partial_scale = if len_ratio < LONG_CANDIDATE_THRESHOLD {
            PARTIAL_SCALE
        } else {
            LONG_PARTIAL_SCALE
        };
        best = best
            .max(partial_ratio(&query, &candidate) * partial_scale)
            .max(token_sort_ratio(&query, &candidate) * TOKEN_SCALE * partial_scale)
            .max(token_set_ratio(&query, &candidate) * TOKEN_SCALE * partial_scale);
    }
    best = best.max(token_coverage(&query, &candidate) * TOKEN_SCALE);

    // Only identical strings may reach the maximum.
    let scaled = (best * f64::from(MAX_SCORE)).round() as u8;
    scaled.min(MAX_SCORE - 1)
}

fn normalize(input: &str) -> String {
    let spaced: String = input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(a, b)
}

/// Best similarity of the shorter string against every same-length window of
/// the longer one.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let long: Vec<char> = long.chars().collect();
    let width = short.chars().count();
    if width == 0 {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for window in long.windows(width) {
        let window: String = window.iter().collect();
        best = best.max(ratio(short, &window));
        if best >= 1.0 {
            break;
        }
    }
    best
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a: BTreeSet<&str> = a.split_whitespace().collect();
    let b: BTreeSet<&str> = b.split_whitespace().collect();
    let shared: Vec<&str> = a.intersection(&b).copied().collect();
    let only_a: Vec<&str> = a.difference(&b).copied().collect();
    let only_b: Vec<&str> = b.difference(&a).copied().collect();

    let joined_a = [shared.as_slice(), only_a.as_slice()].concat().join(" ");
    let joined_b = [shared.as_slice(), only_b.as_slice()].concat().join(" ");
    if shared.is_empty() {
        return ratio(&joined_a, &joined_b);
    }
    // One side's words are all contained in the other's.
    if only_a.is_empty() || only_b.is_empty() {
        return 1.0;
    }
    let shared = shared.join(" ");
    ratio(&shared, &joined_a)
        .max(ratio(&shared, &joined_b))
        .max(ratio(&joined_a, &joined_b))
}

/// Average credit of each query word against its best candidate word.
fn token_coverage(query: &str, candidate: &str) -> f64 {
    let candidate_tokens: Vec<&str> = candidate.split_whitespace().collect();
    let query_tokens: Vec<&str> = query.split_whitespace().collect();
    if query_tokens.is_empty() {
        return 0.0;
    }

    let total: f64 = query_tokens
        .iter()
        .map(|token| {
            candidate_tokens
                .iter()
                .map(|word| token_credit(token, word))
                .fold(0.0, f64::max)
        })
        .sum();
    total / query_tokens.len() as f64
}

fn token_credit(token: &str, word: &str) -> f64 {
    if word == token {
        TOKEN_EXACT
    } else if word.starts_with(token) {
        TOKEN_PREFIX
    } else if token.chars().count() >= MIN_INFIX_LEN && word.contains(token) {
        TOKEN_INFIX
    } else {
        0.0
    }
}

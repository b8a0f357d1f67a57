//! Text normalization, chunking and anchor extraction shared by
//! [`crate::plan`] (block construction) and [`crate::insert`] (per-strategy
//! verification).

const MAX_CHUNK_LEN: usize = 360;
const ANCHOR_LEN: usize = 40;
const SHORT_TEXT_THRESHOLD: usize = 24;

/// Strips zero-width characters and disallowed control characters, then
/// collapses runs of >=3 newlines to 2. Idempotent: normalizing twice
/// yields the same string as normalizing once.
pub fn normalize_text(input: &str) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !is_zero_width(*c) && !is_disallowed_control(*c))
        .collect();
    collapse_excess_newlines(&stripped)
}

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' | '\u{2060}'
    )
}

fn is_disallowed_control(c: char) -> bool {
    // Keep newline and tab; drop every other C0/C1 control character.
    c.is_control() && c != '\n' && c != '\t'
}

fn collapse_excess_newlines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut run = 0usize;
    for c in input.chars() {
        if c == '\n' {
            run += 1;
            if run <= 2 {
                out.push(c);
            }
        } else {
            run = 0;
            out.push(c);
        }
    }
    out
}

/// Splits `text` into chunks no longer than [`MAX_CHUNK_LEN`] chars,
/// preferring to break on sentence or newline boundaries.
pub fn chunk_for_typing(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let hard_end = std::cmp::min(start + MAX_CHUNK_LEN, chars.len());
        if hard_end == chars.len() {
            chunks.push(chars[start..hard_end].iter().collect());
            break;
        }
        // Search backward from hard_end for a sentence/newline boundary.
        let mut split_at = hard_end;
        let mut found = false;
        let mut i = hard_end;
        while i > start {
            i -= 1;
            let c = chars[i];
            if c == '\n' || c == '.' || c == '!' || c == '?' {
                split_at = i + 1;
                found = true;
                break;
            }
        }
        if !found || split_at == start {
            split_at = hard_end;
        }
        chunks.push(chars[start..split_at].iter().collect::<String>());
        start = split_at;
    }
    chunks.into_iter().map(|c: String| c.trim().to_string()).filter(|c| !c.is_empty()).collect()
}

/// Normalizes away quote/emphasis markers and control characters before
/// anchor extraction.
fn strip_markup_for_anchor(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`' | '*' | '_' | '~') && !c.is_control() || *c == ' ')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Anchors {
    pub start: String,
    pub middle: Option<String>,
    pub end: Option<String>,
}

/// Extracts up to three 40-char anchors (start, middle, end) from the
/// normalized expected text, after stripping markup. For text shorter than
/// one anchor only `start` is populated.
pub fn extract_anchors(expected_normalized: &str) -> Anchors {
    let clean = strip_markup_for_anchor(expected_normalized);
    let chars: Vec<char> = clean.chars().collect();
    let len = chars.len();

    if len <= ANCHOR_LEN {
        return Anchors {
            start: clean,
            middle: None,
            end: None,
        };
    }

    let start: String = chars[0..ANCHOR_LEN].iter().collect();
    let end: String = chars[len - ANCHOR_LEN..len].iter().collect();
    let middle = if len >= ANCHOR_LEN * 3 {
        let mid_start = (len - ANCHOR_LEN) / 2;
        Some(chars[mid_start..mid_start + ANCHOR_LEN].iter().collect())
    } else {
        None
    };

    Anchors {
        start,
        middle,
        end: Some(end),
    }
}

/// With two of three anchors present, verification passes; with
/// one, it fails — unless the whole normalized expected text is shorter
/// than 24 chars, where a single anchor (the only one that exists) is
/// sufficient.
pub fn anchors_verify(anchors: &Anchors, observed: &str, expected_normalized_len: usize) -> bool {
    let observed_clean = strip_markup_for_anchor(observed);
    let mut hits = 0;
    if observed_clean.contains(&anchors.start) {
        hits += 1;
    }
    if let Some(m) = &anchors.middle {
        if observed_clean.contains(m) {
            hits += 1;
        }
    }
    if let Some(e) = &anchors.end {
        if observed_clean.contains(e) {
            hits += 1;
        }
    }

    if expected_normalized_len < SHORT_TEXT_THRESHOLD {
        hits >= 1
    } else {
        hits >= 2
    }
}

/// Body character count must grow by at least `max(8, 35% of the
/// chunk's non-whitespace length)`.
pub fn required_growth(chunk_non_whitespace_len: usize) -> usize {
    std::cmp::max(8, (chunk_non_whitespace_len * 35) / 100)
}

pub fn non_whitespace_len(s: &str) -> usize {
    s.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let raw = "hello\u{200B}\u{200B}world\n\n\n\n\nagain";
        let once = normalize_text(raw);
        let twice = normalize_text(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_collapses_excess_newlines() {
        let raw = "a\n\n\n\n\nb";
        assert_eq!(normalize_text(raw), "a\n\nb");
    }

    #[test]
    fn normalize_strips_zero_width_once() {
        assert_eq!(normalize_text("a\u{200B}b"), "ab");
    }

    #[test]
    fn chunker_never_exceeds_360_chars() {
        let long = "word ".repeat(400);
        let chunks = chunk_for_typing(&long);
        assert!(chunks.iter().all(|c| c.chars().count() <= 360));
    }

    #[test]
    fn chunker_splits_long_input_into_several_chunks() {
        let long = "x".repeat(1500);
        let chunks = chunk_for_typing(&long);
        assert!(chunks.len() >= 4);
    }

    #[test]
    fn anchors_two_of_three_present_is_ok() {
        let expected = "a".repeat(150);
        let anchors = extract_anchors(&expected);
        // observed contains start and end but not the exact middle slice.
        let observed = format!("{}{}{}", anchors.start, "------gap------", anchors.end);
        assert!(anchors_verify(&anchors, &observed, expected.chars().count()));
    }

    #[test]
    fn anchors_only_one_of_three_fails_for_long_text() {
        let expected = "a".repeat(150);
        let anchors = extract_anchors(&expected);
        let observed = anchors.start.clone();
        assert!(!anchors_verify(&anchors, &observed, expected.chars().count()));
    }

    #[test]
    fn anchors_single_anchor_suffices_for_short_text() {
        let expected = "short text";
        let anchors = extract_anchors(expected);
        assert!(anchors_verify(&anchors, expected, expected.chars().count()));
    }
}

// src/listing/size.rs
// =============================================================================
// File-size heuristics.
//
// Sizes show up as "123", "2K", "1.5M", "4.0 KiB" or "12 MB". Units are always
// read as binary (K = 1024). The text around a link also holds dates, times
// and file names with digits in them, so we:
//
// 1. strip the date/time formats the date heuristic knows about
// 2. collect number tokens, skipping ones glued to letters ("mp3", "file1")
//    and bare years ("2024-" / "2024/")
// 3. prefer the largest token with a K/M/G/T/P unit, else the largest plain
//    number that does not look like part of a date or a time
// =============================================================================

use regex::Regex;
use std::sync::OnceLock;

struct SizePatterns {
    strip: [Regex; 3],
    token: Regex,
    year_shape: Regex,
    clock: Regex,
}

fn patterns() -> &'static SizePatterns {
    static PATTERNS: OnceLock<SizePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| SizePatterns {
        strip: [
            Regex::new(r"\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}(?::\d{2})?").expect("static regex"),
            Regex::new(r"\d{2}-\w{3}-\d{4}\s\d{2}:\d{2}").expect("static regex"),
            Regex::new(r"(?i)\d{1,2}/\d{1,2}/\d{2,4}\s\d{1,2}:\d{2}(?:\s?(?:AM|PM))?")
                .expect("static regex"),
        ],
        token: Regex::new(r"(?i)(\d+(?:\.\d+)?)(\s?)([KMGTP]i?B?|B)?").expect("static regex"),
        year_shape: Regex::new(r"\d{4}[-/]").expect("static regex"),
        clock: Regex::new(r"\d{1,2}:\d{2}").expect("static regex"),
    })
}

#[derive(Debug)]
struct Token {
    bytes: u64,
    has_unit: bool,
    start: usize,
    end: usize,
}

/// Picks the most plausible size in bytes out of free text.
pub fn parse_size(text: &str) -> Option<u64> {
    let p = patterns();
    let cleaned = strip_date_time(text);

    let mut tokens = Vec::new();
    for caps in p.token.captures_iter(&cleaned) {
        let whole = caps.get(0)?;
        let number_match = caps.get(1)?;
        let (start, mut end) = (whole.start(), whole.end());
        let mut unit = caps.get(3).map_or("", |m| m.as_str());

        // "931 Music.txt", "512 bytes": a spaced unit letter that starts a
        // word belongs to the word, the number stands alone
        let spaced = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
        if spaced && !unit.is_empty() && followed_by_letter(&cleaned, end) {
            unit = "";
        }
        if unit.is_empty() {
            end = number_match.end();
        }
        if embedded_in_word(&cleaned, start, end) {
            continue;
        }

        let number = number_match.as_str();
        if unit.is_empty() && number.len() == 4 && number.bytes().all(|b| b.is_ascii_digit()) {
            let surround = window(&cleaned, start, 5, 6);
            if p.year_shape.is_match(surround) {
                continue;
            }
        }

        let value: f64 = match number.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let scale = unit_scale(unit);
        let bytes = (value * 1024f64.powi(scale as i32)).floor() as u64;
        tokens.push(Token {
            bytes,
            has_unit: scale > 0,
            start,
            end,
        });
    }

    if tokens.iter().any(|t| t.has_unit) {
        return tokens.iter().filter(|t| t.has_unit).map(|t| t.bytes).max();
    }

    tokens
        .iter()
        .filter(|t| !looks_like_date_or_time(&cleaned, t))
        .map(|t| t.bytes)
        .max()
}

fn strip_date_time(text: &str) -> String {
    let mut out = text.to_string();
    for re in &patterns().strip {
        out = re.replace_all(&out, " ").into_owned();
    }
    out
}

/// 0 for plain bytes, 1 for K ... 5 for P.
fn unit_scale(unit: &str) -> u32 {
    match unit.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('K') => 1,
        Some('M') => 2,
        Some('G') => 3,
        Some('T') => 4,
        Some('P') => 5,
        _ => 0,
    }
}

fn followed_by_letter(text: &str, end: usize) -> bool {
    text[end..].chars().next().is_some_and(|c| c.is_alphabetic())
}

fn embedded_in_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.is_some_and(|c| c.is_alphabetic()) || after.is_some_and(|c| c.is_alphabetic())
}

fn looks_like_date_or_time(text: &str, token: &Token) -> bool {
    let before = text[..token.start].chars().next_back();
    let after = text[token.end..].chars().next();
    if matches!(before, Some(':') | Some('-')) || matches!(after, Some(':') | Some('-')) {
        return true;
    }
    token.bytes <= 60 && patterns().clock.is_match(window(text, token.start, 5, 8))
}

/// Up to `before` chars before `start` and `after` chars from `start` on.
fn window(text: &str, start: usize, before: usize, after: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(before)
        .last()
        .map_or(start, |(i, _)| i);
    let hi = text[start..]
        .char_indices()
        .nth(after)
        .map_or(text.len(), |(i, _)| start + i);
    &text[lo..hi]
}

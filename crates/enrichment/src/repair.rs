//! Last-resort textual repair of almost-JSON.
//!
//! One linear pass that tracks whether it is inside a string literal:
//!
//! - literal newline, carriage return, tab, and other control characters
//!   inside a string are escaped;
//! - a `"` inside a string that is not followed (after whitespace) by a JSON
//!   delimiter (`,` `:` `}` `]`) or end of input is treated as an inner
//!   quote and escaped;
//! - a comma directly before `}` or `]` outside a string is dropped.
//!
//! The quote rule is a guess. An inner quote that happens to be followed by
//! a comma still closes the string early, and the result may fail to parse
//! or parse into something other than what the author meant. Callers must
//! treat the output as a candidate for a strict re-parse, nothing more.

use std::fmt::Write;

/// Apply the repair heuristics to `text` and return the rewritten candidate.
pub fn repair_json_text(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(&escaped) = chars.get(i + 1) {
                        out.push(escaped);
                        i += 1;
                    }
                }
                '"' if closes_string(&chars, i + 1) => {
                    in_string = false;
                    out.push(c);
                }
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if u32::from(c) < 0x20 => {
                    let _ = write!(out, "\\u{:04x}", u32::from(c));
                }
                c => out.push(c),
            }
        } else {
            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                ',' if matches!(next_significant(&chars, i + 1), Some('}' | ']')) => {}
                c => out.push(c),
            }
        }
        i += 1;
    }

    out
}

fn closes_string(chars: &[char], from: usize) -> bool {
    match next_significant(chars, from) {
        None => true,
        Some(c) => matches!(c, ',' | ':' | '}' | ']'),
    }
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars
        .get(from..)?
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

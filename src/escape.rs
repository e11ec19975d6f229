//! NTriples escaping for literal and IRI values
//!
//! Output is pure ASCII: anything outside the ASCII range is written as a
//! `\uXXXX` (code points up to U+FFFF) or `\UXXXXXXXX` escape.

use std::fmt::Write;

/// Escape a raw text value for use inside a quoted NTriples literal
///
/// Backslash, double quote, CR and LF get their short escapes. Vertical
/// tab is dropped. Other ASCII passes through unchanged.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{000B}' => {}
            c if c.is_ascii() => out.push(c),
            c => push_unicode_escape(&mut out, c),
        }
    }
    out
}

/// Escape a value for use between `<` and `>` in an NTriples IRI reference
///
/// Characters not allowed in an IRIREF (controls, space, `<>"{}|^`\`) and
/// all non-ASCII characters are written as unicode escapes.
pub fn escape_iri(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => push_unicode_escape(&mut out, ch),
            c if c <= ' ' => push_unicode_escape(&mut out, c),
            c if c.is_ascii() => out.push(c),
            c => push_unicode_escape(&mut out, c),
        }
    }
    out
}

fn push_unicode_escape(out: &mut String, ch: char) {
    let code = ch as u32;
    // Writing into a String cannot fail
    let _ = if code <= 0xFFFF {
        write!(out, "\\u{:04X}", code)
    } else {
        write!(out, "\\U{:08X}", code)
    };
}

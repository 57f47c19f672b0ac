// src/text.rs
//! Line-oriented source helpers shared by the front-ends and detectors.
//!
//! Both comment strippers keep every newline so line numbers and per-line
//! counting stay aligned with the original file.

use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

/// Reads a file as UTF-8, returning `None` on any I/O or encoding error.
#[must_use]
pub fn read_source(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

/// Number of lines in `content` (a trailing newline does not add a line).
#[must_use]
pub fn count_loc(content: &str) -> usize {
    content.lines().count()
}

/// Width of the leading whitespace on line `row` (0-based).
#[must_use]
pub fn line_indent(source: &str, row: usize) -> usize {
    source
        .lines()
        .nth(row)
        .map_or(0, |line| line.len() - line.trim_start().len())
}

/// Removes `#` comments, respecting single and double quoted strings.
#[must_use]
pub fn strip_hash_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(strip_hash_line(line));
    }
    out
}

fn strip_hash_line(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '#' => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Removes `//` and `/* */` comments outside of string literals.
#[must_use]
pub fn strip_c_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            result.push(c);
            quote = handle_string_char(c, q, &mut chars, &mut result);
            continue;
        }

        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                result.push(c);
            }
            '/' => handle_slash(&mut chars, &mut result),
            _ => result.push(c),
        }
    }
    result
}

fn handle_string_char(c: char, q: char, chars: &mut Peekable<Chars>, result: &mut String) -> Option<char> {
    if c == '\\' {
        if let Some(next) = chars.next() {
            result.push(next);
        }
        return Some(q);
    }
    // An unterminated single-line literal must not swallow the rest of the file.
    if c == '\n' && q != '`' {
        return None;
    }
    (c != q).then_some(q)
}

fn handle_slash(chars: &mut Peekable<Chars>, result: &mut String) {
    match chars.peek() {
        Some(&'/') => skip_line_comment(chars, result),
        Some(&'*') => skip_block_comment(chars, result),
        _ => result.push('/'),
    }
}

fn skip_line_comment(chars: &mut Peekable<Chars>, result: &mut String) {
    for ch in chars.by_ref() {
        if ch == '\n' {
            result.push('\n');
            break;
        }
    }
}

fn skip_block_comment(chars: &mut Peekable<Chars>, result: &mut String) {
    chars.next(); // consume '*'
    while let Some(ch) = chars.next() {
        if ch == '\n' {
            result.push('\n');
        }
        if ch == '*' && chars.peek() == Some(&'/') {
            chars.next();
            break;
        }
    }
}

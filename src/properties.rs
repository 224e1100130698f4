//! Parser for `KEY=value` properties files.
//!
//! Follows the usual properties-file conventions: `#` and `!` comment lines,
//! `=`, `:` or whitespace as the key/value separator, trailing-backslash line
//! continuation and backslash escapes. Files that are not valid UTF-8 are
//! read as ISO-8859-1.

use std::collections::HashMap;

/// Key/value pairs read from a properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: HashMap<String, String>,
}

impl Properties {
    /// Parses properties from raw file contents.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let content = String::from_utf8(bytes)
            .unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect());
        Self::parse(&content)
    }

    /// Parses properties from text. Never fails: malformed lines degrade to
    /// a key with an empty value.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();
        let mut lines = content.lines();

        while let Some(line) = lines.next() {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let mut logical = line.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_key_value(&logical);
            entries.insert(unescape(key), unescape(value));
        }

        Self { entries }
    }

    /// Returns the raw value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the value for a key, or an empty string when it is absent.
    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }
}

/// An odd number of trailing backslashes means the line continues.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped separator.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                let key = trim_unescaped_end(&line[..i]);
                return (key, trim_unescaped_end(line[i + 1..].trim_start()));
            }
            c if c.is_whitespace() => {
                // "KEY = value" and "KEY value" both have whitespace first.
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..i], trim_unescaped_end(rest.trim_start()));
            }
            _ => {}
        }
    }
    (line, "")
}

/// Trims trailing whitespace, keeping whitespace written as `\ `.
fn trim_unescaped_end(text: &str) -> &str {
    let mut end = 0;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped || !c.is_whitespace() {
            end = i + c.len_utf8();
        }
        escaped = !escaped && c == '\\';
    }
    &text[..end]
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

//! `Key=Value;` connection string grammar shared by SQL Server drivers.
//!
//! Emission follows the usual ADO.NET builder rules: values are written bare
//! unless they contain `;`, carry leading/trailing whitespace, or start with a
//! quote. Quoted values prefer double quotes (inner `"` doubled); a value that
//! contains `"` but no `'` is wrapped in single quotes instead.

use crate::error::SqlClientError;

/// Ordered `Key=Value` writer.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStringBuilder {
    buf: String,
}

impl ConnectionStringBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: &str) -> &mut Self {
        if !self.buf.is_empty() {
            self.buf.push(';');
        }
        self.buf.push_str(&key.replace('=', "=="));
        self.buf.push('=');
        push_value(&mut self.buf, value);
        self
    }

    pub fn push_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.push(key, if value { "True" } else { "False" })
    }

    pub fn push_int(&mut self, key: &str, value: impl Into<i64>) -> &mut Self {
        self.push(key, &value.into().to_string())
    }

    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

fn needs_quoting(value: &str) -> bool {
    value.contains(';')
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.starts_with('"')
        || value.starts_with('\'')
}

fn push_value(buf: &mut String, value: &str) {
    if !needs_quoting(value) {
        buf.push_str(value);
    } else if value.contains('"') && !value.contains('\'') {
        buf.push('\'');
        buf.push_str(value);
        buf.push('\'');
    } else {
        buf.push('"');
        buf.push_str(&value.replace('"', "\"\""));
        buf.push('"');
    }
}

/// Split a connection string into `(key, value)` pairs in order of appearance.
///
/// Keys are returned lower-cased with surrounding whitespace removed; quoted
/// values are unquoted.
///
/// # Errors
///
/// Returns `SqlClientError::ConfigError` for a pair without `=` or an
/// unterminated quoted value.
pub fn parse_connection_string(input: &str) -> Result<Vec<(String, String)>, SqlClientError> {
    let mut pairs = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }

        let (key, after_key) = read_key(rest)?;
        let (value, after_value) = read_value(after_key)?;
        pairs.push((key.trim().to_lowercase(), value));
        rest = after_value;
    }

    Ok(pairs)
}

fn read_key(input: &str) -> Result<(String, &str), SqlClientError> {
    let mut key = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '=' if matches!(chars.peek(), Some((_, '='))) => {
                key.push('=');
                chars.next();
            }
            '=' => return Ok((key, &input[idx + 1..])),
            ';' => break,
            _ => key.push(c),
        }
    }

    Err(SqlClientError::ConfigError(format!(
        "connection string segment '{}' has no value",
        key.trim()
    )))
}

fn read_value(input: &str) -> Result<(String, &str), SqlClientError> {
    let trimmed = input.trim_start();
    let quote = match trimmed.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => {
            let end = trimmed.find(';').unwrap_or(trimmed.len());
            return Ok((trimmed[..end].trim_end().to_string(), &trimmed[end..]));
        }
    };

    let body = &trimmed[1..];
    let mut value = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c != quote {
            value.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, next)) if *next == quote) {
            value.push(quote);
            chars.next();
            continue;
        }
        let after = body[idx + 1..].trim_start();
        if !(after.is_empty() || after.starts_with(';')) {
            return Err(SqlClientError::ConfigError(format!(
                "unexpected characters after quoted value: '{after}'"
            )));
        }
        return Ok((value, after));
    }

    Err(SqlClientError::ConfigError(
        "unterminated quoted value in connection string".to_string(),
    ))
}

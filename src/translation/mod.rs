use std::borrow::Cow;

mod scanner;

use scanner::{
    State, is_block_comment_end, is_block_comment_start, is_line_comment_start, scan_identifier,
};

/// Strip the driver's `@` marker from a parameter name.
#[must_use]
pub fn bare_parameter_name(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

/// Rewrite named `@name` markers into positional `@P1..@Pn` markers.
///
/// `names` are bare parameter names (no `@`); the marker for `names[i]` becomes
/// `@P{i + 1}`. Matching is ASCII case-insensitive. Markers inside string
/// literals, double-quoted or bracketed identifiers, and comments are left
/// alone, as are `@@` system functions and variables not listed in `names`.
///
/// Returns a borrowed `Cow` when nothing was rewritten.
///
/// ```rust
/// use mssql_data_client::translation::rewrite_named_parameters;
///
/// let sql = "UPDATE t SET note = '@id' WHERE id = @id AND owner = @Owner";
/// assert_eq!(
///     rewrite_named_parameters(sql, &["id", "owner"]),
///     "UPDATE t SET note = '@id' WHERE id = @P1 AND owner = @P2"
/// );
/// ```
#[must_use]
pub fn rewrite_named_parameters<'a>(sql: &'a str, names: &[&str]) -> Cow<'a, str> {
    if names.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'@' if bytes.get(idx + 1) == Some(&b'@') => {
                    idx = scan_identifier(bytes, idx + 2) - 1;
                }
                b'@' => {
                    let end = scan_identifier(bytes, idx + 1);
                    let ident = &sql[idx + 1..end];
                    if !ident.is_empty()
                        && let Some(pos) = names.iter().position(|n| n.eq_ignore_ascii_case(ident))
                    {
                        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                        buf.push_str(&sql[copied..idx]);
                        buf.push_str("@P");
                        buf.push_str(&(pos + 1).to_string());
                        copied = end;
                    }
                    idx = end - 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Bracketed => {
                if b == b']' {
                    if bytes.get(idx + 1) == Some(&b']') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
        }

        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

//! Human-readable JSON for diagnostic output.
//!
//! This is a text transform, not a parser: it never validates its input and
//! leaves everything inside string literals untouched, so the JSON value it
//! describes is unchanged.

const INDENT: &str = "    ";

/// Reformat a compact JSON document with one member per line and four-space
/// indentation.
///
/// # Example
///
/// ```rust
/// use sfbatch_client::prettify_json;
///
/// assert_eq!(
///     prettify_json(r#"{"id":"750xx","state":"Open"}"#),
///     "{\n    \"id\": \"750xx\",\n    \"state\": \"Open\"\n}"
/// );
/// ```
#[must_use]
pub fn prettify_json(compact: &str) -> String {
    let bytes = compact.as_bytes();
    let mut out = String::with_capacity(compact.len() * 2);
    let mut depth: usize = 0;
    let mut quoted = false;

    for (i, ch) in compact.char_indices() {
        match ch {
            '{' | '[' => {
                out.push(ch);
                if !quoted {
                    depth += 1;
                    newline(&mut out, depth);
                }
            }
            '}' | ']' => {
                if !quoted {
                    depth = depth.saturating_sub(1);
                    newline(&mut out, depth);
                }
                out.push(ch);
            }
            '"' => {
                out.push(ch);
                if !is_escaped(bytes, i) {
                    quoted = !quoted;
                }
            }
            ',' => {
                out.push(ch);
                if !quoted {
                    newline(&mut out, depth);
                }
            }
            ':' => {
                out.push(ch);
                if !quoted {
                    out.push(' ');
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// A quote is escaped when an odd number of backslashes directly precede it.
fn is_escaped(bytes: &[u8], quote_at: usize) -> bool {
    bytes[..quote_at]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
        % 2
        == 1
}

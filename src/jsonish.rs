//! Relaxed JSON parsing for JavaScript object literals embedded in pages.
//!
//! Sites push data into inline scripts as JavaScript literals rather than
//! strict JSON: keys are unquoted, strings may be single-quoted and lists
//! carry trailing commas. [`js_to_json`] rewrites such a literal into strict
//! JSON in one token-based pass, and [`parse_loose_json`] feeds the result
//! to `serde_json`.

use crate::error::ExtractError;
use crate::utils::truncate_for_log;
use serde_json::Value;
use tracing::debug;

/// Rewrite a JavaScript object/array literal as strict JSON.
///
/// - double-quoted strings are kept, single-quoted ones are re-quoted
/// - `\xNN` escapes become `\u00NN`
/// - bare identifiers are quoted; `true`, `false` and `null` are kept and
///   `undefined` becomes `null`
/// - comments and trailing commas are dropped
/// - hexadecimal integers are converted to decimal
/// - numeric object keys are quoted
pub fn js_to_json(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            '/' if chars.get(i + 1) == Some(&'*') => i = skip_comment(&chars, i),
            '/' if chars.get(i + 1) == Some(&'/') => i = skip_comment(&chars, i),
            ',' => {
                let next = skip_trivia(&chars, i + 1);
                if !matches!(chars.get(next), Some('}') | Some(']')) {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_ascii_digit() => i = copy_number(&chars, i, &mut out),
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                match ident.as_str() {
                    "true" | "false" | "null" => out.push_str(&ident),
                    "undefined" => out.push_str("null"),
                    _ => {
                        out.push('"');
                        out.push_str(&ident);
                        out.push('"');
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Parse a JavaScript literal as JSON after [`js_to_json`] normalization.
///
/// `what` names the blob in the resulting [`ExtractError::MalformedData`].
pub fn parse_loose_json(src: &str, what: &str) -> Result<Value, ExtractError> {
    let normalized = js_to_json(src);
    debug!(what, normalized = %truncate_for_log(&normalized, 200), "Normalized loose JSON");
    serde_json::from_str(&normalized).map_err(|source| ExtractError::MalformedData {
        what: what.to_string(),
        source,
    })
}

/// Parse a strict JSON document.
pub fn parse_json(src: &str, what: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(src).map_err(|source| ExtractError::MalformedData {
        what: what.to_string(),
        source,
    })
}

/// Wrap a non-array value in a one-element list.
pub fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Index of the first char after `from` that is neither whitespace nor a comment.
fn skip_trivia(chars: &[char], mut from: usize) -> usize {
    loop {
        while from < chars.len() && chars[from].is_whitespace() {
            from += 1;
        }
        if chars.get(from) == Some(&'/') && matches!(chars.get(from + 1), Some('*') | Some('/')) {
            from = skip_comment(chars, from);
        } else {
            return from;
        }
    }
}

fn skip_comment(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    if chars[start + 1] == '/' {
        while i < chars.len() && chars[i] != '\n' {
            i += 1;
        }
        return i;
    }
    while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
        i += 1;
    }
    (i + 2).min(chars.len())
}

fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            out.push('"');
            return i + 1;
        }
        match c {
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    out.push('\\');
                    return chars.len();
                };
                match next {
                    '\'' => out.push('\''),
                    'x' if is_hex_pair(chars, i + 2) => {
                        out.push_str("\\u00");
                        out.push(chars[i + 2]);
                        out.push(chars[i + 3]);
                        i += 2;
                    }
                    _ => {
                        out.push('\\');
                        out.push(next);
                    }
                }
                i += 2;
            }
            '"' => {
                out.push_str("\\\"");
                i += 1;
            }
            '\n' => {
                out.push_str("\\n");
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    i
}

fn is_hex_pair(chars: &[char], at: usize) -> bool {
    matches!(
        (chars.get(at), chars.get(at + 1)),
        (Some(a), Some(b)) if a.is_ascii_hexdigit() && b.is_ascii_hexdigit()
    )
}

fn copy_number(chars: &[char], start: usize, out: &mut String) -> usize {
    let (token, end) = if chars[start] == '0' && matches!(chars.get(start + 1), Some('x') | Some('X')) {
        let mut i = start + 2;
        while i < chars.len() && chars[i].is_ascii_hexdigit() {
            i += 1;
        }
        let digits: String = chars[start + 2..i].iter().collect();
        let token = match u64::from_str_radix(&digits, 16) {
            Ok(n) => n.to_string(),
            Err(_) => chars[start..i].iter().collect(),
        };
        (token, i)
    } else {
        let mut i = start;
        while i < chars.len() {
            let c = chars[i];
            let exponent_sign = (c == '+' || c == '-') && matches!(chars[i - 1], 'e' | 'E');
            if c.is_ascii_alphanumeric() || c == '.' || exponent_sign {
                i += 1;
            } else {
                break;
            }
        }
        (chars[start..i].iter().collect(), i)
    };

    // Object keys must be strings in JSON.
    if chars.get(skip_trivia(chars, end)) == Some(&':') {
        out.push('"');
        out.push_str(&token);
        out.push('"');
    } else {
        out.push_str(&token);
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quotes_bare_keys() {
        let src = r#"{url: "http://example.com/a.mp3", width: 0, codec: 'mp4a'}"#;
        let value = parse_loose_json(src, "inline data").unwrap();
        assert_eq!(
            value,
            json!({"url": "http://example.com/a.mp3", "width": 0, "codec": "mp4a"})
        );
    }

    #[test]
    fn test_single_quoted_strings_and_escapes() {
        let value = parse_loose_json(r#"{'title': 'It\'s "live"', 'x': '\x41'}"#, "t").unwrap();
        assert_eq!(value["title"], "It's \"live\"");
        assert_eq!(value["x"], "A");
    }

    #[test]
    fn test_trailing_commas_and_comments() {
        let src = "[\n  {url: 'a', }, // first\n  /* second */ {url: 'b',},\n]";
        let value = parse_loose_json(src, "t").unwrap();
        assert_eq!(value, json!([{"url": "a"}, {"url": "b"}]));
    }

    #[test]
    fn test_literals_and_numbers() {
        let src = "{a: true, b: false, c: null, d: undefined, e: 0x1F, f: -1.5e+3, g: 12}";
        let value = parse_loose_json(src, "t").unwrap();
        assert_eq!(
            value,
            json!({"a": true, "b": false, "c": null, "d": null, "e": 31, "f": -1500.0, "g": 12})
        );
    }

    #[test]
    fn test_numeric_keys_become_strings() {
        let value = parse_loose_json("{1: 'a', 0x2 : 'b', c: 3}", "t").unwrap();
        assert_eq!(value, json!({"1": "a", "2": "b", "c": 3}));
    }

    #[test]
    fn test_strict_json_passes_through() {
        let src = r#"{"url":"http://example.com/a?b=1,2","size":"1024"}"#;
        assert_eq!(js_to_json(src), src);
    }

    #[test]
    fn test_malformed_input() {
        let err = parse_loose_json("{url: ", "inline data").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedData { ref what, .. } if what == "inline data"));
    }

    #[test]
    fn test_into_list() {
        assert_eq!(into_list(json!({"a": 1})), vec![json!({"a": 1})]);
        assert_eq!(into_list(json!([1, 2])), vec![json!(1), json!(2)]);
    }
}

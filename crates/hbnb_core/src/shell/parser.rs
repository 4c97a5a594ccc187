//! Command-line tokenization for the shell.
//!
//! # Responsibility
//! - Rewrite dotted `Kind.verb(args)` input into `verb Kind args`.
//! - Split argument text into tokens, keeping one `{...}` or `[...]` group
//!   whole.
//! - Decode `create` parameters (`key=value`).
//!
//! # Invariants
//! - Tokenization never evaluates anything; literal decoding is done by
//!   `model::literal`.

use super::error::{CommandError, CommandResult};
use crate::model::literal::parse_literal;
use crate::model::value::{AttrValue, FieldDiagnostic};
use once_cell::sync::Lazy;
use regex::Regex;

static DOTTED_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_]+)\((.*)\)$")
        .unwrap_or_else(|err| panic!("dotted call pattern must compile: {err}"))
});

/// Verbs accepted by the dotted form.
const DOTTED_VERBS: &[&str] = &["all", "count", "create", "destroy", "show", "update"];

/// Rewrites `Kind.verb(args)` to `verb Kind args`.
///
/// Returns `None` when the input is not a dotted call or the verb is not
/// one the shell dispatches.
pub fn rewrite_dotted(line: &str) -> Option<String> {
    let captures = DOTTED_CALL.captures(line.trim())?;
    let kind = captures.get(1)?.as_str();
    let verb = captures.get(2)?.as_str();
    if !DOTTED_VERBS.contains(&verb) {
        return None;
    }
    let args = captures.get(3).map_or("", |m| m.as_str()).trim();
    if args.is_empty() {
        Some(format!("{verb} {kind}"))
    } else {
        Some(format!("{verb} {kind} {args}"))
    }
}

/// Splits command arguments.
///
/// The first brace group (or, without one, the first bracket group) is cut
/// out verbatim and appended as the final token; the text before it is
/// word-split with shell quoting. Leading/trailing commas are stripped from
/// each word.
pub fn split_args(arg: &str) -> CommandResult<Vec<String>> {
    let group = find_group(arg, '{', '}').or_else(|| find_group(arg, '[', ']'));
    let (prefix, group) = match group {
        Some((start, end)) => (&arg[..start], Some(&arg[start..end])),
        None => (arg, None),
    };

    let mut tokens: Vec<String> = split_words(prefix)?
        .into_iter()
        .filter_map(|word| {
            let stripped = word.trim_matches(',');
            if stripped.is_empty() && !word.is_empty() {
                None
            } else {
                Some(stripped.to_string())
            }
        })
        .collect();
    if let Some(group) = group {
        tokens.push(group.to_string());
    }
    Ok(tokens)
}

/// Locates the first balanced `open ... close` group outside quoted text.
///
/// Quotes are tracked from the start of input, so a brace or bracket inside
/// a quoted word never opens a group. An unbalanced group runs to the end of
/// input so the literal parser can report it.
fn find_group(text: &str, open: char, close: char) -> Option<(usize, usize)> {
    let mut start = None;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            c if c == open => {
                start.get_or_insert(offset);
                depth += 1;
            }
            c if c == close && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|start| (start, offset + c.len_utf8()));
                }
            }
            _ => {}
        }
    }
    start.map(|start| (start, text.len()))
}

/// Shell-style word splitting.
///
/// Single quotes are literal, double quotes honor `\"` and `\\`, a
/// backslash outside quotes escapes the next character. `""` yields an
/// empty word.
pub fn split_words(text: &str) -> CommandResult<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(inner) => current.push(inner),
                        None => return Err(CommandError::UnterminatedQuote),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(CommandError::UnterminatedQuote),
                        },
                        Some(inner) => current.push(inner),
                        None => return Err(CommandError::UnterminatedQuote),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Decodes `create` parameters.
///
/// Returns accepted pairs and one diagnostic per rejected pair; a rejected
/// pair never stops the rest from being decoded.
pub fn parse_create_params(text: &str) -> (Vec<(String, AttrValue)>, Vec<FieldDiagnostic>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for raw in text.split_whitespace() {
        let raw = raw.trim_matches(',');
        if raw.is_empty() {
            continue;
        }
        let Some((key, value)) = raw.split_once('=') else {
            rejected.push(FieldDiagnostic::new(raw, "expected key=value"));
            continue;
        };
        if key.is_empty() {
            rejected.push(FieldDiagnostic::new(raw, "missing attribute name"));
            continue;
        }
        match decode_create_value(value) {
            Ok(value) => accepted.push((key.to_string(), value)),
            Err(reason) => rejected.push(FieldDiagnostic::new(key, reason)),
        }
    }
    (accepted, rejected)
}

/// `"quoted_text"` is a string with `_` as space and `\"` as `"`; anything
/// else must be a literal.
fn decode_create_value(value: &str) -> Result<AttrValue, String> {
    if let Some(inner) = value.strip_prefix('"') {
        let inner = inner
            .strip_suffix('"')
            .ok_or_else(|| format!("unterminated string `{value}`"))?;
        return Ok(AttrValue::Str(inner.replace("\\\"", "\"").replace('_', " ")));
    }
    if value.is_empty() {
        return Err("missing value".to_string());
    }
    parse_literal(value).map_err(|_| format!("malformed literal `{value}`"))
}

#[cfg(test)]
mod tests {
    use super::{parse_create_params, rewrite_dotted, split_args, split_words};
    use crate::model::value::AttrValue;
    use crate::shell::error::CommandError;

    #[test]
    fn rewrite_dotted_moves_verb_first() {
        assert_eq!(rewrite_dotted("User.all()").as_deref(), Some("all User"));
        assert_eq!(
            rewrite_dotted(r#"User.show("1234")"#).as_deref(),
            Some(r#"show User "1234""#)
        );
        assert_eq!(rewrite_dotted("User.fly()"), None);
        assert_eq!(rewrite_dotted("User.all"), None);
    }

    #[test]
    fn split_args_strips_commas_and_quotes() {
        let tokens = split_args(r#"User "38f2", "first_name", "John Doe""#)
            .expect("arguments should split");
        assert_eq!(tokens, vec!["User", "38f2", "first_name", "John Doe"]);
    }

    #[test]
    fn split_args_keeps_brace_group_whole() {
        let tokens = split_args(r#"User "38f2", {'first_name': "John", "age": 89}"#)
            .expect("arguments should split");
        assert_eq!(
            tokens,
            vec!["User", "38f2", r#"{'first_name': "John", "age": 89}"#]
        );
    }

    #[test]
    fn split_args_keeps_nested_braces_whole() {
        let tokens = split_args(r#"Place 1 {"meta": {"a": "}"}, "b": 2} tail"#)
            .expect("arguments should split");
        assert_eq!(tokens[2], r#"{"meta": {"a": "}"}, "b": 2}"#);
    }

    #[test]
    fn split_args_extracts_bracket_group_without_braces() {
        let tokens = split_args(r#"Place 1 amenity_ids ["a", "b"]"#)
            .expect("arguments should split");
        assert_eq!(tokens, vec!["Place", "1", "amenity_ids", r#"["a", "b"]"#]);
    }

    #[test]
    fn split_args_ignores_braces_and_brackets_inside_quotes() {
        let tokens = split_args(r#"User 38f2 first_name "a{b}""#)
            .expect("quoted brace is plain text");
        assert_eq!(tokens, vec!["User", "38f2", "first_name", "a{b}"]);

        let tokens = split_args(r#"User 38f2 last_name '[x]'"#)
            .expect("quoted bracket is plain text");
        assert_eq!(tokens, vec!["User", "38f2", "last_name", "[x]"]);

        let tokens =
            split_args(r#"User "x{" {"a": 1}"#).expect("group after a quoted brace is still found");
        assert_eq!(tokens, vec!["User", "x{", r#"{"a": 1}"#]);
    }

    #[test]
    fn split_words_reports_unterminated_quote() {
        assert!(matches!(
            split_words("User \"open"),
            Err(CommandError::UnterminatedQuote)
        ));
        assert_eq!(split_words(r#"a """#).expect("words should split"), vec!["a", ""]);
    }

    #[test]
    fn create_params_decode_strings_and_literals() {
        let (accepted, rejected) = parse_create_params(
            r#"name="My_little_house" number_rooms=4 latitude=37.77 quote="say_\"hi\"" bad=abc novalue"#,
        );
        assert_eq!(
            accepted,
            vec![
                ("name".to_string(), AttrValue::from("My little house")),
                ("number_rooms".to_string(), AttrValue::Int(4)),
                ("latitude".to_string(), AttrValue::Float(37.77)),
                ("quote".to_string(), AttrValue::from("say \"hi\"")),
            ]
        );
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].name, "bad");
        assert_eq!(rejected[1].name, "novalue");
    }
}

//! Literal parser for console values.
//!
//! Accepts quoted strings, integers, floats, `True`/`False`/`None`
//! (lowercase `true`/`false` too), `[...]` lists and `{...}` maps with
//! string or numeric keys. Trailing commas are allowed in containers.

use super::value::AttrValue;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Literal parse failure with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    pub position: usize,
    pub message: String,
}

impl Display for LiteralError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.message, self.position)
    }
}

impl Error for LiteralError {}

pub type LiteralResult<T> = Result<T, LiteralError>;

/// Parses one complete literal; trailing non-whitespace is an error.
pub fn parse_literal(input: &str) -> LiteralResult<AttrValue> {
    let mut parser = Parser { input, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos != input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Parses a `{...}` literal into its entries.
pub fn parse_mapping(input: &str) -> LiteralResult<BTreeMap<String, AttrValue>> {
    match parse_literal(input)? {
        AttrValue::Map(entries) => Ok(entries),
        other => Err(LiteralError {
            position: 0,
            message: format!("expected a mapping, got {}", other.type_name()),
        }),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect(&mut self, wanted: char) -> LiteralResult<()> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => Err(self.error(format!("expected `{wanted}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{wanted}`, found end of input"))),
        }
    }

    fn value(&mut self) -> LiteralResult<AttrValue> {
        self.skip_ws();
        match self.peek() {
            Some('\'') | Some('"') => self.string().map(AttrValue::Str),
            Some('[') => self.list(),
            Some('{') => self.map(),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected character `{c}`"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn string(&mut self) -> LiteralResult<String> {
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn number(&mut self) -> LiteralResult<AttrValue> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E' | '_')
        ) {
            self.bump();
        }
        let text: String = self.input[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if let Ok(number) = text.parse::<i64>() {
            return Ok(AttrValue::Int(number));
        }
        match text.parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(AttrValue::Float(number)),
            _ => Err(LiteralError {
                position: start,
                message: format!("invalid number `{text}`"),
            }),
        }
    }

    fn keyword(&mut self) -> LiteralResult<AttrValue> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.input[start..self.pos] {
            "True" | "true" => Ok(AttrValue::Bool(true)),
            "False" | "false" => Ok(AttrValue::Bool(false)),
            "None" | "null" => Ok(AttrValue::None),
            other => Err(LiteralError {
                position: start,
                message: format!("unknown name `{other}`"),
            }),
        }
    }

    fn list(&mut self) -> LiteralResult<AttrValue> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(AttrValue::List(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(AttrValue::List(items)),
                _ => return Err(self.error("expected `,` or `]` in list")),
            }
        }
    }

    fn map(&mut self) -> LiteralResult<AttrValue> {
        self.expect('{')?;
        let mut entries = BTreeMap::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(AttrValue::Map(entries));
            }
            let key = match self.value()? {
                AttrValue::Str(key) => key,
                AttrValue::Int(number) => number.to_string(),
                other => {
                    return Err(self.error(format!(
                        "mapping keys must be strings, got {}",
                        other.type_name()
                    )))
                }
            };
            self.expect(':')?;
            let value = self.value()?;
            entries.insert(key, value);
            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(AttrValue::Map(entries)),
                _ => return Err(self.error("expected `,` or `}` in mapping")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_literal, parse_mapping};
    use crate::model::value::AttrValue;

    #[test]
    fn parses_scalars() {
        assert_eq!(parse_literal("42"), Ok(AttrValue::Int(42)));
        assert_eq!(parse_literal("-3.5"), Ok(AttrValue::Float(-3.5)));
        assert_eq!(parse_literal("True"), Ok(AttrValue::Bool(true)));
        assert_eq!(parse_literal("None"), Ok(AttrValue::None));
        assert_eq!(
            parse_literal("'it\\'s'"),
            Ok(AttrValue::Str("it's".to_string()))
        );
    }

    #[test]
    fn parses_nested_mapping() {
        let entries =
            parse_mapping(r#"{"first_name": "John", 'age': 89, "tags": [1, 2.5,],}"#)
                .expect("mapping should parse");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["first_name"], AttrValue::from("John"));
        assert_eq!(entries["age"], AttrValue::Int(89));
        assert_eq!(
            entries["tags"],
            AttrValue::List(vec![AttrValue::Int(1), AttrValue::Float(2.5)])
        );
    }

    #[test]
    fn rejects_bare_words_and_trailing_input() {
        assert!(parse_literal("abc").is_err());
        assert!(parse_literal("1 2").is_err());
        assert!(parse_literal("{'a': }").is_err());
        assert!(parse_literal("'open").is_err());
        assert!(parse_mapping("[1]").is_err());
    }
}

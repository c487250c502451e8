//! Best-effort literal coercion for query-parameter values.
//!
//! A value is text unless it is unambiguously one of:
//! - an integer (`5`, `-12`, `+3`)
//! - a float (`0.5`, `1e-3`, `.5`, `2.`)
//! - a boolean (`true`, `false`, `True`, `False`)
//! - null (`null`, `None`)
//! - a quoted string (`'abc'`, `"abc"`)
//! - a list or tuple (`[1, 2]`, `(1, 2)`) or a dict (`{'a': 1}`)
//!
//! Coercion never fails: anything that does not parse completely is kept as
//! the original text.
//!
//! Surrounding whitespace is ignored (`" 5"` is `5`). Lowercase `true`,
//! `false` and `null` are accepted next to the `True`/`False`/`None`
//! spellings so JSON-style addresses coerce the same way; other casings
//! such as `TRUE` stay text.
//!
//! ```rust
//! use libdata_core::address::coerce_literal;
//! use serde_json::json;
//!
//! assert_eq!(coerce_literal("5"), json!(5));
//! assert_eq!(coerce_literal("False"), json!(false));
//! assert_eq!(coerce_literal("[1, 'a']"), json!([1, "a"]));
//! assert_eq!(coerce_literal("localhost"), json!("localhost"));
//! ```

use serde_json::{Map, Number, Value};

/// Maximum nesting accepted before giving up and keeping the text.
const MAX_DEPTH: usize = 64;

/// Coerce a literal to a typed value, falling back to text.
pub fn coerce_literal(text: &str) -> Value {
    let mut parser = LiteralParser::new(text);
    match parser.parse_complete() {
        Some(value) => value,
        None => Value::String(text.to_string()),
    }
}

/// Render a value as literal text that [`coerce_literal`] maps back to it.
pub fn render_literal(value: &Value) -> String {
    match value {
        Value::String(s) => {
            // Bare text only if it would not be coerced into something else.
            if coerce_literal(s) == *value {
                s.clone()
            } else {
                quote(s)
            }
        }
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(render_nested).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), render_nested(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn render_nested(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        other => render_literal(other),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    fn parse_complete(&mut self) -> Option<Value> {
        self.skip_ws();
        let value = self.parse_value()?;
        self.skip_ws();
        if self.pos == self.src.len() {
            Some(value)
        } else {
            None
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn parse_value(&mut self) -> Option<Value> {
        match self.peek()? {
            '[' => self.parse_sequence('[', ']'),
            '(' => self.parse_sequence('(', ')'),
            '{' => self.parse_dict(),
            '\'' | '"' => self.parse_string().map(Value::String),
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.parse_number(),
            _ => self.parse_keyword(),
        }
    }

    fn parse_keyword(&mut self) -> Option<Value> {
        let end = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        let word = &self.rest()[..end];
        let value = match word {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            "null" | "None" => Value::Null,
            _ => return None,
        };
        self.pos += end;
        Some(value)
    }

    fn parse_number(&mut self) -> Option<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut digits = 0;
        let mut is_float = false;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
            digits += 1;
        }
        if self.eat('.') {
            is_float = true;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
                digits += 1;
            }
        }
        if digits == 0 {
            return None;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('-' | '+')) {
                self.bump();
            }
            let mut exp_digits = 0;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
                exp_digits += 1;
            }
            if exp_digits == 0 {
                return None;
            }
        }

        let text = &self.src[start..self.pos];
        let text = text.strip_prefix('+').unwrap_or(text);
        if is_float {
            let f: f64 = text.parse().ok()?;
            Number::from_f64(f).map(Value::Number)
        } else if let Ok(i) = text.parse::<i64>() {
            Some(Value::Number(i.into()))
        } else {
            text.parse::<u64>().ok().map(|u| Value::Number(u.into()))
        }
    }

    fn parse_string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            match self.bump()? {
                c if c == quote => return Some(out),
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '0' => out.push('\0'),
                    'u' => {
                        let hex = self.rest().get(..4)?;
                        let code = u32::from_str_radix(hex, 16).ok()?;
                        out.push(char::from_u32(code)?);
                        self.pos += 4;
                    }
                    c @ ('\\' | '\'' | '"' | '/') => out.push(c),
                    _ => return None,
                },
                '\n' => return None,
                c => out.push(c),
            }
        }
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Option<Value> {
        self.enter()?;
        self.eat(open);
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                break;
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                break;
            }
            return None;
        }
        self.depth -= 1;
        Some(Value::Array(items))
    }

    fn parse_dict(&mut self) -> Option<Value> {
        self.enter()?;
        self.eat('{');
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            let key = match self.parse_value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            self.skip_ws();
            if !self.eat(':') {
                return None;
            }
            self.skip_ws();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return None;
        }
        self.depth -= 1;
        Some(Value::Object(map))
    }

    fn enter(&mut self) -> Option<()> {
        self.depth += 1;
        (self.depth <= MAX_DEPTH).then_some(())
    }
}

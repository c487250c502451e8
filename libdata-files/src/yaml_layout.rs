//! Block-style YAML with a chosen indentation and line width.
//!
//! `serde_yaml` always indents by two spaces and never folds long lines, so
//! the `indent` and `width` options of the directory writer go through this
//! emitter. Scalars are still rendered by `serde_yaml` when they fit on one
//! line; longer or multi-line strings become double-quoted scalars folded at
//! single spaces.

use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::options::DEFAULT_INDENT;

type EmitResult = Result<(), serde_yaml::Error>;

/// Output layout of a YAML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YamlLayout {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Preferred maximum line width.
    pub width: Option<usize>,
}

impl Default for YamlLayout {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            width: None,
        }
    }
}

impl YamlLayout {
    /// Whether this is plain `serde_yaml` output.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Render `doc` as one YAML document.
    pub fn render(&self, doc: &Value) -> Result<String, serde_yaml::Error> {
        if self.is_default() {
            return serde_yaml::to_string(doc);
        }
        let mut out = String::new();
        match doc {
            Value::Object(map) if !map.is_empty() => self.mapping(map, 0, false, &mut out)?,
            Value::Array(items) if !items.is_empty() => self.sequence(items, 0, false, &mut out)?,
            scalar => {
                self.scalar(scalar, 0, 0, &mut out)?;
                out.push('\n');
            }
        }
        Ok(out)
    }

    fn mapping(
        &self,
        map: &Map<String, Value>,
        indent: usize,
        inline_first: bool,
        out: &mut String,
    ) -> EmitResult {
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 || !inline_first {
                push_spaces(out, indent);
            }
            let key = match plain(&Value::String(key.clone()))? {
                text if text.contains('\n') => double_quoted(key),
                text => text,
            };
            out.push_str(&key);
            out.push(':');
            self.entry_value(value, indent, indent + key.chars().count() + 2, out)?;
        }
        Ok(())
    }

    fn sequence(&self, items: &[Value], indent: usize, inline_first: bool, out: &mut String) -> EmitResult {
        for (i, item) in items.iter().enumerate() {
            if i > 0 || !inline_first {
                push_spaces(out, indent);
            }
            out.push_str("- ");
            match item {
                Value::Object(map) if !map.is_empty() => self.mapping(map, indent + 2, true, out)?,
                Value::Array(inner) if !inner.is_empty() => {
                    self.sequence(inner, indent + 2, true, out)?
                }
                scalar => {
                    self.scalar(scalar, indent + 2, indent + 2, out)?;
                    out.push('\n');
                }
            }
        }
        Ok(())
    }

    fn entry_value(&self, value: &Value, indent: usize, column: usize, out: &mut String) -> EmitResult {
        let nested = indent + self.indent;
        match value {
            Value::Object(map) if !map.is_empty() => {
                out.push('\n');
                self.mapping(map, nested, false, out)
            }
            Value::Array(items) if !items.is_empty() => {
                out.push('\n');
                self.sequence(items, nested, false, out)
            }
            scalar => {
                out.push(' ');
                self.scalar(scalar, nested, column, out)?;
                out.push('\n');
                Ok(())
            }
        }
    }

    /// Write a scalar starting at `column`; folded lines start at `continuation`.
    fn scalar(&self, value: &Value, continuation: usize, column: usize, out: &mut String) -> EmitResult {
        let Value::String(s) = value else {
            out.push_str(&plain(value)?);
            return Ok(());
        };
        let fits = self
            .width
            .is_none_or(|width| column + s.chars().count() <= width);
        if fits && !s.contains('\n') {
            let text = plain(value)?;
            if !text.contains('\n') {
                out.push_str(&text);
                return Ok(());
            }
        }
        let quoted = double_quoted(s);
        match self.width {
            Some(width) => fold(&quoted, continuation, column, width, out),
            None => out.push_str(&quoted),
        }
        Ok(())
    }
}

fn plain(value: &Value) -> Result<String, serde_yaml::Error> {
    let text = serde_yaml::to_string(value)?;
    Ok(text.trim_end_matches('\n').to_string())
}

fn push_spaces(out: &mut String, n: usize) {
    out.extend(std::iter::repeat_n(' ', n));
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() || matches!(c, '\u{feff}' | '\u{fffe}' | '\u{ffff}') => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Break a double-quoted scalar at single spaces so lines stay within
/// `width` where possible. Each break folds back into one space on reading.
fn fold(quoted: &str, continuation: usize, column: usize, width: usize, out: &mut String) {
    let chars: Vec<char> = quoted.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;
    for i in 2..chars.len().saturating_sub(2) {
        let breakable = chars[i] == ' '
            && !matches!(chars[i - 1], ' ' | '\\')
            && chars[i + 1] != ' ';
        if breakable {
            pieces.push(&chars[start..i]);
            start = i + 1;
        }
    }
    pieces.push(&chars[start..]);

    let mut line = column;
    for (n, piece) in pieces.into_iter().enumerate() {
        if n > 0 {
            if line + 1 + piece.len() > width {
                out.push('\n');
                push_spaces(out, continuation);
                line = continuation;
            } else {
                out.push(' ');
                line += 1;
            }
        }
        out.extend(piece.iter());
        line += piece.len();
    }
}

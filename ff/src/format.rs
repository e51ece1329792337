//! Human-readable rendering of structured values
//!
//! Prettier than JSON: record keys are unquoted, strings are quoted, and
//! separators get a trailing space. Output is single-line by default, or
//! multiline with two-space indentation.

use std::fmt;

/// A structured value that can be rendered by [`format`]
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Seq(Vec<Shape>),
    /// Keyed record; entries render in insertion order
    Record(Vec<(String, Shape)>),
}

impl Shape {
    /// Starts an empty record, to be filled with [`Shape::field`]
    pub fn record() -> Self {
        Shape::Record(Vec::new())
    }

    /// Appends a field to a record; no-op on any other shape
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Shape>) -> Self {
        if let Shape::Record(entries) = &mut self {
            entries.push((key.into(), value.into()));
        }
        self
    }

    fn is_container(&self) -> bool {
        matches!(self, Shape::Seq(_) | Shape::Record(_))
    }
}

/// Renders the shape. Scalars render as themselves, strings are quoted.
pub fn format(shape: &Shape, multiline: bool) -> String {
    let mut out = String::new();
    write_shape(&mut out, shape, multiline, 0);
    out
}

/// Single-line rendering. Scalars render like string interpolation would
/// (strings unquoted); containers render through [`format`].
pub fn to_display_string(shape: &Shape) -> String {
    match shape {
        Shape::Str(s) => s.clone(),
        other => format(other, false),
    }
}

fn write_shape(out: &mut String, shape: &Shape, multiline: bool, indent: usize) {
    match shape {
        Shape::Null => out.push_str("null"),
        Shape::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Shape::Int(n) => out.push_str(&n.to_string()),
        Shape::Float(x) => out.push_str(&x.to_string()),
        Shape::Str(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Shape::Seq(items) => {
            let entries: Vec<(Option<&str>, &Shape)> = items.iter().map(|v| (None, v)).collect();
            write_container(out, ('[', ']'), &entries, multiline, indent);
        }
        Shape::Record(fields) => {
            let entries: Vec<(Option<&str>, &Shape)> = fields.iter().map(|(k, v)| (Some(k.as_str()), v)).collect();
            write_container(out, ('{', '}'), &entries, multiline, indent);
        }
    }
}

fn write_container(
    out: &mut String,
    (open, close): (char, char),
    entries: &[(Option<&str>, &Shape)],
    multiline: bool,
    indent: usize,
) {
    if entries.is_empty() {
        out.push(open);
        out.push(close);
        return;
    }

    let spaced = open == '{';
    out.push(open);
    if multiline {
        out.push('\n');
    } else if spaced {
        out.push(' ');
    }

    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(if multiline { ",\n" } else { ", " });
        }
        if multiline {
            out.push_str(&" ".repeat(indent + 2));
        }
        if let Some(key) = key {
            out.push_str(key);
            out.push_str(": ");
        }
        let child_indent = if value.is_container() { indent + 2 } else { indent };
        write_shape(out, value, multiline, child_indent);
    }

    if multiline {
        out.push('\n');
        out.push_str(&" ".repeat(indent));
    } else if spaced {
        out.push(' ');
    }
    out.push(close);
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self, f.alternate()))
    }
}

impl From<bool> for Shape {
    fn from(value: bool) -> Self {
        Shape::Bool(value)
    }
}

impl From<i64> for Shape {
    fn from(value: i64) -> Self {
        Shape::Int(value.into())
    }
}

impl From<u64> for Shape {
    fn from(value: u64) -> Self {
        Shape::Int(value.into())
    }
}

impl From<u32> for Shape {
    fn from(value: u32) -> Self {
        Shape::Int(value.into())
    }
}

impl From<f64> for Shape {
    fn from(value: f64) -> Self {
        Shape::Float(value)
    }
}

impl From<&str> for Shape {
    fn from(value: &str) -> Self {
        Shape::Str(value.to_string())
    }
}

impl From<String> for Shape {
    fn from(value: String) -> Self {
        Shape::Str(value)
    }
}

impl<T: Into<Shape>> From<Option<T>> for Shape {
    fn from(value: Option<T>) -> Self {
        value.map_or(Shape::Null, Into::into)
    }
}

impl<T: Into<Shape>> From<Vec<T>> for Shape {
    fn from(value: Vec<T>) -> Self {
        Shape::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Shape {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Shape::Null,
            Value::Bool(b) => Shape::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Shape::Int(i.into()),
                (None, Some(u)) => Shape::Int(u.into()),
                _ => Shape::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Shape::Str(s),
            Value::Array(items) => Shape::Seq(items.into_iter().map(Shape::from).collect()),
            Value::Object(map) => Shape::Record(map.into_iter().map(|(k, v)| (k, Shape::from(v))).collect()),
        }
    }
}

//! core::naming
//!
//! Item naming rules.
//!
//! # Features
//!
//! - Derive item directory names from an item format template
//! - Generate fresh, time-ordered unique names when no template is set
//!
//! # Template Syntax
//!
//! Templates follow the familiar `str.format` shape, restricted to keyword
//! placeholders:
//!
//! - `{key}` substitutes the metadata value of `key`
//! - `{key:Nd}` / `{key:0Nd}` right-aligns / zero-pads an integer to width N
//! - `{key:.Nf}` renders a number with N decimals
//! - `{{` and `}}` produce literal braces
//!
//! A referenced key that is absent from the metadata is an error; it is
//! never defaulted.
//!
//! # Example
//!
//! ```
//! use jbof::core::naming::ItemFormat;
//! use serde_json::json;
//!
//! let format = ItemFormat::parse("{speaker}-{take:03d}").unwrap();
//! let metadata = json!({"speaker": "ann", "take": 7});
//! let name = format.render(metadata.as_object().unwrap()).unwrap();
//! assert_eq!(name, "ann-007");
//! ```

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::core::metadata::Metadata;

/// Errors from template parsing and rendering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    /// The template references a key the metadata does not have.
    #[error("missing metadata key '{0}'")]
    MissingKey(String),

    /// The template could not be parsed, or a value does not fit its
    /// format spec.
    #[error("{0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Spec {
    Plain,
    Integer { width: usize, zero_pad: bool },
    Fixed { precision: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { key: String, spec: Spec },
}

/// A parsed item format template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFormat {
    template: String,
    segments: Vec<Segment>,
}

impl ItemFormat {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns `NamingError::Malformed` if braces are unbalanced, a
    /// placeholder is positional or uses attribute/index/conversion syntax,
    /// a format spec is not supported, or the template has no placeholder
    /// at all (every item would get the same name).
    pub fn parse(template: &str) -> Result<Self, NamingError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        if c == '{' {
                            return Err(NamingError::Malformed(format!(
                                "nested '{{' in template '{}'",
                                template
                            )));
                        }
                        field.push(c);
                    }
                    if !closed {
                        return Err(NamingError::Malformed(format!(
                            "unclosed '{{' in template '{}'",
                            template
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_field(&field)?);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(NamingError::Malformed(format!(
                        "single '}}' in template '{}'",
                        template
                    )));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.iter().any(|s| matches!(s, Segment::Field { .. })) {
            return Err(NamingError::Malformed(format!(
                "template '{}' has no {{placeholder}}",
                template
            )));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Metadata keys referenced by the template, in order of appearance.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field { key, .. } => Some(key.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template against `metadata`.
    ///
    /// Rendering is a pure function of the template and the referenced
    /// values.
    ///
    /// # Errors
    ///
    /// - [`NamingError::MissingKey`] if a referenced key is absent
    /// - [`NamingError::Malformed`] if a value does not fit its format spec
    pub fn render(&self, metadata: &Metadata) -> Result<String, NamingError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { key, spec } => {
                    let value = metadata
                        .get(key)
                        .ok_or_else(|| NamingError::MissingKey(key.clone()))?;
                    out.push_str(&render_value(key, value, spec)?);
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for ItemFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template)
    }
}

/// Generate a fresh item name.
///
/// Names are UUID v7: time-ordered, with enough randomness to be unique in
/// practice without consulting the metadata.
pub fn fresh_item_name() -> String {
    Uuid::now_v7().to_string()
}

/// Resolve the name of a new item from the dataset's template.
///
/// With a template the name is rendered from `metadata`; without one a
/// fresh identifier is generated.
pub fn item_name(format: Option<&ItemFormat>, metadata: &Metadata) -> Result<String, NamingError> {
    match format {
        Some(format) => format.render(metadata),
        None => Ok(fresh_item_name()),
    }
}

fn parse_field(field: &str) -> Result<Segment, NamingError> {
    let (key, spec) = match field.split_once(':') {
        Some((key, spec)) => (key, spec),
        None => (field, ""),
    };
    if key.is_empty() {
        return Err(NamingError::Malformed(
            "positional placeholders are not supported, name a metadata key".into(),
        ));
    }
    if key.contains(['.', '[', ']', '!']) {
        return Err(NamingError::Malformed(format!(
            "placeholder '{}' uses attribute, index or conversion syntax",
            key
        )));
    }
    Ok(Segment::Field {
        key: key.to_string(),
        spec: parse_spec(spec)?,
    })
}

fn parse_spec(spec: &str) -> Result<Spec, NamingError> {
    let unsupported = || NamingError::Malformed(format!("unsupported format spec ':{}'", spec));

    if spec.is_empty() {
        return Ok(Spec::Plain);
    }
    if let Some(precision) = spec.strip_prefix('.').and_then(|s| s.strip_suffix('f')) {
        let precision = precision.parse().map_err(|_| unsupported())?;
        return Ok(Spec::Fixed { precision });
    }
    if let Some(width) = spec.strip_suffix('d') {
        if width.is_empty() {
            return Ok(Spec::Integer {
                width: 0,
                zero_pad: false,
            });
        }
        let zero_pad = width.len() > 1 && width.starts_with('0');
        let width = width.parse().map_err(|_| unsupported())?;
        return Ok(Spec::Integer { width, zero_pad });
    }
    Err(unsupported())
}

fn render_value(key: &str, value: &Value, spec: &Spec) -> Result<String, NamingError> {
    match spec {
        Spec::Plain => Ok(render_plain(value)),
        Spec::Integer { width, zero_pad } => {
            let n = value.as_i64().ok_or_else(|| {
                NamingError::Malformed(format!("'{}' must be an integer, got {}", key, value))
            })?;
            Ok(if *zero_pad {
                format!("{:0width$}", n, width = *width)
            } else {
                format!("{:>width$}", n, width = *width)
            })
        }
        Spec::Fixed { precision } => {
            let f = value.as_f64().ok_or_else(|| {
                NamingError::Malformed(format!("'{}' must be a number, got {}", key, value))
            })?;
            Ok(format!("{:.precision$}", f, precision = *precision))
        }
    }
}

// Scalars render the way existing datasets spell them in item names.
fn render_plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

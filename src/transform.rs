//! Closed transform expressions for identifiers and property values
//!
//! A transform is written in the config as a template string such as
//! `"{config:document_url_prefix}{value}"` and parsed once, at load time,
//! into a list of [`Segment`]s. Evaluation only ever concatenates segment
//! values, so a config file can derive identifiers and rewrite values but
//! cannot run arbitrary code.
//!
//! Placeholders:
//!
//! - `{value}` - raw text of the property being set (value transforms only)
//! - `{config:KEY}` - a configuration value
//! - `{attr:QNAME}` - an attribute of the element
//! - `{prop:NAME}` - the last property child with that name
//! - `{name}` - the element's local name
//! - `{counter}` - the element's per-name occurrence number
//! - `{random}` - a freshly generated ULID
//!
//! `{{` and `}}` produce literal braces.

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::Config;
use crate::entity::Entity;
use crate::error::ConvertError;

/// One piece of a transform template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, copied as-is
    Text(String),
    /// The raw property value
    Value,
    /// A configuration value looked up by key
    Config(String),
    /// An attribute of the element, by qualified name
    Attribute(String),
    /// The value of the last property child with this name
    Property(String),
    /// The element's local name
    Name,
    /// The element's per-name occurrence number
    Counter,
    /// A new ULID on every evaluation
    Random,
}

/// A parsed transform template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Transform {
    source: String,
    segments: Vec<Segment>,
}

impl Transform {
    /// Parse a template string
    pub fn parse(template: &str) -> Result<Self, ConvertError> {
        Ok(Transform {
            source: template.to_string(),
            segments: parse_segments(template)?,
        })
    }

    /// Whether the template refers to `{value}`
    pub fn uses_value(&self) -> bool {
        self.segments.iter().any(|s| *s == Segment::Value)
    }

    /// Evaluate the template for an entity
    ///
    /// `value` is the raw property text when transforming a property
    /// value, and `None` when deriving an identifier.
    pub fn evaluate(
        &self,
        entity: &Entity,
        value: Option<&str>,
        config: &Config,
    ) -> Result<String, ConvertError> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Value => match value {
                    Some(v) => out.push_str(v),
                    None => {
                        return Err(ConvertError::transform(
                            entity.name(),
                            "{value} is only available in value transforms",
                        ))
                    }
                },
                Segment::Config(key) => match config.lookup(key) {
                    Some(v) => out.push_str(&v),
                    None => {
                        return Err(ConvertError::transform(
                            entity.name(),
                            format!("no config value '{}'", key),
                        ))
                    }
                },
                Segment::Attribute(qname) => match entity.attribute(qname) {
                    Some(v) => out.push_str(v),
                    None => {
                        return Err(ConvertError::transform(
                            entity.name(),
                            format!("missing attribute '{}'", qname),
                        ))
                    }
                },
                Segment::Property(name) => match entity.property_value(name) {
                    Some(v) => out.push_str(v),
                    None => {
                        return Err(ConvertError::transform(
                            entity.name(),
                            format!("missing property '{}'", name),
                        ))
                    }
                },
                Segment::Name => out.push_str(entity.name()),
                Segment::Counter => out.push_str(&entity.counter().to_string()),
                Segment::Random => out.push_str(&Ulid::new().to_string()),
            }
        }

        Ok(out)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for Transform {
    type Error = ConvertError;

    fn try_from(template: String) -> Result<Self, Self::Error> {
        let segments = parse_segments(&template)?;
        Ok(Transform {
            source: template,
            segments,
        })
    }
}

impl From<Transform> for String {
    fn from(transform: Transform) -> Self {
        transform.source
    }
}

fn parse_segments(template: &str) -> Result<Vec<Segment>, ConvertError> {
    let invalid = |reason: &str| ConvertError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '}' => return Err(invalid("unmatched '}'")),
            '{' => {
                let mut placeholder = String::new();
                let mut closed = false;
                for p in chars.by_ref() {
                    if p == '}' {
                        closed = true;
                        break;
                    }
                    placeholder.push(p);
                }
                if !closed {
                    return Err(invalid("unclosed '{'"));
                }

                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(parse_placeholder(placeholder.trim()).map_err(|r| invalid(&r))?);
            }
            c => text.push(c),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    Ok(segments)
}

fn parse_placeholder(placeholder: &str) -> Result<Segment, String> {
    if let Some((kind, arg)) = placeholder.split_once(':') {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(format!("'{{{}}}' needs a name after ':'", placeholder));
        }
        return match kind.trim() {
            "config" => Ok(Segment::Config(arg.to_string())),
            "attr" => Ok(Segment::Attribute(arg.to_string())),
            "prop" => Ok(Segment::Property(arg.to_string())),
            other => Err(format!("unknown placeholder kind '{}'", other)),
        };
    }

    match placeholder {
        "value" => Ok(Segment::Value),
        "name" => Ok(Segment::Name),
        "counter" => Ok(Segment::Counter),
        "random" => Ok(Segment::Random),
        other => Err(format!("unknown placeholder '{{{}}}'", other)),
    }
}

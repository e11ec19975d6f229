//! Identifier and subject resolution for resource entities
//!
//! Resolution order, first match wins:
//!
//! 1. `id: null` in the element's rule: no identifier (blank node)
//! 2. an `id-transform`: its result is the identifier
//! 3. identifier candidates, the element's own then the global `ids`:
//!    `@name` reads an attribute, anything else the last property child
//!    with that name; the first non-empty value wins
//! 4. nothing matched: no identifier (blank node)

use crate::config::Config;
use crate::entity::Entity;
use crate::error::ConvertError;
use crate::escape::escape_iri;
use crate::vocab::ATTRIBUTE_MARKER;

/// The frozen identity of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// `None` for blank nodes
    pub identifier: Option<String>,
    /// `<iri>` or `_:label`, ready to be written as an NTriples subject
    pub subject: String,
    /// Qualified name of the attribute the identifier was read from
    pub id_attribute: Option<String>,
}

impl Identity {
    pub fn is_blank(&self) -> bool {
        self.identifier.is_none()
    }
}

/// Work out identifier and subject for an entity
///
/// Callers should go through [`Entity::identity`], which caches the result.
pub fn resolve_identity(entity: &Entity, config: &Config) -> Result<Identity, ConvertError> {
    let (identifier, id_attribute) = resolve_identifier(entity, config)?;

    let subject = match &identifier {
        None => format!("_:{}", entity.numbered_id()),
        Some(id) => {
            let prefix = entity
                .rule(config)
                .and_then(|r| r.subject_prefix.as_deref())
                .unwrap_or(&config.subject_prefix);
            format!("<{}{}>", escape_iri(prefix), escape_iri(id))
        }
    };

    Ok(Identity {
        identifier,
        subject,
        id_attribute,
    })
}

fn resolve_identifier(
    entity: &Entity,
    config: &Config,
) -> Result<(Option<String>, Option<String>), ConvertError> {
    let rule = entity.rule(config);

    if rule.is_some_and(|r| r.is_blank_node()) {
        return Ok((None, None));
    }

    if let Some(transform) = rule.and_then(|r| r.id_transform.as_ref()) {
        let id = transform.evaluate(entity, None, config)?;
        return Ok(((!id.is_empty()).then_some(id), None));
    }

    for candidate in config.id_candidates(entity.name()) {
        if let Some(attr) = candidate.strip_prefix(ATTRIBUTE_MARKER) {
            if let Some(value) = entity.attribute(attr).filter(|v| !v.is_empty()) {
                return Ok((Some(value.to_string()), Some(attr.to_string())));
            }
        } else if let Some(value) = entity.property_value(candidate).filter(|v| !v.is_empty()) {
            return Ok((Some(value.to_string()), None));
        }
    }

    Ok((None, None))
}

/// Name of the output file for a resource
///
/// `<root identifier or "root">-<identifier or name-N>.nt`, sanitized so
/// that it is safe as a single path component.
pub fn output_file_name(root_identifier: Option<&str>, entity: &Entity, identity: &Identity) -> String {
    let resource = match &identity.identifier {
        Some(id) => id.clone(),
        None => entity.numbered_id(),
    };
    format!(
        "{}-{}.nt",
        sanitize_file_component(root_identifier.unwrap_or("root")),
        sanitize_file_component(&resource)
    )
}

/// Fallback file name for a resource whose [`output_file_name`] is taken
///
/// Appends the resource's `<name>-<counter>`, which is unique within a
/// document run: `<root>-<identifier>-<name>-<counter>.nt`.
pub fn numbered_file_name(root_identifier: Option<&str>, entity: &Entity, identity: &Identity) -> String {
    let base = output_file_name(root_identifier, entity, identity);
    let stem = base.strip_suffix(".nt").unwrap_or(&base);
    format!("{}-{}.nt", stem, sanitize_file_component(&entity.numbered_id()))
}

/// Replace everything except ASCII alphanumerics, `.`, `-` and `_` with `_`
pub fn sanitize_file_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Never produce "." or ".." as a component
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}

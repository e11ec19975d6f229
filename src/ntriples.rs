//! NTriples serialization of resource entities
//!
//! Statements for one resource come out in a fixed order so that output
//! is reproducible:
//!
//! 1. `rdf:type`
//! 2. one literal per XML attribute
//! 3. the link to the parent (named resources only)
//! 4. per retained child, in document order: property statements, or a
//!    link to a blank-node child followed by that child's own statements
//!
//! Named child resources are written as their own output units when they
//! close, so they never appear here beyond the links they made themselves.

use crate::config::Config;
use crate::entity::{Attribute, Entity};
use crate::error::ConvertError;
use crate::escape::{escape_iri, escape_literal};
use crate::vocab::{datatype_iri, RDF_TYPE};

/// Serialized statements for one output unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NTriplesDocument {
    pub text: String,
    pub triples: usize,
}

/// Serialize a resource, inlining its blank-node descendants
pub fn serialize_resource(
    entity: &Entity,
    parent: Option<&Entity>,
    config: &Config,
) -> Result<NTriplesDocument, ConvertError> {
    let mut writer = NTriplesWriter::new(config);
    writer.write_resource(entity, parent)?;
    Ok(writer.finish())
}

struct NTriplesWriter<'a> {
    config: &'a Config,
    doc: NTriplesDocument,
}

impl<'a> NTriplesWriter<'a> {
    fn new(config: &'a Config) -> Self {
        NTriplesWriter {
            config,
            doc: NTriplesDocument::default(),
        }
    }

    fn finish(self) -> NTriplesDocument {
        self.doc
    }

    fn statement(&mut self, subject: &str, predicate: &str, object: &str) {
        self.doc.text.push_str(subject);
        self.doc.text.push_str(" <");
        self.doc.text.push_str(&escape_iri(predicate));
        self.doc.text.push_str("> ");
        self.doc.text.push_str(object);
        self.doc.text.push_str(".\n");
        self.doc.triples += 1;
    }

    fn literal(&mut self, subject: &str, predicate: &str, value: &str, suffix: &str) {
        let object = format!("\"{}\"{}", escape_literal(value), suffix);
        self.statement(subject, predicate, &object);
    }

    fn write_resource(&mut self, entity: &Entity, parent: Option<&Entity>) -> Result<(), ConvertError> {
        let config = self.config;
        let identity = entity.identity(config)?;
        let subject = identity.subject.as_str();

        let type_iri = format!("<{}>", escape_iri(&entity.type_iri(config)));
        self.statement(subject, RDF_TYPE, &type_iri);

        for attr in entity.attributes() {
            if attr.is_xsi_type() || identity.id_attribute.as_deref() == Some(attr.qname.as_str()) {
                continue;
            }
            let predicate = attribute_predicate(attr, config);
            self.literal(subject, &predicate, &attr.value, "");
        }

        if !identity.is_blank() {
            if let Some(parent) = parent {
                let parent_subject = parent.subject(config)?;
                self.statement(subject, &parent.predicate(config), parent_subject);
            }
        }

        for child in entity.children() {
            if child.is_property() {
                self.write_property(subject, child);
            } else if child.is_blank_node(config)? {
                let child_subject = child.subject(config)?;
                self.statement(subject, &child.predicate(config), child_subject);
                self.write_resource(child, Some(entity))?;
            }
        }

        Ok(())
    }

    fn write_property(&mut self, subject: &str, property: &Entity) {
        let config = self.config;
        let predicate = property.predicate(config);
        let value = property.value().unwrap_or_default();

        if property.is_literal(config) {
            // A literal cannot carry both a language tag and a datatype
            let suffix = match (property.language(config), property.datatype(config)) {
                (Some(lang), _) => format!("@{}", lang),
                (None, Some(datatype)) => format!("^^<{}>", escape_iri(&datatype_iri(datatype))),
                (None, None) => String::new(),
            };
            self.literal(subject, &predicate, value, &suffix);
        } else {
            let object = format!("<{}>", escape_iri(value));
            self.statement(subject, &predicate, &object);
        }

        for attr in property.attributes() {
            if attr.is_xsi_type() {
                continue;
            }
            let attr_predicate = format!("{}-{}", predicate, attr.local_name);
            self.literal(subject, &attr_predicate, &attr.value, "");
        }
    }
}

/// `<namespace>/<local>` for namespaced attributes, else the global type prefix
fn attribute_predicate(attr: &Attribute, config: &Config) -> String {
    match attr.namespace.as_deref() {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, attr.local_name),
        _ => format!("{}{}", config.type_prefix, attr.local_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElementRule;
    use crate::entity::ElementName;
    use crate::transform::Transform;

    const PREFIX: &str = "http://www.arkivverket.no/standarder/noark5/arkivstruktur/";

    fn property(name: &str, value: &str) -> Entity {
        let mut e = Entity::new(ElementName::new(name, None), vec![], 1);
        e.set_value(value.to_string());
        e
    }

    fn lines(doc: &NTriplesDocument) -> Vec<&str> {
        doc.text.lines().collect()
    }

    #[test]
    fn test_simple_resource() {
        let config = Config::default();
        let mut arkiv = Entity::new(ElementName::new("arkiv", None), vec![], 1);
        arkiv.add_child(property("systemID", "X1"));

        let doc = serialize_resource(&arkiv, None, &config).unwrap();
        assert_eq!(
            lines(&doc),
            vec![
                format!("<http://sesam.io/sys1/X1> <{}> <{}Arkiv>.", RDF_TYPE, PREFIX),
                format!("<http://sesam.io/sys1/X1> <{}systemID> \"X1\".", PREFIX),
            ]
        );
        assert_eq!(doc.triples, 2);
    }

    #[test]
    fn test_attributes_and_parent_link() {
        let config = Config::default();
        let mut parent = Entity::new(ElementName::new("arkiv", None), vec![], 1);
        parent.add_child(property("systemID", "A"));

        let attrs = vec![
            Attribute::new("status", None, "status", "aktiv"),
            Attribute::new("x:note", Some("http://example.org/x"), "note", "say \"hi\""),
        ];
        let mut child = Entity::new(ElementName::new("arkivdel", None), attrs, 1);
        child.add_child(property("systemID", "D"));

        let doc = serialize_resource(&child, Some(&parent), &config).unwrap();
        let out = lines(&doc);
        assert_eq!(out[0], format!("<http://sesam.io/sys1/D> <{}> <{}Arkivdel>.", RDF_TYPE, PREFIX));
        assert_eq!(out[1], format!("<http://sesam.io/sys1/D> <{}status> \"aktiv\".", PREFIX));
        assert_eq!(
            out[2],
            "<http://sesam.io/sys1/D> <http://example.org/x/note> \"say \\\"hi\\\"\"."
        );
        assert_eq!(
            out[3],
            format!("<http://sesam.io/sys1/D> <{}arkiv> <http://sesam.io/sys1/A>.", PREFIX)
        );
        assert_eq!(out[4], format!("<http://sesam.io/sys1/D> <{}systemID> \"D\".", PREFIX));
    }

    #[test]
    fn test_identifier_attribute_not_repeated() {
        let mut config = Config::default();
        config.ids = vec!["@id".to_string()];
        let mut e = Entity::new(
            ElementName::new("mappe", None),
            vec![Attribute::new("id", None, "id", "M1")],
            1,
        );
        e.add_child(property("tittel", "T"));

        let doc = serialize_resource(&e, None, &config).unwrap();
        assert!(!doc.text.contains("\"M1\""));
        assert!(doc.text.starts_with("<http://sesam.io/sys1/M1> "));
    }

    #[test]
    fn test_blank_child_inlined() {
        let mut config = Config::default();
        config
            .object_elements
            .insert("skjerming".to_string(), ElementRule::blank_node());

        let mut skjerming = Entity::new(ElementName::new("skjerming", None), vec![], 1);
        skjerming.add_child(property("tilgangsrestriksjon", "UO"));

        let mut mappe = Entity::new(ElementName::new("mappe", None), vec![], 1);
        mappe.add_child(property("systemID", "M"));
        mappe.add_child(skjerming);

        let doc = serialize_resource(&mappe, None, &config).unwrap();
        assert_eq!(
            lines(&doc),
            vec![
                format!("<http://sesam.io/sys1/M> <{}> <{}Mappe>.", RDF_TYPE, PREFIX),
                format!("<http://sesam.io/sys1/M> <{}systemID> \"M\".", PREFIX),
                format!("<http://sesam.io/sys1/M> <{}skjerming> _:skjerming-1.", PREFIX),
                format!("_:skjerming-1 <{}> <{}Skjerming>.", RDF_TYPE, PREFIX),
                format!("_:skjerming-1 <{}tilgangsrestriksjon> \"UO\".", PREFIX),
            ]
        );
    }

    #[test]
    fn test_language_datatype_and_reference() {
        let mut config = Config::default();
        config.object_elements.insert(
            "tittel".to_string(),
            ElementRule {
                language: Some("nb".to_string()),
                datatype: Some("string".to_string()),
                ..Default::default()
            },
        );
        config.object_elements.insert(
            "opprettetDato".to_string(),
            ElementRule {
                datatype: Some("dateTime".to_string()),
                ..Default::default()
            },
        );
        config.extra.insert(
            "document_url_prefix".to_string(),
            serde_yaml::Value::String("http://localhost:8080/someservice/".to_string()),
        );
        config.object_elements.insert(
            "referanseDokumentfil".to_string(),
            ElementRule {
                literal: Some(false),
                value_transform: Some(Transform::parse("{config:document_url_prefix}{value}").unwrap()),
                ..Default::default()
            },
        );

        let mut reference = Entity::new(ElementName::new("referanseDokumentfil", None), vec![], 1);
        reference.push_text("dokumenter/a.pdf");
        reference.finish_property(&config).unwrap();

        let mut e = Entity::new(ElementName::new("dokumentobjekt", None), vec![], 1);
        e.add_child(property("systemID", "D"));
        e.add_child(property("tittel", "Søknad"));
        e.add_child(property("opprettetDato", "2016-01-01T00:00:00"));
        e.add_child(reference);

        let doc = serialize_resource(&e, None, &config).unwrap();
        let out = lines(&doc);
        assert_eq!(out[2], format!("<http://sesam.io/sys1/D> <{}tittel> \"S\\u00F8knad\"@nb.", PREFIX));
        assert_eq!(
            out[3],
            format!(
                "<http://sesam.io/sys1/D> <{}opprettetDato> \"2016-01-01T00:00:00\"^^<http://www.w3.org/2001/XMLSchema#dateTime>.",
                PREFIX
            )
        );
        assert_eq!(
            out[4],
            format!(
                "<http://sesam.io/sys1/D> <{}referanseDokumentfil> <http://localhost:8080/someservice/dokumenter/a.pdf>.",
                PREFIX
            )
        );
    }

    #[test]
    fn test_property_attributes_expand() {
        let config = Config::default();
        let mut prop = Entity::new(
            ElementName::new("merknadstekst", None),
            vec![Attribute::new("sprak", None, "sprak", "nn")],
            1,
        );
        prop.set_value("tekst".to_string());

        let mut e = Entity::new(ElementName::new("merknad", None), vec![], 1);
        e.add_child(property("systemID", "K"));
        e.add_child(prop);

        let doc = serialize_resource(&e, None, &config).unwrap();
        let out = lines(&doc);
        assert_eq!(out[2], format!("<http://sesam.io/sys1/K> <{}merknadstekst> \"tekst\".", PREFIX));
        assert_eq!(out[3], format!("<http://sesam.io/sys1/K> <{}merknadstekst-sprak> \"nn\".", PREFIX));
    }
}

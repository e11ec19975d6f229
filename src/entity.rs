//! Entity nodes built from XML elements
//!
//! Every element becomes an [`Entity`]. Once its end tag has been seen an
//! entity is either a *property* (no child elements, the text is its
//! value) or a *resource* (at least one child element). Identity and type
//! information are resolved lazily and frozen on first use: a child may
//! already have written a statement pointing at its parent's subject, so
//! the answer must never change afterwards.

use std::cell::OnceCell;

use crate::config::{Config, ElementRule};
use crate::error::ConvertError;
use crate::id::{resolve_identity, Identity};
use crate::vocab::{XSI_NS, XSI_TYPE};

/// Namespace-qualified element name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementName {
    pub local: String,
    pub namespace: Option<String>,
}

impl ElementName {
    pub fn new(local: impl Into<String>, namespace: Option<&str>) -> Self {
        ElementName {
            local: local.into(),
            namespace: namespace.map(String::from),
        }
    }
}

/// An XML attribute as it appeared on the element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name as written (`xsi:type`, `id`)
    pub qname: String,
    pub namespace: Option<String>,
    pub local_name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(qname: &str, namespace: Option<&str>, local_name: &str, value: &str) -> Self {
        Attribute {
            qname: qname.to_string(),
            namespace: namespace.map(String::from),
            local_name: local_name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_xsi_type(&self) -> bool {
        self.namespace.as_deref() == Some(XSI_NS) && self.local_name == XSI_TYPE
    }
}

/// Resolved type name and the prefix it lives under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Type name before casing (element name, `xsi:type` or override)
    pub name: String,
    /// Namespace, always ending in `/`
    pub prefix: String,
}

#[derive(Debug)]
pub struct Entity {
    name: ElementName,
    attributes: Vec<Attribute>,
    /// Retained children: properties and blank-node resources
    children: Vec<Entity>,
    /// All child elements seen, including named resources already written out
    child_count: usize,
    text: String,
    value: Option<String>,
    counter: usize,
    identity: OnceCell<Identity>,
    type_info: OnceCell<TypeInfo>,
}

impl Entity {
    /// Create an entity; `counter` is the 1-based occurrence of its name in the run
    pub fn new(name: ElementName, attributes: Vec<Attribute>, counter: usize) -> Self {
        Entity {
            name,
            attributes,
            children: Vec::new(),
            child_count: 0,
            text: String::new(),
            value: None,
            counter,
            identity: OnceCell::new(),
            type_info: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    /// `<name>-<counter>`, the label used for blank nodes
    pub fn numbered_id(&self) -> String {
        format!("{}-{}", self.name.local, self.counter)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute value by qualified name
    pub fn attribute(&self, qname: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.qname == qname)
            .map(|a| a.value.as_str())
    }

    pub fn xsi_type(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.is_xsi_type())
            .map(|a| a.value.as_str())
    }

    /// Append character data; text may arrive in several chunks
    ///
    /// Text of a resource is never used, so nothing is kept once the first
    /// child element has been seen.
    pub fn push_text(&mut self, text: &str) {
        if self.child_count == 0 {
            self.text.push_str(text);
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attach a closed child that must stay around until this entity is written
    pub fn add_child(&mut self, child: Entity) {
        self.note_child();
        self.children.push(child);
    }

    /// Record a child that was written out and dropped on its own
    pub fn note_child(&mut self) {
        if self.child_count == 0 {
            self.text = String::new();
        }
        self.child_count += 1;
    }

    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    pub fn is_property(&self) -> bool {
        self.child_count == 0
    }

    pub fn is_resource(&self) -> bool {
        !self.is_property()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: String) {
        self.value = Some(value);
    }

    /// Turn the accumulated text into the property value
    ///
    /// The raw text is kept as-is; a configured value transform is applied
    /// to it first.
    pub fn finish_property(&mut self, config: &Config) -> Result<(), ConvertError> {
        let text = std::mem::take(&mut self.text);
        let value = match self.rule(config).and_then(|r| r.value_transform.as_ref()) {
            Some(transform) => transform.evaluate(self, Some(&text), config)?,
            None => text,
        };
        self.value = Some(value);
        Ok(())
    }

    /// Value of the last property child with the given name
    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .rev()
            .filter(|c| c.is_property() && c.name() == name)
            .find_map(|c| c.value())
    }

    pub fn rule<'c>(&self, config: &'c Config) -> Option<&'c ElementRule> {
        config.rule(&self.name.local)
    }

    /// The resolved identity, computed on first call and frozen afterwards
    pub fn identity(&self, config: &Config) -> Result<&Identity, ConvertError> {
        if let Some(identity) = self.identity.get() {
            return Ok(identity);
        }
        let identity = resolve_identity(self, config)?;
        Ok(self.identity.get_or_init(|| identity))
    }

    pub fn subject(&self, config: &Config) -> Result<&str, ConvertError> {
        Ok(&self.identity(config)?.subject)
    }

    /// A resource without an identifier
    pub fn is_blank_node(&self, config: &Config) -> Result<bool, ConvertError> {
        Ok(self.is_resource() && self.identity(config)?.is_blank())
    }

    pub fn type_info(&self, config: &Config) -> &TypeInfo {
        self.type_info.get_or_init(|| self.resolve_type(config))
    }

    /// IRI used as the object of the `rdf:type` statement
    pub fn type_iri(&self, config: &Config) -> String {
        let info = self.type_info(config);
        format!("{}{}", info.prefix, config.type_case.apply(&info.name))
    }

    /// Predicate used when another entity refers to this one
    pub fn predicate(&self, config: &Config) -> String {
        let info = self.type_info(config);
        format!("{}{}", info.prefix, info.name)
    }

    pub fn is_literal(&self, config: &Config) -> bool {
        self.rule(config).and_then(|r| r.literal).unwrap_or(true)
    }

    pub fn datatype<'c>(&self, config: &'c Config) -> Option<&'c str> {
        if !self.is_literal(config) {
            return None;
        }
        self.rule(config)
            .and_then(|r| r.datatype.as_deref())
            .filter(|d| !d.is_empty())
    }

    pub fn language<'c>(&self, config: &'c Config) -> Option<&'c str> {
        if !self.is_literal(config) {
            return None;
        }
        self.rule(config)
            .and_then(|r| r.language.as_deref())
            .filter(|l| !l.is_empty())
    }

    fn resolve_type(&self, config: &Config) -> TypeInfo {
        let mut prefix = self
            .rule(config)
            .and_then(|r| r.type_prefix.clone())
            .filter(|p| !p.is_empty())
            .or_else(|| self.name.namespace.clone().filter(|ns| !ns.is_empty()))
            .unwrap_or_else(|| config.type_prefix.clone());
        if !prefix.ends_with('/') {
            prefix.push('/');
        }

        let mut name = match self.xsi_type() {
            Some(xsi) => xsi.rsplit(':').next().unwrap_or(xsi).to_string(),
            None => self.name.local.clone(),
        };
        if let Some(override_name) = config.rule(&name).and_then(|r| r.type_name.clone()) {
            name = override_name;
        }

        TypeInfo { name, prefix }
    }
}

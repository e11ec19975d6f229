//! Entity tree builder
//!
//! Consumes start-element, character-data and end-element events for one
//! document and keeps a stack of the currently open entities. When a
//! resource closes it is resolved, serialized and handed to the sink, then
//! dropped together with its subtree, so memory use follows the depth of
//! the open elements and not the size of the document. Blank-node
//! resources are the exception: they stay attached to their parent until
//! the parent itself is written, because their statements are inlined
//! there.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::config::Config;
use crate::entity::{Attribute, ElementName, Entity};
use crate::error::ConvertError;
use crate::id::{numbered_file_name, output_file_name};
use crate::ntriples::serialize_resource;
use crate::sink::{OutputUnit, TripleSink};

/// Statistics from converting one or more documents
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConvertStats {
    /// Elements seen
    pub elements: usize,
    /// Elements classified as properties
    pub properties: usize,
    /// Elements classified as resources (including blank nodes)
    pub resources: usize,
    /// Resources without an identifier
    pub blank_nodes: usize,
    /// Output units written
    pub files_written: usize,
    /// Statements written
    pub triples: usize,
}

impl ConvertStats {
    pub fn add(&mut self, other: &ConvertStats) {
        self.elements += other.elements;
        self.properties += other.properties;
        self.resources += other.resources;
        self.blank_nodes += other.blank_nodes;
        self.files_written += other.files_written;
        self.triples += other.triples;
    }
}

/// Per-document state machine turning element events into output units
///
/// All state (open entities, blank-node counters) belongs to one document
/// run; build a new `TreeBuilder` for every document.
pub struct TreeBuilder<'a> {
    config: &'a Config,
    sink: &'a mut dyn TripleSink,
    stack: Vec<Entity>,
    counters: HashMap<String, usize>,
    /// File names already handed to the sink in this run
    file_names: HashSet<String>,
    seen_root: bool,
    stats: ConvertStats,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(config: &'a Config, sink: &'a mut dyn TripleSink) -> Self {
        TreeBuilder {
            config,
            sink,
            stack: Vec::new(),
            counters: HashMap::new(),
            file_names: HashSet::new(),
            seen_root: false,
            stats: ConvertStats::default(),
        }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn start_element(
        &mut self,
        name: ElementName,
        attributes: Vec<Attribute>,
    ) -> Result<(), ConvertError> {
        trace!("Start of entity: {}", name.local);

        if self.stack.is_empty() {
            if self.seen_root {
                return Err(ConvertError::Structural(format!(
                    "second root element '{}'",
                    name.local
                )));
            }
            self.seen_root = true;
        }

        let counter = self.counters.entry(name.local.clone()).or_insert(0);
        *counter += 1;

        self.stats.elements += 1;
        self.stack.push(Entity::new(name, attributes, *counter));
        Ok(())
    }

    /// Text between tags belongs to the innermost open element
    pub fn characters(&mut self, text: &str) {
        if let Some(top) = self.stack.last_mut() {
            top.push_text(text);
        }
    }

    pub fn end_element(&mut self) -> Result<(), ConvertError> {
        let mut entity = self.stack.pop().ok_or_else(|| {
            ConvertError::Structural("end of element without an open element".to_string())
        })?;
        trace!("End of entity: {}", entity.name());

        if entity.is_property() {
            entity.finish_property(self.config)?;
            debug!(
                "Setting value of element '{}' to '{}'",
                entity.numbered_id(),
                entity.value().unwrap_or_default()
            );
            self.stats.properties += 1;
            if let Some(parent) = self.stack.last_mut() {
                parent.add_child(entity);
            }
            return Ok(());
        }

        self.stats.resources += 1;
        let blank = entity.identity(self.config)?.is_blank();
        if blank {
            self.stats.blank_nodes += 1;
            if let Some(parent) = self.stack.last_mut() {
                parent.add_child(entity);
                return Ok(());
            }
        }

        self.write_resource(&entity)?;
        if let Some(parent) = self.stack.last_mut() {
            parent.note_child();
        }
        // `entity` and its subtree are released here
        Ok(())
    }

    fn write_resource(&mut self, entity: &Entity) -> Result<(), ConvertError> {
        let config = self.config;
        let parent = self.stack.last();
        let root = self.stack.first().unwrap_or(entity);

        let identity = entity.identity(config)?;
        let root_identifier = root.identity(config)?.identifier.as_deref();
        let document = serialize_resource(entity, parent, config)?;

        // Sanitizing can map different identifiers to the same name
        let mut file_name = output_file_name(root_identifier, entity, identity);
        if self.file_names.contains(&file_name) {
            let numbered = numbered_file_name(root_identifier, entity, identity);
            debug!(
                "Output file '{}' already written, using '{}' for '{}'",
                file_name,
                numbered,
                entity.numbered_id()
            );
            file_name = numbered;
        }
        if !self.file_names.insert(file_name.clone()) {
            return Err(ConvertError::Structural(format!(
                "output file name '{}' is not unique",
                file_name
            )));
        }

        let unit = OutputUnit {
            file_name,
            resource: identity
                .identifier
                .clone()
                .unwrap_or_else(|| entity.numbered_id()),
            content: document.text,
        };
        self.sink.write_unit(&unit)?;

        self.stats.files_written += 1;
        self.stats.triples += document.triples;
        Ok(())
    }

    /// End of input: every element must have been closed
    pub fn finish(self) -> Result<ConvertStats, ConvertError> {
        if !self.seen_root {
            return Err(ConvertError::Structural(
                "document has no root element".to_string(),
            ));
        }
        if let Some(open) = self.stack.last() {
            return Err(ConvertError::Structural(format!(
                "document ended with {} unclosed element(s), innermost '{}'",
                self.stack.len(),
                open.name()
            )));
        }
        Ok(self.stats)
    }
}

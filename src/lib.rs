//! NOARK5 to RDF Conversion Library
//!
//! This library converts NOARK5 archival XML exports (or any similarly
//! shaped XML) into NTriples, writing one `.nt` file per identified
//! resource.
//!
//! # Overview
//!
//! The document is read as a stream of element events. Every element
//! becomes an entity, classified when it closes:
//!
//! 1. Elements without child elements are *properties*; their text is the
//!    value of a statement on the parent resource
//! 2. Elements with child elements are *resources*, typed from `xsi:type`
//!    or the element name
//! 3. A resource's identifier is the value of its first matching id
//!    candidate property, optionally rewritten by an `id-transform`
//! 4. Resources without an identifier become blank nodes, inlined into
//!    their parent's output
//! 5. Identified resources are serialized and handed to a [`TripleSink`]
//!    as soon as they close, linked to their parent by a predicate named
//!    after the parent's type
//!
//! # Configuration
//!
//! Behaviour is driven by a YAML file (see [`Config`]):
//!
//! ```yaml
//! type_prefix: "http://www.arkivverket.no/standarder/noark5/arkivstruktur/"
//! subject_prefix: "http://sesam.io/sys1/"
//! ids: [systemID, arkivskaperID]
//! ObjectElements:
//!   skjerming:
//!     id: null
//!   referanseDokumentfil:
//!     literal: false
//!     value-transform: "{config:document_url_prefix}{value}"
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use noark5_rdf::{convert_str, Config, MemorySink};
//!
//! let config = Config::load(Path::new("config/config.yaml"))?;
//! let mut sink = MemorySink::new();
//! let stats = convert_str(xml, &config, &mut sink)?;
//!
//! for unit in &sink.units {
//!     println!("{}:\n{}", unit.file_name, unit.content);
//! }
//! ```

pub mod builder;
pub mod config;
pub mod convert;
pub mod entity;
pub mod error;
pub mod escape;
pub mod id;
pub mod logging;
pub mod ntriples;
pub mod sink;
pub mod template;
pub mod transform;
pub mod vocab;

// Re-export main types for convenience
pub use crate::builder::{ConvertStats, TreeBuilder};
pub use crate::config::{Config, ConfigOverrides, ElementRule, IdCandidates, TypeCase};
pub use crate::convert::{
    convert_directory, convert_file, convert_reader, convert_str, convert_to_directory,
    BatchReport,
};
pub use crate::entity::{Attribute, ElementName, Entity};
pub use crate::error::ConvertError;
pub use crate::id::Identity;
pub use crate::sink::{DirectorySink, MemorySink, OutputUnit, TripleSink};
pub use crate::template::{generate_template, write_template};
pub use crate::transform::Transform;
pub use crate::vocab::{DEFAULT_SUBJECT_PREFIX, DEFAULT_TYPE_PREFIX};

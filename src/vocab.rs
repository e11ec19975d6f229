//! Vocabulary definitions for NOARK5 to RDF conversion
//!
//! Fixed RDF/XML Schema IRIs plus the default NOARK5 prefixes used when
//! a configuration does not override them.

/// rdf:type predicate
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// XML Schema datatype namespace (for typed literals)
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// XML Schema instance namespace (carries the `xsi:type` attribute)
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Local name of the type override attribute in the XSI namespace
pub const XSI_TYPE: &str = "type";

/// Default namespace for types and predicates
pub const DEFAULT_TYPE_PREFIX: &str = "http://www.arkivverket.no/standarder/noark5/arkivstruktur/";

/// Default namespace for resource subjects
pub const DEFAULT_SUBJECT_PREFIX: &str = "http://sesam.io/sys1/";

/// Default identifier candidates, tried after any element-specific ones
pub const DEFAULT_ID_CANDIDATES: &[&str] = &["systemID", "arkivskaperID"];

/// Marks an identifier candidate as an attribute lookup (`@id`)
pub const ATTRIBUTE_MARKER: char = '@';

/// Prefixes used by generated config templates
pub const TEMPLATE_TYPE_PREFIX: &str = "http://sesam.io/schema/";
pub const TEMPLATE_SUBJECT_PREFIX: &str = "http://data.sesam.io/";

/// Build a typed-literal datatype IRI
///
/// Bare names (`date`, `integer`) are expanded against the XML Schema
/// namespace; anything containing a `:` is taken to be a full IRI already.
pub fn datatype_iri(datatype: &str) -> String {
    if datatype.contains(':') {
        datatype.to_string()
    } else {
        format!("{}{}", XSD_NS, datatype)
    }
}

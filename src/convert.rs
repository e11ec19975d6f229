//! Document conversion
//!
//! Drives a namespace-aware quick-xml reader over one document and feeds
//! its events to a fresh [`TreeBuilder`], plus batch processing of an
//! input directory.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use tracing::{info, warn};

use crate::builder::{ConvertStats, TreeBuilder};
use crate::config::Config;
use crate::entity::{Attribute, ElementName};
use crate::error::ConvertError;
use crate::sink::{DirectorySink, TripleSink};

/// Convert one XML document read from `input`
pub fn convert_reader<R: BufRead>(
    input: R,
    config: &Config,
    sink: &mut dyn TripleSink,
) -> Result<ConvertStats, ConvertError> {
    let mut reader = NsReader::from_reader(input);
    reader.config_mut().expand_empty_elements = true;

    let mut builder = TreeBuilder::new(config, sink);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => {
                let (name, attributes) = read_start(&reader, &start)?;
                builder.start_element(name, attributes)?;
            }
            Ok(Event::End(_)) => builder.end_element()?,
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|e| xml_error(&reader, e))?;
                builder.characters(&text);
            }
            Ok(Event::CData(cdata)) => {
                let text = reader
                    .decoder()
                    .decode(&cdata)
                    .map_err(|e| xml_error(&reader, e))?;
                builder.characters(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(&reader, e)),
        }
        buf.clear();
    }

    builder.finish()
}

/// Convert an XML string, mostly useful for tests and small inputs
pub fn convert_str(
    xml: &str,
    config: &Config,
    sink: &mut dyn TripleSink,
) -> Result<ConvertStats, ConvertError> {
    convert_reader(xml.as_bytes(), config, sink)
}

/// Convert an XML file into the given sink
pub fn convert_file(
    path: &Path,
    config: &Config,
    sink: &mut dyn TripleSink,
) -> Result<ConvertStats, ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::InvalidPath(path.to_path_buf()));
    }
    info!("Processing XML from {}", path.display());

    let file = File::open(path)?;
    let stats = convert_reader(BufReader::new(file), config, sink)?;

    info!(
        "Finished {}: {} resources ({} blank nodes), {} files, {} triples",
        path.display(),
        stats.resources,
        stats.blank_nodes,
        stats.files_written,
        stats.triples
    );
    Ok(stats)
}

/// Convert an XML file into one `.nt` file per resource in `config.output_dir`
pub fn convert_to_directory(path: &Path, config: &Config) -> Result<ConvertStats, ConvertError> {
    info!("Writing RDF into {}", config.output_dir.display());
    let mut sink = DirectorySink::new(&config.output_dir);
    convert_file(path, config, &mut sink)
}

/// Outcome of one pass over the input directory
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Converted files (now in the backup directory)
    pub converted: Vec<PathBuf>,
    /// Files that failed, left in place, with the reason
    pub failed: Vec<(PathBuf, String)>,
    pub stats: ConvertStats,
}

/// Convert every `*.xml` file in `config.input_dir`
///
/// Files are processed in name order, each with its own run state. A
/// converted file is moved to `config.backup_dir`; a failing one is logged
/// and left where it is.
pub fn convert_directory(config: &Config) -> Result<BatchReport, ConvertError> {
    let mut report = BatchReport::default();

    for path in list_xml_files(&config.input_dir)? {
        match convert_to_directory(&path, config) {
            Ok(stats) => {
                report.stats.add(&stats);
                let moved = move_to_dir(&path, &config.backup_dir)?;
                info!("Moved {} to {}", path.display(), moved.display());
                report.converted.push(moved);
            }
            Err(e) => {
                warn!("Failed to convert {}: {}", path.display(), e);
                report.failed.push((path, e.to_string()));
            }
        }
    }

    Ok(report)
}

fn list_xml_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    if !dir.is_dir() {
        return Err(ConvertError::InvalidPath(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn move_to_dir(path: &Path, dir: &Path) -> Result<PathBuf, ConvertError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ConvertError::InvalidPath(path.to_path_buf()))?;
    let target = dir.join(file_name);

    // rename fails across filesystems; fall back to copy + remove
    if fs::rename(path, &target).is_err() {
        fs::copy(path, &target)?;
        fs::remove_file(path)?;
    }
    Ok(target)
}

fn read_start<R>(
    reader: &NsReader<R>,
    start: &BytesStart<'_>,
) -> Result<(ElementName, Vec<Attribute>), ConvertError> {
    let (ns, local) = reader.resolve_element(start.name());
    let name = ElementName {
        local: decode(reader, local.as_ref())?,
        namespace: namespace_of(reader, ns)?,
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }

        let (ns, local) = reader.resolve_attribute(attr.key);
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| xml_error(reader, e))?;

        attributes.push(Attribute {
            qname: decode(reader, attr.key.as_ref())?,
            namespace: namespace_of(reader, ns)?,
            local_name: decode(reader, local.as_ref())?,
            value: value.into_owned(),
        });
    }

    Ok((name, attributes))
}

fn namespace_of<R>(
    reader: &NsReader<R>,
    ns: ResolveResult<'_>,
) -> Result<Option<String>, ConvertError> {
    match ns {
        ResolveResult::Bound(ns) => Ok(Some(decode(reader, ns.as_ref())?)),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => {
            Err(ConvertError::UnknownPrefix(decode(reader, &prefix)?))
        }
    }
}

fn decode<R>(reader: &NsReader<R>, bytes: &[u8]) -> Result<String, ConvertError> {
    reader
        .decoder()
        .decode(bytes)
        .map(|s| s.into_owned())
        .map_err(|e| xml_error(reader, e))
}

fn xml_error<R>(reader: &NsReader<R>, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::Xml {
        position: reader.buffer_position() as u64,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElementRule;
    use crate::sink::MemorySink;

    const NS: &str = "http://www.arkivverket.no/standarder/noark5/arkivstruktur";

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<arkiv xmlns="http://www.arkivverket.no/standarder/noark5/arkivstruktur"
       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <systemID>a2f34cb</systemID>
  <tittel>Arkiv &amp; historie</tittel>
  <arkivskaper>
    <arkivskaperID>997506499</arkivskaperID>
    <arkivskapernavn>Kommune</arkivskapernavn>
  </arkivskaper>
  <arkivdel>
    <systemID>585231e2</systemID>
    <mappe xsi:type="saksmappe">
      <systemID>2bac1d95</systemID>
      <skjerming>
        <tilgangsrestriksjon>UO</tilgangsrestriksjon>
      </skjerming>
      <registrering xsi:type="journalpost">
        <systemID>8aac37cd</systemID>
        <korrespondansepart>
          <korrespondansepartNavn>Kari</korrespondansepartNavn>
        </korrespondansepart>
        <dokumentbeskrivelse>
          <systemID>c3b4aeec</systemID>
          <dokumentobjekt>
            <opprettetAv>Birger <![CDATA[Ballangrud]]> (baladmin)</opprettetAv>
            <referanseDokumentfil>dokumenter/a.pdf</referanseDokumentfil>
          </dokumentobjekt>
        </dokumentbeskrivelse>
      </registrering>
    </mappe>
  </arkivdel>
</arkiv>
"#;

    fn sample_config() -> Config {
        let yaml = r#"
document_url_prefix: "http://localhost:8080/someservice/"
ObjectElements:
  skjerming:
    id: null
  korrespondansepart:
    id-transform: "{name}-{counter}"
  referanseDokumentfil:
    literal: false
    value-transform: "{config:document_url_prefix}{value}"
"#;
        Config::from_yaml(yaml, "test").unwrap()
    }

    #[test]
    fn test_minimal_document() {
        let config = Config::default();
        let mut sink = MemorySink::new();
        convert_str("<arkiv><systemID>X1</systemID></arkiv>", &config, &mut sink).unwrap();

        let text = sink.get("X1-X1.nt").unwrap();
        assert!(text.contains("<http://sesam.io/sys1/X1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.arkivverket.no/standarder/noark5/arkivstruktur/Arkiv>."));
        assert!(text.contains("<http://sesam.io/sys1/X1> <http://www.arkivverket.no/standarder/noark5/arkivstruktur/systemID> \"X1\"."));
    }

    #[test]
    fn test_sample_document() {
        let config = sample_config();
        let mut sink = MemorySink::new();
        let stats = convert_str(SAMPLE, &config, &mut sink).unwrap();

        assert_eq!(
            sink.file_names(),
            vec![
                "a2f34cb-997506499.nt",
                "a2f34cb-korrespondansepart-1.nt",
                "a2f34cb-c3b4aeec.nt",
                "a2f34cb-8aac37cd.nt",
                "a2f34cb-2bac1d95.nt",
                "a2f34cb-585231e2.nt",
                "a2f34cb-a2f34cb.nt",
            ]
        );
        assert_eq!(stats.files_written, 7);
        assert_eq!(stats.blank_nodes, 2);

        // xsi:type drives the type, namespace drives the prefix
        let mappe = sink.get("a2f34cb-2bac1d95.nt").unwrap();
        assert!(mappe.contains(&format!(
            "<http://sesam.io/sys1/2bac1d95> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <{}/Saksmappe>.",
            NS
        )));
        assert!(!mappe.contains("XMLSchema-instance"));
        // parent link and inlined blank node
        assert!(mappe.contains(&format!(
            "<http://sesam.io/sys1/2bac1d95> <{}/arkivdel> <http://sesam.io/sys1/585231e2>.",
            NS
        )));
        assert!(mappe.contains(&format!(
            "<http://sesam.io/sys1/2bac1d95> <{}/skjerming> _:skjerming-1.",
            NS
        )));
        assert!(mappe.contains(&format!("_:skjerming-1 <{}/tilgangsrestriksjon> \"UO\".", NS)));

        // the parent of a journalpost is referred to with the saksmappe predicate
        let journalpost = sink.get("a2f34cb-8aac37cd.nt").unwrap();
        assert!(journalpost.contains(&format!(
            "<http://sesam.io/sys1/8aac37cd> <{}/saksmappe> <http://sesam.io/sys1/2bac1d95>.",
            NS
        )));

        let dokument = sink.get("a2f34cb-c3b4aeec.nt").unwrap();
        assert!(dokument.contains(&format!(
            "<http://sesam.io/sys1/c3b4aeec> <{}/journalpost> <http://sesam.io/sys1/8aac37cd>.",
            NS
        )));
        assert!(dokument.contains(&format!(
            "_:dokumentobjekt-1 <{}/opprettetAv> \"Birger Ballangrud (baladmin)\".",
            NS
        )));
        assert!(dokument.contains(&format!(
            "_:dokumentobjekt-1 <{}/referanseDokumentfil> <http://localhost:8080/someservice/dokumenter/a.pdf>.",
            NS
        )));

        let root = sink.get("a2f34cb-a2f34cb.nt").unwrap();
        assert!(root.contains(&format!("<{}/tittel> \"Arkiv & historie\".", NS)));
        assert!(!root.contains("arkivdel"));
    }

    #[test]
    fn test_idempotent_runs() {
        let config = sample_config();
        let mut first = MemorySink::new();
        let mut second = MemorySink::new();
        convert_str(SAMPLE, &config, &mut first).unwrap();
        convert_str(SAMPLE, &config, &mut second).unwrap();
        assert_eq!(first.units, second.units);
    }

    #[test]
    fn test_namespaced_attributes() {
        let config = Config::default();
        let mut sink = MemorySink::new();
        let xml = r#"<arkiv xmlns:x="http://example.org/x" status="aktiv" x:kilde="sak">
            <systemID>A</systemID>
        </arkiv>"#;
        convert_str(xml, &config, &mut sink).unwrap();

        let text = sink.get("A-A.nt").unwrap();
        assert!(text.contains("<http://sesam.io/sys1/A> <http://www.arkivverket.no/standarder/noark5/arkivstruktur/status> \"aktiv\"."));
        assert!(text.contains("<http://sesam.io/sys1/A> <http://example.org/x/kilde> \"sak\"."));
        assert!(!text.contains("xmlns"));
    }

    #[test]
    fn test_empty_elements_are_properties() {
        let config = Config::default();
        let mut sink = MemorySink::new();
        convert_str("<arkiv><systemID>A</systemID><merknad/></arkiv>", &config, &mut sink).unwrap();
        let text = sink.get("A-A.nt").unwrap();
        assert!(text.contains("/merknad> \"\"."));
    }

    #[test]
    fn test_transform_failure_writes_nothing_for_resource() {
        let mut config = Config::default();
        config.object_elements.insert(
            "mappe".to_string(),
            ElementRule {
                id_transform: Some(crate::transform::Transform::parse("{attr:kode}").unwrap()),
                ..Default::default()
            },
        );
        let mut sink = MemorySink::new();
        let xml = "<arkiv><systemID>A</systemID><mappe><tittel>x</tittel></mappe></arkiv>";

        let err = convert_str(xml, &config, &mut sink).unwrap_err();
        assert!(matches!(err, ConvertError::Transform { .. }));
        assert!(sink.units.is_empty());
    }

    #[test]
    fn test_malformed_documents() {
        let config = Config::default();

        let mut sink = MemorySink::new();
        assert!(convert_str("<arkiv><mappe></arkiv>", &config, &mut sink).is_err());

        let mut sink = MemorySink::new();
        assert!(convert_str("<arkiv><systemID>A</systemID>", &config, &mut sink).is_err());

        let mut sink = MemorySink::new();
        assert!(matches!(
            convert_str("<p:arkiv/>", &config, &mut sink),
            Err(ConvertError::UnknownPrefix(_))
        ));
    }

    #[test]
    fn test_convert_directory_moves_files() {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.input_dir = root.path().join("input");
        config.output_dir = root.path().join("output");
        config.backup_dir = root.path().join("backup");
        config.ensure_directories().unwrap();

        fs::write(
            config.input_dir.join("a.xml"),
            "<arkiv><systemID>A</systemID></arkiv>",
        )
        .unwrap();
        fs::write(config.input_dir.join("b.xml"), "<arkiv><systemID>B</systemID>").unwrap();
        fs::write(config.input_dir.join("notes.txt"), "ignored").unwrap();

        let report = convert_directory(&config).unwrap();

        assert_eq!(report.converted, vec![config.backup_dir.join("a.xml")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, config.input_dir.join("b.xml"));
        assert_eq!(report.stats.files_written, 1);

        assert!(config.output_dir.join("A-A.nt").is_file());
        assert!(!config.input_dir.join("a.xml").exists());
        assert!(config.input_dir.join("b.xml").exists());
        assert!(config.input_dir.join("notes.txt").exists());
    }

    #[test]
    fn test_missing_input_file() {
        let config = Config::default();
        let mut sink = MemorySink::new();
        let err = convert_file(Path::new("/nonexistent/input.xml"), &config, &mut sink).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidPath(_)));
    }
}

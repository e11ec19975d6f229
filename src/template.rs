//! Config template generation
//!
//! Samples an XML file and writes a starting config in which every
//! element that ever had child elements is listed under `ObjectElements`
//! as a blank node (`id: null`), to be edited by hand afterwards.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};

use crate::config::{Config, ElementRule};
use crate::error::ConvertError;
use crate::vocab::{TEMPLATE_SUBJECT_PREFIX, TEMPLATE_TYPE_PREFIX};

/// Default polling interval written into templates, in seconds
const TEMPLATE_INTERVAL: u64 = 5;

/// Build a config template from an XML document
pub fn generate_template<R: BufRead>(input: R) -> Result<Config, ConvertError> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    // (qualified name, saw a child element)
    let mut open: Vec<(String, bool)> = Vec::new();
    let mut object_elements: BTreeMap<String, ElementRule> = BTreeMap::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| ConvertError::Xml {
            position: reader.buffer_position() as u64,
            reason: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                if let Some((_, has_children)) = open.last_mut() {
                    *has_children = true;
                }
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                open.push((name, false));
            }
            Event::End(_) => {
                let (name, has_children) = open.pop().ok_or_else(|| {
                    ConvertError::Structural("end of element without an open element".to_string())
                })?;
                if has_children && !object_elements.contains_key(&name) {
                    debug!("Found object element '{}'", name);
                    object_elements.insert(name, ElementRule::blank_node());
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(Config {
        type_prefix: TEMPLATE_TYPE_PREFIX.to_string(),
        subject_prefix: TEMPLATE_SUBJECT_PREFIX.to_string(),
        object_elements,
        output_dir: PathBuf::from("output"),
        input_dir: PathBuf::from("input"),
        backup_dir: PathBuf::from("backup"),
        interval: Some(TEMPLATE_INTERVAL),
        ..Config::default()
    })
}

/// Sample `input` and write the template as YAML to `output`
pub fn write_template(input: &Path, output: &Path) -> Result<Config, ConvertError> {
    if !input.is_file() {
        return Err(ConvertError::InvalidPath(input.to_path_buf()));
    }

    let config = generate_template(BufReader::new(File::open(input)?))?;
    fs::write(output, config.to_yaml()?)?;
    info!(
        "Wrote config template with {} object elements to {}",
        config.object_elements.len(),
        output.display()
    );
    Ok(config)
}

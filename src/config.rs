//! Conversion configuration
//!
//! The configuration is read once, before a document is parsed, and is
//! only ever shared by reference afterwards. It maps element names to
//! [`ElementRule`]s and carries the global defaults used for every
//! element without a rule of its own.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::ConvertError;
use crate::transform::Transform;
use crate::vocab::{DEFAULT_ID_CANDIDATES, DEFAULT_SUBJECT_PREFIX, DEFAULT_TYPE_PREFIX};

/// Environment variable used as the base for a relative backup directory
pub const DATA_ROOT_ENV: &str = "SESAM_DATA";

/// How a type name is cased when it becomes an `rdf:type` IRI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeCase {
    /// Upper-case the first character, leave the rest alone
    #[default]
    Capitalize,
    /// Every alphabetic run starts upper-case, the rest is lower-cased
    Title,
    /// Use the type name unchanged
    Preserve,
}

impl TypeCase {
    pub fn apply(&self, name: &str) -> String {
        match self {
            TypeCase::Capitalize => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            TypeCase::Title => {
                let mut out = String::with_capacity(name.len());
                let mut in_word = false;
                for c in name.chars() {
                    if c.is_alphabetic() {
                        if in_word {
                            out.extend(c.to_lowercase());
                        } else {
                            out.extend(c.to_uppercase());
                        }
                        in_word = true;
                    } else {
                        out.push(c);
                        in_word = false;
                    }
                }
                out
            }
            TypeCase::Preserve => name.to_string(),
        }
    }
}

/// Identifier candidates for one element: a single name or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdCandidates {
    One(String),
    Many(Vec<String>),
}

impl IdCandidates {
    pub fn as_slice(&self) -> &[String] {
        match self {
            IdCandidates::One(one) => std::slice::from_ref(one),
            IdCandidates::Many(many) => many,
        }
    }
}

/// Resolution rules for one element name (`ObjectElements.<name>`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRule {
    /// `None` when absent, `Some(None)` for an explicit `id: null`
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Option<IdCandidates>>,

    #[serde(rename = "id-transform", skip_serializing_if = "Option::is_none")]
    pub id_transform: Option<Transform>,

    #[serde(rename = "value-transform", skip_serializing_if = "Option::is_none")]
    pub value_transform: Option<Transform>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_prefix: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,

    #[serde(rename = "lang", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ElementRule {
    /// A rule that marks the element as a blank node
    pub fn blank_node() -> Self {
        ElementRule {
            id: Some(None),
            ..Default::default()
        }
    }

    /// True when the config explicitly says the element has no identifier
    pub fn is_blank_node(&self) -> bool {
        matches!(self.id, Some(None))
    }

    pub fn id_candidates(&self) -> &[String] {
        match &self.id {
            Some(Some(candidates)) => candidates.as_slice(),
            _ => &[],
        }
    }
}

/// Distinguish `id: null` from a missing `id` key
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The resolved configuration for a conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default namespace for types and predicates
    pub type_prefix: String,
    /// Default namespace for resource subjects
    pub subject_prefix: String,
    /// Identifier candidates tried for every element after its own
    pub ids: Vec<String>,
    /// Per-element rules
    #[serde(rename = "ObjectElements")]
    pub object_elements: BTreeMap<String, ElementRule>,
    pub type_case: TypeCase,
    pub output_dir: PathBuf,
    pub input_dir: PathBuf,
    pub backup_dir: PathBuf,
    /// Polling interval in seconds for batch mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logfile: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loglevel: Option<String>,
    /// Any other top-level keys, available to transforms via `{config:KEY}`
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            type_prefix: DEFAULT_TYPE_PREFIX.to_string(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            ids: DEFAULT_ID_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            object_elements: BTreeMap::new(),
            type_case: TypeCase::default(),
            output_dir: PathBuf::new(),
            input_dir: PathBuf::new(),
            backup_dir: PathBuf::new(),
            interval: None,
            logfile: None,
            loglevel: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub logfile: Option<PathBuf>,
    pub loglevel: Option<String>,
    pub interval: Option<u64>,
}

impl Config {
    /// Parse a config from YAML text
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self, ConvertError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConvertError::Config {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, falling back to the defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        debug!("Reading config file from '{}'", path.display());

        if !path.is_file() {
            warn!(
                "Could not find config file '{}'. Using defaults.",
                path.display()
            );
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConvertError::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&content, &path.display().to_string())
    }

    /// Check prefixes and transforms before any document is touched
    pub fn validate(&self) -> Result<(), ConvertError> {
        check_prefix(&self.type_prefix)?;
        check_prefix(&self.subject_prefix)?;

        for (name, rule) in &self.object_elements {
            if let Some(prefix) = &rule.type_prefix {
                check_prefix(prefix)?;
            }
            if let Some(prefix) = &rule.subject_prefix {
                check_prefix(prefix)?;
            }
            if let Some(transform) = &rule.id_transform {
                if transform.uses_value() {
                    return Err(ConvertError::InvalidTemplate {
                        template: transform.to_string(),
                        reason: format!("id-transform for '{}' cannot use {{value}}", name),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(dir) = &overrides.input_dir {
            self.input_dir = dir.clone();
        }
        if let Some(dir) = &overrides.backup_dir {
            self.backup_dir = dir.clone();
        }
        if let Some(logfile) = &overrides.logfile {
            self.logfile = Some(logfile.clone());
        }
        if let Some(level) = &overrides.loglevel {
            self.loglevel = Some(level.clone());
        }
        if let Some(interval) = overrides.interval.filter(|i| *i > 0) {
            self.interval = Some(interval);
        }
    }

    /// Make relative directories absolute
    ///
    /// Input, output and log file paths are resolved against `cwd`; the
    /// backup directory against `data_root` when given, else `cwd`.
    pub fn resolve_paths(&mut self, cwd: &Path, data_root: Option<&Path>) {
        self.output_dir = absolutize(&self.output_dir, cwd);
        self.input_dir = absolutize(&self.input_dir, cwd);
        self.backup_dir = absolutize(&self.backup_dir, data_root.unwrap_or(cwd));
        if let Some(logfile) = &self.logfile {
            self.logfile = Some(absolutize(logfile, cwd));
        }
    }

    /// [`Config::resolve_paths`] against the process environment
    pub fn resolve_paths_from_env(&mut self) -> Result<(), ConvertError> {
        let cwd = std::env::current_dir()?;
        let data_root = std::env::var_os(DATA_ROOT_ENV).map(PathBuf::from);
        self.resolve_paths(&cwd, data_root.as_deref());
        Ok(())
    }

    /// Create the input, output and backup directories if missing
    pub fn ensure_directories(&self) -> Result<(), ConvertError> {
        for dir in [&self.input_dir, &self.output_dir, &self.backup_dir] {
            if dir.as_os_str().is_empty() || dir.is_dir() {
                continue;
            }
            fs::create_dir_all(dir)?;
            debug!("Created directory '{}'", dir.display());
        }
        Ok(())
    }

    /// Batch polling interval; absent or zero means a single pass
    pub fn poll_interval(&self) -> Option<Duration> {
        self.interval.filter(|i| *i > 0).map(Duration::from_secs)
    }

    pub fn rule(&self, name: &str) -> Option<&ElementRule> {
        self.object_elements.get(name)
    }

    /// Identifier candidates for an element: its own first, then the global ones
    pub fn id_candidates<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let own = self.rule(name).map(|r| r.id_candidates()).unwrap_or(&[]);
        own.iter().chain(self.ids.iter()).map(String::as_str)
    }

    /// Look up a scalar config value by key (used by `{config:KEY}`)
    pub fn lookup(&self, key: &str) -> Option<String> {
        match key {
            "type_prefix" => Some(self.type_prefix.clone()),
            "subject_prefix" => Some(self.subject_prefix.clone()),
            _ => match self.extra.get(key)? {
                serde_yaml::Value::String(s) => Some(s.clone()),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                serde_yaml::Value::Bool(b) => Some(b.to_string()),
                _ => None,
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConvertError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn check_prefix(prefix: &str) -> Result<(), ConvertError> {
    Url::parse(prefix)
        .map(|_| ())
        .map_err(|e| ConvertError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: e.to_string(),
        })
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

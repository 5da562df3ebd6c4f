//! Category-organized technology rule store.
//!
//! A store is a directory with one file per category (`analytics.json`,
//! `cms.yaml`, ...), each holding a list of [`TechRule`]s. Files that fail to
//! parse are skipped and reported; an absent or empty store falls back to the
//! embedded rule set.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::{DsxError, Result};

pub const RULES_DIR_ENV: &str = "DSX_RULES_DIR";

const BUILTIN_RULES: &str = include_str!("builtin_rules.json");

/// A declarative check against the captured page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleCheck {
    /// `<tag attribute="...value...">`, or the tag's text when no attribute is named.
    Tag {
        tag: String,
        #[serde(default)]
        attribute: Option<String>,
        value: String,
    },
    /// Response header presence, optionally with a value pattern.
    Header {
        name: String,
        #[serde(default)]
        value: Option<String>,
    },
    /// Bare substring of the page HTML.
    Text { value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    pub checks: Vec<RuleCheck>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRules {
    pub category: String,
    pub rules: Vec<TechRule>,
}

/// A rule file that could not be read or parsed.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum RuleSource {
    #[default]
    Builtin,
    Directory(PathBuf),
}

/// Loaded rule set. `Default` is an empty library that matches nothing.
#[derive(Debug, Clone, Default)]
pub struct RuleLibrary {
    categories: Vec<CategoryRules>,
    skipped: Vec<SkippedFile>,
    source: RuleSource,
}

impl RuleLibrary {
    /// The embedded rule set.
    pub fn builtin() -> Result<Self> {
        let parsed: BTreeMap<String, Vec<TechRule>> = serde_json::from_str(BUILTIN_RULES)
            .map_err(|e| DsxError::Rules(format!("embedded rule set is invalid: {e}")))?;
        Ok(Self {
            categories: parsed
                .into_iter()
                .map(|(category, rules)| CategoryRules { category, rules })
                .collect(),
            skipped: Vec::new(),
            source: RuleSource::Builtin,
        })
    }

    /// Reads every `.json`, `.yaml` and `.yml` file in `dir`, in name order.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            DsxError::Rules(format!("cannot read rule directory {}: {e}", dir.display()))
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| rule_format(path).is_some())
            .collect();
        paths.sort();

        let mut library = Self {
            source: RuleSource::Directory(dir.to_path_buf()),
            ..Default::default()
        };
        for path in paths {
            match parse_file(&path) {
                Ok(rules) => {
                    let category = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    debug!(category = %category, rules = rules.len(), "loaded rule file");
                    library.categories.push(CategoryRules { category, rules });
                }
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "skipping rule file");
                    library.skipped.push(SkippedFile { path, reason });
                }
            }
        }
        Ok(library)
    }

    /// Explicit directory, then `DSX_RULES_DIR`, then the embedded set.
    ///
    /// Never fails: an unreadable or empty store degrades to the embedded
    /// rules, and a broken embedded set degrades to an empty library.
    pub fn resolve(dir: Option<&Path>) -> Self {
        let from_env = std::env::var_os(RULES_DIR_ENV).map(PathBuf::from);
        let chosen = dir.map(Path::to_path_buf).or(from_env);
        if let Some(dir) = chosen {
            match Self::load_dir(&dir) {
                Ok(library) if !library.is_empty() => return library,
                Ok(library) => {
                    warn!(dir = %dir.display(), "rule store is empty; using built-in rules");
                    let skipped = library.skipped;
                    let mut builtin = Self::builtin_or_empty();
                    builtin.skipped = skipped;
                    return builtin;
                }
                Err(err) => warn!(error = %err, "rule store unavailable; using built-in rules"),
            }
        }
        Self::builtin_or_empty()
    }

    fn builtin_or_empty() -> Self {
        Self::builtin().unwrap_or_else(|err| {
            warn!(error = %err, "built-in rules failed to load");
            Self::default()
        })
    }

    pub fn categories(&self) -> &[CategoryRules] {
        &self.categories
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }

    pub fn technology_count(&self) -> usize {
        self.categories.iter().map(|c| c.rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.technology_count() == 0
    }
}

enum RuleFormat {
    Json,
    Yaml,
}

fn rule_format(path: &Path) -> Option<RuleFormat> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "json" => Some(RuleFormat::Json),
        "yaml" | "yml" => Some(RuleFormat::Yaml),
        _ => None,
    }
}

fn parse_file(path: &Path) -> std::result::Result<Vec<TechRule>, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    match rule_format(path) {
        Some(RuleFormat::Json) => serde_json::from_str(&raw).map_err(|e| e.to_string()),
        Some(RuleFormat::Yaml) => serde_yaml::from_str(&raw).map_err(|e| e.to_string()),
        None => Err("unsupported extension".to_string()),
    }
}

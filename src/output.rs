use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ErrorPayload;
use crate::fingerprint::{RuleLibrary, RuleSource};
use crate::types::DesignReport;
use crate::Viewport;

/// Schema version for output payloads.
pub const DSX_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum DsxOutput {
    Extract(ExtractOutput),
    Rules(RulesOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    Extract,
    Rules,
    Error,
}

impl DsxOutput {
    pub fn mode(&self) -> OutputMode {
        match self {
            DsxOutput::Extract(_) => OutputMode::Extract,
            DsxOutput::Rules(_) => OutputMode::Rules,
            DsxOutput::Error(_) => OutputMode::Error,
        }
    }
}

/// Options an extraction actually ran with, after config and flag merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOptions {
    pub dark_mode: bool,
    pub mobile: bool,
    pub slow: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analyzers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOutput {
    pub version: String,
    pub url: String,
    pub viewport: Viewport,
    pub options: ExtractOptions,
    pub report: DesignReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCategorySummary {
    pub name: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRuleFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesOutput {
    pub version: String,
    pub source: RuleSource,
    pub technology_count: usize,
    pub categories: Vec<RuleCategorySummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRuleFile>,
}

impl RulesOutput {
    pub fn from_library(library: &RuleLibrary) -> Self {
        Self {
            version: DSX_OUTPUT_VERSION.to_string(),
            source: library.source().clone(),
            technology_count: library.technology_count(),
            categories: library
                .categories()
                .iter()
                .map(|category| RuleCategorySummary {
                    name: category.category.clone(),
                    technologies: category.rules.iter().map(|r| r.name.clone()).collect(),
                })
                .collect(),
            skipped: library
                .skipped()
                .iter()
                .map(|s| SkippedRuleFile {
                    path: s.path.clone(),
                    reason: s.reason.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DsxError;

    #[test]
    fn extract_output_serializes() {
        let output = DsxOutput::Extract(ExtractOutput {
            version: DSX_OUTPUT_VERSION.to_string(),
            url: "https://example.com".to_string(),
            viewport: Viewport {
                width: 1440,
                height: 900,
            },
            options: ExtractOptions {
                dark_mode: true,
                mobile: false,
                slow: false,
                analyzers: vec!["colors".into()],
            },
            report: DesignReport {
                url: "https://example.com".into(),
                ..Default::default()
            },
        });

        let json = serde_json::to_value(&output).expect("serialize extract output");
        assert_eq!(json["mode"], "extract");
        assert_eq!(json["options"]["darkMode"], true);
        assert_eq!(json["report"]["isCanvasOnly"], false);
        assert_eq!(output.mode(), OutputMode::Extract);
    }

    #[test]
    fn rules_output_lists_builtin_categories() {
        let library = RuleLibrary::builtin().expect("builtin rules");
        let output = DsxOutput::Rules(RulesOutput::from_library(&library));
        let json = serde_json::to_value(&output).expect("serialize rules output");
        assert_eq!(json["mode"], "rules");
        assert_eq!(json["source"]["kind"], "builtin");
        assert!(json["technologyCount"].as_u64().unwrap_or(0) > 10);
        assert!(json.get("skipped").is_none());
        let names: Vec<&str> = json["categories"]
            .as_array()
            .expect("categories")
            .iter()
            .filter_map(|c| c["name"].as_str())
            .collect();
        assert!(names.contains(&"cms"), "{names:?}");
    }

    #[test]
    fn error_output_serializes() {
        let payload = DsxError::Config("Unknown analyzer: colours".into()).to_payload();
        let output = DsxOutput::Error(ErrorOutput {
            version: DSX_OUTPUT_VERSION.to_string(),
            message: Some(payload.message.clone()),
            error: payload,
        });
        let json = serde_json::to_string(&output).expect("serialize error output");
        assert!(json.contains("\"mode\":\"error\""));
        assert!(json.contains("\"category\":\"config\""));
    }
}

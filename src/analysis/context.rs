//! Per-run extraction context threaded through every analyzer.

use std::sync::Arc;

use crate::config::{ColorThresholds, Config, Limits};
use crate::fingerprint::RuleLibrary;
use crate::types::{ElementSnapshot, PageCapture, ProbeSample, StyleRule};

/// Thresholds and limits the analyzers read; fixed for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionSettings {
    pub colors: ColorThresholds,
    pub limits: Limits,
}

impl From<&Config> for ExtractionSettings {
    fn from(config: &Config) -> Self {
        Self {
            colors: config.colors,
            limits: config.limits,
        }
    }
}

/// Which captured element set an analyzer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePass {
    Baseline,
    Dark,
    Mobile,
}

impl CapturePass {
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            CapturePass::Baseline => None,
            CapturePass::Dark => Some("dark"),
            CapturePass::Mobile => Some("mobile"),
        }
    }
}

/// Immutable view of one capture pass. Cloning only bumps reference counts.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub page: Arc<PageCapture>,
    pub settings: Arc<ExtractionSettings>,
    pub rules: Arc<RuleLibrary>,
    pub pass: CapturePass,
}

impl ExtractionContext {
    pub fn new(page: PageCapture, settings: ExtractionSettings, rules: RuleLibrary) -> Self {
        Self {
            page: Arc::new(page),
            settings: Arc::new(settings),
            rules: Arc::new(rules),
            pass: CapturePass::Baseline,
        }
    }

    /// Same page and settings, reading another element set.
    pub fn for_pass(&self, pass: CapturePass) -> Self {
        Self {
            pass,
            ..self.clone()
        }
    }

    pub fn has_pass(&self, pass: CapturePass) -> bool {
        match pass {
            CapturePass::Baseline => true,
            CapturePass::Dark => self.page.variants.dark.is_some(),
            CapturePass::Mobile => self.page.variants.mobile.is_some(),
        }
    }

    pub fn elements(&self) -> &[ElementSnapshot] {
        match self.pass {
            CapturePass::Baseline => &self.page.elements,
            CapturePass::Dark => self.page.variants.dark.as_deref().unwrap_or(&[]),
            CapturePass::Mobile => self.page.variants.mobile.as_deref().unwrap_or(&[]),
        }
    }

    /// Elements that are not `display:none`, `visibility:hidden` or `opacity:0`.
    pub fn visible_elements(&self) -> impl Iterator<Item = &ElementSnapshot> {
        self.elements().iter().filter(|el| el.is_visible())
    }

    pub fn element(&self, index: usize) -> Option<&ElementSnapshot> {
        self.elements().get(index).filter(|el| el.index == index)
    }

    pub fn style_rules(&self) -> &[StyleRule] {
        &self.page.stylesheets.rules
    }

    /// Probe samples belong to the baseline pass only.
    pub fn probe(&self) -> &[ProbeSample] {
        match self.pass {
            CapturePass::Baseline => &self.page.probe,
            _ => &[],
        }
    }

    pub fn domain(&self) -> Option<String> {
        self.page.domain()
    }
}

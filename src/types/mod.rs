//! Core data types: the page capture consumed by analyzers and the report they produce.

pub mod page;
pub mod report;

pub use page::{
    ancestors, children, descendants, parse_px, BoundingBox, CanvasInfo, CaptureVariants,
    ComputedStyle, ElementSnapshot, FontFaceRule, PageCapture, ProbeKind, ProbeSample, StyleRule,
    StylesheetSnapshot, TagSnapshot,
};
pub use report::*;

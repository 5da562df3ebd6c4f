//! Synthetic page builder for analyzer unit tests.

use crate::analysis::{ExtractionContext, ExtractionSettings};
use crate::fingerprint::RuleLibrary;
use crate::types::{ancestors, BoundingBox, ElementSnapshot, PageCapture, StyleRule};

pub(crate) const BODY: usize = 1;

pub(crate) struct PageBuilder {
    page: PageCapture,
}

impl PageBuilder {
    /// `<html>` + `<body>` with black text on white.
    pub fn new() -> Self {
        let mut page = PageCapture {
            url: "https://example.com/".to_string(),
            ..Default::default()
        };
        let root = ElementSnapshot {
            index: 0,
            parent: None,
            tag: "html".into(),
            bounds: BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 1440.0,
                height: 2000.0,
            },
            style: [("display", "block"), ("font-size", "16px")]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let body = ElementSnapshot {
            index: BODY,
            parent: Some(0),
            tag: "body".into(),
            bounds: root.bounds,
            style: [
                ("display", "block"),
                ("color", "rgb(0, 0, 0)"),
                ("background-color", "rgb(255, 255, 255)"),
                ("font-family", "Inter, sans-serif"),
                ("font-size", "16px"),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        page.elements = vec![root, body];
        Self { page }
    }

    pub fn element(&mut self, parent: usize, tag: &str) -> ElementBuilder<'_> {
        let index = self.page.elements.len();
        ElementBuilder {
            page: &mut self.page,
            el: ElementSnapshot {
                index,
                parent: Some(parent),
                tag: tag.to_string(),
                bounds: BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 20.0,
                },
                style: [("display", "block")].into_iter().collect(),
                ..Default::default()
            },
        }
    }

    pub fn rule(&mut self, selector: &str, declarations: &[(&str, &str)]) -> &mut Self {
        self.page.stylesheets.rules.push(StyleRule {
            selector: selector.to_string(),
            declarations: declarations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            media: None,
        });
        self
    }

    pub fn page_mut(&mut self) -> &mut PageCapture {
        &mut self.page
    }

    pub fn build(mut self) -> PageCapture {
        self.page.text_length = self.page.elements[BODY].text.trim().len();
        self.page
    }

    pub fn context(self) -> ExtractionContext {
        ExtractionContext::new(
            self.build(),
            ExtractionSettings::default(),
            RuleLibrary::default(),
        )
    }
}

pub(crate) struct ElementBuilder<'a> {
    page: &'a mut PageCapture,
    el: ElementSnapshot,
}

impl<'a> ElementBuilder<'a> {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.el.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.el.style.insert(property, value);
        self
    }

    pub fn styles(mut self, props: &[(&str, &str)]) -> Self {
        for (k, v) in props {
            self.el.style.insert(*k, *v);
        }
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.el.own_text = text.to_string();
        self.el.text = text.to_string();
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.el.bounds.width = width;
        self.el.bounds.height = height;
        self
    }

    /// Appends the element, propagating its text to ancestors; returns its index.
    pub fn done(self) -> usize {
        let index = self.el.index;
        let text = self.el.text.clone();
        let parents: Vec<usize> = ancestors(&self.page.elements, &self.el)
            .map(|a| a.index)
            .collect();
        self.page.elements.push(self.el);
        if !text.is_empty() {
            for p in parents {
                let target = &mut self.page.elements[p].text;
                if !target.is_empty() {
                    target.push(' ');
                }
                target.push_str(&text);
            }
        }
        index
    }
}

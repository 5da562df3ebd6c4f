//! The inline Playwright capture script and its process plumbing.
//!
//! The script is the only code that touches the live page. It runs every
//! phase in order (navigate, settle, passive capture, interactive probe,
//! variants, runtime checks) and prints one JSON document on stdout. Failures
//! are printed as `{"status":"error","stage":...,"message":...}` on stderr
//! with a non-zero exit code.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::types::PageCapture;
use crate::{DsxError, Result};

pub(crate) const CAPTURE_SCRIPT: &str = r#"
const [, url, optionsJson] = process.argv;
const opts = JSON.parse(optionsJson);
let stage = 'launch';

function captureElements(args) {
  const { properties, maxElements } = args;
  const clip = (s, n) => (s && s.length > n ? s.slice(0, n) : s || '');
  const nodes = Array.from(document.querySelectorAll('*')).slice(0, maxElements);
  const indexOf = new Map(nodes.map((n, i) => [n, i]));
  return nodes.map((el, index) => {
    const cs = getComputedStyle(el);
    const style = {};
    for (const p of properties) {
      const v = cs.getPropertyValue(p);
      if (v) style[p] = v.trim();
    }
    const attributes = {};
    for (const a of Array.from(el.attributes)) attributes[a.name] = clip(a.value, 300);
    let ownText = '';
    for (const c of Array.from(el.childNodes)) {
      if (c.nodeType === 3) ownText += c.textContent;
    }
    const r = el.getBoundingClientRect();
    const parent = el.parentElement && indexOf.has(el.parentElement) ? indexOf.get(el.parentElement) : null;
    const text = typeof el.innerText === 'string' ? el.innerText : el.textContent;
    return {
      index,
      parent,
      tag: el.tagName.toLowerCase(),
      attributes,
      ownText: clip(ownText.replace(/\s+/g, ' ').trim(), 200),
      text: clip((text || '').trim(), 300),
      bounds: { x: r.x + window.scrollX, y: r.y + window.scrollY, width: r.width, height: r.height },
      style,
    };
  });
}

function captureStylesheets() {
  const out = { rules: [], fontFaces: [], mediaQueries: [], blocked: 0 };
  const variables = new Set();
  const MAX_RULES = 8000;
  const declarations = (style) => {
    const d = {};
    for (let i = 0; i < style.length; i++) {
      const name = style[i];
      d[name] = style.getPropertyValue(name).trim();
      if (name.startsWith('--')) variables.add(name);
    }
    return d;
  };
  const walk = (rules, media) => {
    for (const rule of Array.from(rules)) {
      if (out.rules.length >= MAX_RULES) return;
      if (rule.type === 1) {
        out.rules.push({ selector: rule.selectorText, declarations: declarations(rule.style), media });
      } else if (rule.type === 4) {
        out.mediaQueries.push(rule.conditionText || rule.media.mediaText);
        walk(rule.cssRules, rule.conditionText || rule.media.mediaText);
      } else if (rule.type === 5) {
        const s = rule.style;
        out.fontFaces.push({
          family: s.getPropertyValue('font-family').replace(/["']/g, '').trim(),
          src: s.getPropertyValue('src'),
          weight: s.getPropertyValue('font-weight') || null,
          style: s.getPropertyValue('font-style') || null,
          display: s.getPropertyValue('font-display') || null,
        });
      } else if (rule.type === 12 || rule.cssRules) {
        try { walk(rule.cssRules, media); } catch (e) {}
      } else if (rule.type === 3 && rule.styleSheet) {
        try { walk(rule.styleSheet.cssRules, media); } catch (e) { out.blocked++; }
      }
    }
  };
  for (const sheet of Array.from(document.styleSheets)) {
    try {
      walk(sheet.cssRules, null);
    } catch (e) {
      out.blocked++;
    }
  }
  const cssVariables = {};
  const rootStyle = getComputedStyle(document.documentElement);
  const bodyStyle = document.body ? getComputedStyle(document.body) : rootStyle;
  for (const name of variables) {
    const v = rootStyle.getPropertyValue(name).trim() || bodyStyle.getPropertyValue(name).trim();
    if (v) cssVariables[name] = v;
  }
  return { stylesheets: out, cssVariables };
}

function captureDocument() {
  const tags = Array.from(document.querySelectorAll('script, link, meta')).map((el) => {
    const attributes = {};
    for (const a of Array.from(el.attributes)) attributes[a.name] = a.value.slice(0, 500);
    const text = el.tagName === 'SCRIPT' && !el.src ? (el.textContent || '').slice(0, 300) : null;
    return { tag: el.tagName.toLowerCase(), attributes, text };
  });
  const canvases = Array.from(document.querySelectorAll('canvas'));
  let webgl = 0;
  for (const c of canvases) {
    try {
      if (c.getContext('webgl2') || c.getContext('webgl') || c.getContext('experimental-webgl')) webgl++;
    } catch (e) {}
  }
  const html = document.documentElement.outerHTML;
  return {
    title: document.title || null,
    html: html.length > 2000000 ? html.slice(0, 2000000) : html,
    textLength: document.body ? (document.body.innerText || '').trim().length : 0,
    canvas: { count: canvases.length, webgl },
    tags,
  };
}

function markProbeTargets(limit) {
  const selector = 'a[href], button, input:not([type=hidden]), select, textarea, [role=button], [role=link], [role=tab], [role=menuitem], [role=checkbox], [role=switch], [role=textbox]';
  const all = Array.from(document.querySelectorAll('*'));
  const targets = [];
  for (const el of document.querySelectorAll(selector)) {
    if (targets.length >= limit) break;
    const r = el.getBoundingClientRect();
    const cs = getComputedStyle(el);
    if (r.width <= 0 || r.height <= 0 || cs.visibility === 'hidden' || cs.display === 'none') continue;
    const tag = el.tagName.toLowerCase();
    const role = el.getAttribute('role') || '';
    const type = (el.getAttribute('type') || '').toLowerCase();
    let kind = 'other';
    if (tag === 'a' || role === 'link') kind = 'link';
    else if (tag === 'button' || ['button', 'tab', 'menuitem'].includes(role) || ['submit', 'button', 'reset'].includes(type)) kind = 'button';
    else if (['input', 'select', 'textarea'].includes(tag) || ['checkbox', 'switch', 'textbox'].includes(role)) kind = 'input';
    const marker = String(targets.length);
    el.setAttribute('data-dsx-probe', marker);
    targets.push({ marker, element: all.indexOf(el), kind });
  }
  return targets;
}

function readProbeStyle(args) {
  const el = document.querySelector(`[data-dsx-probe="${args.marker}"]`);
  if (!el) return null;
  const cs = getComputedStyle(el);
  const out = {};
  for (const p of args.properties) out[p] = cs.getPropertyValue(p).trim();
  return out;
}

async function probe(page) {
  const targets = await page.evaluate(markProbeTargets, opts.probeLimit);
  const samples = [];
  for (const t of targets) {
    if (t.element < 0 || t.element >= opts.maxElements) continue;
    const locator = page.locator(`[data-dsx-probe="${t.marker}"]`);
    const read = () => page.evaluate(readProbeStyle, { marker: t.marker, properties: opts.probeProperties });
    const sample = { element: t.element, kind: t.kind, before: (await read()) || {} };
    try {
      await locator.hover({ timeout: opts.hoverMs });
      await page.waitForTimeout(opts.transitionMs);
      sample.hover = await read();
    } catch (e) {
      sample.hoverError = String(e && e.message ? e.message : e).split('\n')[0];
    }
    await page.mouse.move(0, 0).catch(() => {});
    if (t.kind === 'button' || t.kind === 'input') {
      try {
        await locator.focus({ timeout: opts.focusMs });
        await page.waitForTimeout(opts.transitionMs);
        sample.focus = await read();
      } catch (e) {
        sample.focusError = String(e && e.message ? e.message : e).split('\n')[0];
      }
      await page.evaluate(() => document.activeElement && document.activeElement.blur && document.activeElement.blur()).catch(() => {});
    }
    samples.push(sample);
  }
  await page.evaluate(() => {
    for (const el of document.querySelectorAll('[data-dsx-probe]')) el.removeAttribute('data-dsx-probe');
  });
  return samples;
}

async function darkVariant(page, captureArgs) {
  await page.emulateMedia({ colorScheme: 'dark' });
  const previous = await page.evaluate(() => {
    const root = document.documentElement;
    const state = { hadClass: root.classList.contains('dark'), theme: root.getAttribute('data-theme') };
    root.classList.add('dark');
    root.setAttribute('data-theme', 'dark');
    return state;
  });
  await page.waitForTimeout(opts.transitionMs);
  const elements = await page.evaluate(captureElements, captureArgs);
  await page.evaluate((state) => {
    const root = document.documentElement;
    if (!state.hadClass) root.classList.remove('dark');
    if (state.theme === null) root.removeAttribute('data-theme');
    else root.setAttribute('data-theme', state.theme);
  }, previous);
  await page.emulateMedia({ colorScheme: null });
  return elements;
}

async function mobileVariant(page, captureArgs) {
  await page.setViewportSize({ width: opts.mobileWidth, height: opts.mobileHeight });
  await page.waitForTimeout(opts.transitionMs);
  const elements = await page.evaluate(captureElements, captureArgs);
  await page.setViewportSize({ width: opts.width, height: opts.height });
  return elements;
}

async function runtimeGlobals(page) {
  return page.evaluate((checks) => {
    const found = [];
    for (const check of checks) {
      try {
        if (new Function(`return (${check.expression});`)()) found.push(check.id);
      } catch (e) {}
    }
    return found;
  }, opts.runtimeChecks);
}

async function run() {
  let browser;
  try {
    const { chromium } = require('playwright');
    browser = await chromium.launch({ headless: opts.headless });
    const context = await browser.newContext({
      viewport: { width: opts.width, height: opts.height },
      bypassCSP: true,
    });
    const page = await context.newPage();

    stage = 'navigation';
    const response = await page.goto(url, { waitUntil: 'load', timeout: opts.navigationMs });
    await page.waitForLoadState('networkidle', { timeout: opts.settleMs }).catch(() => {});
    await page.waitForTimeout(Math.min(opts.settleMs, 1000));

    stage = 'capture';
    const captureArgs = { properties: opts.properties, maxElements: opts.maxElements };
    const elements = await page.evaluate(captureElements, captureArgs);
    const { stylesheets, cssVariables } = await page.evaluate(captureStylesheets);
    const doc = await page.evaluate(captureDocument);

    stage = 'probe';
    const probeSamples = opts.probeLimit > 0 ? await probe(page) : [];

    stage = 'variants';
    const variants = {};
    if (opts.darkMode) variants.dark = await darkVariant(page, captureArgs);
    if (opts.mobile) variants.mobile = await mobileVariant(page, captureArgs);

    stage = 'runtime';
    const globals = await runtimeGlobals(page).catch(() => []);

    const capture = {
      url: page.url(),
      title: doc.title,
      status: response ? response.status() : null,
      headers: response ? response.headers() : {},
      html: doc.html,
      textLength: doc.textLength,
      canvas: doc.canvas,
      elements,
      stylesheets,
      cssVariables,
      tags: doc.tags,
      probe: probeSamples,
      variants,
      runtimeGlobals: globals,
    };
    console.log(JSON.stringify({ status: 'ok', capture }));
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    console.error(JSON.stringify({ status: 'error', stage, message }));
    process.exitCode = 1;
  } finally {
    if (browser) {
      await browser.close();
    }
  }
}

run();
"#;

/// Computed style properties read for every captured element.
pub const CAPTURED_PROPERTIES: &[&str] = &[
    "display",
    "visibility",
    "opacity",
    "position",
    "color",
    "background-color",
    "background-image",
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
    "border-top-style",
    "border-right-style",
    "border-bottom-style",
    "border-left-style",
    "border-top-color",
    "border-right-color",
    "border-bottom-color",
    "border-left-color",
    "border-color",
    "border-radius",
    "box-shadow",
    "outline-color",
    "outline-style",
    "outline-width",
    "caret-color",
    "text-decoration-color",
    "text-decoration-line",
    "text-underline-offset",
    "fill",
    "stroke",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "font-feature-settings",
    "line-height",
    "letter-spacing",
    "text-transform",
    "margin-top",
    "margin-bottom",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "height",
    "accent-color",
    "gap",
    "transition",
    "cursor",
];

pub(crate) const NODE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

const PLAYWRIGHT_CHECK_SCRIPT: &str = "require('playwright'); process.stdout.write('ok');";

/// One runtime-global probe handed to the script.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RuntimeCheckArg {
    pub id: &'static str,
    pub expression: &'static str,
}

/// Everything the script reads from its JSON argument.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScriptOptions {
    pub width: u32,
    pub height: u32,
    pub mobile_width: u32,
    pub mobile_height: u32,
    pub headless: bool,
    pub navigation_ms: u64,
    pub settle_ms: u64,
    pub hover_ms: u64,
    pub focus_ms: u64,
    pub transition_ms: u64,
    pub probe_limit: usize,
    pub max_elements: usize,
    pub dark_mode: bool,
    pub mobile: bool,
    pub properties: Vec<&'static str>,
    pub probe_properties: Vec<&'static str>,
    pub runtime_checks: Vec<RuntimeCheckArg>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScriptOutput {
    pub status: String,
    #[serde(default)]
    pub capture: Option<PageCapture>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScriptError {
    #[serde(default)]
    pub stage: Option<String>,
    pub message: String,
}

pub(crate) fn map_spawn_error(err: io::Error, command: &str) -> DsxError {
    if err.kind() == io::ErrorKind::NotFound {
        DsxError::Browser(format!(
            "Unable to spawn Playwright helper; '{}' was not found on PATH",
            command
        ))
    } else {
        DsxError::Io(err)
    }
}

fn missing_playwright() -> DsxError {
    DsxError::Browser(
        "Playwright npm package is missing; install with `npm install playwright`.".to_string(),
    )
}

/// Maps the helper's stderr to an error. Navigation-stage failures become
/// classified (and retryable) navigation errors.
pub(crate) fn map_script_error(status_text: impl Into<String>, stderr: &str, url: &str) -> DsxError {
    let last_line = stderr.lines().rev().find(|l| l.trim_start().starts_with('{'));
    if let Some(error) = last_line.and_then(|l| serde_json::from_str::<ScriptError>(l).ok()) {
        return map_stage_error(error.stage.as_deref(), error.message, url);
    }

    if stderr
        .to_ascii_lowercase()
        .contains("cannot find module 'playwright'")
    {
        return missing_playwright();
    }

    DsxError::Browser(format!(
        "Playwright exited with status {}: {}",
        status_text.into(),
        stderr.trim()
    ))
}

pub(crate) fn map_stage_error(stage: Option<&str>, message: String, url: &str) -> DsxError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("cannot find module 'playwright'") {
        return missing_playwright();
    }
    match stage {
        Some("navigation") => DsxError::navigation(url, message),
        Some("launch") if lower.contains("executable doesn't exist") => DsxError::Browser(format!(
            "Chromium for Playwright is not installed: {}",
            message.lines().next().unwrap_or_default()
        )),
        Some(stage) => DsxError::Browser(format!("Playwright error during {stage}: {message}")),
        None => DsxError::Browser(format!("Playwright error: {message}")),
    }
}

pub(crate) async fn ensure_node_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.status())
        .await
        .map_err(|_| {
            DsxError::Browser(format!(
                "Timed out checking node availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !status.success() {
        return Err(DsxError::Browser(format!(
            "Node command {:?} is not available (exit {})",
            node_command, status
        )));
    }

    Ok(())
}

pub(crate) async fn ensure_playwright_available(node_command: &str) -> Result<()> {
    let mut cmd = Command::new(node_command);
    cmd.arg("-e")
        .arg(PLAYWRIGHT_CHECK_SCRIPT)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = tokio::time::timeout(NODE_CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            DsxError::Browser(format!(
                "Timed out checking Playwright availability after {:?}",
                NODE_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_script_error(format!("{:?}", output.status), &stderr, ""));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavigationErrorKind;

    #[test]
    fn navigation_stage_errors_are_classified() {
        let err = map_script_error(
            "exit status: 1",
            r#"{"status":"error","stage":"navigation","message":"page.goto: net::ERR_NAME_NOT_RESOLVED at https://nope.invalid/"}"#,
            "https://nope.invalid/",
        );
        match &err {
            DsxError::Navigation { kind, url, .. } => {
                assert_eq!(*kind, NavigationErrorKind::Dns);
                assert_eq!(url, "https://nope.invalid/");
            }
            other => panic!("expected navigation error, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[test]
    fn missing_module_is_reported_in_json_and_plain_stderr() {
        for stderr in [
            r#"{"status":"error","stage":"launch","message":"Cannot find module 'playwright'"}"#,
            "Error: Cannot find module 'playwright'\n    at Module._resolveFilename",
        ] {
            let msg = map_script_error("exit status: 1", stderr, "https://example.com").to_string();
            assert!(msg.contains("Playwright npm package is missing"), "{msg}");
        }
    }

    #[test]
    fn later_stage_errors_are_browser_errors() {
        let err = map_script_error(
            "exit status: 1",
            "some warning\n{\"status\":\"error\",\"stage\":\"capture\",\"message\":\"Execution context was destroyed\"}",
            "https://example.com",
        );
        match err {
            DsxError::Browser(msg) => {
                assert!(msg.contains("during capture"), "{msg}");
                assert!(msg.contains("Execution context"), "{msg}");
            }
            other => panic!("expected browser error, got {other:?}"),
        }
    }

    #[test]
    fn captured_properties_cover_probe_properties() {
        for property in crate::analysis::probe::PROBE_PROPERTIES {
            assert!(CAPTURED_PROPERTIES.contains(property), "{property}");
        }
    }

    #[test]
    fn captured_properties_cover_component_properties() {
        use crate::analysis::components::{badges, buttons, inputs, links};
        let lists = [
            ("buttons", buttons::PROPERTIES),
            ("inputs", inputs::PROPERTIES),
            ("links", links::PROPERTIES),
            ("badges", badges::PROPERTIES),
        ];
        for (component, properties) in lists {
            for property in properties {
                assert!(
                    CAPTURED_PROPERTIES.contains(property),
                    "{component} reads uncaptured {property}"
                );
            }
        }
    }

    #[test]
    fn options_serialize_in_camel_case() {
        let options = ScriptOptions {
            width: 1440,
            height: 900,
            mobile_width: 390,
            mobile_height: 844,
            headless: true,
            navigation_ms: 30_000,
            settle_ms: 2_000,
            hover_ms: 1_000,
            focus_ms: 1_000,
            transition_ms: 200,
            probe_limit: 20,
            max_elements: 6_000,
            dark_mode: false,
            mobile: true,
            properties: vec!["color"],
            probe_properties: vec!["color"],
            runtime_checks: vec![RuntimeCheckArg {
                id: "react",
                expression: "!!window.React",
            }],
        };
        let json = serde_json::to_value(&options).expect("serialize");
        assert_eq!(json["navigationMs"], 30_000);
        assert_eq!(json["probeLimit"], 20);
        assert_eq!(json["runtimeChecks"][0]["id"], "react");
    }

    #[tokio::test]
    async fn ensure_node_available_fails_for_missing_binary() {
        let result = ensure_node_available("definitely-not-a-binary").await;
        assert!(matches!(result, Err(DsxError::Browser(_))));
    }

    #[tokio::test]
    async fn ensure_playwright_available_fails_for_missing_binary() {
        let result = ensure_playwright_available("definitely-not-a-binary").await;
        assert!(result.is_err());
    }
}

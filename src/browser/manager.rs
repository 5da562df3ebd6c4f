//! Browser manager for coordinating capture sessions.
//!
//! Owns the retry policy, the whole-process timeout and the session
//! semaphore; the page itself is only ever touched by the capture script.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::script::{
    ensure_node_available, ensure_playwright_available, map_script_error, map_spawn_error,
    RuntimeCheckArg, ScriptOptions, ScriptOutput, CAPTURED_PROPERTIES, CAPTURE_SCRIPT,
};
use crate::analysis::probe::PROBE_PROPERTIES;
use crate::config::{Config, RetryPolicy, Timeouts};
use crate::fingerprint::builtin::RUNTIME_CHECKS;
use crate::types::PageCapture;
use crate::{DsxError, Result, Viewport};

/// Points at a JSON [`PageCapture`] used instead of launching a browser.
pub const MOCK_CAPTURE_ENV: &str = "DSX_MOCK_CAPTURE";

/// Slow mode multiplies every wait by this factor.
pub const SLOW_FACTOR: u32 = 3;

const TRANSITION_WAIT: Duration = Duration::from_millis(200);

pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration options for capture sessions.
#[derive(Clone)]
pub struct CaptureOptions {
    pub node_command: String,
    pub viewport: Viewport,
    pub headless: bool,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
    pub probe_limit: usize,
    pub max_elements: usize,
    /// Re-capture elements under a forced dark theme.
    pub dark_mode: bool,
    /// Re-capture elements at the mobile viewport.
    pub mobile: bool,
    pub slow: bool,
    pub max_concurrent_sessions: usize,
    pub progress: Option<ProgressCallback>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl std::fmt::Debug for CaptureOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureOptions")
            .field("node_command", &self.node_command)
            .field("viewport", &self.viewport)
            .field("timeouts", &self.effective_timeouts())
            .field("retry", &self.retry)
            .field("probe_limit", &self.probe_limit)
            .field("dark_mode", &self.dark_mode)
            .field("mobile", &self.mobile)
            .field("slow", &self.slow)
            .finish()
    }
}

impl CaptureOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            node_command: "node".to_string(),
            viewport: config.viewport,
            headless: true,
            timeouts: config.timeouts,
            retry: config.retry,
            probe_limit: config.limits.probe_elements,
            max_elements: config.limits.max_elements,
            dark_mode: false,
            mobile: false,
            slow: false,
            max_concurrent_sessions: 1,
            progress: None,
        }
    }

    /// Timeouts after applying slow mode.
    pub fn effective_timeouts(&self) -> Timeouts {
        if self.slow {
            self.timeouts.scaled(SLOW_FACTOR)
        } else {
            self.timeouts
        }
    }

    fn script_options(&self) -> ScriptOptions {
        let timeouts = self.effective_timeouts();
        let transition = if self.slow {
            TRANSITION_WAIT * SLOW_FACTOR
        } else {
            TRANSITION_WAIT
        };
        ScriptOptions {
            width: self.viewport.width,
            height: self.viewport.height,
            mobile_width: Viewport::MOBILE.width,
            mobile_height: Viewport::MOBILE.height,
            headless: self.headless,
            navigation_ms: timeouts.navigation.as_millis() as u64,
            settle_ms: timeouts.settle.as_millis() as u64,
            hover_ms: timeouts.hover.as_millis() as u64,
            focus_ms: timeouts.focus.as_millis() as u64,
            transition_ms: transition.as_millis() as u64,
            probe_limit: self.probe_limit,
            max_elements: self.max_elements,
            dark_mode: self.dark_mode,
            mobile: self.mobile,
            properties: CAPTURED_PROPERTIES.to_vec(),
            probe_properties: PROBE_PROPERTIES.to_vec(),
            runtime_checks: RUNTIME_CHECKS
                .iter()
                .map(|check| RuntimeCheckArg {
                    id: check.id,
                    expression: check.expression,
                })
                .collect(),
        }
    }
}

/// Manages capture sessions with semaphore-based limiting.
#[derive(Debug, Clone)]
pub struct BrowserManager {
    options: CaptureOptions,
    semaphore: Arc<Semaphore>,
}

impl BrowserManager {
    pub fn new(options: CaptureOptions) -> Self {
        let permits = options.max_concurrent_sessions.max(1);
        Self {
            options,
            semaphore: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Captures `url`, retrying navigation failures and near-empty pages
    /// while attempts remain.
    pub async fn capture(&self, url: &str) -> Result<PageCapture> {
        if let Some(path) = mock_capture_path() {
            self.log_progress(&format!("Loading mock capture from {}", path.display()));
            return load_mock_capture(&path, url);
        }

        ensure_node_available(&self.options.node_command).await?;
        ensure_playwright_available(&self.options.node_command).await?;
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DsxError::Browser("Browser manager unavailable".to_string()))?;

        let attempts = self.options.retry.attempts.max(1);
        let min_text = self.options.retry.min_text_length;
        let mut attempt = 1;
        loop {
            self.log_progress(&format!(
                "Capturing {} ({}x{}, attempt {}/{})…",
                url, self.options.viewport.width, self.options.viewport.height, attempt, attempts
            ));
            match self.run_script(url).await {
                Ok(capture) if capture.text_length < min_text && attempt < attempts => {
                    warn!(
                        url,
                        text_length = capture.text_length,
                        attempt,
                        "page content looks empty; retrying"
                    );
                }
                Ok(capture) => return Ok(capture),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(url, attempt, error = %err, "navigation failed; retrying");
                }
                Err(err) => return Err(err),
            }
            tokio::time::sleep(self.options.retry.backoff).await;
            attempt += 1;
        }
    }

    async fn run_script(&self, url: &str) -> Result<PageCapture> {
        let script_options = serde_json::to_string(&self.options.script_options())?;
        let process_timeout = self.options.effective_timeouts().process;

        let mut cmd = Command::new(&self.options.node_command);
        cmd.arg("-e")
            .arg(CAPTURE_SCRIPT)
            .arg(url)
            .arg(script_options)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|err| map_spawn_error(err, &self.options.node_command))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut out) = stdout_pipe {
                let _ = out.read_to_end(&mut buf).await;
            }
            buf
        });

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut err) = stderr_pipe {
                let _ = err.read_to_end(&mut buf).await;
            }
            buf
        });

        let status = match timeout(process_timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => return Err(DsxError::Io(err)),
            Err(_) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                self.log_progress("Playwright timed out; process killed after exceeding timeout.");
                return Err(DsxError::Browser(format!(
                    "Playwright timed out after {:?}",
                    process_timeout
                )));
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(map_script_error(status.to_string(), &stderr, url));
        }

        let stdout = String::from_utf8_lossy(&stdout);
        let output: ScriptOutput = serde_json::from_str(stdout.trim()).map_err(|e| {
            DsxError::Browser(format!(
                "Failed to parse Playwright output: {} - raw: {}",
                e,
                truncate(stdout.trim(), 200)
            ))
        })?;
        if output.status != "ok" {
            return Err(DsxError::Browser(format!(
                "Playwright returned non-ok status {}: {}",
                output.status,
                output.message.as_deref().unwrap_or("no additional details")
            )));
        }
        let capture = output.capture.ok_or_else(|| {
            DsxError::Browser("Playwright returned ok status but no capture data".to_string())
        })?;

        info!(
            url,
            elements = capture.elements.len(),
            rules = capture.stylesheets.rules.len(),
            probed = capture.probe.len(),
            "capture finished"
        );
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "capture timing");
        self.log_progress(&format!(
            "Capture finished in {:.1}s ({} elements)",
            start.elapsed().as_secs_f32(),
            capture.elements.len()
        ));
        Ok(capture)
    }

    fn log_progress(&self, message: &str) {
        if let Some(cb) = &self.options.progress {
            cb(message);
        }
    }
}

fn mock_capture_path() -> Option<PathBuf> {
    std::env::var_os(MOCK_CAPTURE_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Reads a capture document from disk; an empty `url` field takes `url`.
pub fn load_mock_capture(path: &std::path::Path, url: &str) -> Result<PageCapture> {
    let raw = std::fs::read_to_string(path)?;
    let mut capture: PageCapture = serde_json::from_str(&raw)?;
    if capture.url.is_empty() {
        capture.url = url.to_string();
    }
    Ok(capture)
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn capture_options_default_values() {
        let opts = CaptureOptions::default();
        assert_eq!(opts.node_command, "node");
        assert!(opts.headless);
        assert_eq!(opts.max_concurrent_sessions, 1);
        assert_eq!(opts.viewport, Viewport::default());
        assert_eq!(opts.retry.attempts, 2);
        assert_eq!(opts.probe_limit, 20);
        assert!(opts.progress.is_none());
    }

    #[test]
    fn slow_mode_triples_timeouts() {
        let opts = CaptureOptions {
            slow: true,
            ..CaptureOptions::default()
        };
        let base = Timeouts::default();
        let effective = opts.effective_timeouts();
        assert_eq!(effective.navigation, base.navigation * 3);
        assert_eq!(effective.hover, base.hover * 3);
        assert_eq!(effective.process, base.process * 3);
        assert_eq!(opts.script_options().transition_ms, 600);
    }

    #[test]
    fn semaphore_never_zero() {
        let manager = BrowserManager::new(CaptureOptions {
            max_concurrent_sessions: 0,
            ..CaptureOptions::default()
        });
        assert_eq!(manager.semaphore.available_permits(), 1);
    }

    #[test]
    fn script_options_carry_runtime_checks() {
        let options = CaptureOptions {
            dark_mode: true,
            ..CaptureOptions::default()
        }
        .script_options();
        assert!(options.dark_mode);
        assert!(!options.mobile);
        assert_eq!(options.runtime_checks.len(), RUNTIME_CHECKS.len());
        assert_eq!(options.mobile_width, 390);
    }

    #[test]
    fn mock_capture_fills_missing_url() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"url":"","textLength":420,"elements":[]}}"#).expect("write");
        let capture = load_mock_capture(file.path(), "https://example.com").expect("load");
        assert_eq!(capture.url, "https://example.com");
        assert_eq!(capture.text_length, 420);
    }

    #[tokio::test]
    async fn capture_fails_for_missing_node_binary() {
        if mock_capture_path().is_some() {
            return;
        }
        let manager = BrowserManager::new(CaptureOptions {
            node_command: "definitely-not-a-binary".to_string(),
            ..CaptureOptions::default()
        });
        let result = manager.capture("https://example.com").await;
        assert!(matches!(result, Err(DsxError::Browser(_))));
    }
}

//! Headless page capture via Playwright running under Node.js.
//!
//! - [`manager`] - capture sessions, retries and concurrency control
//! - [`script`] - the inline capture script and availability checks
//!
//! # Example
//!
//! ```no_run
//! use dsx_lib::browser::{BrowserManager, CaptureOptions};
//!
//! # async fn example() -> dsx_lib::Result<()> {
//! let manager = BrowserManager::new(CaptureOptions::default());
//! let capture = manager.capture("https://example.com").await?;
//! println!("captured {} elements", capture.elements.len());
//! # Ok(())
//! # }
//! ```

mod manager;
mod script;

pub use manager::{
    load_mock_capture, BrowserManager, CaptureOptions, ProgressCallback, MOCK_CAPTURE_ENV,
    SLOW_FACTOR,
};
pub use script::CAPTURED_PROPERTIES;

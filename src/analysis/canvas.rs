use crate::types::PageCapture;

const MIN_CANVASES: usize = 3;
const MAX_TEXT_LENGTH: usize = 200;

pub const CANVAS_NOTE: &str = "This page renders its interface into canvas/WebGL rather than the DOM, \
so no design tokens could be extracted from computed styles.";

/// More than three canvases, at least one WebGL-backed, and almost no text.
pub fn is_canvas_only(page: &PageCapture) -> bool {
    page.canvas.count > MIN_CANVASES && page.canvas.webgl >= 1 && page.text_length < MAX_TEXT_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanvasInfo;

    fn page(count: usize, webgl: usize, text_length: usize) -> PageCapture {
        PageCapture {
            canvas: CanvasInfo { count, webgl },
            text_length,
            ..Default::default()
        }
    }

    #[test]
    fn webgl_scene_with_little_text() {
        assert!(is_canvas_only(&page(5, 1, 50)));
    }

    #[test]
    fn needs_all_three_signals() {
        assert!(!is_canvas_only(&page(3, 1, 50)));
        assert!(!is_canvas_only(&page(5, 0, 50)));
        assert!(!is_canvas_only(&page(5, 1, 200)));
    }
}

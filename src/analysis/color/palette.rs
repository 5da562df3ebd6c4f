//! Color accumulation, threshold filtering and perceptual deduplication.

use std::collections::HashMap;

use super::parse::{parse_color, Rgba};
use crate::config::ColorThresholds;
use crate::types::{ColorEntry, Confidence};

/// Max context tags kept per color.
const MAX_CONTEXT_TAGS: usize = 3;

#[derive(Debug, Clone)]
struct Tally {
    original: String,
    rgba: Rgba,
    count: usize,
    score: f32,
    tags: Vec<String>,
}

/// Running per-color totals keyed by normalized hex.
#[derive(Debug, Default)]
pub struct ColorAccumulator {
    tallies: HashMap<String, Tally>,
}

impl ColorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one element's use of a color.
    pub fn record(&mut self, original: &str, rgba: Rgba, score: f32, tag: Option<&str>) {
        let hex = rgba.to_hex();
        let tally = self.tallies.entry(hex).or_insert_with(|| Tally {
            original: original.trim().to_string(),
            rgba,
            count: 0,
            score: 0.0,
            tags: Vec::new(),
        });
        tally.count += 1;
        tally.score += score;
        if score > 1.0 {
            if let Some(tag) = tag {
                if tally.tags.len() < MAX_CONTEXT_TAGS && !tally.tags.iter().any(|t| t == tag) {
                    tally.tags.push(tag.to_string());
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Applies inclusion/structural filters, then dedups perceptually.
    pub fn finalize(self, total_elements: usize, thresholds: &ColorThresholds) -> Vec<ColorEntry> {
        let min_count = inclusion_threshold(total_elements, thresholds);
        let mut kept: Vec<(String, Tally)> = self
            .tallies
            .into_iter()
            .filter(|(_, t)| !t.rgba.is_transparent())
            .filter(|(_, t)| {
                t.count >= min_count || t.score >= thresholds.semantic_inclusion_score
            })
            .filter(|(_, t)| !is_structural(t.count, t.score, total_elements, thresholds))
            .collect();

        kept.sort_by(|(ha, a), (hb, b)| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.score.total_cmp(&a.score))
                .then_with(|| ha.cmp(hb))
        });

        let mut entries: Vec<ColorEntry> = Vec::new();
        let mut representatives: Vec<Rgba> = Vec::new();
        for (hex, tally) in kept {
            if representatives
                .iter()
                .any(|r| r.distance(&tally.rgba) < thresholds.dedup_distance)
            {
                continue;
            }
            representatives.push(tally.rgba);
            entries.push(ColorEntry {
                original_text: tally.original,
                normalized_hex: hex,
                occurrence_count: tally.count,
                semantic_score: tally.score,
                confidence: Confidence::from_score(tally.score),
                context_tags: tally.tags,
            });
        }
        entries
    }
}

/// `max(min_occurrences, floor(occurrence_ratio * N))`.
pub fn inclusion_threshold(total_elements: usize, thresholds: &ColorThresholds) -> usize {
    let proportional = (total_elements as f32 * thresholds.occurrence_ratio).floor() as usize;
    thresholds.min_occurrences.max(proportional)
}

/// Ubiquitous and not semantically distinguished.
pub fn is_structural(
    count: usize,
    score: f32,
    total_elements: usize,
    thresholds: &ColorThresholds,
) -> bool {
    if total_elements == 0 {
        return false;
    }
    let usage = count as f32 / total_elements as f32;
    usage > thresholds.structural_usage_ratio
        && score < count as f32 * thresholds.structural_score_factor
}

/// Whether `hex` is within the dedup distance of any palette entry.
pub fn is_represented(palette: &[ColorEntry], color: &Rgba, distance: f32) -> bool {
    palette.iter().any(|entry| {
        parse_color(&entry.normalized_hex)
            .map(|existing| existing.distance(color) < distance)
            .unwrap_or(false)
    })
}

/// Index of the entry that represents `color`, exact hex match first.
pub fn representative_index(palette: &[ColorEntry], color: &Rgba, distance: f32) -> Option<usize> {
    let hex = color.to_hex();
    palette
        .iter()
        .position(|e| e.normalized_hex == hex)
        .or_else(|| {
            palette.iter().position(|e| {
                parse_color(&e.normalized_hex)
                    .map(|existing| existing.distance(color) < distance)
                    .unwrap_or(false)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ColorThresholds {
        ColorThresholds::default()
    }

    fn record_n(acc: &mut ColorAccumulator, rgba: Rgba, n: usize, score: f32) {
        for _ in 0..n {
            acc.record(&rgba.to_hex(), rgba, score, Some("test"));
        }
    }

    #[test]
    fn threshold_is_monotonic_in_element_count() {
        let t = thresholds();
        let mut last = 0;
        for n in (0..5000).step_by(37) {
            let current = inclusion_threshold(n, &t);
            assert!(current >= last, "threshold decreased at {n}");
            assert!(current >= 3);
            last = current;
        }
        assert_eq!(inclusion_threshold(100, &t), 3);
        assert_eq!(inclusion_threshold(1000, &t), 10);
    }

    #[test]
    fn structural_filter_keeps_semantically_boosted_colors() {
        let t = thresholds();
        // half the page, unboosted
        assert!(is_structural(50, 50.0, 100, &t));
        // half the page, every use inside a "primary" element
        assert!(!is_structural(50, 200.0, 100, &t));
        // rare colors are never structural
        assert!(!is_structural(10, 10.0, 100, &t));
    }

    #[test]
    fn dedup_keeps_most_frequent_and_never_grows() {
        let mut acc = ColorAccumulator::new();
        record_n(&mut acc, Rgba::opaque(200, 30, 30), 20, 1.0);
        record_n(&mut acc, Rgba::opaque(205, 32, 28), 8, 1.0);
        record_n(&mut acc, Rgba::opaque(20, 20, 200), 6, 1.0);
        let distinct = acc.len();
        let palette = acc.finalize(200, &thresholds());
        assert!(palette.len() <= distinct);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette[0].normalized_hex, "#c81e1e");
        assert_eq!(palette[0].occurrence_count, 20);
    }

    #[test]
    fn rare_colors_need_a_high_score() {
        let mut acc = ColorAccumulator::new();
        record_n(&mut acc, Rgba::opaque(99, 102, 241), 1, 25.0);
        record_n(&mut acc, Rgba::opaque(10, 200, 10), 1, 1.0);
        let palette = acc.finalize(100, &thresholds());
        assert_eq!(palette.len(), 1);
        assert_eq!(palette[0].normalized_hex, "#6366f1");
        assert_eq!(palette[0].confidence, Confidence::High);
    }

    #[test]
    fn context_tags_are_capped_and_need_boosted_score() {
        let mut acc = ColorAccumulator::new();
        let c = Rgba::opaque(1, 2, 3);
        acc.record("a", c, 1.0, Some("generic"));
        for tag in ["logo", "cta", "hero", "nav", "logo"] {
            acc.record("a", c, 4.0, Some(tag));
        }
        let palette = acc.finalize(10, &thresholds());
        assert_eq!(palette[0].context_tags, vec!["logo", "cta", "hero"]);
    }

    #[test]
    fn transparent_colors_are_dropped() {
        let mut acc = ColorAccumulator::new();
        let clear = Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0.0,
        };
        record_n(&mut acc, clear, 10, 1.0);
        assert!(acc.finalize(100, &thresholds()).is_empty());
    }
}

//! Semicircular risk meter.

use super::{classify, RiskColor, MAX_SCORE, MIN_SCORE};

/// Needle rotation in degrees: -90 at score 0, +90 at score 100.
/// Scores outside 0-100 are clamped to the nearest end.
pub fn needle_angle(score: i32) -> f64 {
    let score = score.clamp(MIN_SCORE, MAX_SCORE) as f64;
    (score / 100.0) * 180.0 - 90.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMeter {
    pub score: i32,
    pub angle: f64,
    pub color: RiskColor,
    /// Share of the arc filled with `color`, 0-100.
    pub fill_percent: u8,
}

impl RiskMeter {
    pub fn new(score: i32) -> Self {
        Self {
            score,
            angle: needle_angle(score),
            color: classify(score).color,
            fill_percent: score.clamp(MIN_SCORE, MAX_SCORE) as u8,
        }
    }

    /// Plain-text gauge for terminals, e.g. `[##########----------] 50/100`.
    pub fn render_bar(&self, width: usize) -> String {
        let filled = (self.fill_percent as usize * width + 50) / 100;
        format!(
            "[{}{}] {}/100",
            "#".repeat(filled),
            "-".repeat(width - filled),
            self.score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_endpoints_and_midpoint() {
        assert_close(needle_angle(0), -90.0);
        assert_close(needle_angle(100), 90.0);
        assert_close(needle_angle(50), 0.0);
    }

    #[test]
    fn test_classifier_boundaries() {
        assert_close(needle_angle(20), -54.0);
        assert_close(needle_angle(40), -18.0);
        assert_close(needle_angle(60), 18.0);
        assert_close(needle_angle(80), 54.0);
        assert_close(needle_angle(92), 75.6);
    }

    #[test]
    fn test_whole_domain_in_range_and_increasing() {
        let mut previous = f64::NEG_INFINITY;
        for score in MIN_SCORE..=MAX_SCORE {
            let angle = needle_angle(score);
            assert!((-90.0..=90.0).contains(&angle));
            assert!(angle > previous);
            previous = angle;
        }
    }

    #[test]
    fn test_out_of_range_clamps() {
        assert_close(needle_angle(-20), -90.0);
        assert_close(needle_angle(250), 90.0);
    }

    #[test]
    fn test_meter() {
        let meter = RiskMeter::new(92);
        assert_eq!(meter.color, RiskColor::Red);
        assert_eq!(meter.fill_percent, 92);
        assert_eq!(RiskMeter::new(50).render_bar(10), "[#####-----] 50/100");
        assert_eq!(RiskMeter::new(0).render_bar(4), "[----] 0/100");
    }
}

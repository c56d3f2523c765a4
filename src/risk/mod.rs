//! Score to level to color mapping shared by every rendering surface.

pub mod gauge;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

pub use gauge::{needle_angle, RiskMeter};

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Severity buckets, declared lowest first so `Ord` follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Lenient parse for level strings supplied by the API. Anything
    /// unrecognized falls back to [`RiskLevel::None`].
    pub fn from_api(value: &str) -> RiskLevel {
        value.parse().unwrap_or_else(|_| {
            log::warn!("Unrecognized risk level '{}', using 'none'", value);
            RiskLevel::None
        })
    }

    pub fn color(&self) -> RiskColor {
        match self {
            RiskLevel::Critical => RiskColor::Red,
            RiskLevel::High => RiskColor::Orange,
            RiskLevel::Medium => RiskColor::Yellow,
            RiskLevel::Low => RiskColor::Blue,
            RiskLevel::None => RiskColor::Green,
        }
    }

    pub fn badge(&self) -> BadgeStyle {
        let (bg, text, border) = match self {
            RiskLevel::Critical => ("bg-red-100", "text-red-800", "border-red-300"),
            RiskLevel::High => ("bg-orange-100", "text-orange-800", "border-orange-300"),
            RiskLevel::Medium => ("bg-yellow-100", "text-yellow-800", "border-yellow-300"),
            RiskLevel::Low => ("bg-blue-100", "text-blue-800", "border-blue-300"),
            RiskLevel::None => ("bg-green-100", "text-green-800", "border-green-300"),
        };
        BadgeStyle {
            level: *self,
            bg,
            text,
            border,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRiskLevel(pub String);

impl fmt::Display for UnknownRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown risk level '{}'", self.0)
    }
}

impl std::error::Error for UnknownRiskLevel {}

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(RiskLevel::None),
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(UnknownRiskLevel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Red,
    Orange,
    Yellow,
    Blue,
    Green,
}

impl RiskColor {
    pub fn hex(&self) -> &'static str {
        match self {
            RiskColor::Red => "#ef4444",
            RiskColor::Orange => "#f97316",
            RiskColor::Yellow => "#eab308",
            RiskColor::Blue => "#3b82f6",
            RiskColor::Green => "#22c55e",
        }
    }

    /// 24-bit ANSI foreground escape for terminal output.
    pub fn ansi(&self) -> String {
        let hex = self.hex().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        format!("\x1b[38;2;{};{};{}m", channel(0), channel(2), channel(4))
    }
}

/// Utility-class tokens for a level badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeStyle {
    pub level: RiskLevel,
    pub bg: &'static str,
    pub text: &'static str,
    pub border: &'static str,
}

impl BadgeStyle {
    /// Badge for a level string straight from the API.
    pub fn for_label(label: &str) -> BadgeStyle {
        RiskLevel::from_api(label).badge()
    }

    pub fn label(&self) -> String {
        self.level.as_str().to_uppercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub level: RiskLevel,
    pub color: RiskColor,
}

static REPORTED_SCORES: Lazy<Mutex<HashSet<i32>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Log an out-of-range score once per distinct value. Returns whether this
/// call produced the report.
pub fn report_out_of_range(score: i32) -> bool {
    let first = match REPORTED_SCORES.lock() {
        Ok(mut seen) => seen.insert(score),
        Err(_) => false,
    };
    if first {
        log::error!(
            "Risk score {} is outside [{}, {}]; rendering as lowest severity",
            score,
            MIN_SCORE,
            MAX_SCORE
        );
    }
    first
}

/// Map a 0-100 score to its level and color. Out-of-range scores render as
/// [`RiskLevel::None`] and are reported.
pub fn classify(score: i32) -> Classification {
    let level = match score {
        80..=100 => RiskLevel::Critical,
        60..=79 => RiskLevel::High,
        40..=59 => RiskLevel::Medium,
        20..=39 => RiskLevel::Low,
        0..=19 => RiskLevel::None,
        _ => {
            report_out_of_range(score);
            RiskLevel::None
        }
    };
    Classification {
        level,
        color: level.color(),
    }
}

/// Level to display for a scan or card.
///
/// The API-supplied label wins whenever it is present. An unrecognized label
/// renders as `none`; the local classification is only used when the API sent
/// no label at all.
pub fn resolve_level(api_level: Option<&str>, score: i32) -> RiskLevel {
    match api_level.map(str::trim).filter(|label| !label.is_empty()) {
        Some(label) => {
            let level = RiskLevel::from_api(label);
            let local = classify(score).level;
            if level != local {
                log::debug!(
                    "API level '{}' differs from local classification '{}' for score {}",
                    label,
                    local,
                    score
                );
            }
            level
        }
        None => classify(score).level,
    }
}

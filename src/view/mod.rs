//! Render models handed to whatever paints the page or terminal.

use crate::api::{CardData, Evidence, ScamCardRef, ScanResult};
use crate::risk::{resolve_level, BadgeStyle, RiskLevel, RiskMeter};
use crate::text::humanize_scam_type;
use serde::Serialize;

pub const SITE_NAME: &str = "Savdhaan AI";
pub const FALLBACK_TITLE: &str = "Scam Alert - Savdhaan AI";
pub const FALLBACK_DESCRIPTION: &str = "This message has been flagged as a potential scam.";

#[derive(Debug, Clone, PartialEq)]
pub struct ScanView {
    pub scan_id: String,
    pub level: RiskLevel,
    pub badge: BadgeStyle,
    pub meter: RiskMeter,
    pub scam_type_label: Option<String>,
    pub explanation: String,
    pub evidence: Vec<Evidence>,
    pub actions: Vec<String>,
    pub checks_performed: Vec<String>,
    pub checks_not_available: Vec<String>,
    pub confidence_note: String,
    pub scam_card: Option<ScamCardRef>,
    pub processing_time_ms: u64,
}

impl ScanView {
    /// Path of the in-app card page, when the scan produced a card.
    pub fn card_path(&self) -> Option<String> {
        self.scam_card
            .as_ref()
            .map(|card| format!("/card/{}", card.card_id))
    }

    /// Public URL for the "Copy Share Link" button.
    pub fn share_link(&self) -> Option<&str> {
        self.scam_card.as_ref().map(|card| card.card_url.as_str())
    }

    pub fn copy_share_link_enabled(&self) -> bool {
        self.scam_card.is_some()
    }

    pub fn threat_count(&self) -> usize {
        self.evidence.iter().filter(|e| e.is_threat).count()
    }
}

impl From<ScanResult> for ScanView {
    fn from(scan: ScanResult) -> Self {
        let level = resolve_level(scan.risk_level.as_deref(), scan.risk_score);
        Self {
            scan_id: scan.scan_id,
            level,
            badge: level.badge(),
            meter: RiskMeter::new(scan.risk_score),
            scam_type_label: scan.scam_type.as_deref().map(humanize_scam_type),
            explanation: scan.explanation,
            evidence: scan.evidence,
            actions: scan.actions,
            checks_performed: scan.checks_performed,
            checks_not_available: scan.checks_not_available,
            confidence_note: scan.confidence_note,
            scam_card: scan.scam_card,
            processing_time_ms: scan.processing_time_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub card_id: String,
    pub title: String,
    pub summary: String,
    pub level: RiskLevel,
    pub badge: BadgeStyle,
    pub risk_score: i32,
    pub scam_type_label: Option<String>,
    pub card_url: String,
    pub image_url: Option<String>,
    pub created_label: String,
    pub views_label: String,
}

impl From<CardData> for CardView {
    fn from(card: CardData) -> Self {
        let level = resolve_level(card.risk_level.as_deref(), card.risk_score);
        Self {
            card_id: card.card_id,
            title: card.title,
            summary: card.summary,
            level,
            badge: level.badge(),
            risk_score: card.risk_score,
            scam_type_label: card.scam_type.as_deref().map(humanize_scam_type),
            card_url: card.card_url,
            image_url: card.image_url,
            created_label: card.created_at.format("%b %-d, %Y").to_string(),
            views_label: format!("{} views", card.view_count),
        }
    }
}

/// Card page outcome. A failed lookup is a page state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CardPage {
    Found(Box<CardView>),
    NotFound,
}

impl CardPage {
    pub const NOT_FOUND_HEADING: &'static str = "Card not found";
    pub const NOT_FOUND_DETAIL: &'static str =
        "This scam card may have been removed or the link is invalid.";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    pub site_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub images: Vec<String>,
}

/// Preview metadata for a shared card link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_graph: Option<OpenGraph>,
}

impl PageMetadata {
    pub fn for_card(card: &CardData) -> Self {
        Self {
            title: format!("{} - {}", card.title, SITE_NAME),
            description: card.summary.clone(),
            open_graph: Some(OpenGraph {
                title: card.title.clone(),
                description: card.summary.clone(),
                site_name: SITE_NAME.to_string(),
                kind: "article".to_string(),
                images: card.image_url.iter().cloned().collect(),
            }),
        }
    }

    /// Generic, non-identifying description.
    pub fn fallback() -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            description: FALLBACK_DESCRIPTION.to_string(),
            open_graph: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.open_graph.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn card(image_url: Option<&str>) -> CardData {
        CardData {
            card_id: "k7Qp2x".to_string(),
            title: "Fake KYC update".to_string(),
            summary: "Message threatens account block and links to a phishing page.".to_string(),
            risk_level: Some("critical".to_string()),
            risk_score: 92,
            scam_type: Some("bank_kyc_fraud".to_string()),
            card_url: "https://savdhaan.ai/card/k7Qp2x".to_string(),
            image_url: image_url.map(str::to_string),
            share_count: 3,
            view_count: 41,
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_card_view_labels() {
        let view = CardView::from(card(None));
        assert_eq!(view.level, RiskLevel::Critical);
        assert_eq!(view.scam_type_label.as_deref(), Some("bank kyc fraud"));
        assert_eq!(view.created_label, "Jan 5, 2026");
        assert_eq!(view.views_label, "41 views");
    }

    #[test]
    fn test_card_view_unknown_level_renders_none() {
        let mut data = card(None);
        data.risk_level = Some("apocalyptic".to_string());
        let view = CardView::from(data);
        assert_eq!(view.level, RiskLevel::None);
        assert_eq!(view.badge.bg, "bg-green-100");
    }

    #[test]
    fn test_metadata_for_card() {
        let meta = PageMetadata::for_card(&card(Some("https://cdn.savdhaan.ai/k7Qp2x.png")));
        assert_eq!(meta.title, "Fake KYC update - Savdhaan AI");
        let og = meta.open_graph.unwrap();
        assert_eq!(og.kind, "article");
        assert_eq!(og.site_name, SITE_NAME);
        assert_eq!(og.images, vec!["https://cdn.savdhaan.ai/k7Qp2x.png".to_string()]);

        let no_image = PageMetadata::for_card(&card(None));
        assert!(no_image.open_graph.unwrap().images.is_empty());
    }

    #[test]
    fn test_fallback_metadata() {
        let meta = PageMetadata::fallback();
        assert!(meta.is_fallback());
        assert_eq!(meta.title, FALLBACK_TITLE);
        assert_eq!(meta.description, FALLBACK_DESCRIPTION);
    }
}

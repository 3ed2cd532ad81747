//! Display helpers for the scan history and treatment tabs.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::api::models::{Prediction, UNKNOWN};

/// Scans that need treatment: a named disease other than "healthy".
pub fn treatments(predictions: &[Prediction]) -> Vec<&Prediction> {
    predictions
        .iter()
        .filter(|p| p.disease_name().is_some() && !p.is_healthy())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub healthy: usize,
    pub needs_attention: usize,
}

pub fn summary(predictions: &[Prediction]) -> HistorySummary {
    HistorySummary {
        total: predictions.len(),
        healthy: predictions.iter().filter(|p| p.is_healthy()).count(),
        needs_attention: treatments(predictions).len(),
    }
}

/// Confidence as a whole percentage, e.g. `0.914` -> `"91%"`.
pub fn format_confidence(confidence: Option<f64>) -> String {
    match confidence {
        Some(c) if c.is_finite() && c >= 0.0 => format!("{:.0}%", c * 100.0),
        _ => UNKNOWN.to_string(),
    }
}

/// Calendar date of an ISO-8601 timestamp as `YYYY-MM-DD`.
pub fn format_date(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .and_then(parse_date)
        .map_or_else(|| UNKNOWN.to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// One history row with every field resolved to display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRow {
    pub id: String,
    pub disease: String,
    pub severity: String,
    pub confidence: String,
    pub date: String,
    pub image_url: String,
}

impl ScanRow {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        let unknown = || UNKNOWN.to_string();
        Self {
            id: prediction.id.clone().unwrap_or_else(unknown),
            disease: prediction
                .disease_name()
                .map_or_else(unknown, ToString::to_string),
            severity: prediction
                .disease
                .as_ref()
                .map_or(UNKNOWN, |d| d.severity().label())
                .to_string(),
            confidence: format_confidence(prediction.confidence),
            date: format_date(prediction.timestamp()),
            image_url: prediction
                .image_url()
                .map_or_else(unknown, ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn predictions() -> Vec<Prediction> {
        serde_json::from_value(json!([
            {"id": "1", "disease": {"nameEn": "Healthy"}},
            {"id": "2", "disease": {"nameEn": "HEALTHY "}},
            {"id": "3", "disease": {"nameEn": "Early Blight", "severityLevel": "high"}},
            {"id": "4"},
            {"id": "5", "disease": {"nameEn": ""}},
            {"id": "6", "disease": {"nameEn": "Leaf Rust"}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_treatments_skip_healthy_and_unnamed() {
        let all = predictions();
        let ids: Vec<_> = treatments(&all)
            .into_iter()
            .filter_map(|p| p.id.as_deref())
            .collect();
        assert_eq!(ids, ["3", "6"]);
    }

    #[test]
    fn test_summary_counts() {
        assert_eq!(
            summary(&predictions()),
            HistorySummary {
                total: 6,
                healthy: 2,
                needs_attention: 2,
            }
        );
    }

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(Some(0.914)), "91%");
        assert_eq!(format_confidence(Some(1.0)), "100%");
        assert_eq!(format_confidence(None), UNKNOWN);
        assert_eq!(format_confidence(Some(f64::NAN)), UNKNOWN);
    }

    #[test]
    fn test_format_date_variants() {
        assert_eq!(format_date(Some("2024-05-01T10:20:30.000Z")), "2024-05-01");
        assert_eq!(format_date(Some("2024-05-01T10:20:30")), "2024-05-01");
        assert_eq!(format_date(Some("2024-05-01")), "2024-05-01");
        assert_eq!(format_date(Some("yesterday")), UNKNOWN);
        assert_eq!(format_date(None), UNKNOWN);
    }

    #[test]
    fn test_scan_row_falls_back_to_unknown() {
        let row = ScanRow::from_prediction(&Prediction::default());
        assert_eq!(row.id, UNKNOWN);
        assert_eq!(row.disease, UNKNOWN);
        assert_eq!(row.severity, UNKNOWN);
        assert_eq!(row.date, UNKNOWN);

        let all = predictions();
        let blight = ScanRow::from_prediction(&all[2]);
        assert_eq!(blight.disease, "Early Blight");
        assert_eq!(blight.severity, "High");
    }
}

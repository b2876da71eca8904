//! View models handed to the frontend. Everything here is a pure function of
//! a record or a list of records.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::history::PredictionRecord;

pub const EMPTY_HISTORY_TEXT: &str = "No history yet.";

const FAKE_COLOR: &str = "#ef4444";
const REAL_COLOR: &str = "#10b981";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub label: String,
    /// CSS class for the badge, e.g. `badge fake`.
    pub badge_class: String,
    /// One decimal place, e.g. `87.3%`.
    pub confidence_text: String,
    /// Fill for the single-bar confidence chart.
    pub bar_color: &'static str,
    pub confidence: f64,
    pub model: String,
    /// Text put on the clipboard by the copy button.
    pub summary: String,
}

impl ResultView {
    pub fn from_record(record: &PredictionRecord) -> Self {
        let confidence_text = format!("{:.1}%", record.confidence() * 100.0);
        Self {
            label: record.label().to_string(),
            badge_class: format!("badge {}", record.label().to_lowercase()),
            summary: format!("{} – {}", record.label(), confidence_text),
            confidence_text,
            bar_color: if record.label() == "Fake" {
                FAKE_COLOR
            } else {
                REAL_COLOR
            },
            confidence: record.confidence(),
            model: record.model().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItemView {
    pub index: usize,
    pub label: String,
    /// Whole percent.
    pub percent: u32,
    pub time_text: String,
    pub text: String,
}

pub fn history_views(records: &[PredictionRecord]) -> Vec<HistoryItemView> {
    history_views_in(records, &Local)
}

pub fn history_views_in<Tz>(records: &[PredictionRecord], tz: &Tz) -> Vec<HistoryItemView>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    records
        .iter()
        .enumerate()
        .map(|(index, record)| HistoryItemView {
            index,
            label: record.label().to_string(),
            percent: (record.confidence() * 100.0).round() as u32,
            time_text: DateTime::from_timestamp_millis(record.time())
                .map(|time| time.with_timezone(tz).format("%H:%M:%S").to_string())
                .unwrap_or_default(),
            text: record.text().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn result_view_formats_confidence() {
        let record = PredictionRecord::new("x", "Fake", 0.8734, "demo", 0).unwrap();

        let view = ResultView::from_record(&record);

        assert_eq!(view.confidence_text, "87.3%");
        assert_eq!(view.badge_class, "badge fake");
        assert_eq!(view.bar_color, FAKE_COLOR);
        assert_eq!(view.summary, "Fake – 87.3%");
    }

    #[test]
    fn history_views_keep_order_and_round() {
        let records = vec![
            PredictionRecord::new("newer", "Real", 0.126, "remote", 3_723_000).unwrap(),
            PredictionRecord::new("older", "Fake", 0.996, "demo", 0).unwrap(),
        ];

        let views = history_views_in(&records, &Utc);

        assert_eq!(views[0].index, 0);
        assert_eq!(views[0].percent, 13);
        assert_eq!(views[0].time_text, "01:02:03");
        assert_eq!(views[1].text, "older");
        assert_eq!(views[1].percent, 100);
        assert_eq!(views[1].time_text, "00:00:00");
    }
}

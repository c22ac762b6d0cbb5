//! Record export formats.
//!
//! # Responsibility
//! - Serialize entries for sharing with care providers (JSON, CSV).
//!
//! # Invariants
//! - Output order is the caller's slice order.
//! - CSV fields are quoted when they contain a comma, quote, CR or LF.

use crate::model::entry::PainEntry;
use chrono::SecondsFormat;

/// Header row of [`export_csv`].
pub const CSV_HEADER: &str =
    "id,timestamp,pain,locations,symptoms,sleepQuality,moodImpact,missedWork,notes";

const LIST_SEPARATOR: &str = "; ";

/// Pretty-printed JSON array of entries.
pub fn export_json(entries: &[PainEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}

/// CSV document with one row per entry and a trailing newline.
pub fn export_csv(entries: &[PainEntry]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + entries.len() * 96);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for entry in entries {
        let row = [
            entry.id.to_string(),
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            entry.baseline_data.pain.to_string(),
            entry.baseline_data.locations.join(LIST_SEPARATOR),
            entry.baseline_data.symptoms.join(LIST_SEPARATOR),
            entry.quality_of_life.sleep_quality.to_string(),
            entry.quality_of_life.mood_impact.to_string(),
            entry.work_impact.missed_work.to_string(),
            entry.notes.clone(),
        ];
        let fields = row.iter().map(|field| csv_field(field)).collect::<Vec<_>>();
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{csv_field, export_csv, export_json, CSV_HEADER};
    use crate::model::entry::PainEntry;
    use serde_json::json;

    fn sample() -> PainEntry {
        serde_json::from_value(json!({
            "id": 1_760_000_000_000_i64,
            "timestamp": "2026-10-09T08:53:20Z",
            "baselineData": { "pain": 6, "locations": ["lower back", "hip"], "symptoms": ["aching"] },
            "qualityOfLife": { "sleepQuality": 3, "moodImpact": 5 },
            "workImpact": { "missedWork": 1 },
            "notes": "worse after \"long\" drive, stiff"
        }))
        .unwrap()
    }

    #[test]
    fn csv_quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn csv_has_header_and_one_row_per_entry() {
        let csv = export_csv(&[sample()]);
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "1760000000000,2026-10-09T08:53:20.000Z,6,lower back; hip,aching,3,5,1,\"worse after \"\"long\"\" drive, stiff\""
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn json_export_uses_wire_field_names() {
        let json = export_json(&[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["baselineData"]["pain"], 6);
        assert_eq!(value[0]["qualityOfLife"]["sleepQuality"], 3);
        assert_eq!(value[0]["notes"], "worse after \"long\" drive, stiff");
    }
}

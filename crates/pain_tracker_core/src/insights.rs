//! Derived insights over the session record.
//!
//! # Responsibility
//! - Compute logging streaks, summary statistics, pain trend and check-in
//!   nudges from a slice of entries.
//! - Render short narrative lines for retention surfaces.
//!
//! # Invariants
//! - Read-only: inputs are borrowed and never reordered in place.
//! - Days are UTC calendar days of entry timestamps.
//! - Narrative lines never quote note, location or symptom text verbatim
//!   beyond the normalized top-frequency labels.

use crate::model::entry::PainEntry;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Most frequent values reported per category.
pub const TOP_VALUES: usize = 3;
/// Minimum mean change (0-10 scale) counted as a trend.
pub const TREND_THRESHOLD: f64 = 1.0;
/// Entries per side compared by the default trend.
pub const DEFAULT_TREND_WINDOW: usize = 3;
/// Days without an entry before a check-in is suggested.
pub const CHECK_IN_AFTER_DAYS: i64 = 3;

/// Consecutive-day logging statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakSummary {
    /// Run ending today, or yesterday when today has no entry yet.
    pub current_days: u32,
    pub longest_days: u32,
    /// Distinct days with at least one entry.
    pub logged_days: u32,
    pub last_logged: Option<NaiveDate>,
}

/// Computes logging streaks relative to `today`.
pub fn streaks(entries: &[PainEntry], today: NaiveDate) -> StreakSummary {
    let days = entries
        .iter()
        .map(PainEntry::recorded_on)
        .collect::<BTreeSet<_>>();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for day in &days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let anchor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| days.contains(yesterday))
    };
    let mut current = 0u32;
    let mut cursor = anchor;
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        current += 1;
        cursor = day.pred_opt();
    }

    StreakSummary {
        current_days: current,
        longest_days: longest,
        logged_days: u32::try_from(days.len()).unwrap_or(u32::MAX),
        last_logged: days.last().copied(),
    }
}

/// How often one normalized value appears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frequency {
    pub value: String,
    pub count: usize,
}

/// Aggregate statistics over a set of entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PainSummary {
    pub entry_count: usize,
    pub average_pain: f64,
    pub min_pain: u8,
    pub max_pain: u8,
    pub average_sleep_quality: f64,
    pub average_mood_impact: f64,
    pub top_locations: Vec<Frequency>,
    pub top_symptoms: Vec<Frequency>,
}

/// Summarizes entries; `None` for an empty slice.
pub fn summarize(entries: &[PainEntry]) -> Option<PainSummary> {
    if entries.is_empty() {
        return None;
    }

    let count = entries.len() as f64;
    let mean = |score: fn(&PainEntry) -> u8| {
        entries
            .iter()
            .map(|entry| f64::from(score(entry)))
            .sum::<f64>()
            / count
    };

    Some(PainSummary {
        entry_count: entries.len(),
        average_pain: mean(|entry| entry.baseline_data.pain),
        min_pain: entries.iter().map(PainEntry::pain).min().unwrap_or(0),
        max_pain: entries.iter().map(PainEntry::pain).max().unwrap_or(0),
        average_sleep_quality: mean(|entry| entry.quality_of_life.sleep_quality),
        average_mood_impact: mean(|entry| entry.quality_of_life.mood_impact),
        top_locations: top_values(
            entries
                .iter()
                .flat_map(|entry| entry.baseline_data.locations.iter()),
        ),
        top_symptoms: top_values(
            entries
                .iter()
                .flat_map(|entry| entry.baseline_data.symptoms.iter()),
        ),
    })
}

fn top_values<'a>(values: impl Iterator<Item = &'a String>) -> Vec<Frequency> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            continue;
        }
        *counts.entry(normalized).or_insert(0) += 1;
    }

    let mut ranked = counts
        .into_iter()
        .map(|(value, count)| Frequency { value, count })
        .collect::<Vec<_>>();
    ranked.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.value.cmp(&right.value))
    });
    ranked.truncate(TOP_VALUES);
    ranked
}

/// Direction of pain over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
    InsufficientData,
}

/// Compares mean pain of the oldest `window` entries with the newest.
pub fn pain_trend(entries: &[PainEntry], window: usize) -> Trend {
    if window == 0 || entries.len() < window.saturating_mul(2) {
        return Trend::InsufficientData;
    }

    let mut ordered = entries.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|entry| entry.timestamp);

    let mean = |slice: &[&PainEntry]| {
        slice
            .iter()
            .map(|entry| f64::from(entry.baseline_data.pain))
            .sum::<f64>()
            / slice.len() as f64
    };
    let earlier = mean(&ordered[..window]);
    let later = mean(&ordered[ordered.len() - window..]);
    let change = later - earlier;

    if change <= -TREND_THRESHOLD {
        Trend::Improving
    } else if change >= TREND_THRESHOLD {
        Trend::Worsening
    } else {
        Trend::Stable
    }
}

/// Why a check-in is suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeKind {
    FirstEntry,
    Overdue { days_since: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInNudge {
    pub kind: NudgeKind,
    pub message: String,
}

/// Suggests a check-in for an empty journal or a stale last entry.
pub fn check_in_nudge(entries: &[PainEntry], today: NaiveDate) -> Option<CheckInNudge> {
    let Some(last_day) = entries.iter().map(PainEntry::recorded_on).max() else {
        return Some(CheckInNudge {
            kind: NudgeKind::FirstEntry,
            message: "Log your first entry to start building your pain history.".to_string(),
        });
    };

    let days_since = (today - last_day).num_days();
    if days_since < CHECK_IN_AFTER_DAYS {
        return None;
    }

    Some(CheckInNudge {
        kind: NudgeKind::Overdue { days_since },
        message: format!(
            "It has been {days_since} days since your last entry. A quick check-in keeps your history useful for your care team."
        ),
    })
}

/// Short insight lines for the journal home screen.
pub fn narrative(entries: &[PainEntry], today: NaiveDate) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(summary) = summarize(entries) else {
        if let Some(nudge) = check_in_nudge(entries, today) {
            lines.push(nudge.message);
        }
        return lines;
    };

    let streak = streaks(entries, today);
    if streak.current_days > 1 {
        lines.push(format!(
            "You have logged {} days in a row.",
            streak.current_days
        ));
    }
    if streak.longest_days > streak.current_days && streak.longest_days > 1 {
        lines.push(format!(
            "Your longest streak is {} days.",
            streak.longest_days
        ));
    }

    lines.push(format!(
        "Average pain across {} {} is {:.1}/10.",
        summary.entry_count,
        if summary.entry_count == 1 { "entry" } else { "entries" },
        summary.average_pain
    ));

    match pain_trend(entries, DEFAULT_TREND_WINDOW) {
        Trend::Improving => lines.push("Your recent pain levels are lower than before.".to_string()),
        Trend::Worsening => {
            lines.push("Your recent pain levels are higher than before.".to_string())
        }
        Trend::Stable => lines.push("Your pain levels have been steady.".to_string()),
        Trend::InsufficientData => {}
    }

    if let Some(top) = summary.top_locations.first() {
        lines.push(format!("Most reported location: {}.", top.value));
    }

    if let Some(nudge) = check_in_nudge(entries, today) {
        lines.push(nudge.message);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::{
        check_in_nudge, narrative, pain_trend, streaks, summarize, NudgeKind, Trend,
    };
    use crate::model::entry::PainEntry;
    use chrono::{Days, NaiveDate};
    use serde_json::json;

    fn days_before(day: NaiveDate, days: u64) -> NaiveDate {
        day - Days::new(days)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 10).unwrap()
    }

    fn entry_on(id: i64, day: NaiveDate, pain: u8, locations: &[&str]) -> PainEntry {
        serde_json::from_value(json!({
            "id": id,
            "timestamp": format!("{day}T12:00:00Z"),
            "baselineData": { "pain": pain, "locations": locations },
            "qualityOfLife": { "sleepQuality": 6, "moodImpact": 4 }
        }))
        .unwrap()
    }

    #[test]
    fn current_streak_counts_back_from_today() {
        let entries = vec![
            entry_on(1, days_before(today(), 2), 3, &[]),
            entry_on(2, days_before(today(), 1), 3, &[]),
            entry_on(3, today(), 3, &[]),
            entry_on(4, today(), 4, &[]),
        ];
        let summary = streaks(&entries, today());
        assert_eq!(summary.current_days, 3);
        assert_eq!(summary.longest_days, 3);
        assert_eq!(summary.logged_days, 3);
        assert_eq!(summary.last_logged, Some(today()));
    }

    #[test]
    fn streak_survives_until_today_is_logged() {
        let entries = vec![
            entry_on(1, days_before(today(), 2), 3, &[]),
            entry_on(2, days_before(today(), 1), 3, &[]),
        ];
        assert_eq!(streaks(&entries, today()).current_days, 2);
    }

    #[test]
    fn gap_resets_current_but_keeps_longest() {
        let entries = vec![
            entry_on(1, days_before(today(), 9), 3, &[]),
            entry_on(2, days_before(today(), 8), 3, &[]),
            entry_on(3, days_before(today(), 7), 3, &[]),
            entry_on(4, days_before(today(), 3), 3, &[]),
        ];
        let summary = streaks(&entries, today());
        assert_eq!(summary.current_days, 0);
        assert_eq!(summary.longest_days, 3);
    }

    #[test]
    fn summary_reports_averages_and_normalized_top_locations() {
        let entries = vec![
            entry_on(1, today(), 2, &["Back", "knee"]),
            entry_on(2, today(), 6, &[" back ", "neck"]),
            entry_on(3, today(), 7, &["knee", "BACK"]),
        ];
        let summary = summarize(&entries).unwrap();
        assert_eq!(summary.entry_count, 3);
        assert!((summary.average_pain - 5.0).abs() < f64::EPSILON);
        assert_eq!(summary.min_pain, 2);
        assert_eq!(summary.max_pain, 7);
        assert!((summary.average_sleep_quality - 6.0).abs() < f64::EPSILON);

        let tops = summary
            .top_locations
            .iter()
            .map(|freq| (freq.value.as_str(), freq.count))
            .collect::<Vec<_>>();
        assert_eq!(tops, vec![("back", 3), ("knee", 2), ("neck", 1)]);
        assert!(summary.top_symptoms.is_empty());
    }

    #[test]
    fn summary_of_empty_record_is_none() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn trend_compares_oldest_and_newest_windows() {
        let falling = (0..6)
            .map(|i| entry_on(i, days_before(today(), 6 - i as u64), 8 - i as u8, &[]))
            .collect::<Vec<_>>();
        assert_eq!(pain_trend(&falling, 3), Trend::Improving);

        let mut rising = falling.clone();
        for (i, entry) in rising.iter_mut().enumerate() {
            entry.baseline_data.pain = 2 + i as u8;
        }
        assert_eq!(pain_trend(&rising, 3), Trend::Worsening);

        assert_eq!(pain_trend(&falling[..5], 3), Trend::InsufficientData);
        assert_eq!(pain_trend(&falling, 0), Trend::InsufficientData);
    }

    #[test]
    fn nudge_for_empty_and_stale_journals_only() {
        assert_eq!(
            check_in_nudge(&[], today()).unwrap().kind,
            NudgeKind::FirstEntry
        );

        let stale = vec![entry_on(1, days_before(today(), 4), 3, &[])];
        assert_eq!(
            check_in_nudge(&stale, today()).unwrap().kind,
            NudgeKind::Overdue { days_since: 4 }
        );

        let fresh = vec![entry_on(1, days_before(today(), 2), 3, &[])];
        assert!(check_in_nudge(&fresh, today()).is_none());
    }

    #[test]
    fn narrative_mentions_streak_and_average() {
        let entries = vec![
            entry_on(1, days_before(today(), 1), 4, &["hip"]),
            entry_on(2, today(), 6, &["hip"]),
        ];
        let lines = narrative(&entries, today());
        assert_eq!(lines[0], "You have logged 2 days in a row.");
        assert!(lines.contains(&"Average pain across 2 entries is 5.0/10.".to_string()));
        assert!(lines.contains(&"Most reported location: hip.".to_string()));
    }

    #[test]
    fn narrative_for_empty_journal_is_a_first_entry_prompt() {
        let lines = narrative(&[], today());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Log your first entry"));
    }
}

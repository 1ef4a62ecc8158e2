// src/ingest/providers/calendar.rs
//! Release calendar backed by a CSV file (`brand,model,release_date,type`).
//!
//! Returns future releases whose model name contains the entity's base
//! model, nearest first. The sample count is the size of the calendar, so
//! an empty or unreadable calendar is rejected by the quality gate while a
//! populated calendar with no matching rows is a valid "nothing upcoming".

use crate::entity::EntityKey;
use crate::ingest::error::SignalError;
use crate::ingest::types::SignalProvider;
use crate::signal::{RawSignal, Release, ScheduleSnapshot, SignalPayload};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const SEED_CALENDAR: &str = include_str!("../../../config/release_calendar.csv");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarRow {
    pub brand: String,
    pub model: String,
    pub release_date: NaiveDate,
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub fn parse_csv(s: &str) -> Result<Vec<CalendarRow>> {
    // Spreadsheet exports often start with a BOM.
    let s = s.trim_start_matches('\u{feff}');
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(s.as_bytes());
    let mut rows = Vec::new();
    for (i, rec) in rdr.deserialize::<CalendarRow>().enumerate() {
        match rec {
            Ok(r) => rows.push(r),
            Err(e) => tracing::warn!(line = i + 2, error = %e, "skipping calendar row"),
        }
    }
    Ok(rows)
}

#[derive(Debug, Clone)]
pub struct CalendarScheduleProvider {
    name: &'static str,
    rows: Vec<CalendarRow>,
    /// Fixed "today" for reproducible runs; `None` uses the clock.
    today: Option<NaiveDate>,
}

impl CalendarScheduleProvider {
    pub fn new(name: &'static str, rows: Vec<CalendarRow>) -> Self {
        Self {
            name,
            rows,
            today: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading release calendar from {}", path.display()))?;
        Ok(Self::new("calendar", parse_csv(&s)?))
    }

    /// Unreadable files yield an empty calendar that the gate rejects.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "release calendar not loaded");
            Self::new("calendar", Vec::new())
        })
    }

    /// Calendar compiled into the binary.
    pub fn embedded() -> Self {
        let rows = parse_csv(SEED_CALENDAR).unwrap_or_default();
        Self::new("seed-calendar", rows)
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn upcoming_for(&self, key: &EntityKey, today: NaiveDate) -> Vec<Release> {
        let mut out: Vec<Release> = self
            .rows
            .iter()
            .filter(|r| r.release_date > today && key.matches_model(&r.model))
            .map(|r| Release {
                brand: r.brand.clone(),
                model: r.model.clone(),
                kind: r.kind.clone(),
                release_date: r.release_date,
                days_until: (r.release_date - today).num_days(),
            })
            .collect();
        out.sort_by(|a, b| a.days_until.cmp(&b.days_until).then(a.model.cmp(&b.model)));
        out
    }
}

#[async_trait::async_trait]
impl SignalProvider for CalendarScheduleProvider {
    async fn fetch(&self, key: &EntityKey, _timeout: Duration) -> Result<RawSignal, SignalError> {
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let upcoming = self.upcoming_for(key, today);
        Ok(RawSignal::observed(
            SignalPayload::Schedule(ScheduleSnapshot { upcoming }),
            self.rows.len() as u32,
        ))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

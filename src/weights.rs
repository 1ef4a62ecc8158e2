//! # Segment Weights
//!
//! Canonical per-segment factor weights and the blender that turns a
//! `SegmentSet` into one normalized `WeightVector`.
//!
//! - Loads an optional JSON override (segment → {macro, trend, schedule}).
//! - Falls back to the built-in `default_seed()` on any error.
//! - Multi-segment vehicles get the per-factor arithmetic mean of their
//!   segments' vectors, re-normalized to sum to 1.0.

use crate::segment::{Segment, SegmentSet};
use crate::signal::SignalKind;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

/// Factor weights; each in `[0, 1]`, summing to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    #[serde(rename = "macro")]
    pub macro_weight: f64,
    #[serde(rename = "trend")]
    pub trend_weight: f64,
    #[serde(rename = "schedule")]
    pub schedule_weight: f64,
}

impl WeightVector {
    pub const fn new(macro_weight: f64, trend_weight: f64, schedule_weight: f64) -> Self {
        Self {
            macro_weight,
            trend_weight,
            schedule_weight,
        }
    }

    pub fn get(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::Macro => self.macro_weight,
            SignalKind::Trend => self.trend_weight,
            SignalKind::Schedule => self.schedule_weight,
        }
    }

    pub fn sum(&self) -> f64 {
        self.macro_weight + self.trend_weight + self.schedule_weight
    }

    /// Clamp each component to `[0, 1]` and scale to sum 1.0.
    /// Returns `None` for an all-zero vector.
    pub fn normalized(&self) -> Option<Self> {
        let c = Self::new(
            clamp01(self.macro_weight),
            clamp01(self.trend_weight),
            clamp01(self.schedule_weight),
        );
        let total = c.sum();
        if total <= f64::EPSILON {
            return None;
        }
        Some(Self::new(
            c.macro_weight / total,
            c.trend_weight / total,
            c.schedule_weight / total,
        ))
    }
}

pub const DEFAULT_WEIGHTS: WeightVector = WeightVector::new(0.40, 0.30, 0.30);

/// Segment → weight table.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    table: BTreeMap<Segment, WeightVector>,
}

impl WeightTable {
    /// Load a JSON table from file.
    /// Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let parsed = fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<BTreeMap<Segment, WeightVector>>(&s).ok());
        match parsed {
            Some(raw) => Self::from_map(raw),
            None => {
                tracing::debug!(path = %path.display(), "segment weights not loaded; using built-in table");
                Self::default_seed()
            }
        }
    }

    /// Sanitizes entries; invalid ones are dropped and `default` is always present.
    pub fn from_map(raw: BTreeMap<Segment, WeightVector>) -> Self {
        let mut table: BTreeMap<Segment, WeightVector> = raw
            .into_iter()
            .filter_map(|(seg, w)| w.normalized().map(|n| (seg, n)))
            .collect();
        table.entry(Segment::Default).or_insert(DEFAULT_WEIGHTS);
        Self { table }
    }

    /// Built-in canonical table.
    pub fn default_seed() -> Self {
        let table = BTreeMap::from([
            (Segment::Imported, WeightVector::new(0.50, 0.25, 0.25)),
            (Segment::Electric, WeightVector::new(0.25, 0.35, 0.40)),
            (Segment::Diesel, WeightVector::new(0.45, 0.30, 0.25)),
            (Segment::Luxury, WeightVector::new(0.50, 0.20, 0.30)),
            (Segment::Economy, WeightVector::new(0.45, 0.30, 0.25)),
            (Segment::Suv, WeightVector::new(0.35, 0.35, 0.30)),
            (Segment::Default, DEFAULT_WEIGHTS),
        ]);
        Self { table }
    }

    pub fn get(&self, segment: Segment) -> Option<&WeightVector> {
        self.table.get(&segment)
    }

    fn default_vector(&self) -> WeightVector {
        self.table
            .get(&Segment::Default)
            .copied()
            .unwrap_or(DEFAULT_WEIGHTS)
    }

    /// Blend a segment set into one weight vector.
    ///
    /// Steps:
    /// 1. Collect vectors of the tags present in the table.
    /// 2. None present → default vector; exactly one → that row as stored.
    /// 3. Per-factor arithmetic mean.
    /// 4. Re-normalize to sum 1.0.
    pub fn blend(&self, segments: &SegmentSet) -> WeightVector {
        let present: Vec<&WeightVector> = segments.iter().filter_map(|s| self.get(s)).collect();
        match present.as_slice() {
            [] => return self.default_vector(),
            [only] => return **only,
            _ => {}
        }

        let n = present.len() as f64;
        let mean = WeightVector::new(
            present.iter().map(|w| w.macro_weight).sum::<f64>() / n,
            present.iter().map(|w| w.trend_weight).sum::<f64>() / n,
            present.iter().map(|w| w.schedule_weight).sum::<f64>() / n,
        );

        mean.normalized().unwrap_or_else(|| self.default_vector())
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

#[inline]
fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_only_is_unchanged() {
        let w = WeightTable::default_seed().blend(&SegmentSet::default_only());
        assert_eq!(w, DEFAULT_WEIGHTS);
    }

    #[test]
    fn single_tags_match_canonical_rows() {
        let t = WeightTable::default_seed();
        let imp = t.blend(&SegmentSet::from_tags([Segment::Imported]));
        assert!(approx(imp.macro_weight, 0.50));
        let ev = t.blend(&SegmentSet::from_tags([Segment::Electric]));
        assert!(approx(ev.trend_weight, 0.35));
        assert!(approx(ev.schedule_weight, 0.40));
    }

    #[test]
    fn two_tags_average() {
        let t = WeightTable::default_seed();
        let w = t.blend(&SegmentSet::from_tags([Segment::Imported, Segment::Electric]));
        assert!(approx(w.macro_weight, 0.375));
        assert!(approx(w.trend_weight, 0.30));
        assert!(approx(w.schedule_weight, 0.325));
        assert!(approx(w.sum(), 1.0));
    }

    #[test]
    fn tags_missing_from_table_use_default() {
        let mut raw = BTreeMap::new();
        raw.insert(Segment::Imported, WeightVector::new(0.6, 0.2, 0.2));
        let t = WeightTable::from_map(raw);
        let w = t.blend(&SegmentSet::from_tags([Segment::Suv]));
        assert_eq!(w, DEFAULT_WEIGHTS);
    }

    #[test]
    fn invalid_rows_are_dropped_and_rescaled() {
        let mut raw = BTreeMap::new();
        raw.insert(Segment::Suv, WeightVector::new(0.0, 0.0, 0.0));
        raw.insert(Segment::Diesel, WeightVector::new(2.0, 1.0, 1.0));
        let t = WeightTable::from_map(raw);
        assert!(t.get(Segment::Suv).is_none());
        let d = t.get(Segment::Diesel).copied().unwrap();
        assert!(approx(d.macro_weight, 1.0 / 3.0));
        assert!(approx(d.sum(), 1.0));
    }

    #[test]
    fn load_from_file_falls_back_to_seed() {
        let t = WeightTable::load_from_file("definitely/not/here.json");
        assert_eq!(t, WeightTable::default_seed());

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"economy": {{"macro": 0.5, "trend": 0.25, "schedule": 0.25}}}}"#).unwrap();
        let t = WeightTable::load_from_file(f.path());
        assert!(approx(t.get(Segment::Economy).unwrap().macro_weight, 0.5));
        assert_eq!(t.get(Segment::Default), Some(&DEFAULT_WEIGHTS));
    }
}

// src/scoring/adjust.rs
//! Post-blend adjustments: estimated popularity and the per-entity offset.

use crate::entity::EntityKey;
use crate::segment::{Segment, SegmentSet};
use sha2::{Digest, Sha256};

/// Deterministic per-entity offset in `[-5, +5]`.
///
/// Spreads otherwise identical scores across models. Derived from the
/// SHA-256 of the key's string form; this is a stable pseudo-random spread,
/// not a security property.
pub fn entity_adjustment(key: &EntityKey) -> i32 {
    let digest = Sha256::digest(key.to_string().as_bytes());
    let head = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (head % 11) as i32 - 5
}

const HIGH_DEMAND: &[&str] = &[
    "그랜저", "grandeur", "쏘나타", "sonata", "k5", "k8", "아반떼", "avante", "e-클래스",
    "e-class", "5시리즈", "5 series", "a6",
];
const SUV_DEMAND: &[&str] = &[
    "투싼", "싼타페", "쏘렌토", "스포티지", "팰리세이드", "gle", "x5", "q7", "gv80",
];
const COMPACT: &[&str] = &["모닝", "기아 레이", "스파크", "캐스퍼"];
const NICHE: &[&str] = &[
    "911", "amg", "m3", "m5", "rs6", "rs7", "s-클래스", "s-class", "7시리즈", "a8",
];

/// Rough popularity estimate (0–100) with a label for the reason line.
///
/// Later tiers override earlier ones, so a niche trim of a high-demand
/// model counts as niche and every electric vehicle lands at 65.
pub fn popularity_estimate(key: &EntityKey, segments: &SegmentSet) -> (f64, &'static str) {
    let hay = key.haystack();
    let hit = |list: &[&str]| list.iter().any(|m| hay.contains(m));

    let mut est = (50.0, "average demand");
    if hit(HIGH_DEMAND) {
        est = (75.0, "high-demand model");
    }
    if hit(SUV_DEMAND) {
        est = (70.0, "popular SUV");
    }
    if hit(COMPACT) {
        est = (55.0, "compact model");
    }
    if hit(NICHE) {
        est = (35.0, "niche/performance model");
    }
    if segments.contains(Segment::Electric) {
        est = (65.0, "electric model");
    }
    est
}

/// Popular models hold their price (−5), rare ones can be negotiated (+5).
pub fn popularity_adjustment(popularity: f64) -> f64 {
    if popularity >= 70.0 {
        -5.0
    } else if popularity >= 50.0 {
        0.0
    } else {
        5.0
    }
}

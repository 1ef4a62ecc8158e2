// src/scoring/factors.rs
//! Per-factor scoring. Each function maps one raw signal to a `FactorScore`
//! in `[0, 100]`; higher means "better moment to buy". Defaulted or
//! mismatched signals score to a neutral per-factor value.

use crate::decision::FactorScore;
use crate::entity::EntityKey;
use crate::segment::{Segment, SegmentSet};
use crate::signal::{Direction, Indicator, RawSignal, Release};

pub const MACRO_DEFAULT: f64 = 55.0;
pub const SCHEDULE_DEFAULT: f64 = 70.0;
pub const SCHEDULE_NONE_UPCOMING: f64 = 75.0;

const RATE_NEUTRAL: f64 = 20.0;
const ELECTRIC_FUEL_POINTS: f64 = 20.0;

// ------------------------------------------------------------
// Macro
// ------------------------------------------------------------

fn rate_band(rate: f64) -> (f64, &'static str) {
    if rate < 2.0 {
        (35.0, "very low")
    } else if rate < 3.0 {
        (25.0, "low")
    } else if rate < 4.0 {
        (15.0, "moderate")
    } else {
        (5.0, "high")
    }
}

/// Financing-cost sensitivity: luxury/imported amplify, economy damps.
fn rate_sensitivity(segments: &SegmentSet) -> f64 {
    if segments.is_import_exposed() {
        1.25
    } else if segments.contains(Segment::Economy) {
        0.75
    } else {
        1.0
    }
}

fn rate_points(ind: &Indicator, segments: &SegmentSet) -> (f64, String) {
    let (band, label) = rate_band(ind.value);
    let s = rate_sensitivity(segments);
    let pts = RATE_NEUTRAL + (band - RATE_NEUTRAL) * s;
    let note = if (s - 1.0).abs() > f64::EPSILON {
        format!(" (sensitivity x{s:.2})")
    } else {
        String::new()
    };
    (
        pts,
        format!("interest rate {:.2}% is {label}: {pts:+.1}{note}", ind.value),
    )
}

fn fx_points(ind: &Indicator, segments: &SegmentSet) -> (f64, String) {
    let v = ind.value;
    if segments.is_import_exposed() {
        let (mut pts, label) = if v > 1400.0 {
            (5.0, "very weak won, import prices inflated")
        } else if v > 1350.0 {
            (10.0, "weak won")
        } else if v > 1250.0 {
            (25.0, "moderate won")
        } else {
            (35.0, "strong won, imports cheaper")
        };
        let mut msg = format!("KRW/USD {v:.0} ({label}): {pts:+.1}");
        match ind.trend {
            Direction::Up => {
                pts -= 3.0;
                msg.push_str(", weakening trend -3");
            }
            Direction::Down => {
                pts += 3.0;
                msg.push_str(", strengthening trend +3");
            }
            Direction::Stable => {}
        }
        (pts, msg)
    } else {
        let pts = if v > 1400.0 {
            20.0
        } else if v > 1350.0 {
            22.0
        } else {
            25.0
        };
        (pts, format!("KRW/USD {v:.0} (limited domestic impact): {pts:+.1}"))
    }
}

fn fuel_level_points(price: f64) -> (f64, &'static str) {
    if price < 60.0 {
        (20.0, "low")
    } else if price < 80.0 {
        (15.0, "moderate")
    } else {
        (5.0, "high")
    }
}

fn fuel_points(ind: &Indicator, segments: &SegmentSet) -> (f64, String) {
    let (level, label) = fuel_level_points(ind.value);
    let mut msg = format!("oil ${:.1} is {label}: {level:+.1}", ind.value);

    let trend_pts = if segments.contains(Segment::Economy) {
        // Rising fuel pushes demand toward small cars.
        match ind.trend {
            Direction::Up => {
                msg.push_str(", rising fuel lifts economy-car demand -10");
                -10.0
            }
            _ => 0.0,
        }
    } else {
        match ind.trend {
            Direction::Down => {
                msg.push_str(", falling trend +10");
                10.0
            }
            _ => 0.0,
        }
    };

    (level + trend_pts, msg)
}

/// Macro factor: financing cost, exchange rate and fuel price.
pub fn macro_factor(signal: &RawSignal, segments: &SegmentSet) -> FactorScore {
    let snap = match signal.as_macro() {
        Some(m) if !signal.is_fallback && m.indicator_count() > 0 => m,
        _ => {
            return FactorScore::new(MACRO_DEFAULT)
                .with_reason("macro indicators unavailable, neutral default applied")
        }
    };

    let mut total = 0.0;
    let mut reasons = Vec::new();

    // 1) Interest rate
    match &snap.interest_rate {
        Some(ind) => {
            let (p, r) = rate_points(ind, segments);
            total += p;
            reasons.push(r);
        }
        None => reasons.push("interest rate missing, no contribution".to_string()),
    }

    // 2) Exchange rate
    match &snap.exchange_rate {
        Some(ind) => {
            let (p, r) = fx_points(ind, segments);
            total += p;
            reasons.push(r);
        }
        None => reasons.push("exchange rate missing, no contribution".to_string()),
    }

    // 3) Fuel; irrelevant for electric vehicles
    if segments.contains(Segment::Electric) {
        total += ELECTRIC_FUEL_POINTS;
        reasons.push(format!(
            "electric drivetrain, fuel price irrelevant: {ELECTRIC_FUEL_POINTS:+.1}"
        ));
    } else {
        match &snap.oil_price {
            Some(ind) => {
                let (p, r) = fuel_points(ind, segments);
                total += p;
                reasons.push(r);
            }
            None => reasons.push("oil price missing, no contribution".to_string()),
        }
    }

    let mut fs = FactorScore::new(total);
    fs.reasons = reasons;
    fs
}

// ------------------------------------------------------------
// Trend
// ------------------------------------------------------------

/// Neutral trend score when search-interest data is missing.
pub fn trend_default(segments: &SegmentSet) -> f64 {
    if segments.contains(Segment::Electric) {
        55.0
    } else if segments.contains(Segment::Luxury) {
        65.0
    } else {
        60.0
    }
}

fn trend_sensitivity(segments: &SegmentSet) -> f64 {
    if segments.contains(Segment::Electric) {
        1.5
    } else if segments.contains(Segment::Luxury) {
        0.8
    } else {
        1.0
    }
}

/// Trend factor: rising interest is a price-upward risk, cooling interest
/// gives the buyer leverage.
pub fn trend_factor(signal: &RawSignal, segments: &SegmentSet) -> FactorScore {
    let snap = match signal.as_trend() {
        Some(t) if !signal.is_fallback && t.change_pct.is_finite() => t,
        _ => {
            return FactorScore::new(trend_default(segments))
                .with_reason("search-interest trend unavailable, neutral default applied")
        }
    };

    let s = trend_sensitivity(segments);
    let adjusted = snap.change_pct * s;
    let (value, label) = if adjusted > 25.0 {
        (25.0, "surging interest, prices likely to rise")
    } else if adjusted > 15.0 {
        (40.0, "rising interest")
    } else if adjusted > -5.0 {
        (70.0, "stable interest")
    } else if adjusted > -15.0 {
        (80.0, "cooling interest")
    } else {
        (85.0, "sharply falling interest, buyer leverage")
    };

    let mut msg = format!("search interest {:+.1}%", snap.change_pct);
    if (s - 1.0).abs() > f64::EPSILON {
        msg.push_str(&format!(" (x{s:.1} sensitivity → {adjusted:+.1}%)"));
    }
    msg.push_str(&format!(": {label}"));

    FactorScore::new(value).with_reason(msg)
}

// ------------------------------------------------------------
// Schedule
// ------------------------------------------------------------

const STANDARD_BANDS: &[(i64, f64)] = &[(30, 25.0), (60, 40.0), (90, 55.0)];
// Luxury and electric depreciate harder when a successor lands.
const STRICT_BANDS: &[(i64, f64)] = &[(30, 15.0), (60, 30.0), (90, 45.0), (180, 60.0)];
const OPEN_BAND: f64 = 70.0;

fn band_for(days: i64, bands: &[(i64, f64)]) -> f64 {
    bands
        .iter()
        .find(|(limit, _)| days < *limit)
        .map(|(_, v)| *v)
        .unwrap_or(OPEN_BAND)
}

/// Schedule factor: an imminent successor depresses the current model's value.
pub fn schedule_factor(signal: &RawSignal, key: &EntityKey, segments: &SegmentSet) -> FactorScore {
    let snap = match signal.as_schedule() {
        Some(s) if !signal.is_fallback => s,
        _ => {
            return FactorScore::new(SCHEDULE_DEFAULT)
                .with_reason("release calendar unavailable, neutral default applied")
        }
    };

    let (successors, competitors): (Vec<&Release>, Vec<&Release>) = snap
        .upcoming
        .iter()
        .filter(|r| r.days_until >= 0)
        .partition(|r| key.matches_model(&r.model));

    if let Some(next) = successors.iter().min_by_key(|r| r.days_until) {
        let strict = segments.contains(Segment::Luxury) || segments.contains(Segment::Electric);
        let bands = if strict { STRICT_BANDS } else { STANDARD_BANDS };
        let value = band_for(next.days_until, bands);
        let kind = if next.kind.is_empty() { "release" } else { next.kind.as_str() };
        return FactorScore::new(value).with_reason(format!(
            "{} {} {kind} in {} days{}",
            next.brand,
            next.model,
            next.days_until,
            if strict { " (strict depreciation bands)" } else { "" }
        ));
    }

    if let Some(next) = competitors.iter().min_by_key(|r| r.days_until) {
        let value = if next.days_until < 30 { 60.0 } else { OPEN_BAND };
        return FactorScore::new(value).with_reason(format!(
            "competing release {} {} in {} days",
            next.brand, next.model, next.days_until
        ));
    }

    FactorScore::new(SCHEDULE_NONE_UPCOMING).with_reason("no upcoming releases announced")
}

//! # Result Formatter
//!
//! Turns a `ScoreCard` plus the resolver's attempt notes into the public
//! `TimingResult`:
//! - factor reasons ordered by factor weight (heaviest first; ties keep
//!   macro → trend → schedule order),
//! - then adjustment reasons, then provider notes,
//! - duplicates removed (first occurrence wins),
//! - provenance attached per factor.

use crate::decision::{Adjustments, FactorBreakdown, Reason, ReasonKind, TimingResult};
use crate::scoring::ScoreCard;
use crate::signal::SignalKind;
use std::collections::{BTreeMap, HashSet};

pub fn format(card: &ScoreCard, provider_notes: &[Reason]) -> TimingResult {
    let mut order: Vec<SignalKind> = SignalKind::ALL.to_vec();
    order.sort_by(|a, b| {
        card.weights
            .get(*b)
            .partial_cmp(&card.weights.get(*a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut reasons = Vec::new();
    for kind in &order {
        if let Some((fs, _)) = card.factors.get(kind) {
            let w = card.weights.get(*kind);
            for msg in &fs.reasons {
                reasons.push(Reason::new(ReasonKind::from(*kind), format!("{kind}: {msg}")).weighted(w));
            }
        }
    }

    reasons.push(Reason::new(
        ReasonKind::Adjustment,
        format!(
            "popularity: {} (est. {:.0}) {:+.0}",
            card.popularity_label, card.popularity, card.popularity_adjustment
        ),
    ));
    reasons.push(Reason::new(
        ReasonKind::Adjustment,
        format!("entity adjustment {:+}", card.entity_adjustment),
    ));
    reasons.extend(provider_notes.iter().cloned());

    let mut seen = HashSet::new();
    reasons.retain(|r| seen.insert(r.message.clone()));

    let breakdown: BTreeMap<SignalKind, FactorBreakdown> = card
        .factors
        .iter()
        .map(|(kind, (fs, prov))| {
            let weight = card.weights.get(*kind);
            (
                *kind,
                FactorBreakdown {
                    score: fs.clone(),
                    weight,
                    weighted: fs.value * weight,
                    provenance: prov.clone(),
                },
            )
        })
        .collect();

    TimingResult {
        entity: card.entity.clone(),
        final_score: card.final_score,
        decision: card.decision,
        confidence: card.confidence,
        base_score: card.base_score,
        adjustments: Adjustments {
            popularity: card.popularity_adjustment,
            entity: card.entity_adjustment,
        },
        breakdown,
        weights: card.weights,
        segments: card.segments.clone(),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{Confidence, Decision, FactorScore, Provenance};
    use crate::entity::EntityKey;
    use crate::segment::SegmentSet;
    use crate::weights::WeightVector;

    fn prov(name: &str, fallback: bool) -> Provenance {
        Provenance {
            source_name: name.into(),
            is_fallback: fallback,
            sample_count: if fallback { 0 } else { 5 },
            collected_at: None,
        }
    }

    fn mk_card(weights: WeightVector) -> ScoreCard {
        let mut factors = BTreeMap::new();
        factors.insert(
            SignalKind::Macro,
            (FactorScore::new(60.0).with_reason("m1").with_reason("shared"), prov("ecos", false)),
        );
        factors.insert(
            SignalKind::Trend,
            (FactorScore::new(70.0).with_reason("t1"), prov("datalab", false)),
        );
        factors.insert(
            SignalKind::Schedule,
            (FactorScore::new(70.0).with_reason("s1"), prov("default", true)),
        );
        ScoreCard {
            entity: EntityKey::new("기아", "EV6", "전기"),
            segments: SegmentSet::default_only(),
            weights,
            factors,
            base_score: 66.0,
            popularity: 65.0,
            popularity_label: "electric model",
            popularity_adjustment: 0.0,
            entity_adjustment: 2,
            final_score: 68.0,
            decision: Decision::Hold,
            confidence: Confidence::Medium,
        }
    }

    #[test]
    fn reasons_follow_weight_order() {
        let card = mk_card(WeightVector::new(0.25, 0.35, 0.40));
        let r = format(&card, &[]);
        let msgs: Vec<&str> = r.reason_messages().collect();
        assert_eq!(msgs[0], "schedule: s1");
        assert_eq!(msgs[1], "trend: t1");
        assert_eq!(msgs[2], "macro: m1");
        assert_eq!(msgs.last().copied(), Some("entity adjustment +2"));
    }

    #[test]
    fn ties_keep_canonical_order() {
        let card = mk_card(WeightVector::new(0.40, 0.30, 0.30));
        let r = format(&card, &[]);
        let msgs: Vec<&str> = r.reason_messages().collect();
        assert_eq!(&msgs[..4], &["macro: m1", "macro: shared", "trend: t1", "schedule: s1"]);
    }

    #[test]
    fn duplicates_removed_and_provenance_attached() {
        let card = mk_card(WeightVector::new(0.40, 0.30, 0.30));
        let notes = vec![
            Reason::new(ReasonKind::Provenance, "schedule: calendar failed"),
            Reason::new(ReasonKind::Provenance, "schedule: calendar failed"),
        ];
        let r = format(&card, &notes);
        let n = r
            .reason_messages()
            .filter(|m| *m == "schedule: calendar failed")
            .count();
        assert_eq!(n, 1);
        assert!(r.breakdown[&SignalKind::Schedule].provenance.is_fallback);
        assert_eq!(r.breakdown[&SignalKind::Macro].provenance.source_name, "ecos");
        assert!((r.breakdown[&SignalKind::Macro].weighted - 24.0).abs() < 1e-9);
        assert_eq!(r.fallback_count(), 1);
    }
}

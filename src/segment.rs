//! # Segment Classifier
//!
//! Maps a vehicle to the market segments that change how its signals are
//! weighted and interpreted. The mapping is a declarative rule table:
//! each segment owns a list of lowercase markers, and a segment applies when
//! any of its markers occurs in `brand model fuel` (case-insensitive).
//!
//! - Pure and deterministic (ordered set output).
//! - Multi-word markers ("기아 레이") guard against accidental substrings.
//! - No match → `{default}`.

use crate::entity::EntityKey;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Imported,
    Electric,
    Diesel,
    Luxury,
    Economy,
    Suv,
    Default,
}

impl Segment {
    pub const ALL: [Segment; 7] = [
        Segment::Imported,
        Segment::Electric,
        Segment::Diesel,
        Segment::Luxury,
        Segment::Economy,
        Segment::Suv,
        Segment::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Imported => "imported",
            Segment::Electric => "electric",
            Segment::Diesel => "diesel",
            Segment::Luxury => "luxury",
            Segment::Economy => "economy",
            Segment::Suv => "suv",
            Segment::Default => "default",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-empty ordered set of segment tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentSet(BTreeSet<Segment>);

impl SegmentSet {
    pub fn default_only() -> Self {
        Self(BTreeSet::from([Segment::Default]))
    }

    /// Builds a set from tags; empty input collapses to `{default}`.
    pub fn from_tags<I: IntoIterator<Item = Segment>>(tags: I) -> Self {
        let set: BTreeSet<Segment> = tags.into_iter().collect();
        if set.is_empty() {
            Self::default_only()
        } else {
            Self(set)
        }
    }

    pub fn contains(&self, s: Segment) -> bool {
        self.0.contains(&s)
    }

    /// Imported or luxury: exposed to the exchange rate and financing cost.
    pub fn is_import_exposed(&self) -> bool {
        self.contains(Segment::Imported) || self.contains(Segment::Luxury)
    }

    pub fn iter(&self) -> impl Iterator<Item = Segment> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SegmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Segment::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[derive(Debug, Clone)]
struct Rule {
    segment: Segment,
    markers: Vec<String>,
}

/// Declarative segment → markers table.
#[derive(Debug, Clone)]
pub struct SegmentRules {
    rules: Vec<Rule>,
}

const IMPORTED: &[&str] = &[
    "벤츠", "메르세데스", "mercedes", "benz", "bmw", "아우디", "audi", "폭스바겐",
    "volkswagen", "볼보", "volvo", "렉서스", "lexus", "토요타", "toyota", "혼다",
    "honda", "미니", "테슬라", "tesla", "포르쉐", "porsche", "랜드로버", "land rover",
    "재규어", "jaguar", "푸조", "peugeot", "지프", "jeep", "링컨", "lincoln", "캐딜락",
    "cadillac", "폴스타", "polestar", "벤틀리", "bentley", "롤스로이스", "rolls-royce",
    "페라리", "ferrari", "람보르기니", "lamborghini", "마세라티", "maserati",
];

const ELECTRIC: &[&str] = &[
    "전기", "electric", "일렉트릭", "아이오닉", "ioniq", "ev3", "ev6", "ev9", "니로",
    "niro", "테슬라", "tesla", "모델3", "모델 3", "model 3", "모델y", "모델 y",
    "model y", "e-tron", "eqa", "eqb", "eqc", "eqe", "eqs", "타이칸", "taycan",
    "폴스타", "polestar", "하이브리드", "hybrid", "수소", "hydrogen", "넥쏘", "nexo",
];

const DIESEL: &[&str] = &["디젤", "diesel", "경유"];

const LUXURY: &[&str] = &[
    "포르쉐", "porsche", "벤틀리", "bentley", "롤스로이스", "rolls-royce", "페라리",
    "ferrari", "람보르기니", "lamborghini", "마세라티", "maserati", "제네시스",
    "genesis", "마이바흐", "maybach", "s-클래스", "s-class", "7시리즈", "7 series",
    "amg", "911",
];

const ECONOMY: &[&str] = &[
    "모닝", "morning", "기아 레이", "kia ray", "스파크", "spark", "캐스퍼", "casper",
    "경차", "lpg", "아반떼", "avante", "elantra", "엑센트", "프라이드", "마티즈",
];

const SUV: &[&str] = &[
    "suv", "투싼", "tucson", "싼타페", "santa fe", "santafe", "쏘렌토", "sorento",
    "스포티지", "sportage", "팰리세이드", "palisade", "셀토스", "seltos", "코나", "kona",
    "모하비", "mohave", "트랙스", "trax", "트레일블레이저", "trailblazer", "토레스",
    "torres", "렉스턴", "rexton", "티볼리", "tivoli", "qm6", "gv60", "gv70", "gv80",
    "카이엔", "cayenne", "마칸", "macan", "gle", "glc", "gls", "x3", "x5", "x7", "q5",
    "q7", "q8", "xc60", "xc90", "레인지로버", "range rover", "랭글러", "wrangler",
    "rav4", "모델y", "모델 y", "model y",
];

impl SegmentRules {
    /// Built-in table for the Korean market.
    pub fn builtin() -> Self {
        Self::from_table(&[
            (Segment::Imported, IMPORTED),
            (Segment::Electric, ELECTRIC),
            (Segment::Diesel, DIESEL),
            (Segment::Luxury, LUXURY),
            (Segment::Economy, ECONOMY),
            (Segment::Suv, SUV),
        ])
    }

    pub fn from_table(table: &[(Segment, &[&str])]) -> Self {
        let rules = table
            .iter()
            .map(|(segment, markers)| Rule {
                segment: *segment,
                markers: markers
                    .iter()
                    .map(|m| m.trim().to_lowercase())
                    .filter(|m| !m.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn classify(&self, key: &EntityKey) -> SegmentSet {
        let hay = key.haystack();
        SegmentSet::from_tags(
            self.rules
                .iter()
                .filter(|r| r.markers.iter().any(|m| hay.contains(m.as_str())))
                .map(|r| r.segment),
        )
    }
}

impl Default for SegmentRules {
    fn default() -> Self {
        Self::builtin()
    }
}

static BUILTIN: Lazy<SegmentRules> = Lazy::new(SegmentRules::builtin);

/// Classify with the built-in table.
pub fn classify(brand: &str, model: &str, fuel: &str) -> SegmentSet {
    BUILTIN.classify(&EntityKey::new(brand, model, fuel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domestic_sedan_is_default() {
        let s = classify("현대", "그랜저", "가솔린");
        assert_eq!(s, SegmentSet::default_only());
    }

    #[test]
    fn imported_luxury_suv_collects_all_tags() {
        let s = classify("포르쉐", "카이엔", "가솔린");
        assert!(s.contains(Segment::Imported));
        assert!(s.contains(Segment::Luxury));
        assert!(s.contains(Segment::Suv));
        assert!(!s.contains(Segment::Default));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let s = classify("BMW", "X5", "DIESEL");
        assert!(s.contains(Segment::Imported));
        assert!(s.contains(Segment::Suv));
        assert!(s.contains(Segment::Diesel));
    }

    #[test]
    fn fuel_alone_marks_electric() {
        let s = classify("기아", "EV6", "전기");
        assert!(s.contains(Segment::Electric));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn ray_marker_needs_brand() {
        assert!(classify("기아", "레이", "가솔린").contains(Segment::Economy));
        assert!(!classify("쉐보레", "트레일블레이저", "가솔린").contains(Segment::Economy));
    }

    #[test]
    fn empty_strings_fall_back_to_default() {
        assert_eq!(classify("", "", ""), SegmentSet::default_only());
    }

    #[test]
    fn display_is_ordered() {
        let s = SegmentSet::from_tags([Segment::Suv, Segment::Imported]);
        assert_eq!(s.to_string(), "{imported, suv}");
    }
}

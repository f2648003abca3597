//! Similarity scoring of [`House`]s for duplicate detection.
//!
//! Two checks are provided:
//! - [`exists_exact()`] is a strict one, treating houses with equal
//!   [normalized] addresses as duplicates;
//! - [`find_similar()`] is a soft one, summing weighted [`Signal`]s into a
//!   [`Score`] and reporting every house scored at or above a threshold.
//!
//! [normalized]: address::normalize

use std::str::FromStr;

use derive_more::Display;
use rust_decimal::Decimal;

use super::{address, Draft, House, Id};

/// Maximal difference of construction years still considered similar.
const BUILD_YEAR_TOLERANCE: u32 = 5;

/// Maximal relative difference of apartment counts still considered similar.
const APARTMENTS_TOLERANCE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Maximal relative difference of total areas still considered similar.
const TOTAL_AREA_TOLERANCE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Maximal difference of floor counts still considered close.
const FLOORS_TOLERANCE: u32 = 1;

/// Similarity score of two houses in `[0, 1]` range.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Ord, PartialEq, PartialOrd)]
pub struct Score(Decimal);

impl Score {
    /// [`Score`] of completely different houses.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Default threshold of [`find_similar()`] lookups.
    pub const DEFAULT_THRESHOLD: Self =
        Self(Decimal::from_parts(8, 0, 0, false, 1));

    /// Threshold of the warning shown before a [`House`] is saved.
    pub const WARNING_THRESHOLD: Self =
        Self(Decimal::from_parts(7, 0, 0, false, 1));

    /// Creates a new [`Score`] if the given `value` is within `[0, 1]` range.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE)
            .contains(&value)
            .then_some(Self(value))
    }

    /// Sums the weights of the provided [`Signal`]s.
    fn of(signals: &[Signal]) -> Self {
        let total = signals.iter().map(|s| s.weight()).sum::<Decimal>();
        Self(total.min(Decimal::ONE))
    }

    /// Returns the value of this [`Score`].
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for Score {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Score`")
    }
}

/// Independent evidence of two houses being the same building.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Signal {
    /// Addresses are equal.
    #[display("equal addresses")]
    AddressExact,

    /// One address contains another one.
    #[display("overlapping addresses")]
    AddressSubstring,

    /// Construction years differ by 5 years at most.
    #[display("close construction years")]
    BuildYear,

    /// Apartment counts differ by 20% of the larger one at most.
    #[display("close apartment counts")]
    Apartments,

    /// Total areas differ by 15% of the larger one at most.
    #[display("close total areas")]
    TotalArea,

    /// Floor counts are equal.
    #[display("equal floor counts")]
    FloorsExact,

    /// Floor counts differ by one.
    #[display("close floor counts")]
    FloorsClose,
}

impl Signal {
    /// Returns the weight this [`Signal`] contributes to a [`Score`].
    #[must_use]
    pub fn weight(self) -> Decimal {
        match self {
            Self::AddressExact => Decimal::new(50, 2),
            Self::AddressSubstring => Decimal::new(30, 2),
            Self::BuildYear
            | Self::Apartments
            | Self::TotalArea
            | Self::FloorsExact => Decimal::new(10, 2),
            Self::FloorsClose => Decimal::new(5, 2),
        }
    }

    /// Detects all the [`Signal`]s between the provided [`Record`]s.
    fn detect(a: &Record<'_>, b: &Record<'_>) -> Vec<Self> {
        let mut signals = Vec::with_capacity(5);

        if a.address == b.address {
            signals.push(Self::AddressExact);
        } else if overlap(a.address, b.address) {
            signals.push(Self::AddressSubstring);
        }

        if a.build_year.abs_diff(b.build_year) <= BUILD_YEAR_TOLERANCE {
            signals.push(Self::BuildYear);
        }

        let (apartments_a, apartments_b) =
            (Decimal::from(a.apartments), Decimal::from(b.apartments));
        if is_close(apartments_a, apartments_b, APARTMENTS_TOLERANCE) {
            signals.push(Self::Apartments);
        }

        if is_close(a.total_area, b.total_area, TOTAL_AREA_TOLERANCE) {
            signals.push(Self::TotalArea);
        }

        if a.floors == b.floors {
            signals.push(Self::FloorsExact);
        } else if a.floors.abs_diff(b.floors) <= FLOORS_TOLERANCE {
            signals.push(Self::FloorsClose);
        }

        signals
    }
}

/// Checks whether one of non-empty addresses contains another one.
fn overlap(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Checks whether `a` and `b` differ by the `tolerance` fraction of the larger
/// one at most.
///
/// Non-positive magnitudes are never close.
fn is_close(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    let larger = a.max(b);
    if larger <= Decimal::ZERO {
        return false;
    }
    a.checked_sub(b)
        .and_then(|diff| diff.abs().checked_div(larger))
        .is_some_and(|ratio| ratio <= tolerance)
}

/// Attributes of a house compared for similarity.
///
/// Unlike a [`House`], a [`Record`] isn't validated, so any garbage may be
/// compared safely.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Record<'a> {
    /// ID of the house, if it's registered already.
    pub id: Option<Id>,

    /// Address of the house.
    pub address: &'a str,

    /// Number of apartments in the house.
    pub apartments: i32,

    /// Total area of the house.
    pub total_area: Decimal,

    /// Year the house was built in.
    pub build_year: i32,

    /// Number of floors in the house.
    pub floors: i32,
}

impl Record<'_> {
    /// Indicates whether this [`Record`] describes the same registered house
    /// as the `other` one.
    fn is_same(&self, other: &Record<'_>) -> bool {
        self.id.is_some() && self.id == other.id
    }
}

/// Something comparable for similarity.
pub trait Comparable {
    /// Returns the [`Record`] to compare.
    fn record(&self) -> Record<'_>;
}

impl Comparable for Record<'_> {
    fn record(&self) -> Record<'_> {
        *self
    }
}

impl Comparable for House {
    fn record(&self) -> Record<'_> {
        Record {
            id: Some(self.id),
            address: self.address.as_ref(),
            apartments: self.apartments.get(),
            total_area: self.total_area.get(),
            build_year: self.build_year.get(),
            floors: self.floors.get(),
        }
    }
}

impl Comparable for Draft {
    fn record(&self) -> Record<'_> {
        Record {
            id: None,
            address: self.address.as_ref(),
            apartments: self.apartments.get(),
            total_area: self.total_area.get(),
            build_year: self.build_year.get(),
            floors: self.floors.get(),
        }
    }
}

impl<T: Comparable + ?Sized> Comparable for &T {
    fn record(&self) -> Record<'_> {
        (**self).record()
    }
}

/// Similarity of two houses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Similarity {
    /// Total [`Score`] of the [`Similarity`].
    pub score: Score,

    /// [`Signal`]s the [`Score`] is summed of.
    pub signals: Vec<Signal>,
}

impl Similarity {
    /// Calculates the [`Similarity`] of the `candidate` to the `existing`
    /// house.
    #[must_use]
    pub fn between(candidate: &Record<'_>, existing: &Record<'_>) -> Self {
        let signals = Signal::detect(candidate, existing);
        Self {
            score: Score::of(&signals),
            signals,
        }
    }
}

/// House found similar to a candidate one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Match<T> {
    /// Similar house.
    pub house: T,

    /// [`Similarity`] of the candidate to the `house`.
    pub similarity: Similarity,
}

/// Finds houses in the `pool` similar to the `candidate` one at least by the
/// provided `threshold`, preserving their order.
///
/// The `candidate` itself is skipped, if it's present in the `pool` already.
pub fn find_similar<T: Comparable>(
    candidate: &Record<'_>,
    pool: impl IntoIterator<Item = T>,
    threshold: Score,
) -> Vec<Match<T>> {
    pool.into_iter()
        .filter_map(|house| {
            let existing = house.record();
            if candidate.is_same(&existing) {
                return None;
            }
            let similarity = Similarity::between(candidate, &existing);
            (similarity.score >= threshold)
                .then_some(Match { house, similarity })
        })
        .collect()
}

/// Checks whether the `pool` contains a house with the same [normalized]
/// address as the `candidate` one has.
///
/// The `candidate` itself is skipped, if it's present in the `pool` already.
///
/// [normalized]: address::normalize
pub fn exists_exact<T: Comparable>(
    candidate: &Record<'_>,
    pool: impl IntoIterator<Item = T>,
) -> bool {
    let normalized = address::normalize(candidate.address);
    pool.into_iter().any(|house| {
        let existing = house.record();
        !candidate.is_same(&existing)
            && address::normalize(existing.address) == normalized
    })
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::{
        exists_exact, find_similar, Id, Record, Score, Signal, Similarity,
    };

    fn record<'a>(
        id: Option<i32>,
        address: &'a str,
        apartments: i32,
        total_area: &str,
        build_year: i32,
        floors: i32,
    ) -> Record<'a> {
        Record {
            id: id.map(Id::from),
            address,
            apartments,
            total_area: total_area.parse().unwrap(),
            build_year,
            floors,
        }
    }

    fn candidate() -> Record<'static> {
        record(None, "ул Ленина д5", 20, "1000.0", 2000, 5)
    }

    fn score(s: &str) -> Score {
        s.parse().unwrap()
    }

    #[test]
    fn scores_near_duplicate() {
        let existing = record(Some(7), "ул Ленина д5", 22, "1050.0", 2001, 5);

        let similarity = Similarity::between(&candidate(), &existing);

        assert_eq!(similarity.score, score("0.9"));
        assert_eq!(
            similarity.signals,
            [
                Signal::AddressExact,
                Signal::BuildYear,
                Signal::Apartments,
                Signal::TotalArea,
                Signal::FloorsExact,
            ],
        );
        assert_eq!(
            find_similar(&candidate(), [existing], Score::WARNING_THRESHOLD)
                .len(),
            1,
        );
    }

    #[test]
    fn scores_unrelated_house() {
        let existing = record(Some(8), "Советская 10", 5, "200", 1960, 2);

        let similarity = Similarity::between(&candidate(), &existing);

        assert_eq!(similarity.score, Score::ZERO);
        assert!(similarity.signals.is_empty());
        assert!(find_similar(&candidate(), [existing], score("0.7"))
            .is_empty());
    }

    #[test]
    fn exact_address_scores_at_least_half() {
        let existing =
            record(Some(1), "ул Ленина д5", 500, "99999", 1600, 90);

        let similarity = Similarity::between(&candidate(), &existing);

        assert_eq!(similarity.signals, [Signal::AddressExact]);
        assert!(similarity.score >= score("0.5"));
    }

    #[test]
    fn overlapping_address_scores_less_than_exact() {
        let existing = record(Some(1), "ул Ленина", 500, "99999", 1600, 90);

        let similarity = Similarity::between(&candidate(), &existing);

        assert_eq!(similarity.signals, [Signal::AddressSubstring]);
        assert_eq!(similarity.score, score("0.3"));
    }

    #[test]
    fn empty_address_overlaps_nothing() {
        let empty = record(None, "", 500, "99999", 1600, 90);
        let existing = record(Some(1), "ул Ленина д5", 1, "1", 2020, 1);

        assert!(Similarity::between(&empty, &existing).signals.is_empty());
    }

    #[test]
    fn scores_close_floors() {
        let existing = record(Some(1), "Мира 1", 100, "1", 1900, 6);

        let similarity = Similarity::between(&candidate(), &existing);

        assert_eq!(similarity.signals, [Signal::FloorsClose]);
        assert_eq!(similarity.score, score("0.05"));
    }

    #[test]
    fn sums_weights_exactly() {
        let existing = record(Some(1), "ул Ленина", 21, "1010", 2003, 5);

        let similarity = Similarity::between(&candidate(), &existing);

        assert_eq!(similarity.score, score("0.7"));
        assert_eq!(
            find_similar(&candidate(), [existing], score("0.7")).len(),
            1,
        );
    }

    #[test]
    fn survives_zero_divisors() {
        let zero = record(None, "A", 0, "0", 2000, 5);
        let also_zero = record(Some(1), "B", 0, "0", 2000, 5);
        let non_zero = record(Some(2), "C", 10, "100", 2000, 5);

        let both = Similarity::between(&zero, &also_zero);
        let one = Similarity::between(&zero, &non_zero);

        for similarity in [both, one] {
            assert!(!similarity.signals.contains(&Signal::Apartments));
            assert!(!similarity.signals.contains(&Signal::TotalArea));
        }
    }

    #[test]
    fn survives_extreme_values() {
        let huge = Record {
            total_area: Decimal::MAX,
            ..record(None, "A", i32::MAX, "1", i32::MAX, i32::MAX)
        };
        let tiny = Record {
            total_area: Decimal::MIN,
            ..record(Some(1), "B", i32::MIN, "1", i32::MIN, i32::MIN)
        };

        assert_eq!(Similarity::between(&huge, &tiny).score, Score::ZERO);
    }

    #[test]
    fn excludes_candidate_itself() {
        let existing = record(Some(7), "ул Ленина д5", 20, "1000", 2000, 5);
        let candidate = Record {
            id: Some(Id::from(7)),
            ..candidate()
        };

        assert!(find_similar(&candidate, [existing], Score::ZERO).is_empty());
        assert!(!exists_exact(&candidate, [existing]));
    }

    #[test]
    fn lower_threshold_keeps_matches() {
        let pool = [
            record(Some(1), "ул Ленина д5", 22, "1050", 2001, 5),
            record(Some(2), "ул Ленина", 25, "1100", 2004, 6),
            record(Some(3), "Мира 1", 21, "990", 1999, 4),
            record(Some(4), "Советская 10", 5, "200", 1960, 2),
        ];

        let thresholds = ["1", "0.9", "0.8", "0.7", "0.5", "0.3", "0.1", "0"];
        for pair in thresholds.windows(2) {
            let higher = find_similar(&candidate(), &pool, score(pair[0]));
            let lower = find_similar(&candidate(), &pool, score(pair[1]));

            for m in higher {
                assert!(
                    lower.iter().any(|l| l.house.id == m.house.id),
                    "{:?} lost at {}",
                    m.house.id,
                    pair[1],
                );
            }
        }
    }

    #[test]
    fn preserves_pool_order() {
        let pool = [
            record(Some(3), "ул Ленина д5", 20, "1000", 2000, 5),
            record(Some(1), "Советская 10", 5, "200", 1960, 2),
            record(Some(2), "ул Ленина д5", 21, "1001", 2000, 5),
        ];

        let ids = find_similar(&candidate(), &pool, Score::DEFAULT_THRESHOLD)
            .into_iter()
            .map(|m| m.house.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, [Some(Id::from(3)), Some(Id::from(2))]);
    }

    #[test]
    fn detects_exact_duplicate_by_normalized_address() {
        let candidate = record(None, "ул. Ленина, д. 5", 1, "1", 1900, 1);
        let pool = [
            record(Some(1), "Советская 10", 5, "200", 1960, 2),
            record(Some(2), "улица Ленина дом 5", 20, "1000", 2000, 5),
        ];

        assert!(exists_exact(&candidate, &pool));
        assert!(!exists_exact(&candidate, &pool[..1]));
    }

    #[test]
    fn parses_score() {
        assert_eq!(score("0.75").value(), Decimal::new(75, 2));
        assert!("1.01".parse::<Score>().is_err());
        assert!("-0.1".parse::<Score>().is_err());
        assert!("high".parse::<Score>().is_err());
        assert!(Score::WARNING_THRESHOLD < Score::DEFAULT_THRESHOLD);
    }
}

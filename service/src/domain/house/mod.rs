//! [`House`] definitions.

pub mod address;
pub mod criterion;
pub mod similarity;

use std::str::FromStr;

use common::{unit, DateTime, DateTimeOf};
use derive_more::{Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

pub use self::{address::Address, criterion::Criterion};

/// Building registered in the housing fund.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct House {
    /// ID of this [`House`].
    pub id: Id,

    /// [`Address`] of this [`House`].
    pub address: Address,

    /// Number of apartments in this [`House`].
    pub apartments: Apartments,

    /// Total area of this [`House`] in square meters.
    pub total_area: TotalArea,

    /// Year this [`House`] was built in.
    pub build_year: BuildYear,

    /// Number of floors in this [`House`].
    pub floors: Floors,

    /// [`DateTime`] when this [`House`] was registered.
    pub created_at: CreationDateTime,
}

impl House {
    /// Returns the age of this [`House`] (in years) as of the provided `year`.
    #[must_use]
    pub fn age_in(&self, year: i32) -> i32 {
        year - self.build_year.get()
    }

    /// Returns the current age of this [`House`] in years.
    #[must_use]
    pub fn age(&self) -> i32 {
        self.age_in(DateTime::current_year())
    }

    /// Indicates whether this [`House`] is older than the provided number of
    /// `years`.
    #[must_use]
    pub fn is_older_than(&self, years: i32) -> bool {
        self.age() > years
    }
}

/// Attributes of a [`House`] which is not registered yet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    /// [`Address`] of the [`House`].
    pub address: Address,

    /// Number of apartments in the [`House`].
    pub apartments: Apartments,

    /// Total area of the [`House`].
    pub total_area: TotalArea,

    /// Year the [`House`] was built in.
    pub build_year: BuildYear,

    /// Number of floors in the [`House`].
    pub floors: Floors,
}

impl Draft {
    /// Turns this [`Draft`] into a registered [`House`].
    #[must_use]
    pub fn into_house(self, id: Id, created_at: CreationDateTime) -> House {
        let Self {
            address,
            apartments,
            total_area,
            build_year,
            floors,
        } = self;
        House {
            id,
            address,
            apartments,
            total_area,
            build_year,
            floors,
            created_at,
        }
    }
}

/// ID of a [`House`], assigned on registration.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    derive_more::FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(i32);

/// Number of apartments in a [`House`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Apartments(i32);

impl Apartments {
    /// Creates new [`Apartments`] without checking the provided `count`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `count` is positive.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(count: i32) -> Self {
        Self(count)
    }

    /// Creates new [`Apartments`] if the given `count` is positive.
    #[must_use]
    pub fn new(count: i32) -> Option<Self> {
        (count > 0).then_some(Self(count))
    }

    /// Returns the number of apartments.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl FromStr for Apartments {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Apartments`")
    }
}

/// Total area of a [`House`] in square meters, with a precision of two
/// decimal places.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct TotalArea(Decimal);

impl TotalArea {
    /// Creates a new [`TotalArea`] without checking the provided value.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `area` is positive and has at
    /// most two decimal places.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(area: Decimal) -> Self {
        Self(area)
    }

    /// Creates a new [`TotalArea`] out of the given `area` rounded to two
    /// decimal places, if it's positive and fits into the storage.
    #[must_use]
    pub fn new(area: Decimal) -> Option<Self> {
        let area = area.round_dp(2);
        (area > Decimal::ZERO && area < Decimal::from(10_000_000_000_i64))
            .then_some(Self(area))
    }

    /// Returns the area in square meters.
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }
}

impl FromStr for TotalArea {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `TotalArea`")
    }
}

/// Year a [`House`] was built in.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct BuildYear(i32);

impl BuildYear {
    /// Earliest [`BuildYear`] accepted by the registry.
    pub const MIN: i32 = 1500;

    /// Creates a new [`BuildYear`] without checking the provided `year`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `year` is between
    /// [`BuildYear::MIN`] and the current year.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(year: i32) -> Self {
        Self(year)
    }

    /// Creates a new [`BuildYear`] if the given `year` is not earlier than
    /// [`BuildYear::MIN`] and not in the future.
    #[must_use]
    pub fn new(year: i32) -> Option<Self> {
        (Self::MIN..=DateTime::current_year())
            .contains(&year)
            .then_some(Self(year))
    }

    /// Returns the year.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl FromStr for BuildYear {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `BuildYear`")
    }
}

/// Number of floors in a [`House`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Floors(i32);

impl Floors {
    /// Maximal number of [`Floors`] in a [`House`].
    pub const MAX: i32 = 100;

    /// Creates new [`Floors`] without checking the provided `count`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `count` is between `1` and
    /// [`Floors::MAX`].
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(count: i32) -> Self {
        Self(count)
    }

    /// Creates new [`Floors`] if the given `count` is between `1` and
    /// [`Floors::MAX`].
    #[must_use]
    pub fn new(count: i32) -> Option<Self> {
        (1..=Self::MAX).contains(&count).then_some(Self(count))
    }

    /// Returns the number of floors.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl FromStr for Floors {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Floors`")
    }
}

/// [`DateTime`] when a [`House`] was registered.
pub type CreationDateTime = DateTimeOf<(House, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::DateTime;
    use rust_decimal::Decimal;

    use super::{
        Address, Apartments, BuildYear, Draft, Floors, House, Id, TotalArea,
    };

    fn house(build_year: i32) -> House {
        Draft {
            address: Address::new("ул Ленина д5").unwrap(),
            apartments: Apartments::new(20).unwrap(),
            total_area: TotalArea::new(Decimal::new(100_050, 2)).unwrap(),
            build_year: BuildYear::new(build_year).unwrap(),
            floors: Floors::new(5).unwrap(),
        }
        .into_house(Id::from(1), DateTime::now().coerce())
    }

    #[test]
    fn apartments_must_be_positive() {
        assert!(Apartments::new(1).is_some());
        assert!(Apartments::new(0).is_none());
        assert!(Apartments::new(-3).is_none());
        assert_eq!("42".parse::<Apartments>().map(Apartments::get), Ok(42));
        assert!("forty".parse::<Apartments>().is_err());
    }

    #[test]
    fn total_area_must_be_positive() {
        assert!(TotalArea::new(Decimal::new(1, 2)).is_some());
        assert!(TotalArea::new(Decimal::ZERO).is_none());
        assert!(TotalArea::new(Decimal::new(-5, 0)).is_none());
        assert!(TotalArea::new(Decimal::new(1, 3)).is_none());
    }

    #[test]
    fn total_area_is_rounded_to_cents() {
        let area = "1050.456".parse::<TotalArea>().unwrap();

        assert_eq!(area.get(), Decimal::new(105_046, 2));
    }

    #[test]
    fn build_year_is_bounded() {
        let current = DateTime::current_year();

        assert!(BuildYear::new(BuildYear::MIN).is_some());
        assert!(BuildYear::new(current).is_some());
        assert!(BuildYear::new(BuildYear::MIN - 1).is_none());
        assert!(BuildYear::new(current + 1).is_none());
    }

    #[test]
    fn floors_are_bounded() {
        assert!(Floors::new(1).is_some());
        assert!(Floors::new(Floors::MAX).is_some());
        assert!(Floors::new(0).is_none());
        assert!(Floors::new(Floors::MAX + 1).is_none());
    }

    #[test]
    fn calculates_age() {
        let house = house(2000);

        assert_eq!(house.age_in(2024), 24);
        assert_eq!(house.age(), DateTime::current_year() - 2000);
    }

    #[test]
    fn detects_older_houses() {
        let house = house(DateTime::current_year() - 30);

        assert!(house.is_older_than(29));
        assert!(!house.is_older_than(30));
        assert!(!house.is_older_than(31));
    }
}

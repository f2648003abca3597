//! [`Criterion`] of selecting multiple [`House`]s at once.
//!
//! [`House`]: super::House

use rust_decimal::Decimal;

use super::{address, House};

/// Criterion of selecting [`House`]s for bulk removal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Criterion {
    /// [`House`]s built exactly in the provided year.
    BuildYear(i32),

    /// [`House`]s with the number of apartments within the [`Bounds`].
    Apartments(Bounds<i32>),

    /// [`House`]s with the total area within the [`Bounds`].
    TotalArea(Bounds<Decimal>),

    /// [`House`]s with the address containing the [`address::Fragment`].
    Address(address::Fragment),
}

impl Criterion {
    /// Checks whether the provided [`House`] satisfies this [`Criterion`].
    #[must_use]
    pub fn matches(&self, house: &House) -> bool {
        match self {
            Self::BuildYear(year) => house.build_year.get() == *year,
            Self::Apartments(bounds) => bounds.contains(house.apartments.get()),
            Self::TotalArea(bounds) => bounds.contains(house.total_area.get()),
            Self::Address(fragment) => fragment.is_in(house.address.as_ref()),
        }
    }
}

/// Inclusive non-negative bounds of a value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bounds<T> {
    /// Lower bound.
    min: T,

    /// Upper bound.
    max: T,
}

impl<T: Copy + Default + PartialOrd> Bounds<T> {
    /// Creates new [`Bounds`] if `0 <= min <= max` holds.
    #[must_use]
    pub fn new(min: T, max: T) -> Option<Self> {
        (T::default() <= min && min <= max).then_some(Self { min, max })
    }

    /// Returns the lower bound.
    #[must_use]
    pub fn min(&self) -> T {
        self.min
    }

    /// Returns the upper bound.
    #[must_use]
    pub fn max(&self) -> T {
        self.max
    }

    /// Checks whether the provided `value` lies within these [`Bounds`].
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

//! [`House`]-related read definitions.

use derive_more::{From, Into};

#[cfg(doc)]
use crate::domain::house::similarity::Score;
use crate::domain::{house::similarity::Match, House};

/// Total count of registered [`House`]s.
#[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
pub struct TotalCount(i32);

/// Selector of [`House`]s older than the specified number of years.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OlderThan(i32);

impl OlderThan {
    /// Creates a new [`OlderThan`] selector if the given number of `years` is
    /// not negative.
    #[must_use]
    pub fn new(years: i32) -> Option<Self> {
        (years >= 0).then_some(Self(years))
    }

    /// Returns the number of years.
    #[must_use]
    pub const fn years(self) -> i32 {
        self.0
    }
}

/// Registered [`House`]s duplicating a candidate one.
#[derive(Clone, Debug, Default)]
pub struct Duplicates {
    /// Indicator whether a [`House`] with the same normalized address is
    /// registered already.
    pub exact: bool,

    /// [`House`]s similar to the candidate one at least by the [`Score`]
    /// threshold.
    pub similar: Vec<Match<House>>,
}

pub mod list {
    //! [`House`] list definitions.
    //!
    //! Lists are filtered and sorted in memory over a snapshot of all the
    //! registered [`House`]s.

    use std::{cmp::Ordering, ops::RangeInclusive};

    use common::DateTime;
    use rust_decimal::Decimal;
    use smart_default::SmartDefault;

    use crate::domain::{
        house::{address, BuildYear, Floors},
        House,
    };

    /// Selector of a [`House`] list.
    #[derive(Clone, Debug, Default)]
    pub struct Selector {
        /// [`Filter`] of the list.
        pub filter: Filter,

        /// [`Sorting`] of the list.
        pub sorting: Sorting,
    }

    impl Selector {
        /// Selects [`House`]s from the provided snapshot.
        ///
        /// An inactive [`Filter`] keeps every [`House`], even the ones beyond
        /// its default bounds.
        #[must_use]
        pub fn select(&self, houses: Vec<House>) -> Vec<House> {
            let mut houses = if self.filter.is_active() {
                houses
                    .into_iter()
                    .filter(|h| self.filter.matches(h))
                    .collect()
            } else {
                houses
            };
            self.sorting.sort(&mut houses);
            houses
        }
    }

    /// Filter of a [`House`] list.
    ///
    /// All the bounds are inclusive.
    #[derive(Clone, Debug, Eq, PartialEq, SmartDefault)]
    pub struct Filter {
        /// Bounds of the [`BuildYear`].
        #[default(BuildYear::MIN..=DateTime::current_year())]
        pub build_year: RangeInclusive<i32>,

        /// Bounds of the number of apartments.
        #[default(0..=1000)]
        pub apartments: RangeInclusive<i32>,

        /// Bounds of the total area.
        #[default(Decimal::ZERO..=Decimal::from(100_000))]
        pub total_area: RangeInclusive<Decimal>,

        /// Bounds of the number of [`Floors`].
        #[default(0..=Floors::MAX)]
        pub floors: RangeInclusive<i32>,

        /// [`address::Fragment`] to be contained in the address.
        pub address: Option<address::Fragment>,
    }

    impl Filter {
        /// Indicates whether this [`Filter`] narrows the list anyhow.
        #[must_use]
        pub fn is_active(&self) -> bool {
            *self != Self::default()
        }

        /// Checks whether the provided [`House`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, house: &House) -> bool {
            self.build_year.contains(&house.build_year.get())
                && self.apartments.contains(&house.apartments.get())
                && self.total_area.contains(&house.total_area.get())
                && self.floors.contains(&house.floors.get())
                && self
                    .address
                    .as_ref()
                    .map_or(true, |f| f.is_in(house.address.as_ref()))
        }
    }

    /// Column of a [`House`] list to sort by.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum Column {
        /// Address.
        Address,

        /// Number of apartments.
        Apartments,

        /// Total area.
        TotalArea,

        /// Construction year.
        BuildYear,

        /// Number of floors.
        Floors,
    }

    impl Column {
        /// Compares the provided [`House`]s by this [`Column`].
        fn compare(self, a: &House, b: &House) -> Ordering {
            match self {
                Self::Address => {
                    str::cmp(a.address.as_ref(), b.address.as_ref())
                }
                Self::Apartments => a.apartments.cmp(&b.apartments),
                Self::TotalArea => a.total_area.cmp(&b.total_area),
                Self::BuildYear => a.build_year.cmp(&b.build_year),
                Self::Floors => a.floors.cmp(&b.floors),
            }
        }
    }

    /// Sorting order.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub enum Order {
        /// Ascending order.
        #[default]
        Asc,

        /// Descending order.
        Desc,
    }

    /// Sorting of a [`House`] list.
    ///
    /// Keys are applied in order. [`House`]s equal by all the keys keep their
    /// snapshot order.
    #[derive(Clone, Debug, Default, Eq, PartialEq)]
    pub struct Sorting(pub Vec<(Column, Order)>);

    impl Sorting {
        /// Sorts the provided [`House`]s in place.
        pub fn sort(&self, houses: &mut [House]) {
            if self.0.is_empty() {
                return;
            }
            houses.sort_by(|a, b| {
                self.0.iter().fold(Ordering::Equal, |ord, &(col, order)| {
                    ord.then_with(|| {
                        let ord = col.compare(a, b);
                        match order {
                            Order::Asc => ord,
                            Order::Desc => ord.reverse(),
                        }
                    })
                })
            });
        }
    }

    #[cfg(test)]
    mod spec {
        use common::DateTime;
        use rust_decimal::Decimal;

        use crate::domain::{
            house::{
                address, Address, Apartments, BuildYear, Draft, Floors, Id,
                TotalArea,
            },
            House,
        };

        use super::{Column, Filter, Order, Selector, Sorting};

        fn house(
            id: i32,
            address: &str,
            apartments: i32,
            build_year: i32,
            floors: i32,
        ) -> House {
            Draft {
                address: Address::new(address).unwrap(),
                apartments: Apartments::new(apartments).unwrap(),
                total_area: TotalArea::new(Decimal::from(apartments * 50))
                    .unwrap(),
                build_year: BuildYear::new(build_year).unwrap(),
                floors: Floors::new(floors).unwrap(),
            }
            .into_house(Id::from(id), DateTime::now().coerce())
        }

        fn snapshot() -> Vec<House> {
            vec![
                house(1, "ул Ленина д5", 20, 2000, 5),
                house(2, "пр Мира 10", 40, 1960, 9),
                house(3, "ул Ленина д7", 20, 1985, 5),
                house(4, "Советская 10", 8, 1890, 2),
            ]
        }

        fn ids(houses: &[House]) -> Vec<i32> {
            houses.iter().map(|h| h.id.into()).collect()
        }

        #[test]
        fn default_filter_is_inactive() {
            let filter = Filter::default();

            assert!(!filter.is_active());
            let houses = Selector::default().select(snapshot());
            assert_eq!(ids(&houses), [1, 2, 3, 4]);
        }

        #[test]
        fn inactive_filter_keeps_houses_beyond_default_bounds() {
            let snapshot = vec![
                house(9, "пр Мира 1", 1500, 2000, 30),
                house(10, "пр Мира 3", 2500, 2000, 40),
            ];
            assert!(snapshot[1].total_area.get() > Decimal::from(100_000));

            let houses = Selector::default().select(snapshot);

            assert_eq!(ids(&houses), [9, 10]);
        }

        #[test]
        fn filters_by_bounds() {
            let filter = Filter {
                build_year: 1950..=2000,
                floors: 5..=9,
                ..Filter::default()
            };

            assert!(filter.is_active());
            let selector = Selector {
                filter,
                ..Selector::default()
            };
            assert_eq!(ids(&selector.select(snapshot())), [1, 2, 3]);
        }

        #[test]
        fn filters_by_address_fragment() {
            let filter = Filter {
                address: address::Fragment::new("ленина"),
                ..Filter::default()
            };

            assert!(filter.is_active());
            let selector = Selector {
                filter,
                ..Selector::default()
            };
            assert_eq!(ids(&selector.select(snapshot())), [1, 3]);
        }

        #[test]
        fn sorts_by_multiple_keys() {
            let selector = Selector {
                sorting: Sorting(vec![
                    (Column::Apartments, Order::Desc),
                    (Column::BuildYear, Order::Asc),
                ]),
                ..Selector::default()
            };

            assert_eq!(ids(&selector.select(snapshot())), [2, 3, 1, 4]);
        }

        #[test]
        fn sorting_is_stable() {
            let selector = Selector {
                sorting: Sorting(vec![(Column::Floors, Order::Asc)]),
                ..Selector::default()
            };

            assert_eq!(ids(&selector.select(snapshot())), [4, 1, 3, 2]);
        }
    }
}

//! [`House`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::{domain, read};

use crate::{
    api::{self, scalar},
    define_error, Context, Error,
};

/// A registered house.
#[derive(Clone, Debug, From)]
pub struct House(domain::House);

/// A house registered in the housing fund.
#[graphql_object(context = Context)]
impl House {
    /// Unique identifier of this `House`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Address of this `House`.
    #[must_use]
    pub fn address(&self) -> Address {
        self.0.address.clone().into()
    }

    /// Number of apartments in this `House`.
    #[must_use]
    pub fn apartments(&self) -> i32 {
        self.0.apartments.get()
    }

    /// Total area of this `House` in square meters.
    #[must_use]
    pub fn total_area(&self) -> scalar::Decimal {
        self.0.total_area.get().into()
    }

    /// Year this `House` was built in.
    #[must_use]
    pub fn build_year(&self) -> i32 {
        self.0.build_year.get()
    }

    /// Number of floors in this `House`.
    #[must_use]
    pub fn floors(&self) -> i32 {
        self.0.floors.get()
    }

    /// Age of this `House` in full years as of the current year.
    #[must_use]
    pub fn age(&self) -> i32 {
        self.0.age()
    }

    /// `DateTime` when this `House` was registered.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `House`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::house::Id)]
#[into(domain::house::Id)]
#[graphql(name = "HouseId", transparent)]
pub struct Id(i32);

/// Address of a `House`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "HouseAddress",
    with = scalar::Via::<domain::house::Address>,
)]
pub struct Address(domain::house::Address);

/// Attributes of a `House` to be saved.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "HouseInput")]
pub struct Input {
    /// Address of the `House`.
    pub address: Address,

    /// Number of apartments in the `House`. Must be positive.
    pub apartments: i32,

    /// Total area of the `House` in square meters. Must be positive.
    pub total_area: scalar::Decimal,

    /// Year the `House` was built in. Must be within `1500..=currentYear`.
    pub build_year: i32,

    /// Number of floors in the `House`. Must be within `1..=100`.
    pub floors: i32,
}

impl TryFrom<Input> for domain::house::Draft {
    type Error = Error;

    fn try_from(input: Input) -> Result<Self, Self::Error> {
        use domain::house as h;

        let Input {
            address,
            apartments,
            total_area,
            build_year,
            floors,
        } = input;

        Ok(Self {
            address: address.into(),
            apartments: h::Apartments::new(apartments)
                .ok_or(DraftError::Apartments)?,
            total_area: h::TotalArea::new(total_area.into())
                .ok_or(DraftError::TotalArea)?,
            build_year: h::BuildYear::new(build_year)
                .ok_or(DraftError::BuildYear)?,
            floors: h::Floors::new(floors).ok_or(DraftError::Floors)?,
        })
    }
}

define_error! {
    enum DraftError {
        #[code = "INVALID_APARTMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Number of apartments must be positive"]
        Apartments,

        #[code = "INVALID_TOTAL_AREA"]
        #[status = BAD_REQUEST]
        #[message = "Total area must be positive"]
        TotalArea,

        #[code = "INVALID_BUILD_YEAR"]
        #[status = BAD_REQUEST]
        #[message = "Construction year must be between 1500 and the current \
                     one"]
        BuildYear,

        #[code = "INVALID_FLOORS"]
        #[status = BAD_REQUEST]
        #[message = "Number of floors must be between 1 and 100"]
        Floors,
    }
}

/// Evidence of two houses being the same building.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "SimilaritySignal")]
pub enum Signal {
    /// Addresses are equal.
    AddressExact,

    /// One address contains another one.
    AddressSubstring,

    /// Construction years differ by 5 years at most.
    BuildYear,

    /// Apartment counts differ by 20% at most.
    Apartments,

    /// Total areas differ by 15% at most.
    TotalArea,

    /// Floor counts are equal.
    FloorsExact,

    /// Floor counts differ by one.
    FloorsClose,
}

impl From<domain::house::similarity::Signal> for Signal {
    fn from(signal: domain::house::similarity::Signal) -> Self {
        use domain::house::similarity::Signal as S;

        match signal {
            S::AddressExact => Self::AddressExact,
            S::AddressSubstring => Self::AddressSubstring,
            S::BuildYear => Self::BuildYear,
            S::Apartments => Self::Apartments,
            S::TotalArea => Self::TotalArea,
            S::FloorsExact => Self::FloorsExact,
            S::FloorsClose => Self::FloorsClose,
        }
    }
}

/// Registered `House` found similar to a candidate one.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "SimilarHouse")]
pub struct Match {
    /// Similar `House`.
    pub house: House,

    /// Similarity score in `[0, 1]` range.
    pub score: scalar::Decimal,

    /// Signals the `score` is summed of.
    pub signals: Vec<Signal>,
}

impl From<domain::house::similarity::Match<domain::House>> for Match {
    fn from(m: domain::house::similarity::Match<domain::House>) -> Self {
        Self {
            house: m.house.into(),
            score: m.similarity.score.value().into(),
            signals: m.similarity.signals.into_iter().map(Into::into).collect(),
        }
    }
}

/// Registered `House`s duplicating a candidate one.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "HouseDuplicates")]
pub struct Duplicates {
    /// Indicator whether a `House` with the same normalized address is
    /// registered already.
    pub exact: bool,

    /// `House`s similar to the candidate one, in registration order.
    pub similar: Vec<Match>,
}

impl From<read::house::Duplicates> for Duplicates {
    fn from(duplicates: read::house::Duplicates) -> Self {
        Self {
            exact: duplicates.exact,
            similar: duplicates.similar.into_iter().map(Into::into).collect(),
        }
    }
}

/// Inclusive range of integers.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
pub struct IntRange {
    /// Lower bound.
    pub min: i32,

    /// Upper bound.
    pub max: i32,
}

/// Inclusive range of decimals.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
pub struct DecimalRange {
    /// Lower bound.
    pub min: scalar::Decimal,

    /// Upper bound.
    pub max: scalar::Decimal,
}

/// Criterion of deleting multiple `House`s at once.
///
/// Exactly one field must be specified.
#[derive(Clone, Debug, Default, GraphQLInputObject)]
#[graphql(name = "HouseDeletionCriterion")]
pub struct Criterion {
    /// Delete `House`s built exactly in this year.
    pub build_year: Option<i32>,

    /// Delete `House`s with the number of apartments within this range.
    pub apartments: Option<IntRange>,

    /// Delete `House`s with the total area within this range.
    pub total_area: Option<DecimalRange>,

    /// Delete `House`s which address contains this text, ignoring case.
    pub address: Option<String>,
}

impl TryFrom<Criterion> for domain::house::Criterion {
    type Error = Error;

    fn try_from(criterion: Criterion) -> Result<Self, Self::Error> {
        use domain::house::{address::Fragment, criterion::Bounds};

        let Criterion {
            build_year,
            apartments,
            total_area,
            address,
        } = criterion;

        Ok(match (build_year, apartments, total_area, address) {
            (Some(year), None, None, None) => Self::BuildYear(year),
            (None, Some(IntRange { min, max }), None, None) => {
                Self::Apartments(
                    Bounds::new(min, max)
                        .ok_or(api::InputError::InvalidRange)?,
                )
            }
            (None, None, Some(DecimalRange { min, max }), None) => {
                Self::TotalArea(
                    Bounds::new(min.into(), max.into())
                        .ok_or(api::InputError::InvalidRange)?,
                )
            }
            (None, None, None, Some(address)) => Self::Address(
                Fragment::new(address)
                    .ok_or(api::InputError::EmptyAddressFragment)?,
            ),
            _ => return Err(api::InputError::AmbiguousCriterion.into()),
        })
    }
}

pub mod list {
    //! Definitions related to a [`House`] list.
    //!
    //! [`House`]: super::House

    use juniper::{GraphQLEnum, GraphQLInputObject};
    use service::{
        domain::house::address,
        read::house::list::{self, Column, Order},
    };

    use crate::api::scalar;

    /// Filter of a `House` list.
    ///
    /// Omitted bounds are not narrowing the list.
    #[derive(Clone, Debug, Default, GraphQLInputObject)]
    #[graphql(name = "HouseFilter")]
    pub struct Filter {
        /// Minimal construction year.
        pub min_build_year: Option<i32>,

        /// Maximal construction year.
        pub max_build_year: Option<i32>,

        /// Minimal number of apartments.
        pub min_apartments: Option<i32>,

        /// Maximal number of apartments.
        pub max_apartments: Option<i32>,

        /// Minimal total area.
        pub min_total_area: Option<scalar::Decimal>,

        /// Maximal total area.
        pub max_total_area: Option<scalar::Decimal>,

        /// Minimal number of floors.
        pub min_floors: Option<i32>,

        /// Maximal number of floors.
        pub max_floors: Option<i32>,

        /// Text the address should contain, ignoring case.
        pub address: Option<String>,
    }

    impl From<Filter> for list::Filter {
        fn from(filter: Filter) -> Self {
            let Filter {
                min_build_year,
                max_build_year,
                min_apartments,
                max_apartments,
                min_total_area,
                max_total_area,
                min_floors,
                max_floors,
                address,
            } = filter;

            let def = Self::default();
            Self {
                build_year: min_build_year.unwrap_or(*def.build_year.start())
                    ..=max_build_year.unwrap_or(*def.build_year.end()),
                apartments: min_apartments.unwrap_or(*def.apartments.start())
                    ..=max_apartments.unwrap_or(*def.apartments.end()),
                total_area: min_total_area
                    .map_or(*def.total_area.start(), Into::into)
                    ..=max_total_area.map_or(*def.total_area.end(), Into::into),
                floors: min_floors.unwrap_or(*def.floors.start())
                    ..=max_floors.unwrap_or(*def.floors.end()),
                address: address.and_then(address::Fragment::new),
            }
        }
    }

    /// Column of a `House` list.
    #[derive(Clone, Copy, Debug, GraphQLEnum)]
    #[graphql(name = "HouseColumn")]
    pub enum HouseColumn {
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

    impl From<HouseColumn> for Column {
        fn from(column: HouseColumn) -> Self {
            match column {
                HouseColumn::Address => Self::Address,
                HouseColumn::Apartments => Self::Apartments,
                HouseColumn::TotalArea => Self::TotalArea,
                HouseColumn::BuildYear => Self::BuildYear,
                HouseColumn::Floors => Self::Floors,
            }
        }
    }

    /// Sorting order.
    #[derive(Clone, Copy, Debug, Default, GraphQLEnum)]
    pub enum SortOrder {
        /// Ascending order.
        #[default]
        Asc,

        /// Descending order.
        Desc,
    }

    impl From<SortOrder> for Order {
        fn from(order: SortOrder) -> Self {
            match order {
                SortOrder::Asc => Self::Asc,
                SortOrder::Desc => Self::Desc,
            }
        }
    }

    /// Key of sorting a `House` list.
    #[derive(Clone, Copy, Debug, GraphQLInputObject)]
    #[graphql(name = "HouseSortKey")]
    pub struct SortKey {
        /// Column to sort by.
        pub column: HouseColumn,

        /// Order of sorting. Ascending, if omitted.
        pub order: Option<SortOrder>,
    }

    /// Builds a [`list::Selector`] out of the provided GraphQL arguments.
    #[must_use]
    pub fn selector(
        filter: Option<Filter>,
        sorting: Option<Vec<SortKey>>,
    ) -> list::Selector {
        list::Selector {
            filter: filter.map(Into::into).unwrap_or_default(),
            sorting: list::Sorting(
                sorting
                    .unwrap_or_default()
                    .into_iter()
                    .map(|k| {
                        (k.column.into(), k.order.unwrap_or_default().into())
                    })
                    .collect(),
            ),
        }
    }
}

pub mod export {
    //! Definitions related to a [`House`] list export.
    //!
    //! [`House`]: super::House

    use juniper::GraphQLEnum;
    use service::export;

    /// Exported field of a `House`.
    #[derive(Clone, Copy, Debug, GraphQLEnum)]
    pub enum ExportField {
        /// Unique identifier.
        Id,

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

        /// Age in years.
        Age,
    }

    impl From<ExportField> for export::Field {
        fn from(field: ExportField) -> Self {
            match field {
                ExportField::Id => Self::Id,
                ExportField::Address => Self::Address,
                ExportField::Apartments => Self::Apartments,
                ExportField::TotalArea => Self::TotalArea,
                ExportField::BuildYear => Self::BuildYear,
                ExportField::Floors => Self::Floors,
                ExportField::Age => Self::Age,
            }
        }
    }

    /// Delimiter of exported fields.
    #[derive(Clone, Copy, Debug, GraphQLEnum)]
    pub enum ExportDelimiter {
        /// Tab character.
        Tab,

        /// Semicolon.
        Semicolon,

        /// Comma.
        Comma,
    }

    impl From<ExportDelimiter> for export::Delimiter {
        fn from(delimiter: ExportDelimiter) -> Self {
            match delimiter {
                ExportDelimiter::Tab => Self::Tab,
                ExportDelimiter::Semicolon => Self::Semicolon,
                ExportDelimiter::Comma => Self::Comma,
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;
    use service::{domain::house, read::house::list};

    use super::{list as api_list, Criterion, DecimalRange, IntRange};

    #[test]
    fn builds_criterion_from_single_field() {
        let criterion = house::Criterion::try_from(Criterion {
            build_year: Some(1960),
            ..Criterion::default()
        })
        .expect("valid criterion");

        assert_eq!(criterion, house::Criterion::BuildYear(1960));
    }

    #[test]
    fn rejects_ambiguous_criterion() {
        let err = house::Criterion::try_from(Criterion {
            build_year: Some(1960),
            address: Some("Ленина".into()),
            ..Criterion::default()
        })
        .expect_err("ambiguous criterion");
        assert_eq!(err.code, "AMBIGUOUS_CRITERION");

        let err = house::Criterion::try_from(Criterion::default())
            .expect_err("empty criterion");
        assert_eq!(err.code, "AMBIGUOUS_CRITERION");
    }

    #[test]
    fn rejects_inverted_ranges() {
        let err = house::Criterion::try_from(Criterion {
            apartments: Some(IntRange { min: 10, max: 5 }),
            ..Criterion::default()
        })
        .expect_err("inverted range");
        assert_eq!(err.code, "INVALID_RANGE");

        let err = house::Criterion::try_from(Criterion {
            total_area: Some(DecimalRange {
                min: Decimal::from(-1).into(),
                max: Decimal::from(5).into(),
            }),
            ..Criterion::default()
        })
        .expect_err("negative range");
        assert_eq!(err.code, "INVALID_RANGE");
    }

    #[test]
    fn rejects_blank_address_criterion() {
        let err = house::Criterion::try_from(Criterion {
            address: Some("   ".into()),
            ..Criterion::default()
        })
        .expect_err("blank address");

        assert_eq!(err.code, "EMPTY_ADDRESS_FRAGMENT");
    }

    #[test]
    fn omitted_filter_bounds_keep_defaults() {
        let filter = list::Filter::from(api_list::Filter {
            min_apartments: Some(10),
            address: Some(" ".into()),
            ..api_list::Filter::default()
        });

        let def = list::Filter::default();
        assert_eq!(filter.apartments, 10..=*def.apartments.end());
        assert_eq!(filter.build_year, def.build_year);
        assert_eq!(filter.total_area, def.total_area);
        assert!(filter.address.is_none());
        assert!(filter.is_active());
    }

    #[test]
    fn selector_defaults_to_ascending_order() {
        let selector = api_list::selector(
            None,
            Some(vec![api_list::SortKey {
                column: api_list::HouseColumn::BuildYear,
                order: None,
            }]),
        );

        assert!(!selector.filter.is_active());
        assert_eq!(
            selector.sorting,
            list::Sorting(vec![(list::Column::BuildYear, list::Order::Asc)]),
        );
    }
}

//! [`Query`] collection related to the multiple [`House`]s.

pub mod duplicates;
pub mod export;
pub mod list;
pub mod similar;

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::{
    domain::{house::address, House},
    read,
};

use super::DatabaseQuery;

pub use self::{
    duplicates::Duplicates, export::Export, list::List, similar::Similar,
};

/// Queries all the registered [`House`]s in their registration order.
pub type All = DatabaseQuery<By<Vec<House>, ()>>;

/// Queries [`House`]s which address contains the provided
/// [`address::Fragment`] ignoring case.
pub type Search = DatabaseQuery<By<Vec<House>, address::Fragment>>;

/// Queries [`House`]s older than the provided number of years.
pub type OlderThan = DatabaseQuery<By<Vec<House>, read::house::OlderThan>>;

/// Queries total count of registered [`House`]s.
pub type TotalCount = DatabaseQuery<By<read::house::TotalCount, ()>>;

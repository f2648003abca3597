//! [`Handler`] abstractions.
//!
//! Every layer of the registry speaks through this single trait: commands and
//! queries are [`Handler`]s of a service, while storage operations (see
//! [`operations`]) are [`Handler`]s of a database.
//!
//! [`operations`]: crate::operations

use std::future::Future;

/// Executable handler of `Args`.
pub trait Handler<Args = ()> {
    /// Type of a successful [`Handler`] result.
    type Ok;

    /// Type of a [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

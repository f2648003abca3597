//! GraphQL API definitions.

pub mod house;
mod mutation;
mod query;
pub mod scalar;
pub mod user;

use crate::define_error;

pub use self::{house::House, mutation::Mutation, query::Query, user::User};

/// GraphQL schema.
pub type Schema = juniper::RootNode<
    'static,
    Query,
    Mutation,
    juniper::EmptySubscription<crate::Context>,
>;

/// Creates a new [`Schema`].
#[must_use]
pub fn schema() -> Schema {
    Schema::new(Query, Mutation, juniper::EmptySubscription::new())
}

define_error! {
    enum InputError {
        #[code = "INVALID_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Range bounds must satisfy `0 <= min <= max`"]
        InvalidRange,

        #[code = "AMBIGUOUS_CRITERION"]
        #[status = BAD_REQUEST]
        #[message = "Exactly one deletion criterion must be specified"]
        AmbiguousCriterion,

        #[code = "EMPTY_ADDRESS_FRAGMENT"]
        #[status = BAD_REQUEST]
        #[message = "Address fragment must not be blank"]
        EmptyAddressFragment,

        #[code = "NEGATIVE_AGE"]
        #[status = BAD_REQUEST]
        #[message = "Number of years must not be negative"]
        NegativeAge,
    }
}

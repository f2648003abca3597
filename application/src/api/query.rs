//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{
    domain::{self, house::similarity::Score},
    export::Layout,
    query, read, Query as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the number of registered `User`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "usersCount",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn users_count(ctx: &Context) -> Result<i32, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::users::TotalCount::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Generates a random strong `UserPassword`.
    ///
    /// The `length` is clamped into `8..=50` range, and defaults to 12.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "generatePassword",
            length = ?length,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn generate_password(length: Option<i32>) -> api::user::Password {
        let len = length.map_or(
            domain::user::Password::DEFAULT_GENERATED_LEN,
            |l| usize::try_from(l).unwrap_or_default(),
        );
        domain::user::Password::generate(len).into()
    }

    /// Returns the `House` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `HOUSE_NOT_EXISTS` - the `House` with the specified ID does not
    ///                        exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "house",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn house(
        id: api::house::Id,
        ctx: &Context,
    ) -> Result<api::House, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::house::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| HouseError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the registered `House`s passing the `filter`, sorted by the
    /// `sorting` keys.
    ///
    /// `House`s are returned in registration order, if no `sorting` is
    /// specified.
    #[tracing::instrument(
        skip_all,
        fields(
            filter = ?filter,
            gql.name = "houses",
            otel.name = Self::SPAN_NAME,
            sorting = ?sorting,
        ),
    )]
    pub async fn houses(
        filter: Option<api::house::list::Filter>,
        sorting: Option<Vec<api::house::list::SortKey>>,
        ctx: &Context,
    ) -> Result<Vec<api::House>, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::houses::List {
                selector: api::house::list::selector(filter, sorting),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|hs| hs.into_iter().map(Into::into).collect())
    }

    /// Searches the `House`s which address contains the provided text,
    /// ignoring case.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `EMPTY_ADDRESS_FRAGMENT` - the provided text is blank.
    #[tracing::instrument(
        skip_all,
        fields(
            address = %address,
            gql.name = "searchHouses",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn search_houses(
        address: String,
        ctx: &Context,
    ) -> Result<Vec<api::House>, Error> {
        _ = ctx.current_session().await?;

        let fragment = domain::house::address::Fragment::new(address)
            .ok_or_else(|| api::InputError::EmptyAddressFragment.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::houses::Search::by(fragment))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|hs| hs.into_iter().map(Into::into).collect())
    }

    /// Returns the `House`s older than the provided number of years.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NEGATIVE_AGE` - the provided number of years is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "housesOlderThan",
            otel.name = Self::SPAN_NAME,
            years = years,
        ),
    )]
    pub async fn houses_older_than(
        years: i32,
        ctx: &Context,
    ) -> Result<Vec<api::House>, Error> {
        _ = ctx.current_session().await?;

        let older_than = read::house::OlderThan::new(years)
            .ok_or_else(|| api::InputError::NegativeAge.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::houses::OlderThan::by(older_than))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|hs| hs.into_iter().map(Into::into).collect())
    }

    /// Returns the number of registered `House`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "housesCount",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn houses_count(ctx: &Context) -> Result<i32, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::houses::TotalCount::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Checks whether the provided `House` duplicates any of the registered
    /// ones, without saving it.
    ///
    /// The `House` with the `id` is never reported as a duplicate of itself.
    /// The configured `threshold` is used, if omitted.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_*` - the provided `House` attributes are invalid;
    /// - `INVALID_THRESHOLD` - the `threshold` is out of `[0, 1]` range.
    #[tracing::instrument(
        skip_all,
        fields(
            address = %house.address,
            gql.name = "houseDuplicates",
            id = ?id,
            otel.name = Self::SPAN_NAME,
            threshold = ?threshold,
        ),
    )]
    pub async fn house_duplicates(
        house: api::house::Input,
        id: Option<api::house::Id>,
        threshold: Option<api::scalar::Decimal>,
        ctx: &Context,
    ) -> Result<api::house::Duplicates, Error> {
        _ = ctx.current_session().await?;

        let threshold = threshold
            .map(|t| {
                Score::new(t.into())
                    .ok_or_else(|| ThresholdError::Invalid.into())
            })
            .transpose()
            .map_err(ctx.error())?;
        let house: domain::house::Draft =
            house.try_into().map_err(ctx.error())?;

        ctx.service()
            .execute(query::houses::Duplicates {
                house,
                id: id.map(Into::into),
                threshold,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the registered `House`s similar to the provided one.
    ///
    /// The `House` with the `id` is never reported as similar to itself.
    /// The `threshold` defaults to 0.8.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_*` - the provided `House` attributes are invalid;
    /// - `INVALID_THRESHOLD` - the `threshold` is out of `[0, 1]` range.
    #[tracing::instrument(
        skip_all,
        fields(
            address = %house.address,
            gql.name = "similarHouses",
            id = ?id,
            otel.name = Self::SPAN_NAME,
            threshold = ?threshold,
        ),
    )]
    pub async fn similar_houses(
        house: api::house::Input,
        id: Option<api::house::Id>,
        threshold: Option<api::scalar::Decimal>,
        ctx: &Context,
    ) -> Result<Vec<api::house::Match>, Error> {
        _ = ctx.current_session().await?;

        let threshold = threshold
            .map(|t| {
                Score::new(t.into())
                    .ok_or_else(|| ThresholdError::Invalid.into())
            })
            .transpose()
            .map_err(ctx.error())?;
        let house: domain::house::Draft =
            house.try_into().map_err(ctx.error())?;

        ctx.service()
            .execute(query::houses::Similar {
                house,
                id: id.map(Into::into),
                threshold,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ms| ms.into_iter().map(Into::into).collect())
    }

    /// Exports the registered `House`s into a delimited text.
    ///
    /// All the `fields` are exported, if omitted. Tab is used as the
    /// default `delimiter`, and the `header` row is included by default.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NO_FIELDS` - the provided `fields` list is empty;
    /// - `NOTHING_TO_EXPORT` - no `House`s pass the `filter`.
    #[tracing::instrument(
        skip_all,
        fields(
            delimiter = ?delimiter,
            fields = ?fields,
            filter = ?filter,
            gql.name = "exportHouses",
            header = ?header,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn export_houses(
        filter: Option<api::house::list::Filter>,
        sorting: Option<Vec<api::house::list::SortKey>>,
        fields: Option<Vec<api::house::export::ExportField>>,
        delimiter: Option<api::house::export::ExportDelimiter>,
        header: Option<bool>,
        ctx: &Context,
    ) -> Result<String, Error> {
        _ = ctx.current_session().await?;

        let def = Layout::default();
        let layout = Layout {
            fields: fields.map_or(def.fields, |fs| {
                fs.into_iter().map(Into::into).collect()
            }),
            delimiter: delimiter.map_or(def.delimiter, Into::into),
            header: header.unwrap_or(def.header),
        };

        ctx.service()
            .execute(query::houses::Export {
                selector: api::house::list::selector(filter, sorting),
                layout,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }
}

impl AsError for query::houses::export::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use service::export::Error as E;

        define_error! {
            enum Error {
                #[code = "NO_FIELDS"]
                #[status = BAD_REQUEST]
                #[message = "At least one field must be exported"]
                NoFields,

                #[code = "NOTHING_TO_EXPORT"]
                #[status = NOT_FOUND]
                #[message = "There are no `House`s to export"]
                NothingToExport,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Export(E::NoFields) => Some(Error::NoFields.into()),
            Self::Export(E::NothingToExport) => {
                Some(Error::NothingToExport.into())
            }
            Self::Export(E::Csv(_) | E::Flush(_) | E::Utf8(_)) => None,
        }
    }
}

define_error! {
    enum HouseError {
        #[code = "HOUSE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`House` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ThresholdError {
        #[code = "INVALID_THRESHOLD"]
        #[status = BAD_REQUEST]
        #[message = "Similarity threshold must be within `[0, 1]` range"]
        Invalid,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}

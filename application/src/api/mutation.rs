//! GraphQL [`Mutation`]s definitions.

use juniper::graphql_object;
use service::{
    command,
    domain::{self, house::similarity::Match},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new `User` with the provided credentials and starts a new
    /// `UserSession` for it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`;
    /// - `LOGIN_TOO_SHORT` - provided `UserLogin` is shorter than 3
    ///                       characters;
    /// - `WEAK_PASSWORD` - provided `UserPassword` is not strong enough.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUser",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        });

        Ok(output.into())
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        });

        Ok(output.into())
    }

    /// Updates the `User`'s password to the provided one.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WEAK_PASSWORD` - provided `new_password` is not strong enough;
    /// - `WRONG_PASSWORD` - provided `old_password` does not match the current
    ///                      `User` password.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateUserPassword",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_user_password(
        old_password: api::user::Password,
        new_password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::UpdateUserPassword {
                user_id: my_id.into(),
                new_password: secrecy::SecretBox::init_with(move || {
                    new_password.into()
                }),
                old_password: secrecy::SecretBox::init_with(move || {
                    old_password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Registers a new `House`.
    ///
    /// Unless `allowSimilar` is set, the `House` is not registered while
    /// similar ones exist.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_*` - the provided `House` attributes are invalid;
    /// - `ADDRESS_OCCUPIED` - a `House` with the same normalized address is
    ///                        registered already;
    /// - `SIMILAR_HOUSES_EXIST` - similar `House`s are registered already.
    #[tracing::instrument(
        skip_all,
        fields(
            address = %house.address,
            allow_similar = ?allow_similar,
            gql.name = "createHouse",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_house(
        house: api::house::Input,
        allow_similar: Option<bool>,
        ctx: &Context,
    ) -> Result<api::House, Error> {
        _ = ctx.current_session().await?;

        let house: domain::house::Draft =
            house.try_into().map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateHouse {
                house,
                allow_similar: allow_similar.unwrap_or_default(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Replaces all the attributes of the registered `House`.
    ///
    /// Unless `allowSimilar` is set, the `House` is not updated while other
    /// similar ones exist.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_*` - the provided `House` attributes are invalid;
    /// - `HOUSE_NOT_EXISTS` - the `House` with the specified ID does not
    ///                        exist;
    /// - `ADDRESS_OCCUPIED` - another `House` with the same normalized
    ///                        address is registered already;
    /// - `SIMILAR_HOUSES_EXIST` - other similar `House`s are registered
    ///                            already.
    #[tracing::instrument(
        skip_all,
        fields(
            address = %house.address,
            allow_similar = ?allow_similar,
            gql.name = "updateHouse",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_house(
        id: api::house::Id,
        house: api::house::Input,
        allow_similar: Option<bool>,
        ctx: &Context,
    ) -> Result<api::House, Error> {
        _ = ctx.current_session().await?;

        let house: domain::house::Draft =
            house.try_into().map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateHouse {
                id: id.into(),
                house,
                allow_similar: allow_similar.unwrap_or_default(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the registered `House`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `HOUSE_NOT_EXISTS` - the `House` with the specified ID does not
    ///                        exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteHouse",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_house(
        id: api::house::Id,
        ctx: &Context,
    ) -> Result<bool, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::DeleteHouse { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| true)
    }

    /// Deletes all the `House`s matching the `criterion`, returning their
    /// number.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_CRITERION` - not exactly one criterion field is
    ///                           specified;
    /// - `INVALID_RANGE` - the range minimum is greater than its maximum;
    /// - `EMPTY_ADDRESS_FRAGMENT` - the address text is blank.
    #[tracing::instrument(
        skip_all,
        fields(
            criterion = ?criterion,
            gql.name = "deleteHouses",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_houses(
        criterion: api::house::Criterion,
        ctx: &Context,
    ) -> Result<i32, Error> {
        _ = ctx.current_session().await?;

        let criterion: domain::house::Criterion =
            criterion.try_into().map_err(ctx.error())?;

        let deleted = ctx
            .service()
            .execute(command::DeleteHouses { criterion })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        i32::try_from(deleted)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }
}

define_error! {
    enum HouseError {
        #[code = "ADDRESS_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`House` with the same address is registered already"]
        AddressOccupied,

        #[code = "HOUSE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`House` with the specified ID does not exist"]
        NotExists,

        #[code = "SIMILAR_HOUSES_EXIST"]
        #[status = CONFLICT]
        #[message = "Similar `House`s are registered already, check them \
                     with `houseDuplicates` query"]
        SimilarExist,
    }
}

/// Builds a `SIMILAR_HOUSES_EXIST` [`Error`] referring the similar `House`s.
fn similar_exist(similar: &[Match<domain::House>]) -> Error {
    Error::from(HouseError::SimilarExist)
        .with_related_ids(similar.iter().map(|m| m.house.id))
}

define_error! {
    enum PasswordError {
        #[code = "WEAK_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "`UserPassword` must contain an upper-case letter, \
                     a lower-case letter, a digit and a special character"]
        Weak,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another \
                             `User`"]
                LoginOccupied,

                #[code = "LOGIN_TOO_SHORT"]
                #[status = BAD_REQUEST]
                #[message = "`UserLogin` must be at least 3 characters long"]
                LoginTooShort,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::LoginOccupied(_) => Error::LoginOccupied.into(),
            Self::LoginTooShort => Error::LoginTooShort.into(),
            Self::WeakPassword => PasswordError::Weak.into(),
        })
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::update_user_password::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_PASSWORD"]
                #[status = CONFLICT]
                #[message = "Provided `old_password` does not match the \
                             current `User` password"]
                WrongPassword,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => None,
            Self::WeakPassword => Some(PasswordError::Weak.into()),
            Self::WrongPassword => Some(Error::WrongPassword.into()),
        }
    }
}

impl AsError for command::create_house::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::AddressOccupied(_) => HouseError::AddressOccupied.into(),
            Self::SimilarExist(similar) => similar_exist(similar),
        })
    }
}

impl AsError for command::update_house::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::HouseNotExists(_) => HouseError::NotExists.into(),
            Self::AddressOccupied(_) => HouseError::AddressOccupied.into(),
            Self::SimilarExist(similar) => similar_exist(similar),
        })
    }
}

impl AsError for command::delete_house::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::HouseNotExists(_) => Some(HouseError::NotExists.into()),
        }
    }
}

impl AsError for command::delete_houses::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

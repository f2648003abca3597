//! [`Error`]-related definitions.

use std::{fmt, num::TryFromIntError};

use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use itertools::Itertools as _;
use juniper::IntoFieldError;
use service::infra::database;
use tracerr::{Trace, Traced};

/// Defines a new error type convertible into an API [`Error`].
///
/// Every variant is given its [`Code`], [`http::StatusCode`] and a message,
/// which also becomes the variant documentation.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self::new(
                            $code,
                            ::http::StatusCode::$status_code,
                            $message,
                        ),
                    )*
                }
            }
        }
    };
}

/// GraphQL API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,

    /// IDs of the registered entities this [`Error`] is caused by.
    ///
    /// For example, IDs of the similar houses preventing a new one from
    /// being registered.
    pub related_ids: Vec<i32>,
}

impl Error {
    /// Creates a new [`Error`] out of the provided parts.
    #[must_use]
    pub fn new(
        code: Code,
        status_code: http::StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            status_code,
            backtrace: None,
            message: message.into(),
            related_ids: vec![],
        }
    }

    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self::new(
            "INTERNAL_SERVER_ERROR",
            http::StatusCode::INTERNAL_SERVER_ERROR,
            msg.to_string(),
        )
    }

    /// Attaches the provided IDs of the entities this [`Error`] is caused by.
    #[must_use]
    pub fn with_related_ids(
        mut self,
        ids: impl IntoIterator<Item = impl Into<i32>>,
    ) -> Self {
        self.related_ids.extend(ids.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
            related_ids,
        } = self;

        write!(f, "[{code}]: {message}")?;
        if !related_ids.is_empty() {
            write!(f, " (related: {})", related_ids.iter().join(", "))?;
        }
        write!(
            f,
            "{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl<S> IntoFieldError<S> for Error
where
    S: From<String> + From<i32>,
{
    fn into_field_error(self) -> juniper::FieldError<S> {
        let mut ext = juniper::Object::with_capacity(3);
        drop(
            ext.add_field("code", juniper::Value::scalar(self.code.to_owned())),
        );
        if !self.related_ids.is_empty() {
            drop(
                ext.add_field(
                    "relatedIds",
                    juniper::Value::list(
                        self.related_ids
                            .iter()
                            .copied()
                            .map(juniper::Value::scalar)
                            .collect(),
                    ),
                ),
            );
        }
        drop(
            ext.add_field(
                "backtrace",
                juniper::Value::list(
                    self.backtrace
                        .iter()
                        .flat_map(|trace| trace.iter())
                        .map(|frame| juniper::Value::scalar(frame.to_string()))
                        .collect(),
                ),
            ),
        );
        juniper::FieldError::new(self.message, juniper::Value::object(ext))
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new(
            "BAD_REQUEST",
            http::StatusCode::BAD_REQUEST,
            self.to_string(),
        ))
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for TryFromIntError {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, FieldError, IntoFieldError as _, Value};

    use super::{AsError as _, Error};

    crate::define_error! {
        enum TestError {
            #[code = "HOUSE_NOT_EXISTS"]
            #[status = NOT_FOUND]
            #[message = "`House` does not exist"]
            NotExists,
        }
    }

    #[test]
    fn defined_error_carries_code_and_status() {
        let err = Error::from(TestError::NotExists);

        assert_eq!(err.code, "HOUSE_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
        assert_eq!(err.message, "`House` does not exist");
        assert!(err.related_ids.is_empty());
        assert_eq!(
            err.to_string(),
            "[HOUSE_NOT_EXISTS]: `House` does not exist",
        );
    }

    #[test]
    fn displays_related_ids() {
        let err = Error::from(TestError::NotExists).with_related_ids([3, 7]);

        assert_eq!(
            err.to_string(),
            "[HOUSE_NOT_EXISTS]: `House` does not exist (related: 3, 7)",
        );
    }

    #[test]
    fn exposes_extensions() {
        let err = Error::from(TestError::NotExists).with_related_ids([5]);

        let field_err: FieldError<DefaultScalarValue> = err.into_field_error();

        let ext = field_err.extensions();
        let obj = ext.as_object_value().unwrap();
        assert_eq!(
            obj.get_field_value("code"),
            Some(&Value::scalar("HOUSE_NOT_EXISTS".to_owned())),
        );
        assert_eq!(
            obj.get_field_value("relatedIds"),
            Some(&Value::list(vec![Value::scalar(5)])),
        );
    }

    #[test]
    fn unknown_errors_become_internal() {
        let err = i32::try_from(u64::MAX).unwrap_err().into_error();

        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(
            err.status_code,
            http::StatusCode::INTERNAL_SERVER_ERROR,
        );
    }
}

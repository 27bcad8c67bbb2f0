//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde_json::{Map, Value};
use service::infra::{database, payment};
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error type.
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
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                            extensions: ::serde_json::Map::new(),
                        },
                    )*
                }
            }
        }
    };
}

/// REST API [`Error`].
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

    /// Additional fields of the response body.
    pub extensions: Map<String, Value>,
}

impl Error {
    /// [`Code`] of an internal server [`Error`].
    pub const INTERNAL: Code = "INTERNAL_SERVER_ERROR";

    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: Self::INTERNAL,
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
            extensions: Map::new(),
        }
    }

    /// Adds the provided field to the response body of this [`Error`].
    #[must_use]
    pub fn with_extension(
        mut self,
        key: &'static str,
        value: impl Into<Value>,
    ) -> Self {
        _ = self.extensions.insert(key.to_owned(), value.into());
        self
    }

    /// Returns the JSON response body of this [`Error`].
    ///
    /// Details of internal errors are never exposed.
    #[must_use]
    pub fn body(&self) -> Value {
        let message = if self.code == Self::INTERNAL {
            "Une erreur interne est survenue"
        } else {
            self.message.as_str()
        };

        let mut body = Map::with_capacity(3 + self.extensions.len());
        _ = body.insert("success".to_owned(), false.into());
        _ = body.insert("error".to_owned(), message.into());
        _ = body.insert("code".to_owned(), self.code.into());
        body.extend(self.extensions.clone());
        Value::Object(body)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
            extensions: _,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            log::error!("{self}");
        }
        (self.status_code, Json(self.body())).into_response()
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

/// Creates a new [`RequestError::Malformed`] [`Error`] with the provided
/// rejection `details`.
fn malformed(details: String) -> Error {
    let mut err = Error::from(RequestError::Malformed);
    err.message = format!("{}: {details}", err.message);
    err
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(malformed(self.to_string()))
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for payment::Error {
    fn try_as_error(&self) -> Option<Error> {
        Some(UpstreamError::Payment.into())
    }
}

define_error! {
    enum RequestError {
        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Requête invalide"]
        Malformed,
    }
}

define_error! {
    enum UpstreamError {
        #[code = "PAYMENT_PROVIDER_ERROR"]
        #[status = BAD_GATEWAY]
        #[message = "Le service de paiement est indisponible"]
        Payment,
    }
}

#[cfg(test)]
mod spec {
    use serde_json::json;

    use super::{Error, RequestError};

    #[test]
    fn renders_body_with_extensions() {
        let err = Error::from(RequestError::Malformed)
            .with_extension("leadId", "42");

        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body(),
            json!({
                "success": false,
                "error": "Requête invalide",
                "code": "VALIDATION_ERROR",
                "leadId": "42",
            }),
        );
    }

    #[test]
    fn hides_internal_details() {
        let err = Error::internal(&"connection refused");

        assert_eq!(err.body()["error"], "Une erreur interne est survenue");
        assert_eq!(err.body()["code"], Error::INTERNAL);
        assert!(err.to_string().contains("connection refused"));
    }
}

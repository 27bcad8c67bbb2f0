//! [`Context`]-related definitions.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
};
use axum_extra::headers::{
    authorization::Bearer, Authorization, HeaderMapExt as _,
};
use secrecy::SecretString;
use serde::Deserialize;
use service::command::{self, Command as _};

use crate::{define_error, AsError, Error, Service};

/// Context of a single API request.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Parts of the HTTP request.
    parts: http::request::Parts,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Ensures the current HTTP request carries the configured admin key.
    ///
    /// # Errors
    ///
    /// With [`AuthError::Unauthorized`] if the key is missing or mismatches.
    pub async fn authorize_admin(&self) -> Result<(), Error> {
        let key = admin_key(&self.parts).ok_or(AuthError::Unauthorized)?;
        self.service
            .execute(command::AuthorizeAdmin { key })
            .await
            .map_err(AsError::into_error)
    }
}

/// Query parameters possibly carrying an admin key.
#[derive(Debug, Deserialize)]
struct AdminKeyQuery {
    /// Admin key itself.
    key: Option<String>,
}

/// Extracts the admin key from the `key` query parameter, or from the
/// `Authorization: Bearer` header otherwise.
fn admin_key(parts: &http::request::Parts) -> Option<SecretString> {
    Query::<AdminKeyQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.key)
        .filter(|k| !k.is_empty())
        .map(SecretString::from)
        .or_else(|| {
            parts
                .headers
                .typed_get::<Authorization<Bearer>>()
                .map(|Authorization(bearer)| {
                    SecretString::from(bearer.token())
                })
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        Ok(Self {
            service,
            parts: parts.clone(),
        })
    }
}

impl AsError for command::authorize_admin::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Unauthorized => Some(AuthError::Unauthorized.into()),
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "UNAUTHORIZED"]
        #[status = UNAUTHORIZED]
        #[message = "Clé d'administration invalide"]
        Unauthorized,
    }
}

#[cfg(test)]
mod spec {
    use secrecy::ExposeSecret as _;

    use super::admin_key;

    fn parts(req: http::request::Builder) -> http::request::Parts {
        req.body(()).unwrap().into_parts().0
    }

    #[test]
    fn reads_key_from_query() {
        let parts = parts(http::Request::get("/premium/expire-sweep?key=abc"));

        assert_eq!(admin_key(&parts).unwrap().expose_secret(), "abc");
    }

    #[test]
    fn reads_key_from_bearer() {
        let parts = parts(
            http::Request::post("/premium/expire-sweep")
                .header(http::header::AUTHORIZATION, "Bearer xyz"),
        );

        assert_eq!(admin_key(&parts).unwrap().expose_secret(), "xyz");
    }

    #[test]
    fn prefers_query_over_bearer() {
        let parts = parts(
            http::Request::post("/premium/expire-sweep?key=abc")
                .header(http::header::AUTHORIZATION, "Bearer xyz"),
        );

        assert_eq!(admin_key(&parts).unwrap().expose_secret(), "abc");
    }

    #[test]
    fn misses_key() {
        let parts = parts(http::Request::get("/premium/expire-sweep?key="));

        assert!(admin_key(&parts).is_none());
    }
}

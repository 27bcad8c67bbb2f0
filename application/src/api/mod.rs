//! REST API definitions.

pub mod analytics;
pub mod lead;
pub mod marketplace;
pub mod payment;
pub mod premium;
pub mod professional;
pub mod tracking;

use axum::{
    routing::{get, post},
    Router,
};
use common::{Currency, Money};
use rust_decimal::Decimal;
use serde::Serialize;
use service::domain;

use crate::{define_error, Error};

pub use self::{lead::Lead, professional::Profile};

/// Creates a new [`Router`] serving all the REST API endpoints.
///
/// Handlers expect the [`Service`] to be provided as an [`Extension`].
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route(
            "/marketplace/purchase",
            get(marketplace::can_purchase).post(marketplace::purchase),
        )
        .route("/marketplace/leads", get(marketplace::leads))
        .route("/payment/marketplace/create", post(payment::create))
        .route("/payment/marketplace/confirm", post(payment::confirm))
        .route(
            "/premium/expire-sweep",
            get(premium::expire_sweep).post(premium::expire_sweep),
        )
        .route("/premium/activate", post(premium::activate))
        .route("/premium/deactivate", post(premium::deactivate))
        .route("/tracking/:professional_id", post(tracking::track))
        .route("/analytics/:professional_id", get(analytics::report))
        .route("/leads", post(lead::create))
        .route("/leads/:lead_id", get(lead::get))
        .route("/leads/:lead_id/publish", post(lead::publish))
        .route("/professionals", post(professional::create))
        .route("/professionals/:professional_id", get(professional::get))
}

/// Amount of money in a response body.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Amount {
    /// Numeric amount, like `39.9`.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// [`Currency`] of the amount.
    pub currency: Currency,
}

impl From<Money> for Amount {
    fn from(Money { amount, currency }: Money) -> Self {
        Self { amount, currency }
    }
}

/// Builds [`Money`] out of a numeric request `amount` in the provided
/// [`Currency`].
fn money(amount: Decimal, currency: Currency) -> Money {
    Money {
        amount: amount.round_dp(2),
        currency,
    }
}

/// Parses the `value` of the request `field` with the provided `parse`
/// function, failing with [`InputError::Invalid`] naming the `field`.
fn parse<V, T>(
    field: &'static str,
    value: V,
    parse: impl FnOnce(V) -> Option<T>,
) -> Result<T, Error> {
    parse(value).ok_or_else(|| invalid(field))
}

/// Parses the optional `value` of the request `field`, treating blank
/// strings as absent.
fn parse_opt<T>(
    field: &'static str,
    value: Option<String>,
    parse: impl FnOnce(String) -> Option<T>,
) -> Result<Option<T>, Error> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| self::parse(field, v, parse))
        .transpose()
}

/// Creates a new [`InputError::Invalid`] [`Error`] naming the `field`.
fn invalid(field: &'static str) -> Error {
    Error::from(InputError::Invalid).with_extension("field", field)
}

define_error! {
    enum InputError {
        #[code = "VALIDATION_ERROR"]
        #[status = BAD_REQUEST]
        #[message = "Champ invalide ou manquant"]
        Invalid,
    }
}

define_error! {
    enum LeadError {
        #[code = "LEAD_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Lead introuvable"]
        NotExists,

        #[code = "LEAD_NOT_AVAILABLE"]
        #[status = BAD_REQUEST]
        #[message = "Ce lead n'est pas disponible à l'achat"]
        NotAvailable,

        #[code = "ALREADY_PURCHASED"]
        #[status = CONFLICT]
        #[message = "Vous avez déjà acheté ce lead"]
        AlreadyPurchased,

        #[code = "LIMIT_REACHED"]
        #[status = GONE]
        #[message = "Ce lead a atteint son nombre maximum de ventes"]
        LimitReached,

        #[code = "CONTENTION"]
        #[status = CONFLICT]
        #[message = "Ce lead est en cours de modification, réessayez"]
        Contention,

        #[code = "INVALID_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "Le prix doit être positif"]
        InvalidPrice,
    }
}

impl From<domain::lead::Ineligibility> for LeadError {
    fn from(reason: domain::lead::Ineligibility) -> Self {
        use domain::lead::Ineligibility as I;

        match reason {
            I::NotPublished => Self::NotAvailable,
            I::AlreadyPurchased => Self::AlreadyPurchased,
            I::SoldOut => Self::LimitReached,
        }
    }
}

define_error! {
    enum ProfessionalError {
        #[code = "PROFESSIONAL_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Professionnel introuvable"]
        NotExists,
    }
}

#[cfg(test)]
mod spec {
    use common::Currency;
    use rust_decimal::Decimal;
    use service::domain::contact;

    use super::{money, parse, parse_opt};

    #[test]
    fn names_invalid_field() {
        let err = parse("email", "nope".to_owned(), contact::Email::new)
            .unwrap_err();

        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.body()["code"], "VALIDATION_ERROR");
        assert_eq!(err.body()["field"], "email");
    }

    #[test]
    fn skips_blank_optional_field() {
        let phone = parse_opt("phone", Some("  ".to_owned()), |p| {
            contact::Phone::new(p)
        })
        .unwrap();

        assert!(phone.is_none());
    }

    #[test]
    fn rounds_money_to_cents() {
        let m = money(Decimal::new(39_999, 3), Currency::Eur);

        assert_eq!(m.amount, Decimal::new(4000, 2));
    }
}

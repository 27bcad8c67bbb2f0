//! [`Lead`]-related definitions.

use axum::{
    extract::{Json, Path},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, contact, lead},
    query, Command as _, Query as _,
};

use crate::{
    api::{self, Amount, LeadError},
    AsError, Context, Error,
};

/// [`domain::Lead`] as seen by professionals browsing the marketplace.
///
/// Never exposes the [`domain::lead::Homeowner`] contact.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// ID of this [`Lead`].
    pub id: lead::Id,

    /// Type of the project, like `renovation`.
    pub project_type: String,

    /// Description of the project.
    pub description: String,

    /// Budget of the project, if specified by the homeowner.
    pub budget: Option<Amount>,

    /// City of the project.
    pub city: String,

    /// Postal code of the project.
    pub postal_code: String,

    /// Indicator whether this [`Lead`] is published on the marketplace.
    pub is_published: bool,

    /// Marketplace status of this [`Lead`], like `ACTIVE`.
    pub status: String,

    /// Maximum number of sales of this [`Lead`].
    pub max_sales: u8,

    /// Number of sales of this [`Lead`] so far.
    pub current_sales: usize,

    /// Price of this [`Lead`].
    pub price: Amount,

    /// RFC 3339 date and time when this [`Lead`] was submitted.
    pub created_at: String,
}

impl From<domain::Lead> for Lead {
    fn from(lead: domain::Lead) -> Self {
        let current_sales = lead.sales_count();
        let domain::Lead {
            id,
            project,
            is_published,
            status,
            max_sales,
            price,
            created_at,
            ..
        } = lead;

        Self {
            id,
            project_type: project.kind.to_string(),
            description: project.description.to_string(),
            budget: project.budget.map(Into::into),
            city: project.city.to_string(),
            postal_code: project.postal_code.to_string(),
            is_published,
            status: status.to_string(),
            max_sales: max_sales.into(),
            current_sales,
            price: price.into(),
            created_at: created_at.to_rfc3339(),
        }
    }
}

/// Request body of [`create()`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Type of the project.
    pub project_type: String,

    /// Description of the project.
    pub description: String,

    /// Budget of the project, in the currency of the marketplace.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub budget: Option<Decimal>,

    /// City of the project.
    pub city: String,

    /// Postal code of the project.
    pub postal_code: String,

    /// Name of the homeowner.
    pub name: String,

    /// Email of the homeowner.
    pub email: String,

    /// Phone of the homeowner.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Submits a new [`Lead`] on behalf of a homeowner.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - some field is invalid or missing.
#[tracing::instrument(
    skip_all,
    fields(
        city = %req.city,
        project_type = %req.project_type,
        rest.name = "createLead",
    ),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<Json<CreateRequest>, Error>,
) -> Result<(StatusCode, Json<Lead>), Error> {
    let CreateRequest {
        project_type,
        description,
        budget,
        city,
        postal_code,
        name,
        email,
        phone,
    } = req;

    let currency = ctx.service().config().lead_price.currency;
    let budget = budget
        .map(|b| {
            let budget = api::money(b, currency);
            budget
                .is_positive()
                .then_some(budget)
                .ok_or_else(|| api::invalid("budget"))
        })
        .transpose()?;

    let project = lead::Project {
        kind: api::parse("projectType", project_type, lead::ProjectType::new)?,
        description: api::parse(
            "description",
            description,
            lead::Description::new,
        )?,
        budget,
        city: api::parse("city", city, contact::City::new)?,
        postal_code: api::parse(
            "postalCode",
            postal_code,
            contact::PostalCode::new,
        )?,
    };
    let homeowner = lead::Homeowner {
        name: api::parse("name", name, contact::Name::new)?,
        email: api::parse("email", email, contact::Email::new)?,
        phone: api::parse_opt("phone", phone, contact::Phone::new)?,
    };

    let lead = ctx
        .service()
        .execute(command::CreateLead { project, homeowner })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(lead.into())))
}

/// Returns the [`Lead`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `LEAD_NOT_FOUND` - [`Lead`] with the provided ID doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(lead.id = %id, rest.name = "getLead"),
)]
pub async fn get(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<lead::Id>, Error>,
) -> Result<Json<Lead>, Error> {
    ctx.service()
        .execute(query::lead::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| LeadError::NotExists.into())
        .map(|l| Json(l.into()))
}

/// Request body of [`publish()`].
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishRequest {
    /// Maximum number of sales, or the configured default.
    pub max_sales: Option<u8>,

    /// Price of a single sale, or the configured default.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
}

/// Publishes the [`Lead`] with the provided ID on the marketplace.
///
/// Requires the admin key.
///
/// # Errors
///
/// Possible error codes:
/// - `UNAUTHORIZED` - admin key is missing or invalid;
/// - `VALIDATION_ERROR` - `maxSales` is out of range or lower than the
///   number of the already recorded sales;
/// - `INVALID_PRICE` - `price` is not positive;
/// - `LEAD_NOT_FOUND` - [`Lead`] with the provided ID doesn't exist;
/// - `CONTENTION` - [`Lead`] was concurrently modified.
#[tracing::instrument(
    skip_all,
    fields(lead.id = %id, rest.name = "publishLead"),
)]
pub async fn publish(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<Path<lead::Id>, Error>,
    WithRejection(Json(req), _): WithRejection<Json<PublishRequest>, Error>,
) -> Result<Json<Lead>, Error> {
    ctx.authorize_admin().await?;

    let PublishRequest { max_sales, price } = req;
    let max_sales = max_sales
        .map(|m| api::parse("maxSales", m, lead::MaxSales::new))
        .transpose()?;
    let currency = ctx.service().config().lead_price.currency;

    ctx.service()
        .execute(command::PublishLead {
            lead_id: id,
            max_sales,
            price: price.map(|p| api::money(p, currency)),
        })
        .await
        .map_err(AsError::into_error)
        .map(|l| Json(l.into()))
}

impl AsError for command::create_lead::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::publish_lead::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeadNotExists(_) => Some(LeadError::NotExists.into()),
            Self::InvalidPrice(_) => Some(LeadError::InvalidPrice.into()),
            Self::Contention(_) => Some(LeadError::Contention.into()),
            Self::MaxSalesBelowSales { .. } => Some(api::invalid("maxSales")),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, DateTime, Money};
    use service::{
        command::publish_lead::ExecutionError,
        domain::{self, contact, lead, professional},
    };

    use crate::AsError as _;

    use super::Lead;

    fn lead() -> domain::Lead {
        domain::Lead {
            id: lead::Id::new(),
            project: lead::Project {
                kind: lead::ProjectType::new("renovation").unwrap(),
                description: lead::Description::new("Cuisine").unwrap(),
                budget: None,
                city: contact::City::new("Nantes").unwrap(),
                postal_code: contact::PostalCode::new("44000").unwrap(),
            },
            homeowner: lead::Homeowner {
                name: contact::Name::new("Jeanne Martin").unwrap(),
                email: contact::Email::new("jeanne@example.fr").unwrap(),
                phone: contact::Phone::new("0612345678"),
            },
            is_published: true,
            status: lead::Status::Active,
            max_sales: lead::MaxSales::new(2).unwrap(),
            price: Money::from_minor_units(3950, Currency::Eur),
            purchases: vec![lead::Purchase {
                buyer_id: professional::Id::new(),
                buyer_name: contact::Name::new("Dupont").unwrap(),
                price: Money::from_minor_units(3950, Currency::Eur),
                payment_ref: lead::PaymentRef::new("pi_1").unwrap(),
                purchased_at: DateTime::now().coerce(),
            }],
            created_at: DateTime::now().coerce(),
            version: lead::Version::default(),
        }
    }

    #[test]
    fn hides_homeowner_contact() {
        let json = serde_json::to_value(Lead::from(lead())).unwrap();

        assert_eq!(json["projectType"], "renovation");
        assert_eq!(json["currentSales"], 1);
        assert_eq!(json["maxSales"], 2);
        assert_eq!(json["status"], "ACTIVE");
        assert_eq!(json["price"]["amount"], 39.5);
        assert_eq!(json["price"]["currency"], "EUR");
        assert!(json["budget"].is_null());

        let text = json.to_string();
        assert!(!text.contains("jeanne@example.fr"));
        assert!(!text.contains("0612345678"));
    }

    #[test]
    fn refuses_max_sales_below_sales() {
        let err = ExecutionError::MaxSalesBelowSales {
            lead_id: lead::Id::new(),
            sales: 2,
        }
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.body()["field"], "maxSales");
    }
}

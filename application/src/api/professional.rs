//! [`Profile`]-related definitions.

use axum::{
    extract::{Json, Path},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{contact, professional, Professional},
    query, Command as _, Query as _,
};

use crate::{
    api::{self, ProfessionalError},
    AsError, Context, Error,
};

/// Public profile of a [`Professional`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// ID of the [`Professional`].
    pub id: professional::Id,

    /// Company name of the [`Professional`].
    pub company_name: String,

    /// Email of the [`Professional`].
    pub email: String,

    /// Phone of the [`Professional`].
    pub phone: Option<String>,

    /// City the [`Professional`] works in.
    pub city: String,

    /// Indicator whether the [`Professional`] has a premium currently.
    pub is_premium: bool,

    /// Current premium of the [`Professional`].
    pub premium: Option<Premium>,

    /// Status of the premium subscription, like `ACTIVE`.
    pub subscription_status: String,

    /// RFC 3339 date and time when the [`Professional`] was registered.
    pub created_at: String,
}

/// Premium in a [`Profile`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Premium {
    /// Plan of this [`Premium`], like `MONTHLY`.
    #[serde(rename = "type")]
    pub plan: String,

    /// RFC 3339 date and time this [`Premium`] starts at.
    pub starts_at: String,

    /// RFC 3339 date and time this [`Premium`] ends at, if it ever does.
    pub ends_at: Option<String>,

    /// Indicator whether the premium badge is shown.
    pub show_badge: bool,

    /// URL of the banner media.
    pub banner_url: Option<String>,
}

impl From<professional::Premium> for Premium {
    fn from(premium: professional::Premium) -> Self {
        let professional::Premium {
            plan,
            starts_at,
            ends_at,
            show_badge,
            banner_url,
        } = premium;

        Self {
            plan: plan.to_string(),
            starts_at: starts_at.to_rfc3339(),
            ends_at: ends_at.map(|at| at.to_rfc3339()),
            show_badge,
            banner_url: banner_url.map(|u| u.to_string()),
        }
    }
}

impl From<Professional> for Profile {
    fn from(professional: Professional) -> Self {
        let Professional {
            id,
            company_name,
            email,
            phone,
            city,
            premium,
            subscription,
            created_at,
        } = professional;

        Self {
            id,
            company_name: company_name.to_string(),
            email: email.to_string(),
            phone: phone.map(|p| p.to_string()),
            city: city.to_string(),
            is_premium: premium.is_some(),
            premium: premium.map(Into::into),
            subscription_status: subscription.to_string(),
            created_at: created_at.to_rfc3339(),
        }
    }
}

/// Request body of [`create()`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Company name of the professional.
    pub company_name: String,

    /// Email of the professional.
    pub email: String,

    /// Phone of the professional.
    #[serde(default)]
    pub phone: Option<String>,

    /// City the professional works in.
    pub city: String,
}

/// Registers a new [`Professional`].
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - some field is invalid or missing.
#[tracing::instrument(
    skip_all,
    fields(city = %req.city, rest.name = "createProfessional"),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<Json<CreateRequest>, Error>,
) -> Result<(StatusCode, Json<Profile>), Error> {
    let CreateRequest {
        company_name,
        email,
        phone,
        city,
    } = req;

    let professional = ctx
        .service()
        .execute(command::CreateProfessional {
            company_name: api::parse(
                "companyName",
                company_name,
                contact::Name::new,
            )?,
            email: api::parse("email", email, contact::Email::new)?,
            phone: api::parse_opt("phone", phone, contact::Phone::new)?,
            city: api::parse("city", city, contact::City::new)?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::CREATED, Json(professional.into())))
}

/// Returns the [`Profile`] of the [`Professional`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `PROFESSIONAL_NOT_FOUND` - [`Professional`] doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(professional.id = %id, rest.name = "getProfessional"),
)]
pub async fn get(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<
        Path<professional::Id>,
        Error,
    >,
) -> Result<Json<Profile>, Error> {
    ctx.service()
        .execute(query::professional::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| ProfessionalError::NotExists.into())
        .map(|p| Json(p.into()))
}

impl AsError for command::create_professional::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

//! Premium subscription definitions.

use axum::extract::Json;
use axum_extra::extract::WithRejection;
use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::professional::{self, premium},
    Command as _,
};

use crate::{
    api::{self, ProfessionalError},
    AsError, Context, Error,
};

/// Response body of [`expire_sweep()`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireSweepResponse {
    /// Always `true`.
    pub success: bool,

    /// Number of expired premiums.
    pub expired_count: usize,

    /// IDs of the professionals whose premium has expired.
    pub expired_ids: Vec<professional::Id>,
}

/// Resets every premium that has ended before now.
///
/// Requires the admin key, either as the `key` query parameter or as an
/// `Authorization: Bearer` header.
///
/// # Errors
///
/// Possible error codes:
/// - `UNAUTHORIZED` - admin key is missing or invalid.
#[tracing::instrument(skip_all, fields(rest.name = "expirePremiums"))]
pub async fn expire_sweep(
    ctx: Context,
) -> Result<Json<ExpireSweepResponse>, Error> {
    ctx.authorize_admin().await?;

    let expired_ids = ctx
        .service()
        .execute(command::ExpirePremiums { at: DateTime::now() })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(ExpireSweepResponse {
        success: true,
        expired_count: expired_ids.len(),
        expired_ids,
    }))
}

/// Premium plan in a request body.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Lasts one calendar month.
    #[serde(alias = "MONTHLY")]
    Monthly,

    /// Lasts one calendar year.
    #[serde(alias = "YEARLY")]
    Yearly,

    /// Never ends.
    #[serde(alias = "LIFETIME")]
    Lifetime,
}

impl From<Plan> for premium::Plan {
    fn from(plan: Plan) -> Self {
        match plan {
            Plan::Monthly => Self::Monthly,
            Plan::Yearly => Self::Yearly,
            Plan::Lifetime => Self::Lifetime,
        }
    }
}

/// Request body of [`activate()`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    /// ID of the professional to activate the premium for.
    pub professional_id: professional::Id,

    /// [`Plan`] of the premium.
    #[serde(rename = "type")]
    pub plan: Plan,

    /// RFC 3339 date and time the premium starts at, or now.
    #[serde(default)]
    pub starts_at: Option<String>,

    /// Indicator whether the premium badge is shown on the profile.
    #[serde(default)]
    pub show_badge: bool,

    /// URL of the profile banner media.
    #[serde(default)]
    pub banner_url: Option<String>,
}

/// Activates a premium for a professional.
///
/// Requires the admin key.
///
/// # Errors
///
/// Possible error codes:
/// - `UNAUTHORIZED` - admin key is missing or invalid;
/// - `VALIDATION_ERROR` - some field is invalid;
/// - `PROFESSIONAL_NOT_FOUND` - professional doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(
        plan = ?req.plan,
        professional.id = %req.professional_id,
        rest.name = "activatePremium",
    ),
)]
pub async fn activate(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<Json<ActivateRequest>, Error>,
) -> Result<Json<api::Profile>, Error> {
    ctx.authorize_admin().await?;

    let ActivateRequest {
        professional_id,
        plan,
        starts_at,
        show_badge,
        banner_url,
    } = req;

    let starts_at = api::parse_opt("startsAt", starts_at, |s| {
        DateTime::from_rfc3339(&s).ok()
    })?
    .unwrap_or_else(DateTime::now);

    ctx.service()
        .execute(command::ActivatePremium {
            professional_id,
            plan: plan.into(),
            starts_at: starts_at.coerce(),
            show_badge,
            banner_url: api::parse_opt(
                "bannerUrl",
                banner_url,
                premium::BannerUrl::new,
            )?,
        })
        .await
        .map_err(AsError::into_error)
        .map(|p| Json(p.into()))
}

/// Request body of [`deactivate()`].
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateRequest {
    /// ID of the professional to deactivate the premium of.
    pub professional_id: professional::Id,
}

/// Deactivates the premium of a professional, if any.
///
/// Requires the admin key.
///
/// # Errors
///
/// Possible error codes:
/// - `UNAUTHORIZED` - admin key is missing or invalid;
/// - `PROFESSIONAL_NOT_FOUND` - professional doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(
        professional.id = %req.professional_id,
        rest.name = "deactivatePremium",
    ),
)]
pub async fn deactivate(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<
        Json<DeactivateRequest>,
        Error,
    >,
) -> Result<Json<api::Profile>, Error> {
    ctx.authorize_admin().await?;

    let DeactivateRequest { professional_id } = req;

    ctx.service()
        .execute(command::DeactivatePremium { professional_id })
        .await
        .map_err(AsError::into_error)
        .map(|p| Json(p.into()))
}

impl AsError for command::expire_premiums::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::activate_premium::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ProfessionalNotExists(_) => {
                Some(ProfessionalError::NotExists.into())
            }
            Self::PeriodOutOfRange(_) => Some(api::invalid("startsAt")),
        }
    }
}

impl AsError for command::deactivate_premium::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ProfessionalNotExists(_) => {
                Some(ProfessionalError::NotExists.into())
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{ActivateRequest, Plan};

    #[test]
    fn accepts_plan_in_any_case() {
        let req = serde_json::from_value::<ActivateRequest>(serde_json::json!({
            "professionalId": "0192f0c5-8f4e-7cc3-a7a5-6b0f5b1a2c3d",
            "type": "MONTHLY",
        }))
        .unwrap();
        assert!(matches!(req.plan, Plan::Monthly));
        assert!(!req.show_badge);
        assert!(req.banner_url.is_none());

        let req = serde_json::from_value::<ActivateRequest>(serde_json::json!({
            "professionalId": "0192f0c5-8f4e-7cc3-a7a5-6b0f5b1a2c3d",
            "type": "lifetime",
            "showBadge": true,
        }))
        .unwrap();
        assert!(matches!(req.plan, Plan::Lifetime));
        assert!(req.show_badge);
    }
}

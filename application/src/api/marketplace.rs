//! Marketplace definitions.

use axum::extract::{Json, Query};
use axum_extra::extract::WithRejection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{contact, lead, professional},
    query,
    read::lead::list,
    Command as _, Query as _,
};

use crate::{
    api::{self, LeadError},
    AsError, Context, Error,
};

/// Request body of [`purchase()`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// ID of the lead being purchased.
    pub lead_id: lead::Id,

    /// ID of the professional purchasing the lead.
    pub buyer_id: professional::Id,

    /// Name of the professional purchasing the lead.
    pub buyer_name: String,

    /// Price paid, in the currency of the marketplace.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Reference of the payment the lead was paid with.
    pub payment_ref: String,
}

/// Response body of [`purchase()`].
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// Always `true`.
    pub success: bool,

    /// Number of sales of the lead after the purchase.
    pub current_sales: usize,

    /// Indicator whether the lead is sold out after the purchase.
    pub is_completed: bool,
}

/// Records a purchase of a lead by a professional.
///
/// Repeating the same purchase with the same `paymentRef` succeeds without
/// recording it twice.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - some field is invalid or missing;
/// - `INVALID_PRICE` - `price` is not positive;
/// - `LEAD_NOT_FOUND` - lead doesn't exist;
/// - `LEAD_NOT_AVAILABLE` - lead is not published;
/// - `ALREADY_PURCHASED` - professional has purchased the lead already;
/// - `LIMIT_REACHED` - lead is sold out;
/// - `CONTENTION` - lead kept being concurrently modified.
#[tracing::instrument(
    skip_all,
    fields(
        buyer.id = %req.buyer_id,
        lead.id = %req.lead_id,
        payment_ref = %req.payment_ref,
        rest.name = "purchaseLead",
    ),
)]
pub async fn purchase(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<Json<PurchaseRequest>, Error>,
) -> Result<Json<PurchaseResponse>, Error> {
    let PurchaseRequest {
        lead_id,
        buyer_id,
        buyer_name,
        price,
        payment_ref,
    } = req;

    let currency = ctx.service().config().lead_price.currency;
    let command::purchase_lead::Output { lead, .. } = ctx
        .service()
        .execute(command::PurchaseLead {
            lead_id,
            buyer_id,
            buyer_name: api::parse(
                "buyerName",
                buyer_name,
                contact::Name::new,
            )?,
            price: api::money(price, currency),
            payment_ref: api::parse(
                "paymentRef",
                payment_ref,
                lead::PaymentRef::new,
            )?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(PurchaseResponse {
        success: true,
        current_sales: lead.sales_count(),
        is_completed: lead.is_completed(),
    }))
}

/// Query parameters of [`can_purchase()`].
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanPurchaseParams {
    /// ID of the lead to check.
    pub lead_id: lead::Id,

    /// ID of the professional willing to purchase the lead.
    pub buyer_id: professional::Id,
}

/// Response body of [`can_purchase()`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanPurchaseResponse {
    /// Indicator whether the lead may be purchased.
    pub can_purchase: bool,

    /// Reason the lead may not be purchased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Error code of the `reason`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// Checks whether a professional may purchase a lead.
///
/// # Errors
///
/// Possible error codes:
/// - `LEAD_NOT_FOUND` - lead doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(
        buyer.id = %params.buyer_id,
        lead.id = %params.lead_id,
        rest.name = "canPurchaseLead",
    ),
)]
pub async fn can_purchase(
    ctx: Context,
    WithRejection(Query(params), _): WithRejection<
        Query<CanPurchaseParams>,
        Error,
    >,
) -> Result<Json<CanPurchaseResponse>, Error> {
    let CanPurchaseParams { lead_id, buyer_id } = params;

    let ineligibility = ctx
        .service()
        .execute(query::CanPurchaseLead { lead_id, buyer_id })
        .await
        .map_err(AsError::into_error)?;

    let resp = match ineligibility {
        None => CanPurchaseResponse {
            can_purchase: true,
            reason: None,
            code: None,
        },
        Some(i) => {
            let Error { code, message, .. } = LeadError::from(i).into();
            CanPurchaseResponse {
                can_purchase: false,
                reason: Some(message),
                code: Some(code),
            }
        }
    };
    Ok(Json(resp))
}

/// Query parameters of [`leads()`].
#[derive(Clone, Debug, Deserialize)]
pub struct LeadsParams {
    /// Number of leads to return.
    pub first: Option<usize>,

    /// ID of the lead to return the ones published before.
    pub after: Option<lead::Id>,

    /// City to return leads in.
    pub city: Option<String>,
}

/// Response body of [`leads()`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadsResponse {
    /// Leads on the page, newest first.
    pub leads: Vec<api::Lead>,

    /// Indicator whether there are more leads after this page.
    pub has_more: bool,

    /// Cursor to request the next page with as `after`.
    pub end_cursor: Option<lead::Id>,
}

/// Returns a page of the leads available for purchase.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - `first` or `city` is invalid.
#[tracing::instrument(
    skip_all,
    fields(
        after = ?params.after,
        city = ?params.city,
        first = ?params.first,
        rest.name = "listLeads",
    ),
)]
pub async fn leads(
    ctx: Context,
    WithRejection(Query(params), _): WithRejection<Query<LeadsParams>, Error>,
) -> Result<Json<LeadsResponse>, Error> {
    let LeadsParams { first, after, city } = params;

    let selector = list::Selector {
        arguments: list::Arguments::new(
            first,
            after,
            list::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::invalid("first"))?,
        filter: list::Filter {
            city: api::parse_opt("city", city, contact::City::new)?,
        },
    };

    let page = ctx
        .service()
        .execute(query::leads::List::by(selector))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(LeadsResponse {
        end_cursor: page.end_cursor().copied(),
        has_more: page.has_more,
        leads: page.edges.into_iter().map(|e| e.node.into()).collect(),
    }))
}

impl AsError for command::purchase_lead::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeadNotExists(_) => Some(LeadError::NotExists.into()),
            Self::Ineligible(i) => Some(LeadError::from(*i).into()),
            Self::InvalidPrice(_) => Some(LeadError::InvalidPrice.into()),
            Self::Contention(_) => Some(LeadError::Contention.into()),
        }
    }
}

impl AsError for query::can_purchase_lead::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeadNotExists(_) => Some(LeadError::NotExists.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{command::purchase_lead::ExecutionError, domain::lead};

    use crate::AsError as _;

    #[test]
    fn maps_purchase_errors_to_statuses() {
        let cases = [
            (
                ExecutionError::Ineligible(lead::Ineligibility::SoldOut),
                http::StatusCode::GONE,
                "LIMIT_REACHED",
            ),
            (
                ExecutionError::Ineligible(
                    lead::Ineligibility::AlreadyPurchased,
                ),
                http::StatusCode::CONFLICT,
                "ALREADY_PURCHASED",
            ),
            (
                ExecutionError::Ineligible(lead::Ineligibility::NotPublished),
                http::StatusCode::BAD_REQUEST,
                "LEAD_NOT_AVAILABLE",
            ),
            (
                ExecutionError::LeadNotExists(lead::Id::new()),
                http::StatusCode::NOT_FOUND,
                "LEAD_NOT_FOUND",
            ),
            (
                ExecutionError::Contention(lead::Id::new()),
                http::StatusCode::CONFLICT,
                "CONTENTION",
            ),
        ];

        for (err, status, code) in cases {
            let err = err.as_error();
            assert_eq!(err.status_code, status);
            assert_eq!(err.code, code);
        }
    }
}

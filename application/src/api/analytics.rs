//! Interaction analytics definitions.

use axum::extract::{Json, Path};
use axum_extra::extract::WithRejection;
use common::DateTime;
use serde::Serialize;
use service::{
    domain::{interaction::Tally, professional},
    query, read, Query as _,
};

use crate::{AsError, Context, Error};

/// Interaction counters of a single month.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCounters {
    /// Month formatted as `YYYY-MM`.
    pub month: String,

    /// Number of profile views.
    pub views: u64,

    /// Number of phone clicks.
    pub phone_clicks: u64,

    /// Number of contact form submissions.
    pub form_submissions: u64,
}

impl MonthlyCounters {
    /// Creates new [`MonthlyCounters`] of the provided `month`.
    fn new(month: impl ToString, tally: Tally) -> Self {
        let Tally {
            views,
            phone_clicks,
            form_submissions,
        } = tally;

        Self {
            month: month.to_string(),
            views,
            phone_clicks,
            form_submissions,
        }
    }
}

/// Response body of [`report()`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Total number of profile views.
    pub total_views: u64,

    /// Total number of phone clicks.
    pub total_phone_clicks: u64,

    /// Total number of contact form submissions.
    pub total_form_submissions: u64,

    /// RFC 3339 date and time of the last profile view.
    pub last_viewed_at: Option<String>,

    /// RFC 3339 date and time of the last interaction of any kind.
    pub last_interaction_at: Option<String>,

    /// Counters of the current month.
    pub current_month: MonthlyCounters,

    /// Counters of every month with interactions, most recent first.
    pub monthly: Vec<MonthlyCounters>,
}

impl From<query::analytics::Output> for Report {
    fn from(out: query::analytics::Output) -> Self {
        let query::analytics::Output {
            totals,
            month,
            current_month,
            months,
        } = out;

        Self {
            total_views: totals.tally.views,
            total_phone_clicks: totals.tally.phone_clicks,
            total_form_submissions: totals.tally.form_submissions,
            last_viewed_at: totals.last_viewed_at.map(|at| at.to_rfc3339()),
            last_interaction_at: totals
                .last_interaction_at
                .map(|at| at.to_rfc3339()),
            current_month: MonthlyCounters::new(month, current_month),
            monthly: months
                .into_iter()
                .map(|read::interaction::MonthlyTally { month, tally }| {
                    MonthlyCounters::new(month, tally)
                })
                .collect(),
        }
    }
}

/// Returns the interaction counters of a professional.
///
/// Counters are zero if no interaction was ever tracked.
#[tracing::instrument(
    skip_all,
    fields(professional.id = %id, rest.name = "getAnalytics"),
)]
pub async fn report(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<
        Path<professional::Id>,
        Error,
    >,
) -> Result<Json<Report>, Error> {
    ctx.service()
        .execute(query::Analytics {
            professional_id: id,
            at: DateTime::now(),
        })
        .await
        .map_err(AsError::into_error)
        .map(|out| Json(out.into()))
}

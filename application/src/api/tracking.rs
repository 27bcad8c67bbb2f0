//! Interaction tracking definitions.

use axum::extract::{Json, Path};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, track_interaction::ContactForm},
    domain::{
        contact,
        interaction::{self, form},
        professional,
    },
    Command as _,
};

use crate::{
    api::{self, ProfessionalError},
    AsError, Context, Error,
};

/// Kind of a tracked interaction in a request body.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Profile was viewed.
    View,

    /// Phone number was revealed or dialed.
    PhoneClick,

    /// Contact form was submitted.
    FormSubmission,
}

impl From<Kind> for interaction::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::View => Self::View,
            Kind::PhoneClick => Self::PhoneClick,
            Kind::FormSubmission => Self::FormSubmission,
        }
    }
}

/// Contact form fields in a request body.
#[derive(Clone, Debug, Deserialize)]
pub struct FormData {
    /// Name of the visitor.
    pub name: String,

    /// Email of the visitor.
    pub email: String,

    /// Phone of the visitor.
    #[serde(default)]
    pub phone: Option<String>,

    /// Message to the professional.
    #[serde(default)]
    pub message: Option<String>,
}

impl TryFrom<FormData> for ContactForm {
    type Error = Error;

    fn try_from(data: FormData) -> Result<Self, Self::Error> {
        let FormData {
            name,
            email,
            phone,
            message,
        } = data;

        Ok(Self {
            name: api::parse("formData.name", name, contact::Name::new)?,
            email: api::parse("formData.email", email, contact::Email::new)?,
            phone: api::parse_opt(
                "formData.phone",
                phone,
                contact::Phone::new,
            )?,
            message: api::parse_opt(
                "formData.message",
                message,
                form::Message::new,
            )?,
        })
    }
}

/// Request body of [`track()`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    /// [`Kind`] of the interaction.
    #[serde(rename = "type")]
    pub kind: Kind,

    /// Contact form fields, required for [`Kind::FormSubmission`].
    #[serde(default)]
    pub form_data: Option<FormData>,
}

/// Response body of [`track()`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct TrackResponse {
    /// Always `true`.
    pub success: bool,
}

/// Tracks an interaction of a visitor with a professional's profile.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - `type` is unknown, or `formData` is invalid or
///   missing for a form submission;
/// - `PROFESSIONAL_NOT_FOUND` - professional doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(
        kind = ?req.kind,
        professional.id = %id,
        rest.name = "trackInteraction",
    ),
)]
pub async fn track(
    ctx: Context,
    WithRejection(Path(id), _): WithRejection<
        Path<professional::Id>,
        Error,
    >,
    WithRejection(Json(req), _): WithRejection<Json<TrackRequest>, Error>,
) -> Result<Json<TrackResponse>, Error> {
    let TrackRequest { kind, form_data } = req;

    ctx.service()
        .execute(command::TrackInteraction {
            professional_id: id,
            kind: kind.into(),
            form: form_data.map(ContactForm::try_from).transpose()?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(TrackResponse { success: true }))
}

impl AsError for command::track_interaction::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ProfessionalNotExists(_) => {
                Some(ProfessionalError::NotExists.into())
            }
            Self::MissingFormData => Some(api::invalid("formData")),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::command::track_interaction::ContactForm;

    use super::{FormData, Kind, TrackRequest};

    #[test]
    fn parses_interaction_kinds() {
        for (raw, expected) in [
            ("view", Kind::View),
            ("phone_click", Kind::PhoneClick),
            ("form_submission", Kind::FormSubmission),
        ] {
            let req = serde_json::from_value::<TrackRequest>(
                serde_json::json!({ "type": raw }),
            )
            .unwrap();
            assert_eq!(req.kind, expected);
            assert!(req.form_data.is_none());
        }

        assert!(serde_json::from_value::<TrackRequest>(
            serde_json::json!({ "type": "click" }),
        )
        .is_err());
    }

    #[test]
    fn validates_form_data() {
        let form = ContactForm::try_from(FormData {
            name: "Paul Durand".to_owned(),
            email: "paul@example.fr".to_owned(),
            phone: Some(String::new()),
            message: Some("Bonjour".to_owned()),
        })
        .unwrap();
        assert!(form.phone.is_none());
        assert!(form.message.is_some());

        let err = ContactForm::try_from(FormData {
            name: "Paul Durand".to_owned(),
            email: "not an email".to_owned(),
            phone: None,
            message: None,
        })
        .unwrap_err();
        assert_eq!(err.body()["field"], "formData.email");
    }
}

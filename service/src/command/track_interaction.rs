//! [`Command`] for tracking an [`Interaction`] with a [`Professional`].

use common::{
    operations::{By, Commit, Deliver, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contact,
        interaction::{self, form},
        professional, FormSubmission, Interaction, Professional,
    },
    infra::{database, mail, Database, Mailer},
    notification, Service,
};

use super::Command;

/// [`Command`] for tracking an [`Interaction`] with a [`Professional`].
///
/// Every execution is counted, repeated ones included.
#[derive(Clone, Debug)]
pub struct TrackInteraction {
    /// ID of the [`Professional`] the [`Interaction`] is with.
    pub professional_id: professional::Id,

    /// [`interaction::Kind`] of the [`Interaction`].
    pub kind: interaction::Kind,

    /// [`ContactForm`] of an [`interaction::Kind::FormSubmission`].
    ///
    /// Ignored for other [`interaction::Kind`]s.
    pub form: Option<ContactForm>,
}

/// Contact fields of a submitted form.
#[derive(Clone, Debug)]
pub struct ContactForm {
    /// [`contact::Name`] of the sender.
    pub name: contact::Name,

    /// [`contact::Email`] of the sender.
    pub email: contact::Email,

    /// [`contact::Phone`] of the sender.
    pub phone: Option<contact::Phone>,

    /// [`form::Message`] of the sender.
    pub message: Option<form::Message>,
}

impl<Db, Pay, Mail> Command<TrackInteraction> for Service<Db, Pay, Mail>
where
    Db: Database<
            Select<By<Option<Professional>, professional::Id>>,
            Ok = Option<Professional>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<Interaction>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Insert<Interaction>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Insert<FormSubmission>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Mail: Mailer<Deliver<mail::Message>, Ok = (), Err = Traced<mail::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: TrackInteraction,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TrackInteraction {
            professional_id,
            kind,
            form,
        } = cmd;

        let form = match (kind, form) {
            (interaction::Kind::FormSubmission, None) => {
                return Err(tracerr::new!(E::MissingFormData));
            }
            (interaction::Kind::FormSubmission, Some(form)) => Some(form),
            (interaction::Kind::View | interaction::Kind::PhoneClick, _) => {
                None
            }
        };

        let professional = if let Some(p) =
            self.professionals().get(&professional_id)
        {
            p
        } else {
            let p = self
                .database()
                .execute(Select(By::new(professional_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::ProfessionalNotExists(professional_id))
                .map_err(tracerr::wrap!())?;
            self.professionals().set(professional_id, p.clone());
            p
        };

        let now = DateTime::now();
        let interaction = Interaction {
            professional_id,
            kind,
            occurred_at: now.coerce(),
        };

        let Some(ContactForm {
            name,
            email,
            phone,
            message,
        }) = form
        else {
            return self
                .database()
                .execute(Insert(interaction))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E));
        };

        let submission = FormSubmission {
            id: form::Id::new(),
            professional_id,
            name,
            email,
            phone,
            message,
            submitted_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(interaction))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(submission.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let msg = notification::form_submitted(&professional, &submission);
        if let Err(e) = self.mailer().execute(Deliver(msg)).await {
            log::warn!(
                "failed to notify `Professional(id: {professional_id})` \
                 about form submission `{}`: {e}",
                submission.id,
            );
        }

        Ok(())
    }
}

/// Error of [`TrackInteraction`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Professional`] with the provided ID does not exist.
    #[display("`Professional(id: {_0})` does not exist")]
    ProfessionalNotExists(#[error(not(source))] professional::Id),

    /// [`interaction::Kind::FormSubmission`] without a [`ContactForm`].
    #[display("Form submission without form data")]
    MissingFormData,
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Select};

    use crate::{
        domain::{
            contact,
            interaction::{form, Kind},
            professional,
        },
        read::interaction::Report,
        spec::{professional, service},
        Command as _,
    };

    use super::{ContactForm, ExecutionError, TrackInteraction};

    fn form() -> ContactForm {
        ContactForm {
            name: contact::Name::new("Paul Durand").unwrap(),
            email: contact::Email::new("paul@example.fr").unwrap(),
            phone: None,
            message: form::Message::new("Devis pour une terrasse <svp>"),
        }
    }

    #[tokio::test]
    async fn counts_every_interaction() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();

        for kind in [Kind::View, Kind::View, Kind::PhoneClick] {
            svc.execute(TrackInteraction {
                professional_id: pro.id,
                kind,
                form: None,
            })
            .await
            .unwrap();
        }

        let report = svc
            .database()
            .execute(Select(By::<Report, _>::new(pro.id)))
            .await
            .unwrap();
        assert_eq!(report.totals.tally.views, 2);
        assert_eq!(report.totals.tally.phone_clicks, 1);
        assert_eq!(report.totals.tally.form_submissions, 0);
        assert!(report.totals.last_viewed_at.is_some());
        assert_eq!(report.months.len(), 1);
        assert_eq!(report.months[0].tally, report.totals.tally);
    }

    #[tokio::test]
    async fn stores_form_and_notifies_professional() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();

        svc.execute(TrackInteraction {
            professional_id: pro.id,
            kind: Kind::FormSubmission,
            form: Some(form()),
        })
        .await
        .unwrap();

        let forms = svc.database().form_submissions(pro.id).await;
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].name.to_string(), "Paul Durand");
        let sent = svc.mailer().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, pro.email);
        assert!(sent[0].html.contains("&lt;svp&gt;"));
    }

    #[tokio::test]
    async fn requires_form_data() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();

        let err = svc
            .execute(TrackInteraction {
                professional_id: pro.id,
                kind: Kind::FormSubmission,
                form: None,
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::MissingFormData), "{err}");
    }

    #[tokio::test]
    async fn fails_on_unknown_professional() {
        let svc = service();

        let err = svc
            .execute(TrackInteraction {
                professional_id: professional::Id::new(),
                kind: Kind::View,
                form: None,
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(
            matches!(err, ExecutionError::ProfessionalNotExists(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn caches_professional_lookup() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();

        svc.execute(TrackInteraction {
            professional_id: pro.id,
            kind: Kind::View,
            form: None,
        })
        .await
        .unwrap();

        assert_eq!(
            svc.professionals().get(&pro.id).map(|p| p.id),
            Some(pro.id),
        );
    }
}

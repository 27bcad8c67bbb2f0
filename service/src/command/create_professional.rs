//! [`Command`] for registering a new [`Professional`].

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contact, professional, Professional},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`Professional`].
#[derive(Clone, Debug)]
pub struct CreateProfessional {
    /// [`contact::Name`] of the company of a new [`Professional`].
    pub company_name: contact::Name,

    /// [`contact::Email`] of a new [`Professional`].
    pub email: contact::Email,

    /// [`contact::Phone`] of a new [`Professional`].
    pub phone: Option<contact::Phone>,

    /// [`contact::City`] a new [`Professional`] works in.
    pub city: contact::City,
}

impl<Db, Pay, Mail> Command<CreateProfessional> for Service<Db, Pay, Mail>
where
    Db: Database<
        Insert<Professional>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = Professional;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProfessional,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateProfessional {
            company_name,
            email,
            phone,
            city,
        } = cmd;

        let professional = Professional {
            id: professional::Id::new(),
            company_name,
            email,
            phone,
            city,
            premium: None,
            subscription: professional::SubscriptionStatus::Inactive,
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(professional.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        log::info!("`Professional(id: {})` registered", professional.id);
        Ok(professional)
    }
}

/// Error of [`CreateProfessional`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

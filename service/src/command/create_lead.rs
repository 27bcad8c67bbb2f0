//! [`Command`] for creating a new [`Lead`].

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{lead, Lead},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new unpublished [`Lead`].
#[derive(Clone, Debug)]
pub struct CreateLead {
    /// [`lead::Project`] of a new [`Lead`].
    pub project: lead::Project,

    /// [`lead::Homeowner`] who submitted a new [`Lead`].
    pub homeowner: lead::Homeowner,
}

impl<Db, Pay, Mail> Command<CreateLead> for Service<Db, Pay, Mail>
where
    Db: Database<Insert<Lead>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Lead;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateLead) -> Result<Self::Ok, Self::Err> {
        let CreateLead { project, homeowner } = cmd;

        let lead = Lead {
            id: lead::Id::new(),
            project,
            homeowner,
            is_published: false,
            status: lead::Status::Active,
            max_sales: self.config().lead_max_sales,
            price: self.config().lead_price,
            purchases: vec![],
            created_at: DateTime::now().coerce(),
            version: lead::Version::default(),
        };
        self.database()
            .execute(Insert(lead.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        log::info!("`Lead(id: {})` created", lead.id);
        Ok(lead)
    }
}

/// Error of [`CreateLead`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

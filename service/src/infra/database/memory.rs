//! In-memory [`Database`] implementation.

use std::{
    collections::HashMap,
    fmt, mem,
    sync::{Arc, Mutex, PoisonError},
};

use common::{
    operations::{By, Commit, Insert, Select, Transact, Update},
    pagination,
};
use tokio::sync::RwLock;
use tracerr::Traced;

use crate::{
    domain::{
        interaction::{Counters, Month, Tally},
        lead, professional, FormSubmission, Interaction, Lead, Professional,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] for local runs and tests.
///
/// Writes inside a [`Transact`]ion are applied on [`Commit`] only, and
/// reads inside it don't observe them. [`Lead`] updates are applied at once,
/// as their version check makes them atomic on their own.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed [`State`].
    state: Arc<RwLock<State>>,

    /// [`Write`]s of the current [`Transact`]ion.
    ///
    /// [`None`] outside a [`Transact`]ion.
    tx: Option<Arc<Mutex<Vec<Write>>>>,

    /// Number of writes left to succeed before the next one fails.
    #[cfg(test)]
    fuse: Arc<Mutex<Option<usize>>>,
}

/// State of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`Lead`]s.
    leads: HashMap<lead::Id, Lead>,

    /// Stored [`Professional`]s.
    professionals: HashMap<professional::Id, Professional>,

    /// Total [`Interaction`] [`Counters`] of [`Professional`]s.
    counters: HashMap<professional::Id, Counters>,

    /// Monthly [`Interaction`] [`Tally`]s of [`Professional`]s.
    monthly: HashMap<(professional::Id, Month), Tally>,

    /// Stored [`FormSubmission`]s.
    forms: Vec<FormSubmission>,
}

/// Deferred write into a [`State`].
struct Write(Box<dyn FnOnce(&mut State) + Send>);

impl fmt::Debug for Write {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Write")
    }
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all the [`FormSubmission`]s stored for the provided
    /// [`Professional`].
    pub async fn form_submissions(
        &self,
        professional_id: professional::Id,
    ) -> Vec<FormSubmission> {
        self.state
            .read()
            .await
            .forms
            .iter()
            .filter(|f| f.professional_id == professional_id)
            .cloned()
            .collect()
    }

    /// Applies the provided `write` to the [`State`], or defers it until
    /// [`Commit`] inside a [`Transact`]ion.
    async fn write(
        &self,
        write: impl FnOnce(&mut State) + Send + 'static,
    ) -> Result<(), Traced<database::Error>> {
        #[cfg(test)]
        self.burn_fuse()?;

        if let Some(tx) = &self.tx {
            tx.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Write(Box::new(write)));
        } else {
            write(&mut *self.state.write().await);
        }
        Ok(())
    }
}

#[cfg(test)]
impl Memory {
    /// Makes every write after the provided number of successful ones fail
    /// with [`database::Error::Unavailable`].
    pub(crate) fn fail_after(&self, writes: usize) {
        *self.fuse.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(writes);
    }

    /// Counts a write down, failing once the fuse is burnt.
    fn burn_fuse(&self) -> Result<(), Traced<database::Error>> {
        let mut fuse = self.fuse.lock().unwrap_or_else(PoisonError::into_inner);
        match fuse.as_mut() {
            Some(0) => Err(tracerr::new!(database::Error::Unavailable)),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Self {
            tx: Some(Arc::default()),
            ..self.clone()
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Some(tx) = &self.tx else {
            return Ok(());
        };
        let writes =
            mem::take(&mut *tx.lock().unwrap_or_else(PoisonError::into_inner));

        let mut state = self.state.write().await;
        for Write(write) in writes {
            write(&mut *state);
        }
        Ok(())
    }
}

impl Database<Insert<Lead>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lead): Insert<Lead>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |s| {
            _ = s.leads.insert(lead.id, lead);
        })
        .await
    }
}

impl Database<Update<Lead>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(mut lead): Update<Lead>,
    ) -> Result<Self::Ok, Self::Err> {
        #[cfg(test)]
        self.burn_fuse()?;

        let mut state = self.state.write().await;
        let Some(stored) = state.leads.get_mut(&lead.id) else {
            return Ok(false);
        };
        if stored.version != lead.version {
            return Ok(false);
        }
        lead.version = lead.version.next();
        *stored = lead;
        Ok(true)
    }
}

impl Database<Select<By<Option<Lead>, lead::Id>>> for Memory {
    type Ok = Option<Lead>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lead>, lead::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.read().await.leads.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<read::lead::list::Page, read::lead::list::Selector>>>
    for Memory
{
    type Ok = read::lead::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::lead::list::Page, read::lead::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let pagination::Selector {
            arguments,
            filter: read::lead::list::Filter { city },
        } = by.into_inner();

        let state = self.state.read().await;
        let mut leads = state
            .leads
            .values()
            .filter(|l| l.is_published && l.status == lead::Status::Active)
            .filter(|l| city.as_ref().map_or(true, |c| l.project.city == *c))
            .filter(|l| arguments.after.map_or(true, |after| l.id < after))
            .collect::<Vec<_>>();
        leads.sort_unstable_by(|a, b| b.id.cmp(&a.id));

        Ok(read::lead::list::Page::new(
            &arguments,
            leads
                .into_iter()
                .take(arguments.fetch_limit())
                .map(|l| (l.id, l.clone())),
        ))
    }
}

impl Database<Insert<Professional>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(professional): Insert<Professional>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |s| {
            _ = s.professionals.insert(professional.id, professional);
        })
        .await
    }
}

impl Database<Update<Professional>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(professional): Update<Professional>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(professional)).await
    }
}

impl Database<Select<By<Option<Professional>, professional::Id>>> for Memory {
    type Ok = Option<Professional>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Professional>, professional::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state
            .read()
            .await
            .professionals
            .get(&by.into_inner())
            .cloned())
    }
}

impl
    Database<
        Select<
            By<Vec<Professional>, read::professional::PremiumEndedBefore>,
        >,
    > for Memory
{
    type Ok = Vec<Professional>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Professional>, read::professional::PremiumEndedBefore>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::professional::PremiumEndedBefore(at) = by.into_inner();

        Ok(self
            .state
            .read()
            .await
            .professionals
            .values()
            .filter(|p| p.premium.as_ref().is_some_and(|p| p.is_expired_at(at)))
            .cloned()
            .collect())
    }
}

impl Database<Insert<Interaction>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(interaction): Insert<Interaction>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |s| {
            s.counters
                .entry(interaction.professional_id)
                .or_default()
                .record(&interaction);
            s.monthly
                .entry((interaction.professional_id, interaction.month()))
                .or_default()
                .increment(interaction.kind);
        })
        .await
    }
}

impl Database<Insert<FormSubmission>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(form): Insert<FormSubmission>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |s| s.forms.push(form)).await
    }
}

impl Database<Select<By<read::interaction::Report, professional::Id>>>
    for Memory
{
    type Ok = read::interaction::Report;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::interaction::Report, professional::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let professional_id = by.into_inner();

        let state = self.state.read().await;
        let mut months = state
            .monthly
            .iter()
            .filter(|((id, _), _)| *id == professional_id)
            .map(|(&(_, month), &tally)| read::interaction::MonthlyTally {
                month,
                tally,
            })
            .collect::<Vec<_>>();
        months.sort_unstable_by(|a, b| b.month.cmp(&a.month));

        Ok(read::interaction::Report {
            totals: state
                .counters
                .get(&professional_id)
                .copied()
                .unwrap_or_default(),
            months,
        })
    }
}

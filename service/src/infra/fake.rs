//! Fake [`Payments`] and [`Mailer`] recording their calls.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use common::operations::{By, Deliver, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::payment::{Intent, IntentId, IntentStatus, NewIntent, Purpose},
    infra::{mail, payment, Mailer, Payments},
};

/// [`Payments`] processor keeping [`Intent`]s in memory.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakePayments(Arc<Mutex<HashMap<IntentId, Intent>>>);

impl FakePayments {
    /// Sets the [`IntentStatus`] of the [`Intent`] with the provided ID.
    pub(crate) fn set_status(&self, id: &IntentId, status: IntentStatus) {
        if let Some(intent) = self.0.lock().unwrap().get_mut(id) {
            intent.status = status;
        }
    }

    /// Registers the provided [`Intent`] as is.
    pub(crate) fn put(&self, intent: Intent) {
        _ = self.0.lock().unwrap().insert(intent.id.clone(), intent);
    }
}

impl Payments<Insert<NewIntent>> for FakePayments {
    type Ok = Intent;
    type Err = Traced<payment::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<NewIntent>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut intents = self.0.lock().unwrap();
        let id = IntentId::new(format!("pi_fake{}", intents.len() + 1))
            .unwrap();
        let intent = Intent {
            id: id.clone(),
            client_secret: format!("{id}_secret").into(),
            amount: new.amount,
            status: IntentStatus::RequiresPaymentMethod,
            purpose: Purpose::MarketplaceLead(new.purchase),
        };
        _ = intents.insert(id, intent.clone());
        Ok(intent)
    }
}

impl Payments<Select<By<Option<Intent>, IntentId>>> for FakePayments {
    type Ok = Option<Intent>;
    type Err = Traced<payment::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Intent>, IntentId>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.lock().unwrap().get(&by.into_inner()).cloned())
    }
}

/// [`Mailer`] keeping delivered [`mail::Message`]s in memory.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakeMailer(Arc<Mutex<Vec<mail::Message>>>);

impl FakeMailer {
    /// Returns all the [`mail::Message`]s delivered so far.
    pub(crate) fn sent(&self) -> Vec<mail::Message> {
        self.0.lock().unwrap().clone()
    }
}

impl Mailer<Deliver<mail::Message>> for FakeMailer {
    type Ok = ();
    type Err = Traced<mail::Error>;

    async fn execute(
        &self,
        Deliver(msg): Deliver<mail::Message>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.lock().unwrap().push(msg);
        Ok(())
    }
}

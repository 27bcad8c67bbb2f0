//! [`Query`] collection related to a single [`Professional`].

use common::operations::By;

use crate::domain::{professional, Professional};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Professional`] by its [`professional::Id`].
pub type ById = DatabaseQuery<By<Option<Professional>, professional::Id>>;

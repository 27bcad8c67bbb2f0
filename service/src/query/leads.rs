//! [`Query`] collection related to the multiple [`Lead`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Lead, Query};
use crate::read;

use super::DatabaseQuery;

/// Queries a page of published [`Lead`]s available on the marketplace.
pub type List =
    DatabaseQuery<By<read::lead::list::Page, read::lead::list::Selector>>;

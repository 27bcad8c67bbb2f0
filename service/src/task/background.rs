//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use derive_more::Display;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Background environment for running [`Task`]s on the current thread.
///
/// Resolves once every spawned [`Task`] completes, or with the first
/// [`Failure`].
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of tasks.
    set: task::LocalSet,

    /// Handles of spawned tasks.
    handles: Vec<task::JoinHandle<Result<(), Failure>>>,
}

impl Background {
    /// Spawns a new [`Task`] with the provided `name` inside the
    /// [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `task::{name}`");
        self.handles
            .push(self.set.spawn_local(future.map_err(move |e| Failure {
                task: name,
                source: Box::new(e),
            })));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failure>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks = handles.into_iter().map(|h| {
            h.map(|res| {
                res.unwrap_or_else(|e| {
                    Err(Failure {
                        task: "unknown",
                        source: Box::new(e),
                    })
                })
            })
            .boxed_local()
        });
        future::try_join_all(iter::once(set.map(Ok).boxed_local()).chain(tasks))
            .map_ok(drop)
            .boxed_local()
    }
}

/// Failure of a [`Task`] running in a [`Background`].
#[derive(Debug, Display)]
#[display("`task::{task}` failed: {source}")]
pub struct Failure {
    /// Name of the failed [`Task`].
    pub task: &'static str,

    /// Error the [`Task`] failed with.
    pub source: Box<dyn Error + 'static>,
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

//! [`Handler`] abstractions.
//!
//! Every operation of the system is a [`Handler`] of some arguments type:
//! commands and queries of a service, statements of a database, calls to a
//! payment processor or a mailer.
//!
//! ```rust,ignore
//! # use common::{operations::Insert, Handler};
//! struct Counter(AtomicUsize);
//!
//! impl Handler<Insert<usize>> for Counter {
//!     type Ok = usize;
//!     type Err = Infallible;
//!
//!     async fn execute(
//!         &self,
//!         Insert(n): Insert<usize>,
//!     ) -> Result<Self::Ok, Self::Err> {
//!         Ok(self.0.fetch_add(n, Ordering::Relaxed) + n)
//!     }
//! }
//! ```

use std::future::Future;

/// Executable operation over the provided `Args`.
///
/// Implementors may be generic over their dependencies, requiring them to be
/// [`Handler`]s of the lower-level operations in turn.
pub trait Handler<Args = ()> {
    /// Result of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Executes the operation with the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

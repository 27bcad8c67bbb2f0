//! [`Command`] for authorizing an administrative operation.

use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretString};
use subtle::ConstantTimeEq as _;
use tracerr::Traced;

use crate::Service;

use super::Command;

/// [`Command`] for authorizing an administrative operation.
#[derive(Clone, Debug, From)]
pub struct AuthorizeAdmin {
    /// Key presented by the caller.
    pub key: SecretString,
}

impl<Db, Pay, Mail> Command<AuthorizeAdmin> for Service<Db, Pay, Mail> {
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeAdmin,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeAdmin { key } = cmd;

        let expected = self.config().admin_key.expose_secret();
        let matches: bool = key
            .expose_secret()
            .as_bytes()
            .ct_eq(expected.as_bytes())
            .into();
        if expected.is_empty() || !matches {
            return Err(tracerr::new!(ExecutionError::Unauthorized));
        }
        Ok(())
    }
}

/// Error of [`AuthorizeAdmin`] [`Command`] execution.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ExecutionError {
    /// Presented key doesn't match the configured one.
    #[display("Invalid admin key")]
    Unauthorized,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretString;

    use crate::{
        spec::{service, ADMIN_KEY},
        Command as _,
    };

    use super::{AuthorizeAdmin, ExecutionError};

    #[tokio::test]
    async fn accepts_configured_key() {
        let svc = service();

        let res = svc
            .execute(AuthorizeAdmin {
                key: SecretString::from(ADMIN_KEY),
            })
            .await;

        assert!(res.is_ok(), "failed: {res:?}");
    }

    #[tokio::test]
    async fn rejects_other_keys() {
        let svc = service();

        for key in ["", "s3cr3", "s3cr3t!", "S3CR3T"] {
            let err = svc
                .execute(AuthorizeAdmin {
                    key: SecretString::from(key),
                })
                .await
                .unwrap_err()
                .into_inner();

            assert!(
                matches!(err, ExecutionError::Unauthorized),
                "`{key}` is accepted",
            );
        }
    }
}

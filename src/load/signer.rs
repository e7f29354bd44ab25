use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::args::LoadArgs;
use crate::error::SignError;
use crate::metrics::RequestEvent;

pub const SIGN_REQUEST_TYPE: &str = "SignTransaction";
pub const SIGN_EVENT_NAME: &str = "sign_transaction";

/// Wallet key and signature produced for one purchase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignedTransaction {
    #[serde(rename = "publicKey")]
    pub public_key: String,
    pub signature: String,
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Signs a purchase on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when no signature could be produced.
    async fn sign(&self, user_id: &str) -> Result<SignedTransaction, SignError>;
}

/// Runs `<program> <args...> <user_id>` and reads JSON from its stdout.
#[derive(Debug, Clone)]
pub struct ProcessSigner {
    program: String,
    args: Vec<String>,
}

impl ProcessSigner {
    #[must_use]
    pub const fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    #[must_use]
    pub fn from_args(args: &LoadArgs) -> Self {
        Self::new(args.signer_program.clone(), args.signer_args.clone())
    }
}

#[async_trait]
impl TransactionSigner for ProcessSigner {
    async fn sign(&self, user_id: &str) -> Result<SignedTransaction, SignError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(user_id)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| SignError::Spawn {
                program: self.program.clone(),
                source: err,
            })?;

        if !output.status.success() {
            return Err(SignError::NonZeroExit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        debug!("Signer produced {} bytes for {}", output.stdout.len(), user_id);
        serde_json::from_slice(&output.stdout)
            .map_err(|err| SignError::MalformedOutput { source: err })
    }
}

/// The failure event recorded when signing fails; no request follows it.
#[must_use]
pub fn sign_failure_event(err: &SignError) -> RequestEvent {
    let detail = match err {
        SignError::NonZeroExit { stderr, .. } => stderr.clone(),
        SignError::Spawn { .. } | SignError::MalformedOutput { .. } => err.to_string(),
    };
    RequestEvent::Failure {
        request_type: SIGN_REQUEST_TYPE,
        name: SIGN_EVENT_NAME,
        response_time: Duration::ZERO,
        message: format!("Signing failed: {}", detail),
    }
}

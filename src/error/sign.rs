use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("failed to start signer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("signer exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },
    #[error("signer output was not valid JSON: {source}")]
    MalformedOutput {
        #[source]
        source: serde_json::Error,
    },
}

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quotd_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No quote text provided")]
    EmptyText,
    #[error("Invalid remote endpoint: {0}")]
    InvalidRemote(String),
    #[error(
        "A sync conflict is pending. Re-run with --resolve <local|server|merge> to settle it."
    )]
    ConflictUnresolved,
}

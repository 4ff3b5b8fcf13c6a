use core_library::RejectionReason;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] core_metadata::MetadataError),

    #[error("Invalid Instagram URL format")]
    InvalidUrl(String),

    #[error("License validation failed: {reason}")]
    LicenseRejected { reason: RejectionReason },
}

pub type Result<T> = std::result::Result<T, CoreError>;

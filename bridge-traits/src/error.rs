use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A write collided with an existing unique key.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Document store error: {0}")]
    DocumentError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

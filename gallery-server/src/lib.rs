//! HTTP front end for the gallery core.
//!
//! Route handlers are thin: they check request shape, call into
//! [`GalleryService`] and shape the JSON reply.

pub mod error;
pub mod router;
pub mod routes;

pub use error::AppError;
pub use router::build_router;

use core_service::GalleryService;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppContext {
    pub service: GalleryService,
}

impl AppContext {
    pub fn new(service: GalleryService) -> Self {
        Self { service }
    }
}

/// Current time for response envelopes.
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

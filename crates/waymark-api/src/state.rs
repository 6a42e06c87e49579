//! Application state shared across handlers.

use waymark_db::Database;
use waymark_enrich::ContentFetcher;

/// Shared per-process state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Repository set over the connection pool.
    pub db: Database,
    /// Page fetcher with its own bounded-timeout HTTP client.
    pub fetcher: ContentFetcher,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            fetcher: ContentFetcher::new(),
        }
    }
}

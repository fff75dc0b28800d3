//! Stanley Restaurant back-office core.
//!
//! The shared record store ([`store::Store`]) persists every collection as
//! a JSON array under a named slot in a local SQLite database. The domain
//! modules — [`orders`], [`inventory`], [`attendance`], [`payroll`],
//! [`agents`], [`records`] — are the transition functions over those
//! snapshots: read a full collection, compute its replacement, write it
//! back whole. Independent contexts (an admin window and a customer
//! window, say) converge through the store's change events; a handle's
//! own writes never fire its subscriptions.
//!
//! External collaborators — the conversational ordering assistant, text
//! to speech, the tracking map, outbound messaging — are consumed through
//! narrow data contracts ([`orders::quote_items`],
//! [`deep_link::handoff_message`], ...) and are not implemented here.

use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod agents;
pub mod attendance;
mod db;
pub mod deep_link;
mod error;
pub mod inventory;
pub mod models;
pub mod orders;
pub mod payroll;
pub mod records;
pub mod seed;
pub mod store;

pub use error::{Error, Result};
pub use store::{ChangeEvent, Collection, Store, Subscription};

/// Initialize structured logging: console always, plus a daily-rolling
/// file in `log_dir` when given. Safe to call more than once; later calls
/// are no-ops.
pub fn init_tracing(log_dir: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stanley_backoffice=debug"));

    let console_layer = fmt::layer().with_target(true);

    let file_layer = log_dir.map(|dir| {
        std::fs::create_dir_all(dir).ok();
        let file_appender = tracing_appender::rolling::daily(dir, "backoffice");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Keep the guard alive for the lifetime of the process — dropping
        // it stops flushing file logs.
        std::mem::forget(guard);
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_init_tracing_is_repeatable() {
        init_tracing(None);
        // A second call must not panic on the already-set global subscriber
        init_tracing(None);
    }

    #[test]
    #[serial]
    fn test_init_tracing_with_file_layer_creates_log_dir() {
        let dir = std::env::temp_dir().join(format!(
            "stanley_tracing_test_{}",
            uuid::Uuid::new_v4()
        ));
        init_tracing(Some(&dir));
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}

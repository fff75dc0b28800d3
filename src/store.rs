//! Shared record store and cross-context change notification.
//!
//! Every collection is one named slot holding a JSON array of whole
//! records. Mutators read a full snapshot, compute a replacement, and
//! write the whole snapshot back; the change event then fans out to every
//! OTHER open handle on the same database file. A handle's own writes do
//! not fire its subscriptions — local refresh is explicit via
//! [`Store::write_and_reload`], preserving the storage-event asymmetry of
//! the web client this store replaces.
//!
//! There is no locking across handles. Two handles racing on the same
//! collection resolve last-write-wins; the expected write concurrency is
//! one human admin at a time.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, error};

use crate::db::{self, DbState};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// The named record collections. Each occupies one slot in the
/// `collections` table; absence of the slot reads as an empty collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Orders,
    Agents,
    Attendance,
    Payroll,
    StockLedger,
    Expenses,
    LeaveRequests,
    Tasks,
    ContactSubmissions,
    Faqs,
}

impl Collection {
    pub fn key(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Orders => "delivery_orders",
            Collection::Agents => "delivery_agents",
            Collection::Attendance => "attendance_records",
            Collection::Payroll => "payroll_records",
            Collection::StockLedger => "stock_ledger",
            Collection::Expenses => "expenses",
            Collection::LeaveRequests => "leave_requests",
            Collection::Tasks => "tasks",
            Collection::ContactSubmissions => "contact_submissions",
            Collection::Faqs => "faqs",
        }
    }
}

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

/// Notification raised after a slot replacement, carrying both serialized
/// forms. Consumers diff old vs. new themselves (e.g. comparing pending
/// counts to detect a new order). `new_value` is `None` when the slot was
/// removed.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

type Handler = dyn Fn(&ChangeEvent) + Send + Sync;

struct Listener {
    id: u64,
    context: u64,
    handler: Box<Handler>,
}

/// One bus per database path; every handle on that path shares it.
#[derive(Default)]
struct Bus {
    listeners: Mutex<Vec<Arc<Listener>>>,
}

impl Bus {
    /// Deliver to every listener registered by a context other than the
    /// writer. Dispatch runs outside the listener lock so a handler may
    /// itself subscribe or drop subscriptions.
    fn publish(&self, origin: u64, event: &ChangeEvent) {
        let snapshot: Vec<Arc<Listener>> = match self.listeners.lock() {
            Ok(guard) => guard.iter().cloned().collect(),
            Err(e) => {
                error!("change bus lock failed: {e}");
                return;
            }
        };
        for listener in snapshot.iter().filter(|l| l.context != origin) {
            (listener.handler)(event);
        }
    }

    fn remove(&self, id: u64) {
        if let Ok(mut guard) = self.listeners.lock() {
            guard.retain(|l| l.id != id);
        }
    }
}

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn bus_registry() -> &'static Mutex<HashMap<PathBuf, Arc<Bus>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Arc<Bus>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn bus_for(db_path: &Path) -> Arc<Bus> {
    let canonical = db_path
        .canonicalize()
        .unwrap_or_else(|_| db_path.to_path_buf());
    let mut registry = bus_registry()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.entry(canonical).or_default().clone()
}

/// Guard returned by [`Store::subscribe`]; unregisters the handler on drop.
pub struct Subscription {
    bus: Arc<Bus>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.remove(self.id);
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// One context over the shared persistence medium — the analogue of a
/// browser tab. Open several handles on the same directory to model
/// independent views converging through change events.
pub struct Store {
    db: DbState,
    bus: Arc<Bus>,
    context: u64,
}

impl Store {
    /// Open (or create) the store under `data_dir` and join the change bus
    /// for that database path.
    pub fn open(data_dir: &Path) -> Result<Store> {
        let db = db::init(data_dir)?;
        let bus = bus_for(&db.db_path);
        let context = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        debug!(context, path = %db.db_path.display(), "store handle opened");
        Ok(Store { db, bus, context })
    }

    /// Read the full collection snapshot. A missing slot reads as empty;
    /// malformed stored data fails closed to empty with a log line, never
    /// a panic.
    pub fn read<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        match self.raw_slot(collection.key()) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    error!(
                        slot = collection.key(),
                        error = %e,
                        "corrupt collection data, reading as empty"
                    );
                    Vec::new()
                }
            },
        }
    }

    /// Replace the entire persisted collection, then notify every other
    /// handle on this database. The writing handle's own subscriptions do
    /// NOT fire.
    pub fn write<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let new_value = serde_json::to_string(records)?;
        self.replace_slot(collection.key(), Some(new_value))
    }

    /// Write, then immediately re-read and return the fresh snapshot. The
    /// explicit local-refresh variant of [`Store::write`] for callers that
    /// would otherwise rely on their own (never-delivered) change event.
    pub fn write_and_reload<T>(&self, collection: Collection, records: &[T]) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.write(collection, records)?;
        Ok(self.read(collection))
    }

    /// Whether the collection slot has ever been written. Used by the seed
    /// initializer, which only writes defaults into absent slots.
    pub fn exists(&self, collection: Collection) -> bool {
        match self.db.conn.lock() {
            Ok(conn) => db::slot_exists(&conn, collection.key()),
            Err(e) => {
                error!("store lock failed: {e}");
                false
            }
        }
    }

    /// Read a scalar content slot (about text, contact phone, ...).
    pub fn read_text(&self, slot: &str) -> Option<String> {
        self.raw_slot(slot)
    }

    /// Replace a scalar content slot and notify other handles.
    pub fn write_text(&self, slot: &str, value: &str) -> Result<()> {
        self.replace_slot(slot, Some(value.to_string()))
    }

    /// Remove a scalar content slot and notify other handles.
    pub fn clear_text(&self, slot: &str) -> Result<()> {
        self.replace_slot(slot, None)
    }

    /// Register a process-wide listener for writes performed by OTHER
    /// handles sharing this database path. Dropping the returned guard
    /// unregisters it.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        let listener = Arc::new(Listener {
            id,
            context: self.context,
            handler: Box::new(handler),
        });
        match self.bus.listeners.lock() {
            Ok(mut guard) => guard.push(listener),
            Err(e) => error!("change bus lock failed during subscribe: {e}"),
        }
        Subscription {
            bus: self.bus.clone(),
            id,
        }
    }

    fn raw_slot(&self, slot: &str) -> Option<String> {
        let conn = match self.db.conn.lock() {
            Ok(c) => c,
            Err(e) => {
                error!("store lock failed: {e}");
                return None;
            }
        };
        db::get_slot(&conn, slot)
    }

    /// The whole read-old/upsert cycle runs under the connection mutex, so
    /// the replacement is atomic from this handle's perspective. The event
    /// publishes after the lock is released.
    fn replace_slot(&self, slot: &str, new_value: Option<String>) -> Result<()> {
        let old_value = {
            let conn = self
                .db
                .conn
                .lock()
                .map_err(|e| Error::Storage(format!("store lock failed: {e}")))?;
            let old = db::get_slot(&conn, slot);
            match &new_value {
                Some(value) => db::set_slot(&conn, slot, value)?,
                None => {
                    db::delete_slot(&conn, slot)?;
                }
            }
            old
        };

        let event = ChangeEvent {
            key: slot.to_string(),
            old_value,
            new_value,
        };
        self.bus.publish(self.context, &event);
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("stanley_store_test_{}", Uuid::new_v4()))
    }

    fn cleanup(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
    }

    fn product(id: &str, name: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price: 9.99,
            description: None,
            image: None,
            stock,
        }
    }

    #[test]
    fn test_missing_slot_reads_empty() {
        let dir = temp_dir();
        let store = Store::open(&dir).expect("open store");

        let products: Vec<Product> = store.read(Collection::Products);
        assert!(products.is_empty());
        assert!(!store.exists(Collection::Products));

        cleanup(&dir);
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = temp_dir();
        let store = Store::open(&dir).expect("open store");

        let records = vec![product("p1", "Pizza", 20), product("p2", "Burger", 30)];
        store
            .write(Collection::Products, &records)
            .expect("write products");

        let read_back: Vec<Product> = store.read(Collection::Products);
        assert_eq!(read_back, records);
        assert!(store.exists(Collection::Products));

        cleanup(&dir);
    }

    #[test]
    fn test_corrupt_slot_fails_closed() {
        let dir = temp_dir();
        let store = Store::open(&dir).expect("open store");

        store
            .write_text(Collection::Products.key(), "{definitely not a json array")
            .expect("write garbage");

        let products: Vec<Product> = store.read(Collection::Products);
        assert!(
            products.is_empty(),
            "unparsable slot must read as empty, not crash"
        );

        cleanup(&dir);
    }

    #[test]
    fn test_second_handle_converges_on_write() {
        let dir = temp_dir();
        let tab_a = Store::open(&dir).expect("open tab a");
        let tab_b = Store::open(&dir).expect("open tab b");

        tab_a
            .write(Collection::Products, &[product("p1", "Pizza", 20)])
            .expect("write from a");

        let seen_by_b: Vec<Product> = tab_b.read(Collection::Products);
        assert_eq!(seen_by_b.len(), 1);
        assert_eq!(seen_by_b[0].id, "p1");

        cleanup(&dir);
    }

    #[test]
    fn test_notification_fires_for_other_handles_only() {
        let dir = temp_dir();
        let tab_a = Store::open(&dir).expect("open tab a");
        let tab_b = Store::open(&dir).expect("open tab b");

        let events_a: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events_a.clone();
        let _sub = tab_a.subscribe(move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        // A's own write must NOT self-trigger its subscription
        tab_a
            .write(Collection::Products, &[product("p1", "Pizza", 20)])
            .expect("write from a");
        assert!(events_a.lock().unwrap().is_empty());

        // B's write must reach A, carrying old and new serialized values
        tab_b
            .write(Collection::Products, &[product("p2", "Burger", 30)])
            .expect("write from b");

        let events = events_a.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, "products");
        assert!(events[0].old_value.as_deref().unwrap().contains("p1"));
        assert!(events[0].new_value.as_deref().unwrap().contains("p2"));

        cleanup(&dir);
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let dir = temp_dir();
        let tab_a = Store::open(&dir).expect("open tab a");
        let tab_b = Store::open(&dir).expect("open tab b");

        let events_a: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events_a.clone();
        let sub = tab_a.subscribe(move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        drop(sub);

        tab_b
            .write(Collection::Products, &[product("p1", "Pizza", 20)])
            .expect("write from b");
        assert!(events_a.lock().unwrap().is_empty());

        cleanup(&dir);
    }

    #[test]
    fn test_concurrent_edits_resolve_last_write_wins() {
        let dir = temp_dir();
        let tab_a = Store::open(&dir).expect("open tab a");
        let tab_b = Store::open(&dir).expect("open tab b");

        tab_a
            .write(Collection::Products, &[product("p1", "Pizza", 20)])
            .expect("seed from a");

        // Both tabs read the same snapshot, then each writes its own edit.
        let mut snapshot_a: Vec<Product> = tab_a.read(Collection::Products);
        let mut snapshot_b: Vec<Product> = tab_b.read(Collection::Products);

        snapshot_b.push(product("p2", "Burger", 30));
        tab_b
            .write(Collection::Products, &snapshot_b)
            .expect("write from b");

        snapshot_a.push(product("p3", "Salad", 25));
        tab_a
            .write(Collection::Products, &snapshot_a)
            .expect("write from a");

        // The later write replaces the whole collection; B's concurrent
        // edit is silently discarded. This weak-consistency model is the
        // contract — do not strengthen it.
        let final_state: Vec<Product> = tab_b.read(Collection::Products);
        let ids: Vec<&str> = final_state.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);

        cleanup(&dir);
    }

    #[test]
    fn test_write_and_reload_returns_fresh_snapshot() {
        let dir = temp_dir();
        let store = Store::open(&dir).expect("open store");

        let reloaded = store
            .write_and_reload(Collection::Products, &[product("p1", "Pizza", 20)])
            .expect("write and reload");
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].name, "Pizza");

        cleanup(&dir);
    }

    #[test]
    fn test_clear_text_notifies_with_none_new_value() {
        let dir = temp_dir();
        let tab_a = Store::open(&dir).expect("open tab a");
        let tab_b = Store::open(&dir).expect("open tab b");

        tab_a
            .write_text("home_background", "data:image/png;base64,AAAA")
            .expect("write background");

        let events_a: Arc<Mutex<Vec<ChangeEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events_a.clone();
        let _sub = tab_a.subscribe(move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        tab_b.clear_text("home_background").expect("clear from b");

        let events = events_a.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].old_value.is_some());
        assert!(events[0].new_value.is_none());
        assert_eq!(tab_a.read_text("home_background"), None);

        cleanup(&dir);
    }
}

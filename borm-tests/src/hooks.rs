use borm::{Aborted, Connection, Driver, Engine, Error, Lifecycle, Model, Result, Session, Value};
use std::sync::{
    LazyLock,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

static QUERIES: AtomicUsize = AtomicUsize::new(0);
static INSERTS: AtomicUsize = AtomicUsize::new(0);
static UPDATES: AtomicUsize = AtomicUsize::new(0);
static LOCKED: AtomicBool = AtomicBool::new(false);

#[derive(Model, Debug, Clone, PartialEq)]
#[borm(name = "audited")]
pub struct Audited {
    #[borm(tag = "PRIMARY KEY")]
    pub id: i32,
    pub label: String,
}

impl<C: Connection> Lifecycle<C> for Audited {
    async fn before_query(_session: &mut Session<C>) -> Result<()> {
        QUERIES.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn after_query(&mut self, _session: &mut Session<C>) -> Result<()> {
        self.label = self.label.to_uppercase();
        Ok(())
    }

    async fn before_insert(&self, session: &mut Session<C>) -> Result<()> {
        if self.label.is_empty() {
            session.abort();
        }
        Ok(())
    }

    async fn after_insert(_session: &mut Session<C>) -> Result<()> {
        INSERTS.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn before_update(_session: &mut Session<C>) -> Result<()> {
        Err(Error::msg("The audit log is not available"))
    }

    async fn after_update(_session: &mut Session<C>) -> Result<()> {
        UPDATES.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn before_delete(session: &mut Session<C>) -> Result<()> {
        if LOCKED.load(Ordering::Relaxed) {
            session.abort();
        }
        Ok(())
    }
}

fn audited(id: i32, label: &str) -> Audited {
    Audited {
        id,
        label: label.into(),
    }
}

pub async fn hooks<D: Driver>(engine: &mut Engine<D>) {
    let _lock = MUTEX.lock().await;
    engine.register_hooks::<Audited>();
    let mut session = engine.new_session();
    session.enable_hook(true).model::<Audited>();
    let result = session.drop_table().await;
    assert!(result.is_ok(), "Failed to drop the audited table: {:?}", result);
    let result = session.create_table().await;
    assert!(result.is_ok(), "Failed to create the audited table: {:?}", result);

    // Insert
    let inserts = INSERTS.load(Ordering::Relaxed);
    let inserted = session
        .insert(&[audited(1, "first"), audited(2, "second")])
        .await
        .expect("Failed to insert");
    assert_eq!(inserted, 2);
    assert_eq!(INSERTS.load(Ordering::Relaxed), inserts + 1);
    crate::silent_logs! {
        let result = session.insert(&[audited(3, "third"), audited(4, "")]).await;
        assert!(
            result.as_ref().is_err_and(|e| e.is::<Aborted>()),
            "A record without label must abort the insert: {:?}",
            result
        );
    }
    assert_eq!(INSERTS.load(Ordering::Relaxed), inserts + 1);
    assert_eq!(session.count().await.expect("Failed to count"), 2);

    // Query
    let queries = QUERIES.load(Ordering::Relaxed);
    let records = session
        .order_by("id")
        .find::<Audited>()
        .await
        .expect("Failed to find");
    assert_eq!(records, [audited(1, "FIRST"), audited(2, "SECOND")]);
    assert_eq!(QUERIES.load(Ordering::Relaxed), queries + 1);

    // A failing hook does not stop the operation
    let updates = UPDATES.load(Ordering::Relaxed);
    crate::silent_logs! {
        let updated = session
            .filter("id = ?", vec![1.into()])
            .update([("label", Value::from("renamed"))])
            .await
            .expect("Failed to update");
        assert_eq!(updated, 1);
    }
    assert_eq!(UPDATES.load(Ordering::Relaxed), updates + 1);

    // Delete
    LOCKED.store(true, Ordering::Relaxed);
    crate::silent_logs! {
        let result = session.filter("id = ?", vec![2.into()]).delete().await;
        assert!(
            result.as_ref().is_err_and(|e| e.is::<Aborted>()),
            "A locked table must abort the delete: {:?}",
            result
        );
    }
    LOCKED.store(false, Ordering::Relaxed);
    assert_eq!(session.count().await.expect("Failed to count"), 2);
    let deleted = session
        .filter("id = ?", vec![2.into()])
        .delete()
        .await
        .expect("Failed to delete");
    assert_eq!(deleted, 1);

    // Hooks are off unless enabled
    let mut plain = engine.new_session();
    let records = plain.find::<Audited>().await.expect("Failed to find");
    assert_eq!(records, [audited(1, "renamed")]);
    assert_eq!(QUERIES.load(Ordering::Relaxed), queries + 1);
    drop(plain);

    let result = session.drop_table().await;
    assert!(result.is_ok(), "Failed to drop the audited table: {:?}", result);
}

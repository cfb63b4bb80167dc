use borm::{ConnectionBusy, Driver, Engine, Error, Model, Result, Session};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Model, Debug, Clone, PartialEq)]
#[borm(name = "ledger")]
pub struct Entry {
    #[borm(tag = "PRIMARY KEY")]
    pub id: i64,
    pub account: String,
    pub amount: f64,
}

fn entry(id: i64, account: &str, amount: f64) -> Entry {
    Entry {
        id,
        account: account.into(),
        amount,
    }
}

async fn total<D: Driver>(engine: &Engine<D>) -> i64 {
    engine
        .new_session()
        .model::<Entry>()
        .count()
        .await
        .expect("Failed to count the ledger entries")
}

pub async fn transactions<D: Driver>(engine: &Engine<D>) {
    let _lock = MUTEX.lock().await;
    let mut session = engine.new_session();
    session.model::<Entry>();
    let result = session.drop_table().await;
    assert!(result.is_ok(), "Failed to drop the ledger table: {:?}", result);
    let result = session.create_table().await;
    assert!(result.is_ok(), "Failed to create the ledger table: {:?}", result);
    drop(session);

    // Commit
    let written = engine
        .transaction(async |session: &mut Session<D::Connection>| -> Result<u64> {
            let first = session.insert(&[entry(1, "cash", 100.0)]).await?;
            let second = session
                .insert(&[entry(2, "bank", -40.5), entry(3, "bank", 12.25)])
                .await?;
            crate::silent_logs! {
                let outside = engine.new_session().model::<Entry>().count().await;
                assert!(
                    outside.as_ref().is_err_and(|e| e.is::<ConnectionBusy>()),
                    "Other sessions must not wait on an open transaction: {:?}",
                    outside
                );
            }
            Ok(first + second)
        })
        .await
        .expect("The transaction should commit");
    assert_eq!(written, 3);
    assert_eq!(total(engine).await, 3);

    // Rollback on error
    let result = engine
        .transaction(async |session: &mut Session<D::Connection>| -> Result<()> {
            session.insert(&[entry(4, "cash", 1.0)]).await?;
            session
                .model::<Entry>()
                .filter("account = ?", vec!["bank".into()])
                .delete()
                .await?;
            Err(Error::msg("Changed my mind"))
        })
        .await;
    assert!(
        result.as_ref().is_err_and(|e| e.to_string() == "Changed my mind"),
        "Expected the closure error back: {:?}",
        result
    );
    assert_eq!(total(engine).await, 3);

    // Rollback on a failing statement
    crate::silent_logs! {
        let result = engine
            .transaction(async |session: &mut Session<D::Connection>| -> Result<()> {
                session.insert(&[entry(5, "cash", 1.0)]).await?;
                session.insert(&[entry(1, "cash", 1.0)]).await?;
                Ok(())
            })
            .await;
        assert!(result.is_err(), "A duplicated key should fail the transaction");
    }
    assert_eq!(total(engine).await, 3);

    // Manual control
    let mut session = engine.new_session();
    session.begin().await.expect("Failed to begin");
    assert!(session.in_transaction());
    assert!(session.begin().await.is_err(), "Transactions do not nest");
    session
        .model::<Entry>()
        .filter("id = ?", vec![3.into()])
        .update([("amount", 0.5.into())])
        .await
        .expect("Failed to update inside the transaction");
    session.rollback().await.expect("Failed to roll back");
    assert!(!session.in_transaction());
    assert!(session.rollback().await.is_err(), "Nothing left to roll back");
    let amount = session
        .filter("id = ?", vec![3.into()])
        .first::<Entry>()
        .await
        .expect("Failed to read the entry")
        .map(|e| e.amount);
    assert_eq!(amount, Some(12.25));

    session.begin().await.expect("Failed to begin");
    session
        .filter("id = ?", vec![3.into()])
        .delete()
        .await
        .expect("Failed to delete inside the transaction");
    session.commit().await.expect("Failed to commit");
    drop(session);
    assert_eq!(total(engine).await, 2);

    let mut session = engine.new_session();
    session.model::<Entry>();
    let result = session.drop_table().await;
    assert!(result.is_ok(), "Failed to drop the ledger table: {:?}", result);
}

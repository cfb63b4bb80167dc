use borm::{Aborted, Driver, Engine, SessionOptions, Value, first_column};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn raw<D: Driver>(engine: &Engine<D>) {
    let _lock = MUTEX.lock().await;
    let mut session = engine.new_session();
    session.options(SessionOptions::new().history(true));

    let result = session.raw("DROP TABLE IF EXISTS notes", vec![]).exec().await;
    assert!(result.is_ok(), "Failed to drop the notes table: {:?}", result);
    let result = session
        .raw("CREATE TABLE notes (id integer PRIMARY KEY,", vec![])
        .raw("body text)", vec![])
        .exec()
        .await;
    assert!(result.is_ok(), "Failed to create the notes table: {:?}", result);

    let affected = session
        .raw("INSERT INTO notes (id, body) VALUES (?, ?)", vec![1.into(), "first".into()])
        .exec()
        .await
        .expect("Failed to insert the first note");
    assert_eq!(affected.rows_affected, 1);
    session
        .raw("INSERT INTO notes (id, body) VALUES (?, ?),", vec![2.into(), "second".into()])
        .raw("(?, ?)", vec![3.into(), Value::Varchar(None)])
        .exec()
        .await
        .expect("Failed to insert the other notes");

    let row = session
        .raw("SELECT body FROM notes WHERE id = ?", vec![2.into()])
        .query_row()
        .await
        .expect("Failed to query a note")
        .expect("The note should exist");
    assert_eq!(row.names(), ["body"]);
    assert_eq!(first_column::<String>(row).expect("Not a string"), "second");

    let none = session
        .raw("SELECT body FROM notes WHERE id = ?", vec![42.into()])
        .query_row()
        .await
        .expect("Failed to query a missing note");
    assert!(none.is_none());

    let rows = session
        .raw("SELECT id, body FROM notes ORDER BY id", vec![])
        .query_rows()
        .await
        .expect("Failed to query the notes");
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows.iter()
            .map(|r| r.get_column("body").map(Value::is_null))
            .collect::<Vec<_>>(),
        [Some(false), Some(false), Some(true)]
    );

    // An aborted statement never reaches the backend
    crate::silent_logs! {
        session.raw("DELETE FROM notes", vec![]).abort();
        let result = session.exec().await;
        assert!(
            result.as_ref().is_err_and(|e| e.is::<Aborted>()),
            "Expected the statement to be aborted: {:?}",
            result
        );
    }
    assert!(!session.is_aborted(), "The abort flag applies to one statement");
    let count = session
        .raw("SELECT count(*) FROM notes", vec![])
        .query_row()
        .await
        .expect("Failed to count")
        .map(first_column::<i64>)
        .transpose()
        .expect("Not an integer");
    assert_eq!(count, Some(3));

    let history = session.history().to_string();
    assert!(
        history.contains("INSERT INTO notes (id, body) VALUES (?, ?), (?, ?)[2, second, 3, NULL]\n"),
        "Unexpected history:\n{}",
        history
    );
    assert!(
        history.contains("SELECT body FROM notes WHERE id = ?[42]\n"),
        "Unexpected history:\n{}",
        history
    );
    assert!(
        !history.contains("DELETE FROM notes"),
        "Aborted statements are not part of the history"
    );

    let result = session.raw("DROP TABLE notes", vec![]).exec().await;
    assert!(result.is_ok(), "Failed to drop the notes table: {:?}", result);
}

use crate::{
    Aborted, AsValue, ColumnDef, Connection, ConnectionBusy, Driver, Engine, Error, Executor,
    HookRegistry, Lifecycle, Model, Query, QueryResult, Result, Row, RowLabeled, RowsAffected,
    Session, SessionOptions, SharedConnection, SqliteDialect, Value, stream,
};
use futures::FutureExt;
use indoc::indoc;
use std::{
    panic::AssertUnwindSafe,
    sync::{Arc, LazyLock, Mutex as StdMutex},
    time::Duration,
};

#[derive(Default, Debug)]
struct MockDriver;

impl Driver for MockDriver {
    type Connection = MockConnection;

    const NAME: &'static str = "mock";
}

/// Records every query, answers `SELECT` with the configured rows and
/// anything else with one affected row.
#[derive(Default)]
struct MockConnection {
    calls: Arc<StdMutex<Vec<Query>>>,
    rows: Vec<RowLabeled>,
}

impl Executor for MockConnection {
    fn run<'s>(
        &'s mut self,
        query: Query,
    ) -> impl stream::Stream<Item = Result<QueryResult>> + Send + 's {
        let results: Vec<Result<QueryResult>> = if query.sql.starts_with("FAIL") {
            vec![Err(Error::msg("Mock failure"))]
        } else if query.sql.starts_with("SELECT") {
            self.rows.iter().cloned().map(|v| Ok(v.into())).collect()
        } else {
            vec![Ok(RowsAffected {
                rows_affected: 1,
                last_affected_id: None,
            }
            .into())]
        };
        self.calls.lock().unwrap().push(query);
        stream::iter(results)
    }
}

impl Connection for MockConnection {
    type Driver = MockDriver;

    async fn connect(_url: &str) -> Result<Self> {
        Ok(Self::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct User {
    name: String,
    age: i32,
}

impl Model for User {
    fn table_name() -> &'static str {
        "User"
    }
    fn columns() -> &'static [ColumnDef] {
        static COLUMNS: LazyLock<Vec<ColumnDef>> = LazyLock::new(|| {
            vec![
                ColumnDef {
                    name: "Name",
                    value: String::as_empty_value(),
                    tag: "PRIMARY KEY",
                },
                ColumnDef {
                    name: "Age",
                    value: i32::as_empty_value(),
                    tag: "",
                },
            ]
        });
        &COLUMNS
    }
    fn row(&self) -> Row {
        Box::new([self.name.clone().as_value(), self.age.as_value()])
    }
    fn from_row(mut row: RowLabeled) -> Result<Self> {
        Ok(Self {
            name: String::try_from_value(row.take_column("Name").unwrap_or_default())?,
            age: i32::try_from_value(row.take_column("Age").unwrap_or_default())?,
        })
    }
}

impl Lifecycle<MockConnection> for User {
    async fn after_query(&mut self, _session: &mut Session<MockConnection>) -> Result<()> {
        self.name = self.name.to_uppercase();
        Ok(())
    }

    async fn before_insert(&self, _session: &mut Session<MockConnection>) -> Result<()> {
        if self.age < 0 {
            return Err(Error::msg("Age cannot be negative"));
        }
        Ok(())
    }
}

/// A model whose reads are always vetoed.
#[derive(Debug)]
struct Locked {
    id: i64,
}

impl Model for Locked {
    fn table_name() -> &'static str {
        "Locked"
    }
    fn columns() -> &'static [ColumnDef] {
        static COLUMNS: LazyLock<Vec<ColumnDef>> = LazyLock::new(|| {
            vec![ColumnDef {
                name: "id",
                value: i64::as_empty_value(),
                tag: "",
            }]
        });
        &COLUMNS
    }
    fn row(&self) -> Row {
        Box::new([self.id.as_value()])
    }
    fn from_row(mut row: RowLabeled) -> Result<Self> {
        Ok(Self {
            id: i64::try_from_value(row.take_column("id").unwrap_or_default())?,
        })
    }
}

impl Lifecycle<MockConnection> for Locked {
    async fn before_query(session: &mut Session<MockConnection>) -> Result<()> {
        session.abort();
        Ok(())
    }

    async fn before_delete(session: &mut Session<MockConnection>) -> Result<()> {
        session.abort();
        Ok(())
    }
}

fn user_row(name: &str, age: i64) -> RowLabeled {
    RowLabeled::new(
        ["Name".to_string(), "Age".to_string()].into(),
        Box::new([Value::from(name), Value::from(age)]),
    )
}

struct Fixture {
    session: Session<MockConnection>,
    connection: SharedConnection<MockConnection>,
    calls: Arc<StdMutex<Vec<Query>>>,
}

impl Fixture {
    fn new(rows: Vec<RowLabeled>) -> Self {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let connection = SharedConnection::new(MockConnection {
            calls: calls.clone(),
            rows,
        });
        let mut hooks = HookRegistry::<MockConnection>::new();
        hooks.register::<User>().register::<Locked>();
        let session = Session::new(
            connection.clone(),
            Arc::new(SqliteDialect),
            Arc::new(hooks),
            SessionOptions::default(),
        );
        Self {
            session,
            connection,
            calls,
        }
    }

    fn sql(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|v| v.sql.clone())
            .collect()
    }

    fn last(&self) -> Query {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[test]
fn raw_is_space_joined() {
    let mut fixture = Fixture::new(vec![]);
    fixture
        .session
        .raw("SELECT *", vec![])
        .raw("FROM User WHERE Age > ?", vec![18.into()])
        .raw("AND Name = ?", vec!["bob".into()]);
    assert_eq!(
        fixture.session.pending_sql(),
        "SELECT * FROM User WHERE Age > ? AND Name = ?"
    );
    assert_eq!(
        fixture.session.pending_args(),
        [Value::Int32(Some(18)), Value::Varchar(Some("bob".into()))]
    );
}

#[tokio::test]
async fn abort_skips_backend() {
    let mut fixture = Fixture::new(vec![]);
    fixture.session.model::<User>().filter("Age > ?", vec![1.into()]);
    fixture.session.raw("DELETE FROM User", vec![]).abort();
    let error = fixture.session.exec().await.unwrap_err();
    assert!(error.is::<Aborted>());
    assert!(fixture.sql().is_empty());
    assert!(fixture.session.is_idle());
    assert!(!fixture.session.is_aborted());

    // The flag is consumed by the aborted statement
    fixture.session.raw("DELETE FROM User", vec![]).exec().await.unwrap();
    assert_eq!(fixture.sql(), ["DELETE FROM User"]);
}

#[tokio::test]
async fn state_reset_after_failure() {
    let mut fixture = Fixture::new(vec![]);
    fixture.session.limit(3);
    let result = fixture.session.raw("FAIL", vec![1.into()]).exec().await;
    assert!(result.is_err());
    assert!(fixture.session.is_idle());
}

#[tokio::test]
async fn history() {
    let mut fixture = Fixture::new(vec![]);
    fixture.session.raw("DELETE FROM User", vec![]).exec().await.unwrap();
    assert_eq!(fixture.session.history(), "");

    fixture.session.enable_history(true);
    fixture
        .session
        .raw("DELETE FROM User WHERE Age > ? AND Name = ?", vec![
            30.into(),
            "bob".into(),
        ])
        .exec()
        .await
        .unwrap();
    fixture.session.raw("DROP TABLE IF EXISTS User", vec![]).exec().await.unwrap();
    assert_eq!(
        fixture.session.history(),
        indoc! {"
            DELETE FROM User WHERE Age > ? AND Name = ?[30, bob]
            DROP TABLE IF EXISTS User[]
        "}
    );
}

#[tokio::test]
async fn insert() {
    let mut fixture = Fixture::new(vec![]);
    let affected = fixture
        .session
        .insert(&[
            User {
                name: "alice".into(),
                age: 30,
            },
            User {
                name: "bob".into(),
                age: 25,
            },
        ])
        .await
        .unwrap();
    assert_eq!(affected, 1);
    let query = fixture.last();
    assert_eq!(query.sql, "INSERT INTO User (Name,Age)  VALUES (?,?), (?,?)");
    assert_eq!(
        query.args,
        [
            Value::Varchar(Some("alice".into())),
            Value::Int32(Some(30)),
            Value::Varchar(Some("bob".into())),
            Value::Int32(Some(25)),
        ]
    );
    assert_eq!(fixture.session.insert::<User>(&[]).await.unwrap(), 0);
    assert_eq!(fixture.sql().len(), 1);
}

#[tokio::test]
async fn find_with_filter_order_and_page() {
    let mut fixture = Fixture::new(vec![user_row("alice", 30), user_row("bob", 25)]);
    let users = fixture
        .session
        .filter("Age > ?", vec![18.into()])
        .order_by("Name DESC")
        .page(3, 10)
        .find::<User>()
        .await
        .unwrap();
    assert_eq!(
        users,
        [
            User {
                name: "alice".into(),
                age: 30
            },
            User {
                name: "bob".into(),
                age: 25
            },
        ]
    );
    let query = fixture.last();
    assert_eq!(
        query.sql,
        "SELECT Name,Age FROM User  WHERE Age > ? ORDER BY Name DESC LIMIT ? OFFSET ?"
    );
    assert_eq!(
        query.args,
        [
            Value::Int32(Some(18)),
            Value::Int64(Some(10)),
            Value::Int64(Some(20))
        ]
    );
}

#[tokio::test]
async fn first() {
    let mut fixture = Fixture::new(vec![user_row("alice", 30)]);
    let user = fixture
        .session
        .filter("Name = ?", vec!["alice".into()])
        .first::<User>()
        .await
        .unwrap();
    assert_eq!(user.map(|v| v.age), Some(30));
    assert_eq!(
        fixture.last().sql,
        "SELECT Name,Age FROM User  WHERE Name = ? LIMIT ?"
    );

    let mut fixture = Fixture::new(vec![]);
    assert!(fixture.session.first::<User>().await.unwrap().is_none());
}

#[tokio::test]
async fn hooks_disabled_by_default() {
    let mut fixture = Fixture::new(vec![user_row("alice", 30)]);
    let users = fixture.session.find::<User>().await.unwrap();
    assert_eq!(users[0].name, "alice");
    assert!(fixture.session.find::<Locked>().await.is_ok());
}

#[tokio::test]
async fn after_query_hook() {
    let mut fixture = Fixture::new(vec![user_row("alice", 30)]);
    let users = fixture
        .session
        .enable_hook(true)
        .find::<User>()
        .await
        .unwrap();
    assert_eq!(users[0].name, "ALICE");
}

#[tokio::test]
async fn before_query_abort() {
    let mut fixture = Fixture::new(vec![]);
    let error = fixture
        .session
        .enable_hook(true)
        .filter("id = ?", vec![1.into()])
        .find::<Locked>()
        .await
        .unwrap_err();
    assert!(error.is::<Aborted>());
    assert!(fixture.sql().is_empty());
    assert!(fixture.session.is_idle());

    let error = fixture.session.delete().await.unwrap_err();
    assert!(error.is::<Aborted>());
    assert!(fixture.sql().is_empty());
}

#[tokio::test]
async fn hook_error_does_not_abort() {
    let mut fixture = Fixture::new(vec![]);
    fixture
        .session
        .enable_hook(true)
        .insert(&[User {
            name: "nobody".into(),
            age: -1,
        }])
        .await
        .unwrap();
    assert_eq!(fixture.sql(), ["INSERT INTO User (Name,Age)  VALUES (?,?)"]);
}

#[tokio::test]
async fn update_delete_count() {
    let count = RowLabeled::new(["count(*)".to_string()].into(), Box::new([Value::from(7_i64)]));
    let mut fixture = Fixture::new(vec![count]);
    let session = &mut fixture.session;
    session.model::<User>();

    session.filter("Name = ?", vec!["bob".into()]);
    session
        .update([("Age", Value::from(31)), ("Name", Value::from("robert"))])
        .await
        .unwrap();
    session.filter("Age < ?", vec![18.into()]);
    session.delete().await.unwrap();
    assert_eq!(session.filter("Age > ?", vec![0.into()]).count().await.unwrap(), 7);

    let calls = fixture.calls.lock().unwrap().clone();
    assert_eq!(calls[0].sql, "UPDATE User SET Age = ?, Name = ? WHERE Name = ?");
    assert_eq!(
        calls[0].args,
        [
            Value::Int32(Some(31)),
            Value::Varchar(Some("robert".into())),
            Value::Varchar(Some("bob".into())),
        ]
    );
    assert_eq!(calls[1].sql, "DELETE FROM User WHERE Age < ?");
    assert_eq!(calls[2].sql, "SELECT count(*) FROM User  WHERE Age > ?");
}

#[tokio::test]
async fn operations_need_a_model() {
    let mut fixture = Fixture::new(vec![]);
    assert!(fixture.session.delete().await.is_err());
    assert!(fixture.session.count().await.is_err());
    assert!(fixture.session.create_table().await.is_err());
    assert!(fixture.sql().is_empty());
}

#[tokio::test]
async fn failed_operations_leave_the_session_idle() {
    let mut fixture = Fixture::new(vec![]);
    let session = &mut fixture.session;
    assert!(session.filter("Age > ?", vec![99.into()]).delete().await.is_err());
    assert!(session.is_idle());
    assert!(
        session
            .filter("Age > ?", vec![99.into()])
            .update([("Age", Value::from(1))])
            .await
            .is_err()
    );
    assert!(session.is_idle());
    assert!(session.filter("Age > ?", vec![99.into()]).limit(3).count().await.is_err());
    assert!(session.is_idle());
    assert!(session.order_by("Age").create_table().await.is_err());
    assert!(session.is_idle());
    assert!(session.offset(2).drop_table().await.is_err());
    assert!(session.is_idle());
    assert!(session.limit(1).has_table().await.is_err());
    assert!(session.is_idle());

    session.model::<User>().find::<User>().await.unwrap();
    assert_eq!(fixture.sql(), ["SELECT Name,Age FROM User "]);
    assert!(fixture.last().args.is_empty());
}

#[tokio::test]
async fn table_statements() {
    let exists = RowLabeled::new(["name".to_string()].into(), Box::new([Value::from("User")]));
    let mut fixture = Fixture::new(vec![exists]);
    let session = &mut fixture.session;
    session.model::<User>();
    session.drop_table().await.unwrap();
    session.create_table().await.unwrap();
    assert!(session.has_table().await.unwrap());
    assert_eq!(
        fixture.sql(),
        [
            "DROP TABLE IF EXISTS User",
            "CREATE TABLE User (Name text PRIMARY KEY, Age integer)",
            "SELECT name FROM sqlite_master WHERE type = 'table' and name = ?",
        ]
    );
    assert_eq!(fixture.last().args, [Value::Varchar(Some("User".into()))]);

    let mut fixture = Fixture::new(vec![]);
    assert!(!fixture.session.model::<User>().has_table().await.unwrap());
}

#[tokio::test]
async fn model_rebinds_on_type_change() {
    let mut fixture = Fixture::new(vec![]);
    let session = &mut fixture.session;
    assert_eq!(session.model::<User>().ref_table().unwrap().name, "User");
    assert!(session.model::<User>().ref_table().unwrap().is::<User>());
    assert_eq!(session.model::<Locked>().ref_table().unwrap().name, "Locked");
}

#[tokio::test]
async fn transaction_holds_the_connection() {
    let mut fixture = Fixture::new(vec![]);
    fixture.session.begin().await.unwrap();
    assert!(fixture.session.in_transaction());
    assert!(fixture.connection.connection.try_lock().is_err());
    assert!(fixture.connection.in_transaction());
    assert!(fixture.session.begin().await.is_err());

    fixture.session.raw("DELETE FROM User", vec![]).exec().await.unwrap();
    fixture.session.commit().await.unwrap();
    assert!(fixture.connection.connection.try_lock().is_ok());
    assert!(!fixture.connection.in_transaction());
    assert_eq!(fixture.sql(), ["BEGIN", "DELETE FROM User", "COMMIT"]);

    assert!(fixture.session.commit().await.is_err());
    assert!(fixture.session.rollback().await.is_err());
}

#[tokio::test]
async fn dropped_session_rolls_back() {
    let fixture = Fixture::new(vec![]);
    let Fixture {
        mut session,
        connection,
        calls,
    } = fixture;
    session.begin().await.unwrap();
    drop(session);
    let _guard = connection.connection.lock().await;
    assert!(!connection.in_transaction());
    let sql: Vec<_> = calls.lock().unwrap().iter().map(|v| v.sql.clone()).collect();
    assert_eq!(sql, ["BEGIN", "ROLLBACK"]);
}

fn engine() -> (Engine<MockDriver>, Arc<StdMutex<Vec<Query>>>) {
    let connection = MockConnection::default();
    let calls = connection.calls.clone();
    let mut engine = Engine::<MockDriver>::new(connection, Arc::new(SqliteDialect))
        .with_options(SessionOptions::new().history(true));
    engine.register_hooks::<User>();
    (engine, calls)
}

fn statements(calls: &Arc<StdMutex<Vec<Query>>>) -> Vec<String> {
    calls.lock().unwrap().iter().map(|v| v.sql.clone()).collect()
}

#[tokio::test]
async fn engine_transaction_commits() {
    let (engine, calls) = engine();
    let value = engine
        .transaction(async |session| -> Result<i32> {
            assert!(session.history().is_empty());
            session.raw("DELETE FROM User", vec![]).exec().await?;
            Ok(42)
        })
        .await
        .unwrap();
    assert_eq!(value, 42);
    assert_eq!(statements(&calls), ["BEGIN", "DELETE FROM User", "COMMIT"]);
}

#[tokio::test]
async fn engine_transaction_rolls_back_on_error() {
    let (engine, calls) = engine();
    let error = engine
        .transaction(async |session| -> Result<()> {
            session.raw("DELETE FROM User", vec![]).exec().await?;
            Err(Error::msg("Callback failed"))
        })
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Callback failed");
    assert_eq!(statements(&calls), ["BEGIN", "DELETE FROM User", "ROLLBACK"]);
}

#[tokio::test]
async fn engine_transaction_rolls_back_on_panic() {
    let (engine, calls) = engine();
    let result = AssertUnwindSafe(engine.transaction(async |_session| -> Result<()> {
        panic!("Callback panicked");
    }))
    .catch_unwind()
    .await;
    assert!(result.is_err());
    assert_eq!(statements(&calls), ["BEGIN", "ROLLBACK"]);
}

#[tokio::test]
async fn other_sessions_fail_fast_inside_a_transaction() {
    let (engine, calls) = engine();
    let transaction = engine.transaction(async |session| -> Result<()> {
        session.raw("DELETE FROM User", vec![]).exec().await?;
        let mut other = engine.new_session();
        let error = other.raw("SELECT 1", vec![]).query_rows().await.unwrap_err();
        assert!(error.is::<ConnectionBusy>());
        assert!(other.is_idle());
        assert!(other.begin().await.unwrap_err().is::<ConnectionBusy>());
        assert!(!other.in_transaction());
        Ok(())
    });
    let result = tokio::time::timeout(Duration::from_secs(2), transaction).await;
    assert!(result.is_ok(), "The transaction waited on its own connection");
    result.unwrap().unwrap();
    assert_eq!(statements(&calls), ["BEGIN", "DELETE FROM User", "COMMIT"]);

    engine
        .new_session()
        .raw("SELECT 1", vec![])
        .query_rows()
        .await
        .unwrap();
}

#[tokio::test]
async fn engine_connect() {
    let registry = crate::DialectRegistry::with_builtin();
    assert!(Engine::<MockDriver>::connect("mock://memory", &registry).await.is_err());

    let mut registry = crate::DialectRegistry::new();
    registry.register("mock", SqliteDialect);
    let engine = Engine::<MockDriver>::connect("mock://memory", &registry)
        .await
        .unwrap();
    let session = engine.new_session();
    assert!(session.is_idle());
    assert_eq!(engine.dialect().name(), "sqlite");
    drop(session);
    engine.close();
}

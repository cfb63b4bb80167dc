use borm::{Driver, Engine, Model, Value};
use rust_decimal::Decimal;
use std::sync::LazyLock;
use time::{PrimitiveDateTime, macros::datetime};
use tokio::sync::Mutex;
use uuid::Uuid;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Model, Debug, Clone, PartialEq)]
#[borm(name = "users")]
pub struct User {
    #[borm(tag = "PRIMARY KEY")]
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
    pub active: bool,
    pub joined: PrimitiveDateTime,
    pub token: Uuid,
    pub balance: Decimal,
}

fn user(name: &str, age: i32, email: Option<&str>) -> User {
    User {
        name: name.into(),
        age,
        email: email.map(Into::into),
        active: true,
        joined: datetime!(2024-03-01 12:30:00),
        token: Uuid::from_u128(0x5eed_0000 + age as u128),
        balance: Decimal::new(age as i64 * 25, 1),
    }
}

pub async fn users<D: Driver>(engine: &Engine<D>) {
    let _lock = MUTEX.lock().await;
    let mut session = engine.new_session();

    // Setup
    session.model::<User>();
    let result = session.drop_table().await;
    assert!(result.is_ok(), "Failed to drop the users table: {:?}", result);
    let result = session.create_table().await;
    assert!(result.is_ok(), "Failed to create the users table: {:?}", result);
    assert!(
        session.has_table().await.expect("Failed to look up the users table"),
        "The users table should exist after creation"
    );

    assert_eq!(session.insert::<User>(&[]).await.expect("Empty insert"), 0);
    let inserted = session
        .insert(&[
            user("alice", 31, Some("alice@example.com")),
            user("bob", 25, None),
            user("carol", 47, Some("carol@example.com")),
            user("dave", 19, None),
        ])
        .await
        .expect("Failed to insert the users");
    assert_eq!(inserted, 4);
    assert_eq!(session.count().await.expect("Failed to count"), 4);

    // Read back
    let all = session
        .order_by("name")
        .find::<User>()
        .await
        .expect("Failed to find the users");
    assert_eq!(
        all.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
        ["alice", "bob", "carol", "dave"]
    );
    assert_eq!(all[0], user("alice", 31, Some("alice@example.com")));
    assert_eq!(all[1].email, None);

    let adults = session
        .filter("age > ?", vec![20.into()])
        .order_by("age DESC")
        .find::<User>()
        .await
        .expect("Failed to filter the users");
    assert_eq!(
        adults.iter().map(|u| u.age).collect::<Vec<_>>(),
        [47, 31, 25]
    );

    let found = session
        .filter("name = ?", vec!["bob".into()])
        .first::<User>()
        .await
        .expect("Failed to find bob");
    assert_eq!(found, Some(user("bob", 25, None)));
    let missing = session
        .filter("name = ?", vec!["mallory".into()])
        .first::<User>()
        .await
        .expect("Failed to look for mallory");
    assert_eq!(missing, None);

    // Paging
    let second = session
        .order_by("name")
        .page(2, 3)
        .find::<User>()
        .await
        .expect("Failed to read the second page");
    assert_eq!(second, [user("dave", 19, None)]);
    let beyond = session
        .order_by("name")
        .page(3, 3)
        .find::<User>()
        .await
        .expect("Failed to read past the last page");
    assert!(beyond.is_empty());
    let window = session
        .order_by("age")
        .limit(2)
        .offset(1)
        .find::<User>()
        .await
        .expect("Failed to read with limit and offset");
    assert_eq!(
        window.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
        ["bob", "alice"]
    );

    // Modify
    let updated = session
        .filter("age < ?", vec![30.into()])
        .update([("active", Value::from(false)), ("age", Value::from(30))])
        .await
        .expect("Failed to update the users");
    assert_eq!(updated, 2);
    let inactive = session
        .filter("active = ?", vec![false.into()])
        .count()
        .await
        .expect("Failed to count the inactive users");
    assert_eq!(inactive, 2);
    let bob = session
        .filter("name = ?", vec!["bob".into()])
        .first::<User>()
        .await
        .expect("Failed to find bob")
        .expect("Bob should still exist");
    assert_eq!(bob.age, 30);
    assert!(!bob.active);

    let deleted = session
        .filter("active = ?", vec![false.into()])
        .delete()
        .await
        .expect("Failed to delete the inactive users");
    assert_eq!(deleted, 2);
    assert_eq!(session.count().await.expect("Failed to count"), 2);

    // Duplicated primary key
    crate::silent_logs! {
        let result = session.insert(&[user("alice", 1, None)]).await;
        assert!(result.is_err(), "Inserting a duplicated key should fail");
    }
    assert!(session.is_idle(), "A failed statement must not leak into the next one");
    assert_eq!(session.count().await.expect("Failed to count"), 2);

    let result = session.drop_table().await;
    assert!(result.is_ok(), "Failed to drop the users table: {:?}", result);
    assert!(
        !session.has_table().await.expect("Failed to look up the users table"),
        "The users table should not exist after dropping it"
    );
}

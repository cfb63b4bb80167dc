use borm::{Driver, Engine, Model, Result, Session};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Key/value entry of a persistent cache.
#[allow(non_snake_case)]
#[derive(Model, Debug, Clone, PartialEq)]
pub struct Item {
    #[borm(tag = "PRIMARY KEY")]
    pub Key: String,
    pub Value: String,
}

async fn get<C: borm::Connection>(session: &mut Session<C>, key: &str) -> Result<Option<String>> {
    let item = session
        .filter("Key = ?", vec![key.into()])
        .first::<Item>()
        .await?;
    Ok(item.map(|v| v.Value))
}

async fn set<C: borm::Connection>(session: &mut Session<C>, key: &str, value: &str) -> Result<()> {
    session.model::<Item>();
    let existing = session.filter("Key = ?", vec![key.into()]).count().await?;
    if existing > 0 {
        session
            .filter("Key = ?", vec![key.into()])
            .update([("Value", value.into())])
            .await?;
    } else {
        session
            .insert(&[Item {
                Key: key.into(),
                Value: value.into(),
            }])
            .await?;
    }
    Ok(())
}

pub async fn cache<D: Driver>(engine: &Engine<D>) {
    let _lock = MUTEX.lock().await;
    let mut session = engine.new_session();
    session.model::<Item>();
    let result = session.drop_table().await;
    assert!(result.is_ok(), "Failed to drop the Item table: {:?}", result);
    let result = session.create_table().await;
    assert!(result.is_ok(), "Failed to create the Item table: {:?}", result);

    assert_eq!(get(&mut session, "missing").await.expect("Failed to get"), None);

    set(&mut session, "greeting", "hello").await.expect("Failed to set");
    set(&mut session, "empty", "").await.expect("Failed to set");
    assert_eq!(
        get(&mut session, "greeting").await.expect("Failed to get"),
        Some("hello".to_string())
    );
    assert_eq!(
        get(&mut session, "empty").await.expect("Failed to get"),
        Some(String::new())
    );

    set(&mut session, "greeting", "ciao, 世界").await.expect("Failed to overwrite");
    assert_eq!(
        get(&mut session, "greeting").await.expect("Failed to get"),
        Some("ciao, 世界".to_string())
    );
    session.model::<Item>();
    assert_eq!(session.count().await.expect("Failed to count"), 2);

    let result = session.drop_table().await;
    assert!(result.is_ok(), "Failed to drop the Item table: {:?}", result);
}

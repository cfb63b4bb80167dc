#[cfg(test)]
mod tests {
    use borm::{DialectRegistry, Engine};
    use borm_sqlite::SqliteDriver;
    use borm_tests::{execute_tests, init_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).await.expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        let engine = Engine::<SqliteDriver>::connect(
            &format!("sqlite://{}?mode=rwc", DB_PATH),
            &DialectRegistry::with_builtin(),
        )
        .await
        .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        execute_tests(engine).await;
    }
}

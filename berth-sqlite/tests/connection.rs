#[cfg(test)]
mod tests {
    use berth_core::{Connection, SqlSupport, Statement, Value};
    use berth_sqlite::{SqliteConnection, SqliteError};
    use berth_tests::{init_logs, silent_logs};
    use libsqlite3_sys::SQLITE_BUSY;
    use std::{
        fs,
        path::Path,
        sync::{Mutex, mpsc},
        thread,
        time::Duration,
    };

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn create_database() {
        init_logs();
        const DB_PATH: &'static str = concat!(env!("CARGO_TARGET_TMPDIR"), "/creation.sqlite");
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH))
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SqliteConnection::connect(&format!("sqlite://{}?mode=ro", DB_PATH)).is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[test]
    fn percent_encoded_path() {
        init_logs();
        const DB_PATH: &'static str = concat!(env!("CARGO_TARGET_TMPDIR"), "/with space.sqlite");
        let _guard = MUTEX.lock().unwrap();
        let _ = fs::remove_file(DB_PATH);
        let encoded = DB_PATH.replace(' ', "%20");
        SqliteConnection::connect(&format!("sqlite://{}", encoded))
            .expect("Could not open the database");
        assert!(Path::new(DB_PATH).exists());
        let _ = fs::remove_file(DB_PATH);
    }

    #[test]
    fn wrong_url() {
        silent_logs! {
            assert!(SqliteConnection::connect("postgres://some_value").is_err());
        }
    }

    #[test]
    fn multiple_statements() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:").unwrap();
        silent_logs! {
            assert!(connection.prepare("SELECT 1; SELECT 2", false).is_err());
            assert!(connection.prepare("   ", false).is_err());
        }
        assert!(connection.prepare("SELECT 1;  ", false).is_ok());
    }

    #[test]
    fn native_error() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:").unwrap();
        silent_logs! {
            let error = connection
                .prepare("SELECT * FROM missing_table", false)
                .err()
                .expect("Preparing a query on a missing table must fail");
            assert!(error.is::<SqliteError>());
            assert!(format!("{error:#}").contains("missing_table"));
        }
    }

    #[test]
    fn bind_and_read() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:").unwrap();
        let mut statement = connection
            .prepare("SELECT ? AS a, ? AS b, ? AS c, ? AS d", false)
            .unwrap();
        statement.bind(1, Value::Int32(Some(7))).unwrap();
        statement.bind(2, Value::Varchar(None)).unwrap();
        statement.bind(3, Value::Boolean(Some(true))).unwrap();
        statement
            .bind(
                4,
                Value::List(
                    Some(vec![Value::Int64(Some(1)), Value::Int64(Some(2))]),
                    Box::new(Value::Int64(None)),
                ),
            )
            .unwrap();
        let rows = statement.query().unwrap().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.names(), ["a", "b", "c", "d"]);
        assert_eq!(row.get(1).unwrap(), &Value::Int64(Some(7)));
        assert_eq!(row.get(2).unwrap(), &Value::Null);
        assert_eq!(row.get(3).unwrap(), &Value::Int64(Some(1)));
        assert_eq!(row.get(4).unwrap(), &Value::Varchar(Some("[1,2]".into())));
        assert!(row.get(5).is_err());
    }

    #[test]
    fn blob_in_list() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:").unwrap();
        let mut statement = connection.prepare("SELECT ?", false).unwrap();
        silent_logs! {
            assert!(
                statement
                    .bind(
                        1,
                        Value::List(
                            Some(vec![Value::Blob(Some([1u8, 2].into()))]),
                            Box::new(Value::Blob(None)),
                        ),
                    )
                    .is_err()
            );
        }
    }

    #[test]
    fn busy_database_fails() {
        init_logs();
        const DB_PATH: &'static str = concat!(env!("CARGO_TARGET_TMPDIR"), "/busy.sqlite");
        let _guard = MUTEX.lock().unwrap();
        let _ = fs::remove_file(DB_PATH);
        let url = format!("sqlite://{}", DB_PATH);
        let support = SqlSupport::default();
        let mut holder = SqliteConnection::connect(&url).expect("Could not open the database");
        support
            .sql("CREATE TABLE t (x INTEGER)")
            .update(&mut holder)
            .expect("Failed to create the table");
        support
            .sql("BEGIN IMMEDIATE")
            .update(&mut holder)
            .expect("Failed to take the write lock");

        let (sender, receiver) = mpsc::channel();
        let writer = thread::spawn(move || {
            let mut connection =
                SqliteConnection::connect(&url).expect("Could not open the database");
            let result = silent_logs! {
                SqlSupport::default()
                    .sql("INSERT INTO t VALUES (1)")
                    .update(&mut connection)
            };
            let code = result.map_err(|e| e.downcast_ref::<SqliteError>().map(|e| e.code));
            let _ = sender.send(code);
        });
        let result = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("The second writer must not wait for the lock");
        writer.join().expect("The writer thread panicked");
        assert_eq!(result, Err(Some(SQLITE_BUSY)));

        support
            .sql("COMMIT")
            .update(&mut holder)
            .expect("Failed to release the write lock");
        drop(holder);
        let _ = fs::remove_file(DB_PATH);
    }

    #[test]
    fn rows_affected_by_ddl() {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:").unwrap();
        let support = SqlSupport::default();
        let mut update = |sql: &str| support.sql(sql).update(&mut connection).unwrap();
        assert_eq!(update("CREATE TABLE a (x INTEGER)"), 0);
        assert_eq!(update("INSERT INTO a VALUES (1), (2), (3)"), 3);
        // The count of the previous insert does not leak into statements changing no rows
        assert_eq!(update("CREATE TABLE b (x INTEGER)"), 0);
        assert_eq!(update("UPDATE a SET x = 0 WHERE x > 10"), 0);
        assert_eq!(update("DELETE FROM a WHERE x < 3"), 2);

        let mut statement = connection.prepare("DROP TABLE b", true).unwrap();
        let affected = statement.execute().unwrap();
        assert_eq!(affected.rows_affected, 0);
        assert_eq!(affected.last_affected_id, None);
        assert_eq!(statement.generated_keys().unwrap().count(), 0);
    }
}

use crate::{dialect, recreate_table, silent_logs};
use berth::{
    AsValue, Connection, Driver, Error, SqlSupport, SupportOptions, TypeMappingError, WrappedError,
    from_row,
};
use indoc::indoc;
use std::{
    collections::HashMap,
    sync::{LazyLock, Mutex},
};

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(berth::Entity, Default, Debug, Clone, PartialEq)]
struct Ledger {
    id: Option<i64>,
    account: String,
    amount: i64,
}

fn setup<C: Connection>(connection: &mut C) {
    recreate_table(
        connection,
        "ledger",
        indoc! {"
            CREATE TABLE ledger (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account TEXT NOT NULL,
                amount INTEGER NOT NULL
            )
        "},
        indoc! {"
            CREATE TABLE ledger (
                id BIGSERIAL PRIMARY KEY,
                account TEXT NOT NULL,
                amount BIGINT NOT NULL
            )
        "},
    );
}

/// Insert statement returning the generated `id` on every store.
fn insert_sql<C: Connection>(connection: &C) -> String {
    let returning = match <C::Driver as Driver>::NAME {
        "postgres" => " RETURNING id",
        _ => "",
    };
    dialect(
        connection,
        &format!("INSERT INTO ledger (account, amount) VALUES (?, ?){returning}"),
    )
}

pub fn support<C: Connection>(connection: &mut C) {
    let _lock = MUTEX.lock().unwrap();
    setup(connection);
    let support = SqlSupport::default();

    // Insert
    let insert = insert_sql(connection);
    let mut keys = Vec::new();
    for (account, amount) in [("alice", 10), ("bob", 20), ("alice", 5)] {
        let key = support
            .sql(insert.clone())
            .bind(|s| {
                s.bind_value(1, account.to_string())?;
                s.bind_value(2, amount as i64)
            })
            .insert::<_, i64>(connection)
            .expect("Failed to insert the ledger entry")
            .expect("The store did not return the generated key");
        keys.push(key);
    }
    assert_eq!(keys.len(), 3);

    // Query
    let total = support
        .sql("SELECT CAST(SUM(amount) AS BIGINT) AS total FROM ledger")
        .map_row(|row| i64::try_from_value(row.get(1)?.clone()))
        .query(connection)
        .expect("Failed to query the total");
    assert_eq!(total, Some(35));
    let nothing = support
        .sql(dialect(connection, "SELECT id FROM ledger WHERE amount > ?"))
        .bind(|s| s.bind_value(1, 1000i64))
        .map_row(|row| i64::try_from_value(row.get(1)?.clone()))
        .query(connection)
        .expect("Failed to query the missing entry");
    assert_eq!(nothing, None);

    // Query list, in order, with the row index
    let entries = support
        .sql(dialect(
            connection,
            "SELECT id, account, amount FROM ledger WHERE account = ? ORDER BY amount",
        ))
        .bind(|s| s.bind_value(1, "alice".to_string()))
        .map(|row, i| Ok((i, from_row::<Ledger>(row)?)))
        .query_list(connection)
        .expect("Failed to query alice's entries");
    assert_eq!(
        entries,
        vec![
            (
                0,
                Ledger {
                    id: Some(keys[2]),
                    account: "alice".into(),
                    amount: 5,
                }
            ),
            (
                1,
                Ledger {
                    id: Some(keys[0]),
                    account: "alice".into(),
                    amount: 10,
                }
            ),
        ]
    );

    // Query map
    let amounts = support
        .sql("SELECT id, amount FROM ledger")
        .map_row(|row| i64::try_from_value(row.get_column("amount").cloned().unwrap_or_default()))
        .key(|row, _| i64::try_from_value(row.get(1)?.clone()))
        .query_map(connection)
        .expect("Failed to query the amounts");
    assert_eq!(
        amounts,
        HashMap::from([(keys[0], 10), (keys[1], 20), (keys[2], 5)])
    );

    // Update
    let changed = support
        .sql(dialect(
            connection,
            "UPDATE ledger SET amount = amount + ? WHERE account = ?",
        ))
        .bind(|s| {
            s.bind_value(1, 1i64)?;
            s.bind_value(2, "alice".to_string())
        })
        .update(connection)
        .expect("Failed to update alice's entries");
    assert_eq!(changed, 2);
    let unchanged = support
        .sql(dialect(connection, "DELETE FROM ledger WHERE account = ?"))
        .bind(|s| s.bind_value(1, "carol".to_string()))
        .update(connection)
        .expect("Failed to delete carol's entries");
    assert_eq!(unchanged, 0);

    // Entities stay consistent with raw statements
    assert_eq!(
        <Ledger as berth::Entity>::find(connection, keys[2]).expect("Failed to find the entry"),
        Some(Ledger {
            id: Some(keys[2]),
            account: "alice".into(),
            amount: 6,
        })
    );
}

pub fn support_errors<C: Connection>(connection: &mut C) {
    let _lock = MUTEX.lock().unwrap();
    setup(connection);
    let support = SqlSupport::default();
    let insert = insert_sql(connection);
    support
        .sql(insert.clone())
        .bind(|s| {
            s.bind_value(1, "alice".to_string())?;
            s.bind_value(2, 1i64)
        })
        .insert::<_, i64>(connection)
        .expect("Failed to insert the ledger entry");

    silent_logs! {
        // Errors of the store pass through
        let error = support
            .sql("SELECT missing_column FROM ledger")
            .map_row(|row| Ok(row.len()))
            .query_list(connection)
            .expect_err("Selecting a missing column must fail");
        assert!(
            error.is::<<C::Driver as Driver>::Error>(),
            "Unexpected error: {error:#}"
        );

        // Unexpected callback failures are wrapped
        let error = support
            .sql("SELECT account FROM ledger")
            .map_row(|_| -> berth::Result<()> { Err(Error::msg("the mapping gave up")) })
            .query_list(connection)
            .expect_err("A failing mapping must fail the query");
        let wrapped = error
            .downcast_ref::<WrappedError>()
            .expect("The error must be a WrappedError");
        assert!(wrapped.0.to_string().contains("the mapping gave up"));
        let error = support
            .sql(insert.clone())
            .bind(|_| Err(Error::msg("the binding gave up")))
            .update(connection)
            .expect_err("A failing binding must fail the update");
        assert!(error.is::<WrappedError>());

        // Mapping errors of the crate pass through
        let error = support
            .sql("SELECT account FROM ledger")
            .map_row(|row| i64::try_from_value(row.get(1)?.clone()).map_err(|e| {
                Error::new(TypeMappingError::new("account", format!("{e:#}")))
            }))
            .query(connection)
            .expect_err("Converting text into an integer must fail");
        assert!(error.is::<TypeMappingError>());

        // A parameter the statement does not have is a failure of the driver, not of the callback
        let error = support
            .sql(dialect(connection, "SELECT id FROM ledger WHERE account = ?"))
            .bind(|s| s.bind_value(99, "alice".to_string()))
            .update(connection)
            .expect_err("Binding a missing parameter must fail");
        assert!(!error.is::<WrappedError>(), "Unexpected error: {error:#}");
        assert!(
            error.is::<<C::Driver as Driver>::Error>() || error.is::<TypeMappingError>(),
            "Unexpected error: {error:#}"
        );

        // List parameters rejected when the store has no array support
        let scalar = SqlSupport::new(SupportOptions {
            array_support: false,
        });
        let error = scalar
            .sql(dialect(connection, "SELECT id FROM ledger WHERE account = ?"))
            .bind(|s| s.bind(1, vec!["alice".to_string()].as_value()))
            .map_row(|row| Ok(row.len()))
            .query_list(connection)
            .expect_err("A list parameter must be rejected");
        assert!(error.is::<TypeMappingError>());
    }
}

use crate::{recreate_table, silent_logs};
use berth::{Connection, Driver, Entity};
use indoc::indoc;
use rust_decimal::Decimal;
use std::{
    collections::HashSet,
    sync::{LazyLock, Mutex},
};
use uuid::Uuid;

#[derive(Entity, Default, Debug, Clone, PartialEq, Eq, Hash)]
#[berth(name = "catalog_item")]
struct CatalogItem {
    #[berth(primary_key)]
    code: String,
    #[berth(name = "display_name")]
    title: String,
    price: Option<Decimal>,
}

#[derive(Entity, Default, Debug, Clone, PartialEq, Eq, Hash)]
struct Session {
    id: Uuid,
    user_name: String,
}

pub fn catalog<C: Connection>(connection: &mut C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().unwrap();

    // Setup
    recreate_table(
        connection,
        "catalog_item",
        indoc! {"
            CREATE TABLE catalog_item (
                code TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                price TEXT
            )
        "},
        indoc! {"
            CREATE TABLE catalog_item (
                code TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                price NUMERIC
            )
        "},
    );

    // Provided keys come back unchanged
    let pen = CatalogItem {
        code: "A-1".into(),
        title: "Pen".into(),
        price: Some(Decimal::new(150, 2)),
    };
    let inserted = pen
        .clone()
        .insert(connection)
        .expect("Failed to insert the pen")
        .expect("An entity with a provided key is always returned");
    assert_eq!(inserted, pen);
    let ink = CatalogItem {
        code: "B-2".into(),
        title: "Ink".into(),
        price: None,
    }
    .insert(connection)
    .expect("Failed to insert the ink")
    .expect("An entity with a provided key is always returned");

    // Column renamed
    let found = CatalogItem::find(connection, "A-1".to_string())
        .expect("Failed to query the pen")
        .expect("Failed to find the pen");
    assert_eq!(found, pen);
    assert_eq!(
        CatalogItem::find_many(
            connection,
            ["A-1".to_string(), "B-2".to_string(), "C-3".to_string()]
        )
        .expect("Failed to query the catalog"),
        HashSet::from([pen.clone(), ink.clone()])
    );

    // Duplicate keys fail with the error of the store
    silent_logs! {
        let error = pen
            .clone()
            .insert(connection)
            .expect_err("Inserting a duplicate key must fail");
        assert!(
            error.is::<<C::Driver as Driver>::Error>(),
            "Unexpected error: {error:#}"
        );
    }

    // Update and delete
    let renamed = CatalogItem {
        title: "Fountain pen".into(),
        ..pen.clone()
    };
    renamed.update(connection).expect("Failed to rename the pen");
    assert_eq!(
        CatalogItem::find(connection, "A-1".to_string()).expect("Failed to query the pen"),
        Some(renamed)
    );
    CatalogItem::delete_by_key(connection, "A-1".to_string()).expect("Failed to delete the pen");
    assert_eq!(
        CatalogItem::find_many(connection, ["A-1".to_string(), "B-2".to_string()])
            .expect("Failed to query the catalog"),
        HashSet::from([ink])
    );
}

pub fn sessions<C: Connection>(connection: &mut C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().unwrap();

    // Setup
    recreate_table(
        connection,
        "session",
        indoc! {"
            CREATE TABLE session (
                id TEXT PRIMARY KEY,
                user_name TEXT NOT NULL
            )
        "},
        indoc! {"
            CREATE TABLE session (
                id UUID PRIMARY KEY,
                user_name TEXT NOT NULL
            )
        "},
    );

    // A non-primitive key is always provided, also when nil
    let sessions = (0..5)
        .map(|i| Session {
            id: if i == 0 { Uuid::nil() } else { Uuid::new_v4() },
            user_name: format!("user{i}"),
        })
        .collect::<Vec<_>>();
    for session in &sessions {
        let inserted = session
            .clone()
            .insert(connection)
            .expect("Failed to insert the session")
            .expect("An entity with a provided key is always returned");
        assert_eq!(&inserted, session);
    }
    let found = Session::find_many(connection, sessions.iter().map(|s| s.id))
        .expect("Failed to query the sessions");
    assert_eq!(found, sessions.iter().cloned().collect::<HashSet<_>>());
    let found = Session::find(connection, Uuid::nil())
        .expect("Failed to query the nil session")
        .expect("Failed to find the nil session");
    assert_eq!(found.user_name, "user0");
}

use crate::recreate_table;
use berth::{Connection, Entity};
use indoc::indoc;
use std::{
    collections::HashSet,
    sync::{LazyLock, Mutex},
};

#[derive(Entity, Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Widget {
    pub id: Option<i64>,
    pub name: String,
    pub score: Option<i32>,
}

pub fn widget<C: Connection>(connection: &mut C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().unwrap();

    // Setup
    recreate_table(
        connection,
        "widget",
        indoc! {"
            CREATE TABLE widget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                score INTEGER
            )
        "},
        indoc! {"
            CREATE TABLE widget (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                score INTEGER
            )
        "},
    );

    // Insert with a generated key
    let first = Widget {
        id: None,
        name: "a".into(),
        score: None,
    }
    .insert(connection)
    .expect("Failed to insert widget a")
    .expect("The store did not return the generated key of widget a");
    let key = first.id.expect("The generated key was not written into the entity");
    assert_eq!(
        first,
        Widget {
            id: Some(key),
            name: "a".into(),
            score: None,
        }
    );

    // Select
    let found = Widget::find(connection, key)
        .expect("Failed to query widget a")
        .expect("Failed to find widget a");
    assert_eq!(found, first);
    assert_eq!(
        Widget::find(connection, key + 1000).expect("Failed to query a missing widget"),
        None
    );
    assert_eq!(
        Widget::find(connection, Some(key))
            .expect("Failed to query widget a by optional key")
            .as_ref(),
        Some(&first)
    );

    // Update
    let changed = Widget {
        name: "b".into(),
        score: Some(7),
        ..first.clone()
    };
    changed.update(connection).expect("Failed to update widget a");
    assert_eq!(
        Widget::find(connection, key).expect("Failed to query widget b"),
        Some(changed.clone())
    );
    Widget {
        id: Some(key + 1000),
        ..changed.clone()
    }
    .update(connection)
    .expect("Updating a missing widget is not an error");

    // Bulk select
    let second = Widget {
        id: None,
        name: "c".into(),
        score: Some(-1),
    }
    .insert(connection)
    .expect("Failed to insert widget c")
    .expect("The store did not return the generated key of widget c");
    let second_key = second.id.expect("The generated key was not written into the entity");
    assert_ne!(second_key, key);
    let found = Widget::find_many(connection, [key, second_key, key, key + 1000])
        .expect("Failed to query the widgets by key");
    assert_eq!(found, HashSet::from([changed.clone(), second.clone()]));
    assert!(
        Widget::find_many(connection, Vec::<i64>::new())
            .expect("Failed to query an empty key set")
            .is_empty()
    );

    // Delete
    Widget::delete_by_key(connection, key).expect("Failed to delete widget b");
    assert_eq!(
        Widget::find(connection, key).expect("Failed to query a deleted widget"),
        None
    );
    Widget::delete_by_key(connection, key).expect("Deleting a missing widget is not an error");
    assert_eq!(
        Widget::find_many(connection, [key, second_key]).expect("Failed to query the widgets"),
        HashSet::from([second])
    );
}

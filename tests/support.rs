mod resource {
    pub mod mock;
}

#[cfg(test)]
mod tests {
    use crate::resource::mock::{MockConnection, MockError, row};
    use berth::{
        AsValue, Entity, Error, ResultMapping, SchemaError, SqlSupport, StatementBinding,
        SupportOptions, TypeMappingError, Value, WrappedError, from_row,
    };
    use std::collections::HashMap;

    #[derive(Entity, Default, Debug, PartialEq)]
    struct Ledger {
        id: Option<i64>,
        account: String,
        amount: i64,
    }

    fn ledger() -> MockConnection {
        MockConnection::new().with_rows(vec![
            row(
                &["id", "account", "amount"],
                vec![1i64.into(), "alice".into(), 10i64.into()],
            ),
            row(
                &["id", "account", "amount"],
                vec![2i64.into(), "bob".into(), 20i64.into()],
            ),
            row(
                &["id", "account", "amount"],
                vec![3i64.into(), "alice".into(), 5i64.into()],
            ),
        ])
    }

    #[test]
    fn query() {
        let support = SqlSupport::default();
        let mut connection = ledger();
        let account = support
            .sql("SELECT id, account, amount FROM ledger WHERE amount > ?")
            .bind(|s| s.bind_value(1, 0i64))
            .map(|row, i| Ok((i, String::try_from_value(row.get(2)?.clone())?)))
            .query(&mut connection)
            .expect("Failed to query");
        assert_eq!(account, Some((0, "alice".to_string())));
        let executed = connection.last();
        assert_eq!(executed.binds, [(1, Value::Int64(Some(0)))]);
        assert!(!executed.generated_keys);

        let nothing = support
            .sql("SELECT id FROM ledger")
            .map_row(|row| i64::try_from_value(row.get(1)?.clone()))
            .query(&mut connection)
            .expect("Failed to query");
        assert_eq!(nothing, None);
        assert!(connection.last().binds.is_empty());
        assert_eq!(connection.open, 0);
    }

    #[test]
    fn query_list() {
        let support = SqlSupport::default();
        let mut connection = ledger();
        let entries = support
            .sql("SELECT id, account, amount FROM ledger")
            .map(|row, i| Ok((i, from_row::<Ledger>(row)?)))
            .query_list(&mut connection)
            .expect("Failed to query the list");
        assert_eq!(
            entries,
            [
                (
                    0,
                    Ledger {
                        id: Some(1),
                        account: "alice".into(),
                        amount: 10,
                    }
                ),
                (
                    1,
                    Ledger {
                        id: Some(2),
                        account: "bob".into(),
                        amount: 20,
                    }
                ),
                (
                    2,
                    Ledger {
                        id: Some(3),
                        account: "alice".into(),
                        amount: 5,
                    }
                ),
            ]
        );
    }

    #[test]
    fn query_map() {
        let support = SqlSupport::default();
        let mut connection = ledger();
        // Duplicate keys keep the last row
        let amounts = support
            .sql("SELECT id, account, amount FROM ledger")
            .map_row(|row| i64::try_from_value(row.get(3)?.clone()))
            .key(|row, _| String::try_from_value(row.get(2)?.clone()))
            .query_map(&mut connection)
            .expect("Failed to query the map");
        assert_eq!(
            amounts,
            HashMap::from([("alice".to_string(), 5), ("bob".to_string(), 20)])
        );
    }

    #[test]
    fn update() {
        let support = SqlSupport::default();
        let mut connection = MockConnection::new();
        connection.rows_affected = 2;
        let changed = support
            .sql("UPDATE ledger SET amount = amount + ? WHERE account = ?")
            .bind(|s| {
                s.bind_value(1, 1i64)?;
                s.bind_value(2, "alice".to_string())
            })
            .update(&mut connection)
            .expect("Failed to update");
        assert_eq!(changed, 2);
        assert_eq!(
            connection.last().binds,
            [
                (1, Value::Int64(Some(1))),
                (2, Value::Varchar(Some("alice".into()))),
            ]
        );
        assert!(!connection.last().generated_keys);
    }

    #[test]
    fn insert() {
        let support = SqlSupport::default();
        let mut connection = MockConnection::new()
            .with_generated(vec![
                row(&["id"], vec![Value::Int64(Some(12))]),
                row(&["id"], vec![Value::Int64(Some(13))]),
            ])
            .with_generated(vec![row(&["id"], vec![Value::Varchar(Some("x".into()))])]);
        let key = support
            .sql("INSERT INTO ledger (account, amount) VALUES (?, ?)")
            .bind(|s| {
                s.bind_value(1, "carol".to_string())?;
                s.bind_value(2, 7i64)
            })
            .insert::<_, i32>(&mut connection)
            .expect("Failed to insert");
        // The first generated key, converted to the requested type
        assert_eq!(key, Some(12));
        assert!(connection.last().generated_keys);

        let error = support
            .sql("INSERT INTO ledger DEFAULT VALUES")
            .insert::<_, i64>(&mut connection)
            .expect_err("Text is not an integer key");
        assert!(error.is::<TypeMappingError>());

        let key = support
            .sql("INSERT INTO ledger DEFAULT VALUES")
            .insert::<_, i64>(&mut connection)
            .expect("Failed to insert");
        assert_eq!(key, None);
        assert_eq!(connection.open, 0);
    }

    #[test]
    fn errors_of_the_store_pass_through() {
        let support = SqlSupport::default();
        let mut connection = MockConnection::new();
        connection.fail_prepare = true;
        let error = support
            .sql("SELECT")
            .map_row(|row| Ok(row.len()))
            .query_list(&mut connection)
            .expect_err("The store refuses the statement");
        assert!(error.is::<MockError>());
        assert!(!error.is::<WrappedError>());

        let mut connection = ledger();
        let error = support
            .sql("SELECT id FROM ledger")
            .map_row(|_| -> berth::Result<()> { Err(MockError("closed".into()).into()) })
            .query_list(&mut connection)
            .expect_err("The mapping fails");
        assert!(error.is::<MockError>());
        assert!(!error.is::<WrappedError>());
    }

    #[test]
    fn errors_of_the_crate_pass_through() {
        let support = SqlSupport::default();
        let mut connection = ledger();
        let error = support
            .sql("SELECT id FROM ledger")
            .map_row(|_| -> berth::Result<()> {
                Err(TypeMappingError::new("id", "not today").into())
            })
            .query(&mut connection)
            .expect_err("The mapping fails");
        assert!(error.is::<TypeMappingError>());

        let mut connection = ledger();
        let error = support
            .sql("SELECT id FROM ledger")
            .map_row(|_| -> berth::Result<()> {
                Err(SchemaError::MissingPrimaryKey { entity: "Ledger" }.into())
            })
            .query(&mut connection)
            .expect_err("The mapping fails");
        assert!(error.is::<SchemaError>());
    }

    #[test]
    fn other_errors_are_wrapped() {
        let support = SqlSupport::default();
        let mut connection = ledger();
        let error = support
            .sql("SELECT id FROM ledger")
            .map(|_, i| -> berth::Result<()> { Err(Error::msg(format!("row {i} rejected"))) })
            .query_list(&mut connection)
            .expect_err("The mapping fails");
        let wrapped = error
            .downcast_ref::<WrappedError>()
            .expect("The error must be a WrappedError");
        assert_eq!(wrapped.0.to_string(), "row 0 rejected");

        let mut connection = ledger();
        let error = support
            .sql("SELECT id FROM ledger")
            .map_row(|row| Ok(row.len()))
            .key(|_, _| -> berth::Result<i64> { Err(Error::msg("no key")) })
            .query_map(&mut connection)
            .expect_err("The key mapping fails");
        assert!(error.is::<WrappedError>());

        let error = support
            .sql("DELETE FROM ledger")
            .bind(|_| Err(Error::msg("nothing to bind")))
            .update(&mut connection)
            .expect_err("The binding fails");
        assert!(error.is::<WrappedError>());

        // Already wrapped errors are not wrapped again
        let mut connection = ledger();
        let error = support
            .sql("SELECT id FROM ledger")
            .map_row(|_| -> berth::Result<()> {
                Err(WrappedError::new(Error::msg("inner")).into())
            })
            .query(&mut connection)
            .expect_err("The mapping fails");
        let wrapped = error
            .downcast_ref::<WrappedError>()
            .expect("The error must be a WrappedError");
        assert!(wrapped.0.downcast_ref::<WrappedError>().is_none());
    }

    #[test]
    fn array_support() {
        let mut connection = MockConnection::new();
        let keys = vec![1i64, 2];
        SqlSupport::default()
            .sql("DELETE FROM ledger WHERE id = ANY(?)")
            .bind(|s| s.bind_value(1, keys.clone()))
            .update(&mut connection)
            .expect("Lists are bound when the store supports arrays");
        assert!(matches!(
            connection.last().binds.as_slice(),
            [(1, Value::List(Some(..), ..))]
        ));

        let support = SqlSupport::new(SupportOptions {
            array_support: false,
        });
        assert!(!support.options().array_support);
        let error = support
            .sql("DELETE FROM ledger WHERE id = ANY(?)")
            .bind(|s| s.bind_value(1, keys.clone()))
            .update(&mut connection)
            .expect_err("Lists are rejected without array support");
        assert!(error.is::<TypeMappingError>());
        assert!(connection.last().binds.is_empty());
        support
            .sql("DELETE FROM ledger WHERE id = ?")
            .bind(|s| s.bind_value(1, 1i64))
            .update(&mut connection)
            .expect("Scalars are still bound");
        assert_eq!(connection.last().binds, [(1, Value::Int64(Some(1)))]);
    }

    #[test]
    fn direct_operations() {
        let support = SqlSupport::default();
        let mut connection = ledger();
        let mapping: ResultMapping<'_, i64> =
            &mut |row, _| i64::try_from_value(row.get(1)?.clone());
        let ids = support
            .query_list(&mut connection, "SELECT id FROM ledger", None, mapping)
            .expect("Failed to query the list");
        assert_eq!(ids, [1, 2, 3]);
        let binding: StatementBinding<'_> = &mut |s| s.bind_value(1, 2i64);
        let changed = support
            .update(
                &mut connection,
                "DELETE FROM ledger WHERE id = ?",
                Some(binding),
            )
            .expect("Failed to delete");
        assert_eq!(changed, 0);
        assert_eq!(connection.last().binds, [(1, Value::Int64(Some(2)))]);
    }
}

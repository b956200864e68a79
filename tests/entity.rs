#[cfg(test)]
mod tests {
    use berth::{Entity, EntityDescriptor, SchemaError, Value, materializer};
    use std::{ptr, thread};
    use time::Date;
    use uuid::Uuid;

    #[derive(Entity, Default, Debug, Clone, PartialEq)]
    struct Widget {
        id: Option<i64>,
        name: String,
        score: Option<i32>,
    }

    #[derive(Entity, Default, Debug)]
    #[berth(name = "catalog")]
    struct CatalogItem {
        #[berth(primary_key)]
        code: String,
        #[berth(name = "display_name")]
        title: String,
        released: Option<Date>,
    }

    #[derive(Entity, Default, Debug)]
    struct OrderLine {
        id: i64,
        #[berth(primary_key)]
        reference: Uuid,
        tags: Vec<String>,
    }

    #[derive(Entity, Default, Debug)]
    struct _Hidden {
        id: u32,
    }

    #[derive(Entity, Default, Debug)]
    struct NoKey {
        name: String,
    }

    #[derive(Entity, Default, Debug)]
    struct TwoKeys {
        #[berth(primary_key)]
        first: i32,
        #[berth(primary_key)]
        second: i32,
    }

    #[test]
    fn describe_conventional_key() {
        let descriptor = Widget::descriptor().expect("Widget is well formed");
        assert_eq!(descriptor.entity, "Widget");
        assert_eq!(descriptor.table, "widget");
        assert_eq!(descriptor.primary_key.name, "id");
        assert_eq!(descriptor.primary_key.column, "id");
        assert!(descriptor.primary_key.nullable);
        assert!(matches!(descriptor.primary_key.value, Value::Int64(None)));
        assert_eq!(
            descriptor.columns.iter().map(|c| c.name).collect::<Vec<_>>(),
            ["name", "score"]
        );
        assert!(!descriptor.columns[0].nullable);
        assert!(matches!(descriptor.columns[0].value, Value::Varchar(None)));
        assert!(descriptor.columns[1].nullable);
        assert!(matches!(descriptor.columns[1].value, Value::Int32(None)));
        assert_eq!(
            descriptor.fields().map(|c| c.position).collect::<Vec<_>>(),
            [0, 1, 2]
        );
    }

    #[test]
    fn describe_tagged_key_and_renames() {
        let descriptor = CatalogItem::descriptor().expect("CatalogItem is well formed");
        assert_eq!(descriptor.table, "catalog");
        assert_eq!(descriptor.primary_key.name, "code");
        assert!(!descriptor.primary_key.nullable);
        assert_eq!(descriptor.column_name("title"), Some("display_name"));
        assert_eq!(descriptor.column_name("code"), Some("code"));
        assert_eq!(descriptor.column_name("display_name"), None);
        assert_eq!(
            descriptor.field("released").map(|f| f.value.clone()),
            Some(Value::Date(None))
        );
        assert!(descriptor.field("missing").is_none());
    }

    #[test]
    fn tagged_key_wins_over_id() {
        let descriptor = OrderLine::descriptor().expect("OrderLine is well formed");
        assert_eq!(descriptor.table, "order_line");
        assert_eq!(descriptor.primary_key.name, "reference");
        assert_eq!(
            descriptor.columns.iter().map(|c| c.name).collect::<Vec<_>>(),
            ["id", "tags"]
        );
        assert_eq!(descriptor.primary_key.mapper.map(|m| m.name), Some("Uuid"));
        let tags = descriptor.field("tags").expect("Field tags exists");
        assert!(tags.mapper.is_none());
        assert!(matches!(&tags.value, Value::List(None, ty) if **ty == Value::Varchar(None)));
    }

    #[test]
    fn table_name_drops_leading_underscore() {
        assert_eq!(_Hidden::table_def().name, "hidden");
        assert_eq!(
            _Hidden::descriptor().map(|d| d.table).ok(),
            Some("hidden")
        );
    }

    #[test]
    fn missing_primary_key() {
        let error = NoKey::descriptor().expect_err("NoKey has no primary key");
        assert!(matches!(
            error.downcast_ref::<SchemaError>(),
            Some(SchemaError::MissingPrimaryKey { entity: "NoKey" })
        ));
        // Not cached, every use fails again
        assert!(NoKey::descriptor().is_err());
    }

    #[test]
    fn multiple_primary_keys() {
        let error = TwoKeys::descriptor().expect_err("TwoKeys tags two primary keys");
        let Some(SchemaError::MultiplePrimaryKeys { entity, fields }) =
            error.downcast_ref::<SchemaError>()
        else {
            panic!("Unexpected error: {error:#}");
        };
        assert_eq!(*entity, "TwoKeys");
        assert_eq!(fields, "first, second");
        assert!(matches!(
            EntityDescriptor::build(TwoKeys::table_def()),
            Err(SchemaError::MultiplePrimaryKeys { .. })
        ));
    }

    #[test]
    fn descriptor_is_cached() {
        let first = Widget::descriptor().expect("Widget is well formed");
        let second = Widget::descriptor().expect("Widget is well formed");
        assert!(ptr::eq(first, second));
        let built = EntityDescriptor::build(Widget::table_def()).expect("Widget is well formed");
        assert!(!ptr::eq(first, &built));
        assert_eq!(built.table, first.table);
    }

    #[test]
    fn descriptor_concurrent_first_use() {
        #[derive(Entity, Default)]
        struct Contended {
            id: i32,
            value: f64,
        }
        let descriptors = thread::scope(|s| {
            let handles = (0..8)
                .map(|_| s.spawn(|| Contended::descriptor().map(|d| ptr::from_ref(d) as usize)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().expect("The thread panicked"))
                .collect::<Result<Vec<_>, _>>()
                .expect("Contended is well formed")
        });
        assert!(descriptors.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn materializer_access_by_name() {
        let descriptor = Widget::descriptor().expect("Widget is well formed");
        let mut widget = materializer::construct::<Widget>();
        assert_eq!(widget, Widget::default());
        materializer::write_by_name(&mut widget, descriptor, "name", "gear".into())
            .expect("Failed to write the name");
        materializer::write_by_name(&mut widget, descriptor, "score", Value::Int32(Some(3)))
            .expect("Failed to write the score");
        assert_eq!(
            widget,
            Widget {
                id: None,
                name: "gear".into(),
                score: Some(3),
            }
        );
        assert_eq!(
            materializer::read_by_name(&widget, descriptor, "id").ok(),
            Some(Value::Int64(None))
        );
        assert!(materializer::read_by_name(&widget, descriptor, "weight").is_err());
        assert!(
            materializer::write_by_name(&mut widget, descriptor, "name", Value::Int32(None))
                .is_err()
        );
    }
}

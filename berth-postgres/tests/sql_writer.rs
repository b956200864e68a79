#[cfg(test)]
mod tests {
    use berth::{Driver, Entity, SqlWriter};
    use berth_postgres::PostgresDriver;
    use indoc::indoc;

    #[derive(Entity, Default, Debug)]
    struct Widget {
        id: Option<i64>,
        name: String,
        score: Option<i32>,
    }

    #[test]
    fn numbered_placeholders() {
        let writer = PostgresDriver::new().sql_writer();
        let descriptor = Widget::descriptor().unwrap();
        assert_eq!(
            writer.select_by_key(descriptor).sql,
            "SELECT id, name, score FROM widget WHERE id = $1"
        );
        assert_eq!(
            writer.bulk_select_by_keys(descriptor).sql,
            "SELECT id, name, score FROM widget WHERE id = ANY($1)"
        );
        assert_eq!(
            writer.update(descriptor).sql,
            "UPDATE widget SET name = $1, score = $2 WHERE id = $3"
        );
        assert_eq!(
            writer.delete_by_key(descriptor).sql,
            "DELETE FROM widget WHERE id = $1"
        );
    }

    #[test]
    fn insert_returns_generated_key() {
        let writer = PostgresDriver::new().sql_writer();
        let descriptor = Widget::descriptor().unwrap();
        let template = writer.insert(descriptor, false);
        assert_eq!(
            template.sql,
            indoc! {"
                INSERT INTO widget (name, score) VALUES ($1, $2) RETURNING id
            "}
            .trim_end()
        );
        assert!(template.generated_key);
        assert_eq!(
            writer.insert(descriptor, true).sql,
            "INSERT INTO widget (id, name, score) VALUES ($1, $2, $3)"
        );
    }
}

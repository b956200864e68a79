use berth_core::{EntityDescriptor, SqlWriter};

/// Sqlite has no array parameters, the key set is bound as a JSON array and expanded by
/// `json_each`.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_key_set_filter(&self, out: &mut String, descriptor: &EntityDescriptor, index: usize) {
        self.write_identifier(out, descriptor.primary_key.column);
        out.push_str(" IN (SELECT value FROM json_each(");
        self.write_placeholder(out, index);
        out.push_str("))");
    }
}

use berth_core::{EntityDescriptor, SqlWriter, write_numbered_placeholder};

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresSqlWriter {}

impl SqlWriter for PostgresSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_placeholder(&self, out: &mut String, index: usize) {
        write_numbered_placeholder(out, index);
    }

    fn write_returning_key(&self, out: &mut String, descriptor: &EntityDescriptor) {
        out.push_str(" RETURNING ");
        self.write_identifier(out, descriptor.primary_key.column);
    }
}

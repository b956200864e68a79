use crate::{AsValue, Driver, Result, RowIter, RowsAffected, Value};

/// A live connection to a store.
///
/// Calls block the caller's thread. A connection is used by one caller at a time, distinct
/// connections can be used concurrently.
pub trait Connection {
    type Driver: Driver;
    type Statement<'c>: Statement
    where
        Self: 'c;

    /// Open a connection to the given URL.
    fn connect(url: &str) -> Result<Self>
    where
        Self: Sized;

    fn driver(&self) -> &Self::Driver;

    /// Prepare a parameterized statement.
    ///
    /// When `generated_keys` is set the statement retains the keys generated by its execution,
    /// readable through [`Statement::generated_keys`].
    fn prepare(&mut self, sql: &str, generated_keys: bool) -> Result<Self::Statement<'_>>;
}

/// A prepared statement.
///
/// The statement and the rows it produces are released when dropped.
///
/// # Binding Semantics
/// * Indexes start from 1 and follow the order of the placeholders.
/// * A bound value stays bound across executions until replaced.
pub trait Statement {
    /// Bind a value at a specific index.
    fn bind(&mut self, index: usize, value: Value) -> Result<()>;
    /// Execute the statement and iterate the resulting rows.
    fn query(&mut self) -> Result<RowIter<'_>>;
    /// Execute the statement ignoring any resulting row.
    fn execute(&mut self) -> Result<RowsAffected>;
    /// Keys generated by the last execution, one row per inserted row.
    fn generated_keys(&mut self) -> Result<RowIter<'_>>;
}

impl dyn Statement + '_ {
    /// Bind any convertible value, `None` binds a null of the declared type.
    ///
    /// ```rust,ignore
    /// statement.bind_value(1, Some(42i32))?;
    /// statement.bind_value(2, None::<String>)?;
    /// ```
    pub fn bind_value<V: AsValue>(&mut self, index: usize, value: V) -> Result<()> {
        self.bind(index, value.as_value())
    }
}

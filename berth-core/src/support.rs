use crate::{
    AsValue, Connection, Driver, Error, Result, RowIter, RowLabeled, RowsAffected, SchemaError,
    Statement, TypeMappingError, Value, WrappedError,
};
use std::{collections::HashMap, hash::Hash};

/// Binds the parameters of a statement.
pub type StatementBinding<'b> = &'b mut dyn FnMut(&mut dyn Statement) -> Result<()>;
/// Maps a row, with its 0-based index in the result, to a value.
pub type ResultMapping<'m, T> = &'m mut dyn FnMut(&RowLabeled, usize) -> Result<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportOptions {
    /// The store accepts list parameters. When unset binding a list fails before reaching it.
    pub array_support: bool,
}

impl Default for SupportOptions {
    fn default() -> Self {
        Self {
            array_support: true,
        }
    }
}

/// Runs raw SQL with optional binding and result mapping callbacks.
///
/// Failures of the store and of the crate's own mapping surface unchanged. Any other failure
/// raised by a callback is wrapped in a [`WrappedError`].
#[derive(Debug, Default, Clone)]
pub struct SqlSupport {
    options: SupportOptions,
}

impl SqlSupport {
    pub fn new(options: SupportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SupportOptions {
        &self.options
    }

    /// Fluent composition over the operations of this helper.
    pub fn sql(&self, sql: impl Into<String>) -> Builder<'_> {
        Builder {
            support: self,
            sql: sql.into(),
            binding: (),
            mapping: (),
            key: (),
        }
    }

    /// First mapped row, `None` when there is none.
    pub fn query<C: Connection, T>(
        &self,
        connection: &mut C,
        sql: &str,
        binding: Option<StatementBinding<'_>>,
        mapping: ResultMapping<'_, T>,
    ) -> Result<Option<T>> {
        let mut statement = connection.prepare(sql, false)?;
        self.bind::<C::Driver>(&mut statement, binding)?;
        let mut rows = statement.query()?;
        let Some(row) = rows.next().transpose()? else {
            return Ok(None);
        };
        mapping(&row, 0).map(Some).map_err(wrap::<C::Driver>)
    }

    /// Every mapped row, in the order returned by the store.
    pub fn query_list<C: Connection, T>(
        &self,
        connection: &mut C,
        sql: &str,
        binding: Option<StatementBinding<'_>>,
        mapping: ResultMapping<'_, T>,
    ) -> Result<Vec<T>> {
        let mut statement = connection.prepare(sql, false)?;
        self.bind::<C::Driver>(&mut statement, binding)?;
        map_rows::<C::Driver, T>(statement.query()?, mapping)
    }

    /// Every mapped row, keyed by `key`. Rows with the same key keep the last one.
    pub fn query_map<C: Connection, K: Eq + Hash, T>(
        &self,
        connection: &mut C,
        sql: &str,
        binding: Option<StatementBinding<'_>>,
        key: ResultMapping<'_, K>,
        mapping: ResultMapping<'_, T>,
    ) -> Result<HashMap<K, T>> {
        let mut statement = connection.prepare(sql, false)?;
        self.bind::<C::Driver>(&mut statement, binding)?;
        let mut result = HashMap::new();
        for (i, row) in statement.query()?.enumerate() {
            let row = row?;
            let k = key(&row, i).map_err(wrap::<C::Driver>)?;
            let v = mapping(&row, i).map_err(wrap::<C::Driver>)?;
            result.insert(k, v);
        }
        Ok(result)
    }

    /// Number of rows changed.
    pub fn update<C: Connection>(
        &self,
        connection: &mut C,
        sql: &str,
        binding: Option<StatementBinding<'_>>,
    ) -> Result<u64> {
        let mut statement = connection.prepare(sql, false)?;
        self.bind::<C::Driver>(&mut statement, binding)?;
        Ok(statement.execute()?.rows_affected)
    }

    /// The first key generated by the store, `None` when there is none.
    pub fn insert<C: Connection, K: AsValue>(
        &self,
        connection: &mut C,
        sql: &str,
        binding: Option<StatementBinding<'_>>,
    ) -> Result<Option<K>> {
        let mut statement = connection.prepare(sql, true)?;
        self.bind::<C::Driver>(&mut statement, binding)?;
        statement.execute()?;
        let mut keys = statement.generated_keys()?;
        let Some(row) = keys.next().transpose()? else {
            return Ok(None);
        };
        K::try_from_value(row.get(1)?.clone())
            .map(Some)
            .map_err(|e| Error::new(TypeMappingError::new("generated key", format!("{e:#}"))))
    }

    fn bind<D: Driver>(
        &self,
        statement: &mut dyn Statement,
        binding: Option<StatementBinding<'_>>,
    ) -> Result<()> {
        let Some(binding) = binding else {
            return Ok(());
        };
        let result = if self.options.array_support {
            binding(statement)
        } else {
            binding(&mut ScalarParameters { statement })
        };
        result.map_err(wrap::<D>)
    }
}

fn map_rows<D: Driver, T>(rows: RowIter<'_>, mapping: ResultMapping<'_, T>) -> Result<Vec<T>> {
    rows.enumerate()
        .map(|(i, row)| mapping(&row?, i).map_err(wrap::<D>))
        .collect()
}

/// Passes through errors of the store and of this crate, wraps the others.
fn wrap<D: Driver>(error: Error) -> Error {
    if error.is::<D::Error>()
        || error.is::<SchemaError>()
        || error.is::<TypeMappingError>()
        || error.is::<WrappedError>()
    {
        error
    } else {
        Error::new(WrappedError::new(error))
    }
}

/// Statement rejecting list parameters, for stores without array support.
struct ScalarParameters<'s> {
    statement: &'s mut dyn Statement,
}

impl Statement for ScalarParameters<'_> {
    fn bind(&mut self, index: usize, value: Value) -> Result<()> {
        if let Value::List(..) = value {
            return Err(Error::new(TypeMappingError::new(
                format!("parameter {index}"),
                "list parameters are disabled by SupportOptions::array_support",
            )));
        }
        self.statement.bind(index, value)
    }
    fn query(&mut self) -> Result<RowIter<'_>> {
        self.statement.query()
    }
    fn execute(&mut self) -> Result<RowsAffected> {
        self.statement.execute()
    }
    fn generated_keys(&mut self) -> Result<RowIter<'_>> {
        self.statement.generated_keys()
    }
}

/// Binding of a [`Builder`] set with [`Builder::bind`].
pub struct Bound<F>(F);
/// Mapping of a [`Builder`] set with [`Builder::map`] or [`Builder::map_row`].
pub struct Mapped<F>(F);
/// Key mapping of a [`Builder`] set with [`Builder::key`].
pub struct Keyed<F>(F);

/// Binding state of a [`Builder`].
pub trait BuilderBinding {
    fn as_binding(&mut self) -> Option<StatementBinding<'_>>;
}

impl BuilderBinding for () {
    fn as_binding(&mut self) -> Option<StatementBinding<'_>> {
        None
    }
}

impl<F: FnMut(&mut dyn Statement) -> Result<()>> BuilderBinding for Bound<F> {
    fn as_binding(&mut self) -> Option<StatementBinding<'_>> {
        Some(&mut self.0)
    }
}

/// Fluent composition of a [`SqlSupport`] operation.
///
/// ```rust,ignore
/// let names = support
///     .sql("SELECT id, name FROM widget WHERE score > ?")
///     .bind(|s| s.bind_value(1, 10))
///     .map(|row, _| String::try_from_value(row.get(2)?.clone()))
///     .key(|row, _| i64::try_from_value(row.get(1)?.clone()))
///     .query_map(&mut connection)?;
/// ```
pub struct Builder<'s, B = (), M = (), K = ()> {
    support: &'s SqlSupport,
    sql: String,
    binding: B,
    mapping: M,
    key: K,
}

impl<'s, M, K> Builder<'s, (), M, K> {
    pub fn bind<F>(self, binding: F) -> Builder<'s, Bound<F>, M, K>
    where
        F: FnMut(&mut dyn Statement) -> Result<()>,
    {
        Builder {
            support: self.support,
            sql: self.sql,
            binding: Bound(binding),
            mapping: self.mapping,
            key: self.key,
        }
    }
}

impl<'s, B: BuilderBinding> Builder<'s, B, (), ()> {
    pub fn map<F, T>(self, mapping: F) -> Builder<'s, B, Mapped<F>, ()>
    where
        F: FnMut(&RowLabeled, usize) -> Result<T>,
    {
        Builder {
            support: self.support,
            sql: self.sql,
            binding: self.binding,
            mapping: Mapped(mapping),
            key: (),
        }
    }

    /// Like [`Builder::map`], for mappings that ignore the row index.
    pub fn map_row<F, T>(
        self,
        mut mapping: F,
    ) -> Builder<'s, B, Mapped<impl FnMut(&RowLabeled, usize) -> Result<T>>, ()>
    where
        F: FnMut(&RowLabeled) -> Result<T>,
    {
        self.map(move |row: &RowLabeled, _: usize| mapping(row))
    }

    pub fn update<C: Connection>(mut self, connection: &mut C) -> Result<u64> {
        self.support
            .update(connection, &self.sql, self.binding.as_binding())
    }

    pub fn insert<C: Connection, K: AsValue>(mut self, connection: &mut C) -> Result<Option<K>> {
        self.support
            .insert(connection, &self.sql, self.binding.as_binding())
    }
}

impl<'s, B, F, T> Builder<'s, B, Mapped<F>, ()>
where
    B: BuilderBinding,
    F: FnMut(&RowLabeled, usize) -> Result<T>,
{
    pub fn key<G, K>(self, key: G) -> Builder<'s, B, Mapped<F>, Keyed<G>>
    where
        G: FnMut(&RowLabeled, usize) -> Result<K>,
    {
        Builder {
            support: self.support,
            sql: self.sql,
            binding: self.binding,
            mapping: self.mapping,
            key: Keyed(key),
        }
    }

    pub fn query<C: Connection>(mut self, connection: &mut C) -> Result<Option<T>> {
        self.support.query(
            connection,
            &self.sql,
            self.binding.as_binding(),
            &mut self.mapping.0,
        )
    }

    pub fn query_list<C: Connection>(mut self, connection: &mut C) -> Result<Vec<T>> {
        self.support.query_list(
            connection,
            &self.sql,
            self.binding.as_binding(),
            &mut self.mapping.0,
        )
    }
}

impl<'s, B, F, T, G, K> Builder<'s, B, Mapped<F>, Keyed<G>>
where
    B: BuilderBinding,
    F: FnMut(&RowLabeled, usize) -> Result<T>,
    G: FnMut(&RowLabeled, usize) -> Result<K>,
    K: Eq + Hash,
{
    pub fn query_map<C: Connection>(mut self, connection: &mut C) -> Result<HashMap<K, T>> {
        self.support.query_map(
            connection,
            &self.sql,
            self.binding.as_binding(),
            &mut self.key.0,
            &mut self.mapping.0,
        )
    }
}

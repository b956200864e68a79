use crate::{ValueHolder, postgres_type_to_value, row_to_values};
use berth_core::{
    Error, Result, RowIter, RowLabeled, RowNames, RowsAffected, Statement, TypeMappingError,
    Value, log_error, truncate_long,
};
use postgres::{Client, fallible_iterator::FallibleIterator, types::ToSql};
use std::{
    fmt::{self, Display},
    mem,
};

/// A prepared postgres statement with its bound parameters.
pub struct PostgresPrepared<'c> {
    client: &'c mut Client,
    statement: postgres::Statement,
    sql: String,
    params: Vec<Option<Value>>,
    generated_keys: bool,
    returned: Vec<RowLabeled>,
}

impl<'c> PostgresPrepared<'c> {
    pub(crate) fn new(
        client: &'c mut Client,
        statement: postgres::Statement,
        sql: String,
        generated_keys: bool,
    ) -> Self {
        let params = vec![None; statement.params().len()];
        Self {
            client,
            statement,
            sql,
            params,
            generated_keys,
            returned: Vec::new(),
        }
    }

    fn context(&self) -> String {
        format!("While running the query:\n{}", truncate_long!(self.sql))
    }

    /// Parameters converted to the types the server inferred for them.
    fn values(&self) -> Result<Vec<ValueHolder>> {
        let types = self.statement.params();
        self.params
            .iter()
            .zip(types)
            .enumerate()
            .map(|(i, (value, ty))| {
                let Some(value) = value else {
                    return Err(Error::new(TypeMappingError::new(
                        format!("parameter {}", i + 1),
                        "was not set",
                    )));
                };
                value
                    .clone()
                    .try_as(&postgres_type_to_value(ty))
                    .map(ValueHolder)
                    .map_err(|e| {
                        Error::new(TypeMappingError::new(
                            format!("parameter {}", i + 1),
                            format!("{e:#}"),
                        ))
                    })
            })
            .collect::<Result<_>>()
            .map_err(|e| log_error!(e.context(self.context())))
    }
}

fn labels(row: &postgres::Row) -> RowNames {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

impl Statement for PostgresPrepared<'_> {
    fn bind(&mut self, index: usize, value: Value) -> Result<()> {
        let len = self.params.len();
        let Some(param) = index.checked_sub(1).and_then(|i| self.params.get_mut(i)) else {
            return Err(log_error!(Error::new(TypeMappingError::new(
                format!("parameter {index}"),
                format!("the query has {len} parameters"),
            ))));
        };
        *param = Some(value);
        Ok(())
    }

    fn query(&mut self) -> Result<RowIter<'_>> {
        let values = self.values()?;
        let context = self.context();
        let rows = self
            .client
            .query_raw(&self.statement, values)
            .map_err(|e| log_error!(Error::new(e).context(context.clone())))?;
        let mut names: Option<RowNames> = None;
        Ok(Box::new(rows.iterator().map(move |row| {
            let row = row.map_err(|e| log_error!(Error::new(e).context(context.clone())))?;
            let names = names.get_or_insert_with(|| labels(&row)).clone();
            Ok(RowLabeled::new(names, row_to_values(&row)?))
        })))
    }

    fn execute(&mut self) -> Result<RowsAffected> {
        let values = self.values()?;
        let params = values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect::<Vec<_>>();
        let context = self.context();
        if !self.generated_keys {
            let rows_affected = self
                .client
                .execute(&self.statement, &params)
                .map_err(|e| log_error!(Error::new(e).context(context)))?;
            return Ok(RowsAffected {
                rows_affected,
                last_affected_id: None,
            });
        }
        let rows = self
            .client
            .query(&self.statement, &params)
            .map_err(|e| log_error!(Error::new(e).context(context)))?;
        self.returned = rows
            .iter()
            .map(|row| Ok(RowLabeled::new(labels(row), row_to_values(row)?)))
            .collect::<Result<_>>()?;
        Ok(RowsAffected {
            rows_affected: rows.len() as u64,
            last_affected_id: None,
        })
    }

    fn generated_keys(&mut self) -> Result<RowIter<'_>> {
        Ok(Box::new(mem::take(&mut self.returned).into_iter().map(Ok)))
    }
}

impl Display for PostgresPrepared<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

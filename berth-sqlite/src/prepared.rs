use crate::{
    CBox, SqliteConnection, SqliteError,
    extract::{extract_name, extract_value},
};
use berth_core::{
    DATE_FORMAT, Error, Result, Row, RowIter, RowLabeled, RowNames, RowsAffected, Statement,
    TIME_FORMAT, TIMESTAMP_FORMAT, TIMESTAMPTZ_FORMAT, TypeMappingError, Value, log_error,
    truncate_long,
};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, c_int},
    fmt::{self, Display},
    iter,
    marker::PhantomData,
    os::raw::{c_char, c_void},
    sync::Arc,
};

/// A prepared sqlite statement, finalized when dropped.
pub struct SqlitePrepared<'c> {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
    generated_keys: bool,
    last_insert_id: Option<i64>,
    _connection: PhantomData<&'c mut SqliteConnection>,
}

impl SqlitePrepared<'_> {
    pub(crate) fn new(statement: CBox<*mut sqlite3_stmt>, generated_keys: bool) -> Self {
        unsafe {
            sqlite3_clear_bindings(*statement);
        }
        Self {
            statement,
            generated_keys,
            last_insert_id: None,
            _connection: PhantomData,
        }
    }

    fn error(&self, code: c_int) -> Error {
        let statement = *self.statement;
        unsafe { SqliteError::from_connection(sqlite3_db_handle(statement), code) }.context(
            format!("While running the query:\n{}", truncate_long!(self.sql())),
        )
    }

    fn sql(&self) -> String {
        unsafe {
            let sql = sqlite3_sql(*self.statement);
            if sql.is_null() {
                return String::new();
            }
            CStr::from_ptr(sql).to_string_lossy().into_owned()
        }
    }
}

fn bind_text(statement: *mut sqlite3_stmt, index: c_int, value: &str) -> c_int {
    unsafe {
        sqlite3_bind_text(
            statement,
            index,
            value.as_ptr() as *const c_char,
            value.len() as c_int,
            SQLITE_TRANSIENT(),
        )
    }
}

fn format_error(error: time::error::Format) -> Error {
    Error::new(error).context("Cannot format the temporal value as text")
}

/// Elements of a list parameter, as the JSON array read by `json_each`.
fn json_element(value: Value) -> Result<serde_json::Value> {
    Ok(match value {
        v if v.is_null() => serde_json::Value::Null,
        Value::Boolean(Some(v)) => v.into(),
        Value::Int8(Some(v)) => v.into(),
        Value::Int16(Some(v)) => v.into(),
        Value::Int32(Some(v)) => v.into(),
        Value::Int64(Some(v)) => v.into(),
        Value::UInt8(Some(v)) => v.into(),
        Value::UInt16(Some(v)) => v.into(),
        Value::UInt32(Some(v)) => v.into(),
        Value::UInt64(Some(v)) => v.into(),
        Value::Float32(Some(v)) => serde_json::Number::from_f64(v as f64)
            .map(Into::into)
            .ok_or_else(|| Error::msg(format!("Cannot represent {v} in a JSON array")))?,
        Value::Float64(Some(v)) => serde_json::Number::from_f64(v)
            .map(Into::into)
            .ok_or_else(|| Error::msg(format!("Cannot represent {v} in a JSON array")))?,
        Value::Decimal(Some(v)) => v.to_string().into(),
        Value::Varchar(Some(v)) => v.into(),
        Value::Date(Some(v)) => v.format(DATE_FORMAT).map_err(format_error)?.into(),
        Value::Time(Some(v)) => v.format(TIME_FORMAT).map_err(format_error)?.into(),
        Value::Timestamp(Some(v)) => v.format(TIMESTAMP_FORMAT).map_err(format_error)?.into(),
        Value::TimestampWithTimezone(Some(v)) => {
            v.format(TIMESTAMPTZ_FORMAT).map_err(format_error)?.into()
        }
        Value::Uuid(Some(v)) => v.hyphenated().to_string().into(),
        Value::List(Some(v), ..) => v
            .into_iter()
            .map(json_element)
            .collect::<Result<Vec<_>>>()?
            .into(),
        Value::Blob(..) => {
            return Err(Error::new(TypeMappingError::new(
                "list element",
                "sqlite cannot compare blobs inside a list parameter",
            )));
        }
        // Every null was handled by the first arm
        _ => serde_json::Value::Null,
    })
}

impl Statement for SqlitePrepared<'_> {
    fn bind(&mut self, index: usize, value: Value) -> Result<()> {
        let statement = *self.statement;
        let position = index as c_int;
        let rc = match value {
            v if v.is_null() => unsafe { sqlite3_bind_null(statement, position) },
            Value::Boolean(Some(v)) => unsafe { sqlite3_bind_int(statement, position, v as c_int) },
            Value::Int8(Some(v)) => unsafe { sqlite3_bind_int(statement, position, v as c_int) },
            Value::Int16(Some(v)) => unsafe { sqlite3_bind_int(statement, position, v as c_int) },
            Value::Int32(Some(v)) => unsafe { sqlite3_bind_int(statement, position, v as c_int) },
            Value::Int64(Some(v)) => unsafe { sqlite3_bind_int64(statement, position, v) },
            Value::UInt8(Some(v)) => unsafe { sqlite3_bind_int(statement, position, v as c_int) },
            Value::UInt16(Some(v)) => unsafe { sqlite3_bind_int(statement, position, v as c_int) },
            Value::UInt32(Some(v)) => unsafe { sqlite3_bind_int64(statement, position, v as i64) },
            Value::UInt64(Some(v)) => {
                let Ok(v) = i64::try_from(v) else {
                    return Err(log_error!(Error::new(TypeMappingError::new(
                        format!("parameter {index}"),
                        format!("{v} is out of the range of a sqlite integer"),
                    ))));
                };
                unsafe { sqlite3_bind_int64(statement, position, v) }
            }
            Value::Float32(Some(v)) => unsafe {
                sqlite3_bind_double(statement, position, v as f64)
            },
            Value::Float64(Some(v)) => unsafe { sqlite3_bind_double(statement, position, v) },
            Value::Decimal(Some(v)) => bind_text(statement, position, &v.to_string()),
            Value::Varchar(Some(v)) => bind_text(statement, position, &v),
            Value::Blob(Some(v)) => unsafe {
                sqlite3_bind_blob(
                    statement,
                    position,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                )
            },
            Value::Date(Some(v)) => {
                bind_text(statement, position, &v.format(DATE_FORMAT).map_err(format_error)?)
            }
            Value::Time(Some(v)) => {
                bind_text(statement, position, &v.format(TIME_FORMAT).map_err(format_error)?)
            }
            Value::Timestamp(Some(v)) => bind_text(
                statement,
                position,
                &v.format(TIMESTAMP_FORMAT).map_err(format_error)?,
            ),
            Value::TimestampWithTimezone(Some(v)) => bind_text(
                statement,
                position,
                &v.format(TIMESTAMPTZ_FORMAT).map_err(format_error)?,
            ),
            Value::Uuid(Some(v)) => bind_text(statement, position, &v.hyphenated().to_string()),
            value @ Value::List(..) => {
                let json = json_element(value)
                    .and_then(|v| Ok(serde_json::to_string(&v)?))
                    .map_err(|e| log_error!(e))?;
                bind_text(statement, position, &json)
            }
            _ => unsafe { sqlite3_bind_null(statement, position) },
        };
        if rc != SQLITE_OK {
            let error = self
                .error(rc)
                .context(format!("Cannot bind parameter {}", index));
            return Err(log_error!(error));
        }
        Ok(())
    }

    fn query(&mut self) -> Result<RowIter<'_>> {
        let statement = *self.statement;
        unsafe {
            sqlite3_reset(statement);
        }
        let count = unsafe { sqlite3_column_count(statement) };
        let labels = (0..count)
            .map(|i| extract_name(statement, i))
            .collect::<Result<RowNames>>()?;
        let sql = self.sql();
        let mut done = false;
        Ok(Box::new(iter::from_fn(move || {
            if done {
                return None;
            }
            match unsafe { sqlite3_step(statement) } {
                SQLITE_ROW => Some(
                    (0..count)
                        .map(|i| extract_value(statement, i))
                        .collect::<Result<Row>>()
                        .map(|values| RowLabeled::new(labels.clone(), values)),
                ),
                SQLITE_DONE => {
                    done = true;
                    None
                }
                rc => {
                    done = true;
                    let error = unsafe {
                        SqliteError::from_connection(sqlite3_db_handle(statement), rc)
                    }
                    .context(format!("While running the query:\n{}", truncate_long!(sql)));
                    Some(Err(log_error!(error)))
                }
            }
        })))
    }

    fn execute(&mut self) -> Result<RowsAffected> {
        let statement = *self.statement;
        let db = unsafe {
            sqlite3_reset(statement);
            sqlite3_db_handle(statement)
        };
        let changes_before = unsafe { sqlite3_total_changes64(db) };
        loop {
            // Busy is returned like any other failure, retrying is up to the caller
            match unsafe { sqlite3_step(statement) } {
                SQLITE_ROW => continue,
                SQLITE_DONE => break,
                rc => return Err(log_error!(self.error(rc))),
            }
        }
        // sqlite3_changes keeps the count of the last DML, DDL must not report it
        let (rows_affected, last_insert_id) = unsafe {
            let rows_affected = if sqlite3_total_changes64(db) != changes_before {
                sqlite3_changes64(db).max(0) as u64
            } else {
                0
            };
            (rows_affected, sqlite3_last_insert_rowid(db))
        };
        self.last_insert_id = (self.generated_keys && rows_affected > 0).then_some(last_insert_id);
        Ok(RowsAffected {
            rows_affected,
            last_affected_id: self.last_insert_id,
        })
    }

    fn generated_keys(&mut self) -> Result<RowIter<'_>> {
        let labels: RowNames = Arc::from(["last_insert_rowid()".to_string()]);
        Ok(Box::new(self.last_insert_id.into_iter().map(move |id| {
            Ok(RowLabeled::new(
                labels.clone(),
                Box::new([Value::Int64(Some(id))]),
            ))
        })))
    }
}

impl Display for SqlitePrepared<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:p}", *self.statement)
    }
}

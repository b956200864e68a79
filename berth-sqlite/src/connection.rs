use crate::{CBox, SqliteDriver, SqliteError, SqlitePrepared, error_message_from_ptr};
use berth_core::{Connection, Context, Driver, Error, Result, log_error, truncate_long};
use libsqlite3_sys::{
    SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, sqlite3,
    sqlite3_close, sqlite3_errmsg, sqlite3_finalize, sqlite3_open_v2, sqlite3_prepare_v2,
};
use std::{
    ffi::{CStr, CString, c_int},
    ptr,
};

/// A connection to a sqlite database.
///
/// `sqlite://` is followed by the percent-encoded path of the database file, opened as a
/// sqlite URI filename (`sqlite://:memory:` is a private in-memory database). Missing files are
/// created.
pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
}

impl Connection for SqliteConnection {
    type Driver = SqliteDriver;
    type Statement<'c> = SqlitePrepared<'c>;

    fn connect(url: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(path) = url.strip_prefix(&prefix) else {
            return Err(log_error!(Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ))));
        };
        let context = || format!("Error while decoding connection URL: `{}`", url);
        let path = urlencoding::decode(path).with_context(context)?;
        let path = CString::new(format!("file:{path}")).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                path.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let error = SqliteError::from_connection(*connection, rc)
                .context(format!("Could not open the database `{}`", url));
            return Err(log_error!(error));
        }
        log::debug!("Connected to sqlite database `{}`", url);
        Ok(Self { connection })
    }

    fn driver(&self) -> &Self::Driver {
        &SqliteDriver {}
    }

    fn prepare(&mut self, sql: &str, generated_keys: bool) -> Result<SqlitePrepared<'_>> {
        let context = || format!("While preparing the query:\n{}", truncate_long!(sql));
        let query = CString::new(sql)
            .context("Could not create a CString from the query String")
            .with_context(context)
            .map_err(|e| log_error!(e))?;
        let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_finalize(p);
        });
        let mut tail = ptr::null();
        let rc = unsafe {
            sqlite3_prepare_v2(
                *self.connection,
                query.as_ptr(),
                query.as_bytes_with_nul().len() as c_int,
                &mut *statement,
                &mut tail,
            )
        };
        if rc != SQLITE_OK {
            let error = SqliteError::from_connection(*self.connection, rc).context(context());
            return Err(log_error!(error));
        }
        if statement.is_null() {
            return Err(log_error!(
                Error::msg("The query does not contain any statement").context(context())
            ));
        }
        let remaining = unsafe { tail.as_ref().map(|tail| CStr::from_ptr(tail)) };
        if remaining.is_some_and(|v| !v.to_bytes().iter().all(u8::is_ascii_whitespace)) {
            return Err(log_error!(
                Error::msg("Cannot prepare more than one statement at a time").context(context())
            ));
        }
        Ok(SqlitePrepared::new(statement, generated_keys))
    }
}

impl SqliteError {
    pub(crate) fn from_connection(connection: *mut sqlite3, code: c_int) -> Error {
        let message = unsafe { error_message_from_ptr(&sqlite3_errmsg(connection)).to_string() };
        Error::new(SqliteError { code, message })
    }
}

#![allow(dead_code)]
use berth::{
    Connection, Driver, GenericSqlWriter, Result, RowIter, RowLabeled, RowNames, RowsAffected,
    Statement, Value,
};
use std::{collections::VecDeque, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("mock store failure: {0}")]
pub struct MockError(pub String);

#[derive(Default, Debug, Clone, Copy)]
pub struct MockDriver;

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;
    type Error = MockError;

    const NAME: &'static str = "mock";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }
}

/// A statement as seen by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub generated_keys: bool,
    pub binds: Vec<(usize, Value)>,
}

/// Connection recording every statement, answering with scripted rows.
#[derive(Default, Debug)]
pub struct MockConnection {
    driver: MockDriver,
    pub executed: Vec<Executed>,
    /// Rows returned by the next queries, one entry per query.
    pub results: VecDeque<Vec<RowLabeled>>,
    /// Rows returned as generated keys, one entry per execution preparing them.
    pub generated: VecDeque<Vec<RowLabeled>>,
    pub rows_affected: u64,
    /// Fails the next prepare with a [`MockError`].
    pub fail_prepare: bool,
    /// Statements prepared and not yet dropped.
    pub open: usize,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<RowLabeled>) -> Self {
        self.results.push_back(rows);
        self
    }

    pub fn with_generated(mut self, rows: Vec<RowLabeled>) -> Self {
        self.generated.push_back(rows);
        self
    }

    pub fn last(&self) -> &Executed {
        self.executed.last().expect("No statement was prepared")
    }
}

impl Connection for MockConnection {
    type Driver = MockDriver;
    type Statement<'c> = MockStatement<'c>;

    fn connect(url: &str) -> Result<Self> {
        if !url.starts_with("mock://") {
            return Err(MockError(format!("Unexpected url `{url}`")).into());
        }
        Ok(Self::new())
    }

    fn driver(&self) -> &MockDriver {
        &self.driver
    }

    fn prepare(&mut self, sql: &str, generated_keys: bool) -> Result<MockStatement<'_>> {
        if self.fail_prepare {
            self.fail_prepare = false;
            return Err(MockError(format!("Cannot prepare `{sql}`")).into());
        }
        self.executed.push(Executed {
            sql: sql.to_string(),
            generated_keys,
            binds: Vec::new(),
        });
        self.open += 1;
        Ok(MockStatement {
            connection: self,
            generated: Vec::new(),
        })
    }
}

pub struct MockStatement<'c> {
    connection: &'c mut MockConnection,
    generated: Vec<RowLabeled>,
}

impl MockStatement<'_> {
    fn executed(&mut self) -> &mut Executed {
        self.connection
            .executed
            .last_mut()
            .expect("The statement was recorded when prepared")
    }
}

impl Statement for MockStatement<'_> {
    fn bind(&mut self, index: usize, value: Value) -> Result<()> {
        self.executed().binds.push((index, value));
        Ok(())
    }

    fn query(&mut self) -> Result<RowIter<'_>> {
        let rows = self.connection.results.pop_front().unwrap_or_default();
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn execute(&mut self) -> Result<RowsAffected> {
        if self.executed().generated_keys {
            self.generated = self.connection.generated.pop_front().unwrap_or_default();
        }
        Ok(RowsAffected {
            rows_affected: self.connection.rows_affected,
            last_affected_id: None,
        })
    }

    fn generated_keys(&mut self) -> Result<RowIter<'_>> {
        Ok(Box::new(self.generated.drain(..).map(Ok)))
    }
}

impl Drop for MockStatement<'_> {
    fn drop(&mut self) {
        self.connection.open -= 1;
    }
}

pub fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
    let labels: RowNames = labels.iter().map(|v| v.to_string()).collect::<Arc<[_]>>();
    RowLabeled::new(labels, values.into())
}

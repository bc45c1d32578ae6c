//! Execution gateway: the three driver operations a command needs.
//!
//! [`Command::go`](crate::Command::go) only talks to a [`Gateway`]. The implementations here
//! adapt `tokio-postgres` clients and transactions (and pooled `deadpool-postgres` clients with
//! the `pool` feature); tests substitute an in-memory gateway.

use crate::error::{ChainError, ChainResult};
use crate::value::{Value, ValueHolder, ValueParam};
use bytes::{BufMut, Bytes, BytesMut};
use futures_util::SinkExt;
use std::fmt::Write;
use tokio_postgres::types::ToSql;

/// Column names plus decoded tuples returned by [`Gateway::query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub tuples: Vec<Vec<Value>>,
}

/// A database connection able to run commands.
///
/// `sql` passed to `query` and `execute` already uses `$1, $2, ...` parameters.
pub trait Gateway: Send + Sync {
    /// Run a statement and return every row.
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = ChainResult<QueryOutput>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = ChainResult<u64>> + Send;

    /// Load `rows` into `table` in one round trip and return the number of rows written.
    fn bulk_load(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> impl std::future::Future<Output = ChainResult<u64>> + Send;
}

impl<G: Gateway> Gateway for &G {
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = ChainResult<QueryOutput>> + Send {
        G::query(self, sql, args)
    }

    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl std::future::Future<Output = ChainResult<u64>> + Send {
        G::execute(self, sql, args)
    }

    fn bulk_load(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> impl std::future::Future<Output = ChainResult<u64>> + Send {
        G::bulk_load(self, table, columns, rows)
    }
}

impl Gateway for tokio_postgres::Client {
    async fn query(&self, sql: &str, args: &[Value]) -> ChainResult<QueryOutput> {
        pg_query(self, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> ChainResult<u64> {
        pg_execute(self, sql, args).await
    }

    async fn bulk_load(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> ChainResult<u64> {
        pg_copy_in(self, table, columns, rows).await
    }
}

impl Gateway for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, args: &[Value]) -> ChainResult<QueryOutput> {
        pg_query(self, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> ChainResult<u64> {
        pg_execute(self, sql, args).await
    }

    async fn bulk_load(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> ChainResult<u64> {
        pg_copy_in(self, table, columns, rows).await
    }
}

#[cfg(feature = "pool")]
impl Gateway for deadpool_postgres::Client {
    async fn query(&self, sql: &str, args: &[Value]) -> ChainResult<QueryOutput> {
        let client: &tokio_postgres::Client = self;
        pg_query(client, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> ChainResult<u64> {
        let client: &tokio_postgres::Client = self;
        pg_execute(client, sql, args).await
    }

    async fn bulk_load(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> ChainResult<u64> {
        let client: &tokio_postgres::Client = self;
        pg_copy_in(client, table, columns, rows).await
    }
}

// ===== tokio-postgres plumbing =====

async fn pg_query<C>(client: &C, sql: &str, args: &[Value]) -> ChainResult<QueryOutput>
where
    C: tokio_postgres::GenericClient + Sync,
{
    // Prepare first so the column list is known even when no rows come back.
    let stmt = client
        .prepare(sql)
        .await
        .map_err(ChainError::from_db_error)?;
    let columns: Vec<String> = stmt
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let params: Vec<ValueParam<'_>> = args.iter().map(ValueParam).collect();
    let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
    let rows = client
        .query(&stmt, &refs)
        .await
        .map_err(ChainError::from_db_error)?;

    let tuples = rows
        .iter()
        .map(decode_row)
        .collect::<ChainResult<Vec<_>>>()?;
    Ok(QueryOutput { columns, tuples })
}

async fn pg_execute<C>(client: &C, sql: &str, args: &[Value]) -> ChainResult<u64>
where
    C: tokio_postgres::GenericClient + Sync,
{
    let params: Vec<ValueParam<'_>> = args.iter().map(ValueParam).collect();
    let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
    client
        .execute(sql, &refs)
        .await
        .map_err(ChainError::from_db_error)
}

async fn pg_copy_in<C>(
    client: &C,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
) -> ChainResult<u64>
where
    C: tokio_postgres::GenericClient + Sync,
{
    let stmt = copy_statement(table, columns);
    let payload = encode_copy_rows(rows);

    let sink = client
        .client()
        .copy_in::<_, Bytes>(stmt.as_str())
        .await
        .map_err(ChainError::from_db_error)?;
    let mut sink = std::pin::pin!(sink);
    sink.send(payload)
        .await
        .map_err(ChainError::from_db_error)?;
    sink.as_mut()
        .finish()
        .await
        .map_err(ChainError::from_db_error)
}

fn decode_row(row: &tokio_postgres::Row) -> ChainResult<Vec<Value>> {
    (0..row.len())
        .map(|idx| {
            row.try_get::<_, ValueHolder>(idx)
                .map(|holder| holder.0)
                .map_err(|e| ChainError::decode(row.columns()[idx].name(), e.to_string()))
        })
        .collect()
}

pub(crate) fn copy_statement(table: &str, columns: &[String]) -> String {
    format!("COPY {} ({}) FROM STDIN", table, columns.join(", "))
}

/// Encode rows in COPY text format: tab separated fields, newline terminated rows.
pub(crate) fn encode_copy_rows(rows: &[Vec<Value>]) -> Bytes {
    let mut buf = BytesMut::new();
    for row in rows {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                buf.put_u8(b'\t');
            }
            match value {
                Value::Null => buf.put_slice(b"\\N"),
                other => buf.put_slice(escape_copy(&copy_literal(other)).as_bytes()),
            }
        }
        buf.put_u8(b'\n');
    }
    buf.freeze()
}

/// Postgres input syntax for a non-null value, before COPY escaping.
fn copy_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "t".to_string(),
        Value::Bool(false) => "f".to_string(),
        Value::Float(v) if v.is_nan() => "NaN".to_string(),
        Value::Float(v) if v.is_infinite() => {
            let literal = if *v > 0.0 { "Infinity" } else { "-Infinity" };
            literal.to_string()
        }
        Value::Map(_) => serde_json::to_string(value).unwrap_or_default(),
        Value::List(items) => {
            let mut out = String::from("{");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                match item {
                    Value::Null => out.push_str("NULL"),
                    other => {
                        let inner = copy_literal(other)
                            .replace('\\', "\\\\")
                            .replace('"', "\\\"");
                        let _ = write!(&mut out, "\"{inner}\"");
                    }
                }
            }
            out.push('}');
            out
        }
        other => other.to_string(),
    }
}

fn escape_copy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vals;

    #[test]
    fn copy_statement_lists_columns() {
        let cols = ["name", "age", "email"].map(String::from);
        assert_eq!(
            copy_statement("actor", &cols),
            "COPY actor (name, age, email) FROM STDIN"
        );
    }

    #[test]
    fn encodes_rows_as_copy_text() {
        let rows = vec![
            vals!["Ryan Bryan", 4, "mc@ortserga.com"],
            vals!["a\tb", None::<i32>, true],
        ];
        let payload = encode_copy_rows(&rows);
        assert_eq!(
            &payload[..],
            b"Ryan Bryan\t4\tmc@ortserga.com\na\\tb\t\\N\tt\n"
        );
    }

    #[test]
    fn escapes_backslashes_and_newlines() {
        let payload = encode_copy_rows(&[vals!["C:\\tmp\nx"]]);
        assert_eq!(&payload[..], b"C:\\\\tmp\\nx\n");
    }

    #[test]
    fn bytes_use_escaped_hex() {
        let payload = encode_copy_rows(&[vec![Value::Bytes(vec![0x01, 0xff])]]);
        assert_eq!(&payload[..], b"\\\\x01ff\n");
    }

    #[test]
    fn lists_become_array_literals() {
        let payload = encode_copy_rows(&[vec![Value::list([
            Value::from("a\"b"),
            Value::Null,
            Value::from(3),
        ])]]);
        assert_eq!(&payload[..], b"{\"a\\\\\"b\",NULL,\"3\"}\n");
    }

    #[test]
    fn special_floats() {
        let payload = encode_copy_rows(&[vals![f64::INFINITY, f64::NAN, 1.5]]);
        assert_eq!(&payload[..], b"Infinity\tNaN\t1.5\n");
    }
}

//! Sending a command to a [`Gateway`].

use super::{Command, Draft};
use crate::error::{ChainError, ChainResult};
use crate::gateway::{Gateway, QueryOutput, copy_statement};
use crate::placeholder::{count_placeholders, translate_placeholders};
use crate::result::ResultSet;
use std::future::Future;

impl Command {
    /// Execute the command.
    ///
    /// - A chain with a build error returns it; the gateway is never called.
    /// - In insert mode the recorded rows are bulk-loaded and `Ok(None)` is returned.
    /// - A command without `SELECT` is executed for its side effects and returns `Ok(None)`.
    /// - Otherwise every returned row is read before this resolves, as `Ok(Some(results))`.
    pub async fn go<G: Gateway>(&self, gateway: &G) -> ChainResult<Option<ResultSet>> {
        self.dispatch(gateway, None).await
    }

    /// [`Command::go`] with a prefetch hint.
    ///
    /// Results are still fully materialized; the hint is recorded in the SQL log so callers can
    /// see how many rows a site expects to buffer.
    pub async fn go_prefetch<G: Gateway>(
        &self,
        gateway: &G,
        prefetch: usize,
    ) -> ChainResult<Option<ResultSet>> {
        self.dispatch(gateway, Some(prefetch)).await
    }

    async fn dispatch<G: Gateway>(
        &self,
        gateway: &G,
        prefetch: Option<usize>,
    ) -> ChainResult<Option<ResultSet>> {
        let draft = match &self.state {
            Ok(draft) => draft,
            Err(err) => {
                tracing::warn!(
                    target: "pgchain.sql",
                    error = %err,
                    "command not executed: chain has a build error"
                );
                return Err(err.clone().into());
            }
        };

        if draft.is_insert_mode() {
            return self.bulk_load(gateway, draft).await.map(|_| None);
        }

        let markers = count_placeholders(&draft.text);
        if markers != draft.args.len() {
            tracing::warn!(
                target: "pgchain.sql",
                markers,
                param_count = draft.args.len(),
                "marker count differs from bound arguments"
            );
        }

        let sql = translate_placeholders(&draft.text);
        if draft.is_void {
            self.log_before("execute", &sql, draft.args.len(), prefetch);
            let affected = self.timed(gateway.execute(&sql, &draft.args)).await?;
            if self.config.log_sql {
                tracing::debug!(target: "pgchain.sql", affected, "execute finished");
            }
            return Ok(None);
        }

        self.log_before("query", &sql, draft.args.len(), prefetch);
        let QueryOutput { columns, tuples } = self.timed(gateway.query(&sql, &draft.args)).await?;
        let results = ResultSet::from_tuples(columns, tuples);
        if self.config.log_sql {
            tracing::debug!(target: "pgchain.sql", rows = results.count(), "query finished");
        }
        Ok(Some(results))
    }

    async fn bulk_load<G: Gateway>(&self, gateway: &G, draft: &Draft) -> ChainResult<u64> {
        let table = draft.table.as_deref().unwrap_or_default();
        self.log_before(
            "bulk_load",
            &copy_statement(table, &draft.columns),
            draft.rows.len(),
            None,
        );
        let written = self
            .timed(gateway.bulk_load(table, &draft.columns, &draft.rows))
            .await?;
        if self.config.log_sql {
            tracing::debug!(target: "pgchain.sql", rows = written, "bulk load finished");
        }
        Ok(written)
    }

    async fn timed<T>(&self, fut: impl Future<Output = ChainResult<T>>) -> ChainResult<T> {
        match self.config.query_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ChainError::Timeout(limit))?,
            None => fut.await,
        }
    }

    fn log_before(&self, kind: &'static str, sql: &str, param_count: usize, prefetch: Option<usize>) {
        if !self.config.log_sql {
            return;
        }
        let sql = self.config.truncate_sql(sql);
        tracing::debug!(
            target: "pgchain.sql",
            kind,
            param_count,
            prefetch = ?prefetch,
            sql = %sql,
            "sending command"
        );
    }
}

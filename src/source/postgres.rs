//! PostgreSQL table extractor

use crate::config::SourceConfig;
use crate::error::EtlError;
use crate::etl::Extractor;
use crate::records::{RecordSet, Row};
use eyre::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row as _};

const COLUMNS_SQL: &str = "SELECT column_name::text \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

/// Extractor that reads every row and column of one table
///
/// Column names come from the table schema verbatim and in ordinal
/// order. Every value is cast to text in the query, so a cell is either
/// the value's text form or `None` for SQL `NULL`.
///
/// Each extraction opens its own connection and closes it before
/// returning, whether or not the extraction succeeded. Nothing is retried
/// here.
///
/// # Example
/// ```no_run
/// use table_indexer::config::SourceConfig;
/// use table_indexer::etl::Extractor;
/// use table_indexer::source::PostgresExtractor;
///
/// # async fn example() -> eyre::Result<()> {
/// let extractor = PostgresExtractor::new(SourceConfig::default());
/// let raw = extractor.extract().await?;
/// println!("{} rows x {} columns", raw.len(), raw.width());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PostgresExtractor {
    config: SourceConfig,
}

impl PostgresExtractor {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.database)
            .username(&self.config.user)
            .password(&self.config.password)
    }

    async fn connect(&self) -> Result<PgConnection, EtlError> {
        log::debug!("Connecting to {}", self.config);
        PgConnection::connect_with(&self.connect_options())
            .await
            .map_err(|e| {
                EtlError::connectivity(format!("cannot connect to {}: {}", self.config, e))
            })
    }

    /// Close a connection; a failure is only logged
    async fn close(&self, conn: PgConnection) {
        if let Err(e) = conn.close().await {
            log::warn!("Failed to close connection to {}: {}", self.config, e);
        }
    }

    /// Verify the source is reachable with the configured credentials
    pub async fn check(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(classify_sqlx);
        self.close(conn).await;
        result?;

        log::debug!("Source {} is reachable", self.config);
        Ok(())
    }

    async fn extract_table(&self) -> Result<RecordSet, EtlError> {
        let mut conn = self.connect().await?;
        let result = self.fetch_table(&mut conn).await;
        self.close(conn).await;
        result
    }

    async fn fetch_table(&self, conn: &mut PgConnection) -> Result<RecordSet, EtlError> {
        let schema = &self.config.schema;
        let table = &self.config.table;

        let columns: Vec<String> = sqlx::query_scalar(COLUMNS_SQL)
            .bind(schema.as_str())
            .bind(table.as_str())
            .fetch_all(&mut *conn)
            .await
            .map_err(classify_sqlx)?;

        if columns.is_empty() {
            return Err(EtlError::query(format!(
                "table {}.{} not found or has no columns",
                schema, table
            )));
        }

        let sql = select_sql(schema, table, &columns);
        log::debug!("Running: {}", sql);

        let rows = sqlx::query(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(classify_sqlx)?;

        let mut set = RecordSet::new(columns);
        for pg_row in rows {
            let row = (0..set.width())
                .map(|i| pg_row.try_get::<Option<String>, _>(i))
                .collect::<Result<Row, _>>()
                .map_err(classify_sqlx)?;
            set.push_row(row)
                .map_err(|e| EtlError::query(e.to_string()))?;
        }

        Ok(set)
    }
}

impl Extractor for PostgresExtractor {
    type Output = RecordSet;

    async fn extract(&self) -> Result<Self::Output> {
        let set = self
            .extract_table()
            .await
            .with_context(|| {
                format!(
                    "Failed to extract {}.{}",
                    self.config.schema, self.config.table
                )
            })?;

        log::info!(
            "Extracted {} row(s) x {} column(s) from {}.{}",
            set.len(),
            set.width(),
            self.config.schema,
            self.config.table
        );
        Ok(set)
    }
}

/// Quote an identifier for PostgreSQL, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// The fixed full-table query, casting every column to text
fn select_sql(schema: &str, table: &str, columns: &[String]) -> String {
    let projection = columns
        .iter()
        .map(|c| format!("{}::text", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {} FROM {}.{}",
        projection,
        quote_ident(schema),
        quote_ident(table)
    )
}

/// Split driver errors into lost connections and failed queries
fn classify_sqlx(err: sqlx::Error) -> EtlError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => EtlError::connectivity(err.to_string()),
        other => EtlError::query(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::classify;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("table_m3"), "\"table_m3\"");
        assert_eq!(quote_ident("Name "), "\"Name \"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_select_sql() {
        let columns = vec!["Name ".to_string(), "Val".to_string()];
        assert_eq!(
            select_sql("public", "table_m3", &columns),
            "SELECT \"Name \"::text, \"Val\"::text FROM \"public\".\"table_m3\""
        );
    }

    #[test]
    fn test_classify_sqlx() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(matches!(classify_sqlx(io), EtlError::Connectivity(_)));

        let decode = sqlx::Error::ColumnNotFound("val".to_string());
        assert!(matches!(classify_sqlx(decode), EtlError::Query(_)));
    }

    #[tokio::test]
    async fn test_unreachable_source_is_connectivity_error() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let extractor = PostgresExtractor::new(SourceConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        });

        let err = extractor.extract().await.unwrap_err();
        assert!(matches!(classify(&err), Some(EtlError::Connectivity(_))));
        assert!(extractor.check().await.is_err());
    }
}

//! Database source fetching composite values.
//!
//! Wraps a single `tokio_postgres` connection. The connection driver runs on
//! its own tokio task for as long as the [`PgSource`] lives.
//!
//! # Example
//!
//! ```ignore
//! use pgcomposite::source::PgSource;
//! use pgcomposite::decode_composite;
//!
//! let source = PgSource::connect("host=127.0.0.1 user=postgres").await?;
//! let payload = source
//!     .fetch_composite_binary("select row(42, 'foo')", &[])
//!     .await?
//!     .expect("non-NULL composite");
//! let fields = decode_composite(&payload)?;
//! ```

use std::error::Error as StdError;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use crate::error::{CompositeError, Result};

/// Raw binary bytes of a column of any type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn(pub Bytes);

impl<'a> FromSql<'a> for RawColumn {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(RawColumn(Bytes::copy_from_slice(raw)))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// A connection used to fetch composite values.
pub struct PgSource {
    client: Client,
    driver: JoinHandle<()>,
}

impl PgSource {
    /// Connect using a libpq-style connection string.
    ///
    /// # Errors
    ///
    /// Returns `Collaborator` if the string is invalid or the connection fails.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls).await?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Connection error: {}", e);
            }
        });

        tracing::debug!("Connected to database");
        Ok(Self { client, driver })
    }

    /// Fetch the first column of the first row in text format.
    ///
    /// Uses the simple query protocol. Returns `None` if the value is NULL.
    ///
    /// # Errors
    ///
    /// Returns `Collaborator` if the query fails, or `NoRows` if it produced
    /// no rows.
    pub async fn fetch_composite_text(&self, sql: &str) -> Result<Option<String>> {
        let messages = self.client.simple_query(sql).await?;
        first_text_column(&messages)
    }

    /// Fetch the first column of exactly one row in binary format.
    ///
    /// Returns `None` if the value is NULL.
    ///
    /// # Errors
    ///
    /// Returns `Collaborator` if the query fails or does not return exactly
    /// one row.
    pub async fn fetch_composite_binary(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Bytes>> {
        let row = self.client.query_one(sql, params).await?;
        let column: Option<RawColumn> = row.try_get(0)?;

        if let Some(RawColumn(bytes)) = &column {
            tracing::debug!(
                "Fetched {} bytes of type {}",
                bytes.len(),
                row.columns()[0].type_()
            );
        }
        Ok(column.map(|c| c.0))
    }

    /// Close the connection.
    pub async fn close(self) {
        drop(self.client);
        // The driver exits once the client is dropped.
        let _ = self.driver.await;
    }
}

/// Text of the first column of the first row among simple query messages.
fn first_text_column(messages: &[SimpleQueryMessage]) -> Result<Option<String>> {
    messages
        .iter()
        .find_map(|msg| match msg {
            SimpleQueryMessage::Row(row) => Some(row.get(0).map(str::to_string)),
            _ => None,
        })
        .ok_or(CompositeError::NoRows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_column_accepts_any_type() {
        assert!(<RawColumn as FromSql>::accepts(&Type::RECORD));
        assert!(<RawColumn as FromSql>::accepts(&Type::INT4));
        assert!(<RawColumn as FromSql>::accepts(&Type::TEXT));
    }

    #[test]
    fn test_raw_column_copies_bytes() {
        let raw = [0, 0, 0, 0];
        let column = RawColumn::from_sql(&Type::RECORD, &raw).unwrap();
        assert_eq!(&column.0[..], &raw);
    }

    #[test]
    fn test_no_rows_is_an_error() {
        assert!(matches!(first_text_column(&[]), Err(CompositeError::NoRows)));
        assert!(matches!(
            first_text_column(&[SimpleQueryMessage::CommandComplete(0)]),
            Err(CompositeError::NoRows)
        ));
    }

    #[tokio::test]
    async fn test_invalid_dsn_is_collaborator_error() {
        let err = PgSource::connect("host='unterminated").await.err().unwrap();
        assert!(matches!(err, CompositeError::Collaborator(_)));
    }
}

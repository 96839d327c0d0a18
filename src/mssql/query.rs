use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::TryStreamExt;
use rust_decimal::Decimal;
use tiberius::{ColumnData, FromSql, QueryItem, QueryStream, Row};

use crate::error::SqlClientError;
use crate::row::{ColumnNames, DataRow};
use crate::traits::DataReader;
use crate::types::SqlValue;

/// Forward-only reader over the first result set of a tiberius query stream.
///
/// Rows of later result sets are never surfaced; the reader reports the end
/// as soon as the next result set's metadata arrives.
pub struct MssqlReader<'a> {
    items: QueryStream<'a>,
    columns: Arc<ColumnNames>,
    result_sets: ResultSetCursor,
}

impl<'a> MssqlReader<'a> {
    pub(crate) fn new(items: QueryStream<'a>) -> Self {
        Self {
            items,
            columns: Arc::default(),
            result_sets: ResultSetCursor::default(),
        }
    }
}

#[async_trait]
impl<'a> DataReader for MssqlReader<'a> {
    async fn read(&mut self) -> Result<Option<DataRow>, SqlClientError> {
        if self.result_sets.finished {
            return Ok(None);
        }
        while let Some(item) = self.items.try_next().await? {
            match item {
                QueryItem::Metadata(meta) => {
                    if !self.result_sets.enter() {
                        return Ok(None);
                    }
                    let names = meta.columns().iter().map(|col| col.name().to_string()).collect();
                    self.columns = Arc::new(ColumnNames::new(names));
                }
                QueryItem::Row(row) => {
                    return Ok(Some(DataRow::new(Arc::clone(&self.columns), convert_row(row)?)));
                }
            }
        }
        self.result_sets.finished = true;
        Ok(None)
    }
}

/// Tracks result-set boundaries so only the first one is read.
#[derive(Debug, Default)]
struct ResultSetCursor {
    started: bool,
    finished: bool,
}

impl ResultSetCursor {
    /// Called on each metadata token. `false` once a second result set begins.
    fn enter(&mut self) -> bool {
        if self.started {
            self.finished = true;
            return false;
        }
        self.started = true;
        true
    }
}

/// Convert every column of a fetched row.
///
/// # Errors
///
/// Returns the driver error if a date/time column cannot be decoded.
pub fn convert_row(row: Row) -> Result<Vec<SqlValue>, SqlClientError> {
    row.into_iter().map(|data| convert_column(&data)).collect()
}

/// Convert one column value; every `None` variant becomes `SqlValue::Null`.
///
/// # Errors
///
/// Returns the driver error if a date/time column cannot be decoded.
pub fn convert_column(data: &ColumnData<'static>) -> Result<SqlValue, SqlClientError> {
    let value = match data {
        ColumnData::Bit(Some(b)) => SqlValue::Bool(*b),
        ColumnData::U8(Some(v)) => SqlValue::Int(i64::from(*v)),
        ColumnData::I16(Some(v)) => SqlValue::Int(i64::from(*v)),
        ColumnData::I32(Some(v)) => SqlValue::Int(i64::from(*v)),
        ColumnData::I64(Some(v)) => SqlValue::Int(*v),
        ColumnData::F32(Some(v)) => SqlValue::Float(f64::from(*v)),
        ColumnData::F64(Some(v)) => SqlValue::Float(*v),
        ColumnData::Numeric(Some(n)) => {
            Decimal::try_from_i128_with_scale(n.value(), u32::from(n.scale()))
                .map(SqlValue::Decimal)
                .map_err(|e| SqlClientError::ColumnError(format!(
                    "numeric {}e-{} out of range: {e}",
                    n.value(),
                    n.scale()
                )))?
        }
        ColumnData::String(Some(s)) => SqlValue::Text(s.to_string()),
        ColumnData::Guid(Some(g)) => SqlValue::Text(g.to_string()),
        ColumnData::Xml(Some(xml)) => SqlValue::Text(xml.to_string()),
        ColumnData::Binary(Some(bytes)) => SqlValue::Blob(bytes.to_vec()),
        ColumnData::DateTime(Some(_))
        | ColumnData::SmallDateTime(Some(_))
        | ColumnData::DateTime2(Some(_)) => {
            NaiveDateTime::from_sql(data)?.map_or(SqlValue::Null, SqlValue::Timestamp)
        }
        ColumnData::Date(Some(_)) => NaiveDate::from_sql(data)?.map_or(SqlValue::Null, SqlValue::Date),
        ColumnData::Time(Some(_)) => NaiveTime::from_sql(data)?.map_or(SqlValue::Null, SqlValue::Time),
        ColumnData::DateTimeOffset(Some(_)) => chrono::DateTime::<Utc>::from_sql(data)?
            .map_or(SqlValue::Null, |dt| SqlValue::Timestamp(dt.naive_utc())),
        _ => SqlValue::Null,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn scalar_columns() {
        assert_eq!(convert_column(&ColumnData::I32(Some(123))).unwrap(), SqlValue::Int(123));
        assert_eq!(convert_column(&ColumnData::U8(Some(7))).unwrap(), SqlValue::Int(7));
        assert_eq!(convert_column(&ColumnData::Bit(Some(true))).unwrap(), SqlValue::Bool(true));
        assert_eq!(
            convert_column(&ColumnData::String(Some(Cow::Borrowed("abc")))).unwrap(),
            SqlValue::Text("abc".into())
        );
        assert_eq!(
            convert_column(&ColumnData::Binary(Some(Cow::Owned(vec![1, 2])))).unwrap(),
            SqlValue::Blob(vec![1, 2])
        );
    }

    #[test]
    fn money_arrives_as_float() {
        // tiberius hands money/smallmoney over as F64
        assert_eq!(convert_column(&ColumnData::F64(Some(12.5))).unwrap(), SqlValue::Float(12.5));
    }

    #[test]
    fn nulls_of_any_type() {
        assert_eq!(convert_column(&ColumnData::I64(None)).unwrap(), SqlValue::Null);
        assert_eq!(convert_column(&ColumnData::String(None)).unwrap(), SqlValue::Null);
        assert_eq!(convert_column(&ColumnData::DateTime2(None)).unwrap(), SqlValue::Null);
    }

    #[test]
    fn only_the_first_result_set_is_entered() {
        let mut cursor = ResultSetCursor::default();
        assert!(cursor.enter());
        assert!(!cursor.finished);
        assert!(!cursor.enter());
        assert!(cursor.finished);
        assert!(!cursor.enter());
    }

    #[test]
    fn numeric_keeps_scale() {
        let n = tiberius::numeric::Numeric::new_with_scale(12345, 2);
        assert_eq!(
            convert_column(&ColumnData::Numeric(Some(n))).unwrap(),
            SqlValue::Decimal(Decimal::new(12345, 2))
        );
    }
}

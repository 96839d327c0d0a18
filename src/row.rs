use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::SqlClientError;
use crate::types::SqlValue;

/// Column names shared by every row of one result.
#[derive(Debug, Default)]
pub struct ColumnNames {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColumnNames {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // first occurrence wins for duplicated names
            index.entry(name.to_lowercase()).or_insert(i);
        }
        Self { names, index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&str> {
        self.names.get(ordinal).map(String::as_str)
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }
}

/// The current row as handed to a mapper: ordinal-indexed values with typed getters.
///
/// ```rust
/// use std::sync::Arc;
/// use mssql_data_client::prelude::*;
///
/// let columns = Arc::new(ColumnNames::new(vec!["id".into(), "name".into()]));
/// let row = DataRow::new(columns, vec![SqlValue::Int(7), SqlValue::Null]);
/// assert_eq!(row.get_i32(0).unwrap(), 7);
/// assert!(row.is_null(1).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct DataRow {
    columns: Arc<ColumnNames>,
    values: Vec<SqlValue>,
}

impl DataRow {
    #[must_use]
    pub fn new(columns: Arc<ColumnNames>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn column_name(&self, ordinal: usize) -> Option<&str> {
        self.columns.get(ordinal)
    }

    /// Ordinal of a named column, when the driver reported names.
    #[must_use]
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.columns.position(name)
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Raw value at `ordinal`.
    ///
    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` when `ordinal` is out of range.
    pub fn get_value(&self, ordinal: usize) -> Result<&SqlValue, SqlClientError> {
        self.values.get(ordinal).ok_or_else(|| {
            SqlClientError::ColumnError(format!(
                "ordinal {ordinal} out of range for row with {} fields",
                self.values.len()
            ))
        })
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` when `ordinal` is out of range.
    pub fn is_null(&self, ordinal: usize) -> Result<bool, SqlClientError> {
        Ok(self.get_value(ordinal)?.is_null())
    }

    fn typed<T>(
        &self,
        ordinal: usize,
        expected: &str,
        convert: impl FnOnce(&SqlValue) -> Option<T>,
    ) -> Result<T, SqlClientError> {
        let value = self.get_value(ordinal)?;
        convert(value).ok_or_else(|| {
            SqlClientError::ColumnError(format!(
                "column {} holds {}, expected {expected}",
                self.describe(ordinal),
                value.type_name()
            ))
        })
    }

    fn describe(&self, ordinal: usize) -> String {
        match self.columns.get(ordinal) {
            Some(name) if !name.is_empty() => format!("{ordinal} ('{name}')"),
            _ => ordinal.to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-boolean value.
    pub fn get_bool(&self, ordinal: usize) -> Result<bool, SqlClientError> {
        self.typed(ordinal, "bool", SqlValue::as_bool)
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal, a non-integer
    /// value, or a value that does not fit in `i32`.
    pub fn get_i32(&self, ordinal: usize) -> Result<i32, SqlClientError> {
        self.typed(ordinal, "int", |v| {
            v.as_int().and_then(|i| i32::try_from(i).ok())
        })
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-integer value.
    pub fn get_i64(&self, ordinal: usize) -> Result<i64, SqlClientError> {
        self.typed(ordinal, "bigint", SqlValue::as_int)
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-numeric value.
    pub fn get_f64(&self, ordinal: usize) -> Result<f64, SqlClientError> {
        self.typed(ordinal, "float", SqlValue::as_float)
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-decimal value.
    pub fn get_decimal(&self, ordinal: usize) -> Result<Decimal, SqlClientError> {
        self.typed(ordinal, "decimal", SqlValue::as_decimal)
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-text value.
    pub fn get_str(&self, ordinal: usize) -> Result<&str, SqlClientError> {
        let value = self.get_value(ordinal)?;
        value.as_text().ok_or_else(|| {
            SqlClientError::ColumnError(format!(
                "column {} holds {}, expected text",
                self.describe(ordinal),
                value.type_name()
            ))
        })
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-text value.
    pub fn get_string(&self, ordinal: usize) -> Result<String, SqlClientError> {
        self.get_str(ordinal).map(str::to_string)
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-temporal value.
    pub fn get_datetime(&self, ordinal: usize) -> Result<NaiveDateTime, SqlClientError> {
        self.typed(ordinal, "datetime", SqlValue::as_timestamp)
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-temporal value.
    pub fn get_date(&self, ordinal: usize) -> Result<NaiveDate, SqlClientError> {
        self.typed(ordinal, "date", SqlValue::as_date)
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-temporal value.
    pub fn get_time(&self, ordinal: usize) -> Result<NaiveTime, SqlClientError> {
        self.typed(ordinal, "time", SqlValue::as_time)
    }

    /// # Errors
    ///
    /// Returns `SqlClientError::ColumnError` for an out-of-range ordinal or a non-binary value.
    pub fn get_bytes(&self, ordinal: usize) -> Result<&[u8], SqlClientError> {
        let value = self.get_value(ordinal)?;
        value.as_blob().ok_or_else(|| {
            SqlClientError::ColumnError(format!(
                "column {} holds {}, expected binary",
                self.describe(ordinal),
                value.type_name()
            ))
        })
    }
}

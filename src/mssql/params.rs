use tiberius::Query;
use tiberius::numeric::Numeric;

use crate::error::SqlClientError;
use crate::translation::{bare_parameter_name, rewrite_named_parameters};
use crate::types::{SqlParameter, SqlValue};

/// SQL Server's limit on parameters per request.
pub const MAX_PARAMETERS: usize = 2100;

/// Validate `params`, rewrite their `@name` markers to `@P1..@Pn`, and bind them
/// in order onto a new query.
///
/// # Errors
///
/// Returns `SqlClientError::ParameterError` for an empty or duplicated name, or
/// more than [`MAX_PARAMETERS`] parameters.
pub fn bind_query_params(
    sql: &str,
    params: &[SqlParameter],
) -> Result<Query<'static>, SqlClientError> {
    if params.len() > MAX_PARAMETERS {
        return Err(SqlClientError::ParameterError(format!(
            "{} parameters exceed the SQL Server limit of {MAX_PARAMETERS}",
            params.len()
        )));
    }

    let mut names: Vec<&str> = Vec::with_capacity(params.len());
    for param in params {
        let name = bare_parameter_name(&param.name);
        if name.is_empty() {
            return Err(SqlClientError::ParameterError(
                "parameter name is empty".to_string(),
            ));
        }
        if names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            return Err(SqlClientError::ParameterError(format!(
                "parameter '{}' is bound more than once",
                param.name
            )));
        }
        names.push(name);
    }

    let text = rewrite_named_parameters(sql, &names).into_owned();
    let mut query = Query::new(text);
    for param in params {
        bind_value(&mut query, &param.value);
    }
    Ok(query)
}

fn bind_value(query: &mut Query<'static>, value: &SqlValue) {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Decimal(d) => {
            // rust_decimal caps the scale at 28
            #[allow(clippy::cast_possible_truncation)]
            let scale = d.scale() as u8;
            query.bind(Numeric::new_with_scale(d.mantissa(), scale));
        }
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Timestamp(ts) => query.bind(*ts),
        SqlValue::Date(date) => query.bind(*date),
        SqlValue::Time(time) => query.bind(*time),
        SqlValue::Blob(bytes) => query.bind(bytes.clone()),
    }
}

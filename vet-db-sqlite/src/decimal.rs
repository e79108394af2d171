use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};
use vet_core::RepositoryError;

/// Read a decimal column.
///
/// Values written by this crate are TEXT; INTEGER and REAL are accepted too
/// so rows typed in by hand with the sqlite shell still load.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Storage(format!("Column '{}' not found: {}", column, e)))?;

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    match type_name {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Storage(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            Decimal::from_str(val.trim()).map_err(|e| {
                RepositoryError::Serialization(format!(
                    "Column '{}' holds '{}', not a decimal: {}",
                    column, val, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Storage(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Storage(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Serialization(format!(
                    "Failed to convert {} to Decimal: {}",
                    val, e
                ))
            })
        }
        _ => Err(RepositoryError::Serialization(format!(
            "Unexpected type '{}' for decimal column '{}'",
            type_name, column
        ))),
    }
}

/// Exact text form used for storage; trailing zeros are dropped so `10.50`
/// and `10.5` are stored identically.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}

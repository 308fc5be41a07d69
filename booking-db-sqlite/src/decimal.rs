use std::str::FromStr;

use booking_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::{Row, TypeInfo, ValueRef};

/// Get a decimal value from a row.
///
/// Money is written as TEXT, but hand-written seed rows may hold INTEGER or
/// REAL values, so all three storage classes are accepted. NULL reads as zero.
pub fn get_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(Decimal::ZERO);
    }

    let type_name = value_ref.type_info().name().to_string();

    match type_name.as_str() {
        "TEXT" => {
            let val: String = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get TEXT from '{}': {}", column, e))
            })?;
            Decimal::from_str(val.trim()).map_err(|e| {
                RepositoryError::Database(format!(
                    "Invalid decimal '{}' in column '{}': {}",
                    val, column, e
                ))
            })
        }
        "INTEGER" => {
            let val: i64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to get INTEGER from '{}': {}",
                    column, e
                ))
            })?;
            Ok(Decimal::from(val))
        }
        "REAL" => {
            let val: f64 = row.try_get(column).map_err(|e| {
                RepositoryError::Database(format!("Failed to get REAL from '{}': {}", column, e))
            })?;
            Decimal::try_from(val).map_err(|e| {
                RepositoryError::Database(format!("Failed to convert {} to Decimal: {}", val, e))
            })
        }
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{}' for column '{}'",
            other, column
        ))),
    }
}

/// Get an optional decimal value from a row, returning None for NULL values.
pub fn get_optional_decimal(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let value_ref = row
        .try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{}' not found: {}", column, e)))?;

    if value_ref.is_null() {
        return Ok(None);
    }

    get_decimal(row, column).map(Some)
}

/// Storage form of a decimal: its exact string representation.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

    use super::*;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query(
            "CREATE TABLE prices (
                id INTEGER PRIMARY KEY,
                amount
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create test table");
        pool
    }

    async fn read(sql_value: &str) -> (Result<Decimal, RepositoryError>, Result<Option<Decimal>, RepositoryError>) {
        let pool = setup_test_db().await;
        sqlx::query(&format!("INSERT INTO prices (id, amount) VALUES (1, {sql_value})"))
            .execute(&pool)
            .await
            .expect("Failed to insert test data");

        let row = sqlx::query("SELECT amount FROM prices WHERE id = 1")
            .fetch_one(&pool)
            .await
            .expect("Failed to fetch row");

        (get_decimal(&row, "amount"), get_optional_decimal(&row, "amount"))
    }

    #[tokio::test]
    async fn reads_text_exactly() {
        let (value, optional) = read("'149.95'").await;

        assert_eq!(value, Ok(dec!(149.95)));
        assert_eq!(optional, Ok(Some(dec!(149.95))));
    }

    #[tokio::test]
    async fn reads_integer() {
        let (value, _) = read("250").await;

        assert_eq!(value, Ok(dec!(250)));
    }

    #[tokio::test]
    async fn reads_real() {
        let (value, _) = read("99.5").await;

        assert_eq!(value, Ok(dec!(99.5)));
    }

    #[tokio::test]
    async fn null_is_zero_or_none() {
        let (value, optional) = read("NULL").await;

        assert_eq!(value, Ok(Decimal::ZERO));
        assert_eq!(optional, Ok(None));
    }

    #[tokio::test]
    async fn rejects_non_numeric_text() {
        let (value, _) = read("'free'").await;

        assert!(
            matches!(value, Err(RepositoryError::Database(msg)) if msg.starts_with("Invalid decimal 'free'"))
        );
    }

    #[tokio::test]
    async fn missing_column_is_reported() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO prices (id, amount) VALUES (1, 1)")
            .execute(&pool)
            .await
            .expect("Failed to insert test data");
        let row = sqlx::query("SELECT id FROM prices WHERE id = 1")
            .fetch_one(&pool)
            .await
            .expect("Failed to fetch row");

        let result = get_decimal(&row, "amount");

        assert!(
            matches!(result, Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'amount' not found:"))
        );
    }

    #[test]
    fn decimal_to_text_drops_trailing_zeros() {
        assert_eq!(decimal_to_text(dec!(225.00)), "225");
        assert_eq!(decimal_to_text(dec!(10.50)), "10.5");
    }
}

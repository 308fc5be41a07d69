use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use booking_core::{
    Booking, BookingRepository, BookingStatus, CartLine, Coupon, DiscountType, NewBooking,
    NewCoupon, RepositoryError, normalize_code,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const MEMORY: &str = ":memory:";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database`, a file path (created when missing) or `:memory:`.
    ///
    /// An in-memory database lives only as long as its connection, so it is
    /// served by a single-connection pool.
    pub async fn new(database: &str) -> Result<Self> {
        let pool = if database == MEMORY || database == "sqlite::memory:" {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
        } else {
            let options = SqliteConnectOptions::from_str(database)
                .with_context(|| format!("Invalid database location: {}", database))?
                .create_if_missing(true)
                .foreign_keys(true);
            SqlitePoolOptions::new().connect_with(options).await
        }
        .with_context(|| format!("Failed to connect to database: {}", database))?;

        debug!(database, "opened sqlite database");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            info!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn cart_lines(
        &self,
        booking_id: i64,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT service_id, name, price, quantity
             FROM booking_cart_items WHERE booking_id = ? ORDER BY id",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let quantity: i64 = row.try_get("quantity").map_err(db_err)?;
                Ok(CartLine {
                    service_id: row.try_get("service_id").map_err(db_err)?,
                    name: row.try_get("name").map_err(db_err)?,
                    price: get_decimal(row, "price")?,
                    quantity: to_u32(quantity, "quantity")?,
                })
            })
            .collect()
    }

    async fn with_cart_lines(
        &self,
        row: &SqliteRow,
    ) -> Result<Booking, RepositoryError> {
        let mut booking = row_to_booking(row)?;
        booking.cart_lines = self.cart_lines(booking.id).await?;
        Ok(booking)
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn to_u32(
    value: i64,
    column: &str,
) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::Database(format!("Value {} out of range for '{}'", value, column)))
}

const COUPON_COLUMNS: &str = "id, code, name, description, discount_type, discount_value,
    minimum_amount, maximum_discount, usage_limit, used_count, valid_from, valid_until, is_active";

fn row_to_coupon(row: &SqliteRow) -> Result<Coupon, RepositoryError> {
    let discount_type_str: String = row.try_get("discount_type").map_err(db_err)?;
    let discount_type = DiscountType::parse(&discount_type_str).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid discount type: {}", discount_type_str))
    })?;
    let usage_limit: Option<i64> = row.try_get("usage_limit").map_err(db_err)?;
    let used_count: i64 = row.try_get("used_count").map_err(db_err)?;

    Ok(Coupon {
        id: row.try_get("id").map_err(db_err)?,
        code: row.try_get("code").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        discount_type,
        discount_value: get_decimal(row, "discount_value")?,
        minimum_amount: get_decimal(row, "minimum_amount")?,
        maximum_discount: get_optional_decimal(row, "maximum_discount")?,
        usage_limit: usage_limit.map(|limit| to_u32(limit, "usage_limit")).transpose()?,
        used_count: to_u32(used_count, "used_count")?,
        valid_from: row
            .try_get::<DateTime<Utc>, _>("valid_from")
            .map_err(|e| RepositoryError::Database(format!("Failed to get valid_from: {}", e)))?,
        valid_until: row
            .try_get::<DateTime<Utc>, _>("valid_until")
            .map_err(|e| RepositoryError::Database(format!("Failed to get valid_until: {}", e)))?,
        is_active: row.try_get("is_active").map_err(db_err)?,
    })
}

const BOOKING_COLUMNS: &str = "id, reference, service_id, service_name, address_id, booking_date,
    booking_time, payment_method, special_requests, price, coupon_id, discount_amount,
    final_price, status, created_at";

fn row_to_booking(row: &SqliteRow) -> Result<Booking, RepositoryError> {
    let status_str: String = row.try_get("status").map_err(db_err)?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid booking status: {}", status_str)))?;
    let reference: Option<String> = row.try_get("reference").map_err(db_err)?;

    Ok(Booking {
        id: row.try_get("id").map_err(db_err)?,
        reference: reference.unwrap_or_default(),
        service_id: row.try_get("service_id").map_err(db_err)?,
        service_name: row.try_get("service_name").map_err(db_err)?,
        address_id: row.try_get("address_id").map_err(db_err)?,
        booking_date: row
            .try_get::<NaiveDate, _>("booking_date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get booking_date: {}", e)))?,
        booking_time: row.try_get("booking_time").map_err(db_err)?,
        payment_method: row.try_get("payment_method").map_err(db_err)?,
        special_requests: row.try_get("special_requests").map_err(db_err)?,
        price: get_decimal(row, "price")?,
        coupon_id: row.try_get("coupon_id").map_err(db_err)?,
        discount_amount: get_decimal(row, "discount_amount")?,
        final_price: get_decimal(row, "final_price")?,
        status,
        cart_lines: Vec::new(),
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

#[async_trait]
impl BookingRepository for SqliteRepository {
    async fn get_coupon_by_code(
        &self,
        code: &str,
    ) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE code = ?"))
            .bind(normalize_code(code))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_coupon(&row)
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {COUPON_COLUMNS} FROM coupons ORDER BY code"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_coupon).collect()
    }

    async fn upsert_coupon(
        &self,
        coupon: &NewCoupon,
    ) -> Result<Coupon, RepositoryError> {
        let code = normalize_code(&coupon.code);

        sqlx::query(
            "INSERT INTO coupons (
                code, name, description, discount_type, discount_value, minimum_amount,
                maximum_discount, usage_limit, valid_from, valid_until, is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (code) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                discount_type = excluded.discount_type,
                discount_value = excluded.discount_value,
                minimum_amount = excluded.minimum_amount,
                maximum_discount = excluded.maximum_discount,
                usage_limit = excluded.usage_limit,
                valid_from = excluded.valid_from,
                valid_until = excluded.valid_until,
                is_active = excluded.is_active",
        )
        .bind(&code)
        .bind(&coupon.name)
        .bind(&coupon.description)
        .bind(coupon.discount_type.as_str())
        .bind(decimal_to_text(coupon.discount_value))
        .bind(decimal_to_text(coupon.minimum_amount))
        .bind(coupon.maximum_discount.map(decimal_to_text))
        .bind(coupon.usage_limit.map(i64::from))
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(coupon.is_active)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_coupon_by_code(&code).await
    }

    async fn increment_coupon_usage(
        &self,
        coupon_id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE id = ?")
            .bind(coupon_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn create_booking(
        &self,
        booking: NewBooking,
    ) -> Result<Booking, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let result = sqlx::query(
            "INSERT INTO bookings (
                service_id, service_name, address_id, booking_date, booking_time,
                payment_method, special_requests, price, coupon_id, discount_amount,
                final_price, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.service_id)
        .bind(&booking.service_name)
        .bind(booking.address_id)
        .bind(booking.booking_date)
        .bind(&booking.booking_time)
        .bind(&booking.payment_method)
        .bind(&booking.special_requests)
        .bind(decimal_to_text(booking.price))
        .bind(booking.coupon_id)
        .bind(decimal_to_text(booking.discount_amount))
        .bind(decimal_to_text(booking.final_price))
        .bind(booking.status.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();

        sqlx::query("UPDATE bookings SET reference = ? WHERE id = ?")
            .bind(Booking::make_reference(id, now))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for line in &booking.cart_lines {
            sqlx::query(
                "INSERT INTO booking_cart_items (booking_id, service_id, name, price, quantity)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(line.service_id)
            .bind(&line.name)
            .bind(decimal_to_text(line.price))
            .bind(i64::from(line.quantity))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        self.get_booking(id).await
    }

    async fn get_booking(
        &self,
        id: i64,
    ) -> Result<Booking, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        self.with_cart_lines(&row).await
    }

    async fn list_bookings(
        &self,
        booking_date: Option<NaiveDate>,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let rows = match booking_date {
            Some(date) => {
                sqlx::query(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings
                     WHERE booking_date = ? ORDER BY booking_time, id"
                ))
                .bind(date)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY booking_date, booking_time, id"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in &rows {
            bookings.push(self.with_cart_lines(row).await?);
        }
        Ok(bookings)
    }
}

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use vet_core::db::collection::sort_newest_first;
use vet_core::{
    COMPANY_ID, Company, CompanyPatch, Estimate, EstimateRepository, EstimateStatus, Gender,
    LineItem, Owner, Pet, RepositoryError, apply_update, format_estimate_id, next_estimate_number,
};

use crate::decimal::{decimal_to_text, get_decimal};

const SEQUENCE_NAME: &str = "estimate";

const ESTIMATE_COLUMNS: &str = "id, owner_name, owner_address, owner_email, owner_phone, owner_cedula,
     pet_name, pet_breed, pet_age, pet_gender, tax_rate, status, created_at";

const LINE_ITEM_COLUMNS: &str = "estimate_id, id, service, description, quantity, price";

/// Repository backed by a SQLite database.
///
/// Writes are serialized by a mutex and each one runs in a single
/// transaction, so id allocation and the sequence row move together.
pub struct SqliteRepository {
    pool: SqlitePool,
    writer: Mutex<()>,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);

        // Every connection to `:memory:` would otherwise see its own empty
        // database.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        debug!(url = database_url, "connected to sqlite");

        Ok(Self::new_with_pool(pool))
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Mutex::new(()),
        }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

fn column<'r, T>(
    row: &'r SqliteRow,
    name: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Storage(format!("Failed to get '{}': {}", name, e)))
}

fn timestamp_to_text(ts: DateTime<Utc>) -> String {
    // Fixed width, so text order is time order.
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            RepositoryError::Serialization(format!("Failed to parse timestamp '{}': {}", s, e))
        })
}

fn row_to_company(row: &SqliteRow) -> Result<Company, RepositoryError> {
    Ok(Company {
        id: column(row, "id")?,
        name: column(row, "name")?,
        address: column(row, "address")?,
        contact_info: column(row, "contact_info")?,
        tax_id: column(row, "tax_id")?,
        logo_url: column(row, "logo_url")?,
        disclaimer: column(row, "disclaimer")?,
        accent_color: column(row, "accent_color")?,
    })
}

fn row_to_line_item(row: &SqliteRow) -> Result<LineItem, RepositoryError> {
    Ok(LineItem {
        id: column(row, "id")?,
        service: column(row, "service")?,
        description: column(row, "description")?,
        quantity: get_decimal(row, "quantity")?,
        price: get_decimal(row, "price")?,
    })
}

fn row_to_estimate(
    row: &SqliteRow,
    line_items: Vec<LineItem>,
) -> Result<Estimate, RepositoryError> {
    let gender: String = column(row, "pet_gender")?;
    let status: String = column(row, "status")?;
    let created_at: String = column(row, "created_at")?;

    Ok(Estimate {
        id: column(row, "id")?,
        owner: Owner {
            name: column(row, "owner_name")?,
            address: column(row, "owner_address")?,
            email: column(row, "owner_email")?,
            phone: column(row, "owner_phone")?,
            cedula: column(row, "owner_cedula")?,
        },
        pet: Pet {
            name: column(row, "pet_name")?,
            breed: column(row, "pet_breed")?,
            age: column(row, "pet_age")?,
            gender: Gender::parse(&gender).ok_or_else(|| {
                RepositoryError::Serialization(format!("Invalid pet gender: {}", gender))
            })?,
        },
        line_items,
        tax_rate: get_decimal(row, "tax_rate")?,
        created_at: parse_timestamp(&created_at)?,
        status: EstimateStatus::parse(&status).ok_or_else(|| {
            RepositoryError::Serialization(format!("Invalid estimate status: {}", status))
        })?,
    })
}

async fn insert_line_items(
    conn: &mut SqliteConnection,
    estimate: &Estimate,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM line_item WHERE estimate_id = ?")
        .bind(&estimate.id)
        .execute(&mut *conn)
        .await
        .map_err(storage)?;

    for (position, item) in estimate.line_items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO line_item (estimate_id, position, id, service, description, quantity, price)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&estimate.id)
        .bind(position as i64)
        .bind(&item.id)
        .bind(&item.service)
        .bind(&item.description)
        .bind(decimal_to_text(item.quantity))
        .bind(decimal_to_text(item.price))
        .execute(&mut *conn)
        .await
        .map_err(storage)?;
    }

    Ok(())
}

#[async_trait]
impl EstimateRepository for SqliteRepository {
    async fn get_company(&self) -> Result<Option<Company>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, address, contact_info, tax_id, logo_url, disclaimer, accent_color
             FROM company WHERE id = ?",
        )
        .bind(COMPANY_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        row.as_ref().map(row_to_company).transpose()
    }

    async fn update_company(
        &self,
        patch: CompanyPatch,
    ) -> Result<Company, RepositoryError> {
        let _guard = self.writer.lock().await;

        let existing = self.get_company().await?;
        let company = apply_update(existing, patch);

        sqlx::query(
            "INSERT INTO company (id, name, address, contact_info, tax_id, logo_url, disclaimer, accent_color)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                contact_info = excluded.contact_info,
                tax_id = excluded.tax_id,
                logo_url = excluded.logo_url,
                disclaimer = excluded.disclaimer,
                accent_color = excluded.accent_color",
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.contact_info)
        .bind(&company.tax_id)
        .bind(&company.logo_url)
        .bind(&company.disclaimer)
        .bind(&company.accent_color)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        info!(name = %company.name, "company profile updated");
        Ok(company)
    }

    async fn get_estimates(&self) -> Result<Vec<Estimate>, RepositoryError> {
        let item_rows = sqlx::query(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM line_item ORDER BY estimate_id, position"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut items: HashMap<String, Vec<LineItem>> = HashMap::new();
        for row in &item_rows {
            let estimate_id: String = column(row, "estimate_id")?;
            items
                .entry(estimate_id)
                .or_default()
                .push(row_to_line_item(row)?);
        }

        let rows = sqlx::query(&format!("SELECT {ESTIMATE_COLUMNS} FROM estimate"))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut estimates = rows
            .iter()
            .map(|row| {
                let id: String = column(row, "id")?;
                row_to_estimate(row, items.remove(&id).unwrap_or_default())
            })
            .collect::<Result<Vec<_>, _>>()?;
        // Same order as the other backends; text ids do not sort numerically.
        sort_newest_first(&mut estimates);

        debug!(count = estimates.len(), "listed estimates");
        Ok(estimates)
    }

    async fn get_estimate_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Estimate>, RepositoryError> {
        let Some(row) = sqlx::query(&format!(
            "SELECT {ESTIMATE_COLUMNS} FROM estimate WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?
        else {
            return Ok(None);
        };

        let line_items = sqlx::query(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM line_item WHERE estimate_id = ? ORDER BY position"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?
        .iter()
        .map(row_to_line_item)
        .collect::<Result<Vec<_>, _>>()?;

        row_to_estimate(&row, line_items).map(Some)
    }

    async fn save_estimate(
        &self,
        mut estimate: Estimate,
    ) -> Result<Estimate, RepositoryError> {
        let _guard = self.writer.lock().await;
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let stored_created_at: Option<String> =
            sqlx::query_scalar("SELECT created_at FROM estimate WHERE id = ?")
                .bind(&estimate.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage)?;

        let created = match stored_created_at {
            Some(created_at) => {
                estimate.created_at = parse_timestamp(&created_at)?;
                sqlx::query(
                    "UPDATE estimate SET
                        owner_name = ?, owner_address = ?, owner_email = ?, owner_phone = ?,
                        owner_cedula = ?, pet_name = ?, pet_breed = ?, pet_age = ?, pet_gender = ?,
                        tax_rate = ?, status = ?
                     WHERE id = ?",
                )
                .bind(&estimate.owner.name)
                .bind(&estimate.owner.address)
                .bind(&estimate.owner.email)
                .bind(&estimate.owner.phone)
                .bind(&estimate.owner.cedula)
                .bind(&estimate.pet.name)
                .bind(&estimate.pet.breed)
                .bind(&estimate.pet.age)
                .bind(estimate.pet.gender.as_str())
                .bind(decimal_to_text(estimate.tax_rate))
                .bind(estimate.status.as_str())
                .bind(&estimate.id)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
                false
            }
            None => {
                let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM estimate")
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(storage)?;
                let last_issued: i64 = sqlx::query_scalar(
                    "SELECT last_number FROM estimate_sequence WHERE name = ?",
                )
                .bind(SEQUENCE_NAME)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage)?
                .unwrap_or(0);

                let number = next_estimate_number(
                    ids.iter().map(String::as_str),
                    u64::try_from(last_issued).unwrap_or(0),
                );
                let stored_number = i64::try_from(number).map_err(|_| {
                    RepositoryError::Storage(format!("Estimate number {} out of range", number))
                })?;

                estimate.id = format_estimate_id(number);
                estimate.created_at = Utc::now();

                sqlx::query(&format!(
                    "INSERT INTO estimate ({ESTIMATE_COLUMNS})
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ))
                .bind(&estimate.id)
                .bind(&estimate.owner.name)
                .bind(&estimate.owner.address)
                .bind(&estimate.owner.email)
                .bind(&estimate.owner.phone)
                .bind(&estimate.owner.cedula)
                .bind(&estimate.pet.name)
                .bind(&estimate.pet.breed)
                .bind(&estimate.pet.age)
                .bind(estimate.pet.gender.as_str())
                .bind(decimal_to_text(estimate.tax_rate))
                .bind(estimate.status.as_str())
                .bind(timestamp_to_text(estimate.created_at))
                .execute(&mut *tx)
                .await
                .map_err(storage)?;

                sqlx::query(
                    "INSERT INTO estimate_sequence (name, last_number) VALUES (?, ?)
                     ON CONFLICT(name) DO UPDATE SET last_number = excluded.last_number",
                )
                .bind(SEQUENCE_NAME)
                .bind(stored_number)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
                true
            }
        };

        insert_line_items(&mut *tx, &estimate).await?;
        tx.commit().await.map_err(storage)?;

        if created {
            info!(id = %estimate.id, "estimate created");
        } else {
            info!(id = %estimate.id, "estimate updated");
        }
        Ok(estimate)
    }

    async fn delete_estimate(
        &self,
        id: &str,
    ) -> Result<bool, RepositoryError> {
        let _guard = self.writer.lock().await;
        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query("DELETE FROM line_item WHERE estimate_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        let result = sqlx::query("DELETE FROM estimate WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(id, "estimate deleted");
        }
        Ok(deleted)
    }
}

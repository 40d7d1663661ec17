//! SQLite-backed ledger store.
//!
//! Embedded, file-backed persistence for single-site deployments. Each
//! mutating call runs in one transaction, including the reference lookups the
//! movement validator needs, so a rejected call never leaves a partial write.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | Database (unique violation) | `Domain(DuplicateKey)` for the natural key being written |
//! | anything else | `Storage` |
//!
//! Ids are stored as hyphenated UUID text and timestamps as RFC 3339 UTC text
//! with microsecond precision, which sorts chronologically as plain text.

use core::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};

use stockroom_core::{DomainError, EntityKind, LocationId, MovementId, ProductId};
use stockroom_inventory::{
    DeletePolicy, KnownReferences, Location, Movement, MovementDraft, MovementValidator, NewLocation,
    NewProduct, Product,
};

use super::r#trait::{
    still_referenced, EntityRef, LedgerSnapshot, LedgerStore, StoreError, StoreOptions, StoreResult,
};
use super::timestamp_now;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          TEXT PRIMARY KEY NOT NULL,
        sku         TEXT NOT NULL UNIQUE,
        name        TEXT NOT NULL,
        description TEXT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id      TEXT PRIMARY KEY NOT NULL,
        code    TEXT NOT NULL UNIQUE,
        name    TEXT NOT NULL,
        address TEXT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS movements (
        id               TEXT PRIMARY KEY NOT NULL,
        recorded_at      TEXT NOT NULL,
        product_id       TEXT NOT NULL,
        from_location_id TEXT NULL,
        to_location_id   TEXT NULL,
        qty              INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS movements_recorded_at_idx ON movements (recorded_at, id)",
    "CREATE INDEX IF NOT EXISTS movements_product_idx ON movements (product_id)",
    "CREATE INDEX IF NOT EXISTS movements_from_idx ON movements (from_location_id)",
    "CREATE INDEX IF NOT EXISTS movements_to_idx ON movements (to_location_id)",
];

fn map_sqlx_error(operation: &'static str, e: sqlx::Error) -> StoreError {
    tracing::error!(operation, error = %e, "sqlite operation failed");
    StoreError::Storage(format!("{operation}: {e}"))
}

/// Like [`map_sqlx_error`], but a unique violation becomes a duplicate natural key.
fn map_write_error(operation: &'static str, kind: EntityKind, key: &str, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DomainError::duplicate_key(kind, key).into();
        }
    }
    map_sqlx_error(operation, e)
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Storage(format!("corrupt timestamp '{raw}': {e}")))
}

fn parse_id<T: FromStr>(column: &str, raw: &str) -> StoreResult<T> {
    raw.parse()
        .map_err(|_| StoreError::Storage(format!("corrupt {column} '{raw}'")))
}

fn parse_opt_id<T: FromStr>(column: &str, raw: Option<String>) -> StoreResult<Option<T>> {
    raw.as_deref().map(|r| parse_id(column, r)).transpose()
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Storage(format!("failed to read column {column}: {e}")))
}

fn product_from_row(row: &SqliteRow) -> StoreResult<Product> {
    Ok(Product {
        id: parse_id("products.id", &get::<String>(row, "id")?)?,
        sku: get(row, "sku")?,
        name: get(row, "name")?,
        description: get(row, "description")?,
    })
}

fn location_from_row(row: &SqliteRow) -> StoreResult<Location> {
    Ok(Location {
        id: parse_id("locations.id", &get::<String>(row, "id")?)?,
        code: get(row, "code")?,
        name: get(row, "name")?,
        address: get(row, "address")?,
    })
}

fn movement_from_row(row: &SqliteRow) -> StoreResult<Movement> {
    Ok(Movement {
        id: parse_id("movements.id", &get::<String>(row, "id")?)?,
        recorded_at: parse_ts(&get::<String>(row, "recorded_at")?)?,
        product_id: parse_id("movements.product_id", &get::<String>(row, "product_id")?)?,
        from_location_id: parse_opt_id("movements.from_location_id", get(row, "from_location_id")?)?,
        to_location_id: parse_opt_id("movements.to_location_id", get(row, "to_location_id")?)?,
        qty: get(row, "qty")?,
    })
}

const SELECT_PRODUCTS: &str = "SELECT id, sku, name, description FROM products";
const SELECT_LOCATIONS: &str = "SELECT id, code, name, address FROM locations";
const SELECT_MOVEMENTS: &str =
    "SELECT id, recorded_at, product_id, from_location_id, to_location_id, qty FROM movements";

/// SQLite-backed ledger store (see module docs).
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
    validator: MovementValidator,
    delete_policy: DeletePolicy,
}

impl SqliteLedgerStore {
    /// Open (creating if missing) the database at `url` and apply the schema.
    pub async fn connect(url: &str, options: StoreOptions) -> StoreResult<Self> {
        let connect = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("parse_database_url", e))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::from_pool(pool, options);
        store.migrate().await?;
        tracing::info!(url, "sqlite ledger store ready");
        Ok(store)
    }

    /// Private in-memory database (tests/dev).
    ///
    /// Pinned to a single long-lived connection: every SQLite `:memory:`
    /// connection is its own database.
    pub async fn in_memory(options: StoreOptions) -> StoreResult<Self> {
        let connect = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| map_sqlx_error("parse_database_url", e))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::from_pool(pool, options);
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool. Call [`migrate`](Self::migrate) before use.
    pub fn from_pool(pool: SqlitePool, options: StoreOptions) -> Self {
        Self {
            pool,
            validator: MovementValidator::new(options.rules),
            delete_policy: options.delete_policy,
        }
    }

    /// Create tables and indexes if they do not exist yet. Idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))
    }

    async fn fetch_product(
        tx: &mut Transaction<'static, Sqlite>,
        id: ProductId,
    ) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("{SELECT_PRODUCTS} WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn fetch_location(
        tx: &mut Transaction<'static, Sqlite>,
        id: LocationId,
    ) -> StoreResult<Option<Location>> {
        let row = sqlx::query(&format!("{SELECT_LOCATIONS} WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("get_location", e))?;
        row.as_ref().map(location_from_row).transpose()
    }

    async fn fetch_products(tx: &mut Transaction<'static, Sqlite>) -> StoreResult<Vec<Product>> {
        sqlx::query(&format!("{SELECT_PRODUCTS} ORDER BY name, sku"))
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?
            .iter()
            .map(product_from_row)
            .collect()
    }

    async fn fetch_locations(tx: &mut Transaction<'static, Sqlite>) -> StoreResult<Vec<Location>> {
        sqlx::query(&format!("{SELECT_LOCATIONS} ORDER BY name, code"))
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("list_locations", e))?
            .iter()
            .map(location_from_row)
            .collect()
    }

    async fn fetch_all_movements(tx: &mut Transaction<'static, Sqlite>) -> StoreResult<Vec<Movement>> {
        sqlx::query(&format!("{SELECT_MOVEMENTS} ORDER BY recorded_at ASC, id ASC"))
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("list_all_movements", e))?
            .iter()
            .map(movement_from_row)
            .collect()
    }

    async fn commit(tx: Transaction<'static, Sqlite>) -> StoreResult<()> {
        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }
}

#[async_trait::async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn create_product(&self, input: &NewProduct) -> StoreResult<Product> {
        let product = Product::create(ProductId::new(), input)?;
        sqlx::query("INSERT INTO products (id, sku, name, description) VALUES (?1, ?2, ?3, ?4)")
            .bind(product.id.to_string())
            .bind(&product.sku)
            .bind(&product.name)
            .bind(product.description.as_deref())
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error("create_product", EntityKind::Product, &product.sku, e))?;
        tracing::debug!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, input: &NewProduct) -> StoreResult<Product> {
        let mut tx = self.begin().await?;
        let mut product = Self::fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::Product, id))?;
        product.edit(input)?;
        sqlx::query("UPDATE products SET sku = ?2, name = ?3, description = ?4 WHERE id = ?1")
            .bind(id.to_string())
            .bind(&product.sku)
            .bind(&product.name)
            .bind(product.description.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error("update_product", EntityKind::Product, &product.sku, e))?;
        Self::commit(tx).await?;
        tracing::debug!(product_id = %id, "product updated");
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("{SELECT_PRODUCTS} WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        sqlx::query(&format!("{SELECT_PRODUCTS} ORDER BY name, sku"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?
            .iter()
            .map(product_from_row)
            .collect()
    }

    async fn create_location(&self, input: &NewLocation) -> StoreResult<Location> {
        let location = Location::create(LocationId::new(), input)?;
        sqlx::query("INSERT INTO locations (id, code, name, address) VALUES (?1, ?2, ?3, ?4)")
            .bind(location.id.to_string())
            .bind(&location.code)
            .bind(&location.name)
            .bind(location.address.as_deref())
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error("create_location", EntityKind::Location, &location.code, e))?;
        tracing::debug!(location_id = %location.id, code = %location.code, "location created");
        Ok(location)
    }

    async fn update_location(&self, id: LocationId, input: &NewLocation) -> StoreResult<Location> {
        let mut tx = self.begin().await?;
        let mut location = Self::fetch_location(&mut tx, id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::Location, id))?;
        location.edit(input)?;
        sqlx::query("UPDATE locations SET code = ?2, name = ?3, address = ?4 WHERE id = ?1")
            .bind(id.to_string())
            .bind(&location.code)
            .bind(&location.name)
            .bind(location.address.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error("update_location", EntityKind::Location, &location.code, e))?;
        Self::commit(tx).await?;
        tracing::debug!(location_id = %id, "location updated");
        Ok(location)
    }

    async fn get_location(&self, id: LocationId) -> StoreResult<Option<Location>> {
        let row = sqlx::query(&format!("{SELECT_LOCATIONS} WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_location", e))?;
        row.as_ref().map(location_from_row).transpose()
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        sqlx::query(&format!("{SELECT_LOCATIONS} ORDER BY name, code"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_locations", e))?
            .iter()
            .map(location_from_row)
            .collect()
    }

    async fn create_movement(&self, draft: &MovementDraft) -> StoreResult<Movement> {
        let mut tx = self.begin().await?;

        // Resolve exactly the references this draft names.
        let product = Self::fetch_product(&mut tx, draft.product_id).await?;
        let mut locations = Vec::with_capacity(2);
        for id in [draft.from_location_id, draft.to_location_id].into_iter().flatten() {
            if Self::fetch_location(&mut tx, id).await?.is_some() {
                locations.push(id);
            }
        }
        let refs = KnownReferences::new(product.map(|p| p.id), locations);

        let valid = self.validator.validate(draft, &refs)?;
        let movement = Movement::record(MovementId::new(), valid, timestamp_now());

        sqlx::query(
            r#"
            INSERT INTO movements (id, recorded_at, product_id, from_location_id, to_location_id, qty)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(movement.id.to_string())
        .bind(format_ts(movement.recorded_at))
        .bind(movement.product_id.to_string())
        .bind(movement.from_location_id.map(|id| id.to_string()))
        .bind(movement.to_location_id.map(|id| id.to_string()))
        .bind(movement.qty)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_movement", e))?;
        Self::commit(tx).await?;

        tracing::debug!(
            movement_id = %movement.id,
            kind = movement.kind().as_str(),
            qty = movement.qty,
            "movement recorded"
        );
        Ok(movement)
    }

    async fn get_movement(&self, id: MovementId) -> StoreResult<Option<Movement>> {
        let row = sqlx::query(&format!("{SELECT_MOVEMENTS} WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_movement", e))?;
        row.as_ref().map(movement_from_row).transpose()
    }

    async fn list_movements(&self, limit: Option<usize>) -> StoreResult<Vec<Movement>> {
        // A negative LIMIT means "no limit" in SQLite.
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX)).unwrap_or(-1);
        sqlx::query(&format!("{SELECT_MOVEMENTS} ORDER BY recorded_at DESC, id DESC LIMIT ?1"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_movements", e))?
            .iter()
            .map(movement_from_row)
            .collect()
    }

    async fn list_all_movements(&self) -> StoreResult<Vec<Movement>> {
        sqlx::query(&format!("{SELECT_MOVEMENTS} ORDER BY recorded_at ASC, id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_all_movements", e))?
            .iter()
            .map(movement_from_row)
            .collect()
    }

    async fn delete_entity(&self, entity: EntityRef) -> StoreResult<()> {
        let mut tx = self.begin().await?;

        match entity {
            EntityRef::Product(id) => {
                let product = Self::fetch_product(&mut tx, id)
                    .await?
                    .ok_or_else(|| DomainError::not_found(EntityKind::Product, id))?;
                let references: i64 = sqlx::query("SELECT COUNT(*) FROM movements WHERE product_id = ?1")
                    .bind(id.to_string())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("count_product_references", e))?
                    .try_get(0)
                    .map_err(|e| map_sqlx_error("count_product_references", e))?;
                if references > 0 {
                    if self.delete_policy == DeletePolicy::Restrict {
                        return Err(still_referenced(entity, &product.sku, references as usize));
                    }
                    sqlx::query("DELETE FROM movements WHERE product_id = ?1")
                        .bind(id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| map_sqlx_error("cascade_product_movements", e))?;
                }
                sqlx::query("DELETE FROM products WHERE id = ?1")
                    .bind(id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_product", e))?;
                tracing::debug!(product_id = %id, cascaded = references, "product deleted");
            }
            EntityRef::Location(id) => {
                let location = Self::fetch_location(&mut tx, id)
                    .await?
                    .ok_or_else(|| DomainError::not_found(EntityKind::Location, id))?;
                let references: i64 = sqlx::query(
                    "SELECT COUNT(*) FROM movements WHERE from_location_id = ?1 OR to_location_id = ?1",
                )
                .bind(id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("count_location_references", e))?
                .try_get(0)
                .map_err(|e| map_sqlx_error("count_location_references", e))?;
                if references > 0 {
                    if self.delete_policy == DeletePolicy::Restrict {
                        return Err(still_referenced(entity, &location.code, references as usize));
                    }
                    sqlx::query("DELETE FROM movements WHERE from_location_id = ?1 OR to_location_id = ?1")
                        .bind(id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| map_sqlx_error("cascade_location_movements", e))?;
                }
                sqlx::query("DELETE FROM locations WHERE id = ?1")
                    .bind(id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_location", e))?;
                tracing::debug!(location_id = %id, cascaded = references, "location deleted");
            }
            EntityRef::Movement(id) => {
                let deleted = sqlx::query("DELETE FROM movements WHERE id = ?1")
                    .bind(id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_movement", e))?
                    .rows_affected();
                if deleted == 0 {
                    return Err(DomainError::not_found(EntityKind::Movement, id).into());
                }
                tracing::debug!(movement_id = %id, "movement deleted");
            }
        }

        Self::commit(tx).await
    }

    async fn snapshot(&self) -> StoreResult<LedgerSnapshot> {
        let mut tx = self.begin().await?;
        let snapshot = LedgerSnapshot {
            products: Self::fetch_products(&mut tx).await?,
            locations: Self::fetch_locations(&mut tx).await?,
            movements: Self::fetch_all_movements(&mut tx).await?,
        };
        Self::commit(tx).await?;
        Ok(snapshot)
    }
}

use serde::Serialize;
use thiserror::Error;

use stockroom_core::{DomainError, EntityKind, LocationId, MovementId, ProductId};
use stockroom_inventory::{
    DeletePolicy, Location, Movement, MovementDraft, MovementRules, NewLocation, NewProduct, Product,
};

/// Ledger store operation error.
///
/// `Domain` carries the deterministic failures a caller can fix (validation,
/// duplicate natural keys, missing records, restricted deletes). `Storage` is
/// everything the backend itself got wrong.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Typed reference to one deletable record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Product(ProductId),
    Location(LocationId),
    Movement(MovementId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Product(_) => EntityKind::Product,
            EntityRef::Location(_) => EntityKind::Location,
            EntityRef::Movement(_) => EntityKind::Movement,
        }
    }
}

impl core::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EntityRef::Product(id) => write!(f, "product {id}"),
            EntityRef::Location(id) => write!(f, "location {id}"),
            EntityRef::Movement(id) => write!(f, "movement {id}"),
        }
    }
}

/// Backend-independent behaviour switches.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub rules: MovementRules,
    pub delete_policy: DeletePolicy,
}

/// Point-in-time copy of every table, as consumed by the balance report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerSnapshot {
    pub products: Vec<Product>,
    pub locations: Vec<Location>,
    pub movements: Vec<Movement>,
}

/// Persistence seam for products, locations and the movement ledger.
///
/// Implementations must make each mutating call atomic: a call either applies
/// completely or leaves the store unchanged. Movement validation runs inside
/// that same atomic step, against the catalog as the store sees it.
///
/// Ordering contract for listings:
/// - products by name, then sku
/// - locations by name, then code
/// - `list_movements` newest first (`recorded_at`, then id, descending)
/// - `list_all_movements` oldest first
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create a product; `sku` must be unused.
    async fn create_product(&self, input: &NewProduct) -> StoreResult<Product>;

    /// Replace a product's fields (last write wins); `sku` must stay unique.
    async fn update_product(&self, id: ProductId, input: &NewProduct) -> StoreResult<Product>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// Create a location; `code` must be unused.
    async fn create_location(&self, input: &NewLocation) -> StoreResult<Location>;

    async fn update_location(&self, id: LocationId, input: &NewLocation) -> StoreResult<Location>;

    async fn get_location(&self, id: LocationId) -> StoreResult<Option<Location>>;

    async fn list_locations(&self) -> StoreResult<Vec<Location>>;

    /// Validate and append a movement, stamping its id and `recorded_at`.
    async fn create_movement(&self, draft: &MovementDraft) -> StoreResult<Movement>;

    async fn get_movement(&self, id: MovementId) -> StoreResult<Option<Movement>>;

    /// Newest movements first, optionally capped.
    async fn list_movements(&self, limit: Option<usize>) -> StoreResult<Vec<Movement>>;

    /// Every movement, oldest first.
    async fn list_all_movements(&self) -> StoreResult<Vec<Movement>>;

    /// Delete one record, honouring the configured [`DeletePolicy`] for
    /// products and locations that movements still reference.
    async fn delete_entity(&self, entity: EntityRef) -> StoreResult<()>;

    /// Consistent read of all three tables.
    ///
    /// The default issues three independent reads; backends that can do
    /// better (one lock, one transaction) should override it.
    async fn snapshot(&self) -> StoreResult<LedgerSnapshot> {
        Ok(LedgerSnapshot {
            products: self.list_products().await?,
            locations: self.list_locations().await?,
            movements: self.list_all_movements().await?,
        })
    }
}

/// Build the error for a restricted delete.
pub(crate) fn still_referenced(entity: EntityRef, label: &str, references: usize) -> StoreError {
    StoreError::Domain(DomainError::conflict(format!(
        "{} '{label}' is referenced by {references} movement(s); delete those first",
        entity.kind()
    )))
}

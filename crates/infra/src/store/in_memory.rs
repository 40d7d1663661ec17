use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use stockroom_core::{DomainError, Entity, EntityKind, LocationId, MovementId, ProductId};
use stockroom_inventory::{
    DeletePolicy, Location, Movement, MovementDraft, MovementValidator, NewLocation, NewProduct,
    Product, ReferenceLookup,
};

use super::r#trait::{
    still_referenced, EntityRef, LedgerSnapshot, LedgerStore, StoreError, StoreOptions, StoreResult,
};
use super::timestamp_now;

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<ProductId, Product>,
    locations: HashMap<LocationId, Location>,
    movements: HashMap<MovementId, Movement>,
}

impl ReferenceLookup for Tables {
    fn product_exists(&self, id: ProductId) -> bool {
        self.products.contains_key(&id)
    }

    fn location_exists(&self, id: LocationId) -> bool {
        self.locations.contains_key(&id)
    }
}

impl Tables {
    fn sorted_products(&self) -> Vec<Product> {
        let mut out: Vec<_> = self.products.values().cloned().collect();
        out.sort_by(|a, b| (&a.name, &a.sku).cmp(&(&b.name, &b.sku)));
        out
    }

    fn sorted_locations(&self) -> Vec<Location> {
        let mut out: Vec<_> = self.locations.values().cloned().collect();
        out.sort_by(|a, b| (&a.name, &a.code).cmp(&(&b.name, &b.code)));
        out
    }

    fn movements_oldest_first(&self) -> Vec<Movement> {
        let mut out: Vec<_> = self.movements.values().cloned().collect();
        out.sort_by_key(|m| (m.recorded_at, m.id));
        out
    }
}

/// Reject `key` if any record other than `except` already uses it.
fn ensure_unique<'a, E: Entity + 'a>(
    key: &str,
    except: Option<E::Id>,
    existing: impl IntoIterator<Item = (&'a E, &'a str)>,
) -> StoreResult<()> {
    let taken = existing
        .into_iter()
        .any(|(record, k)| k == key && Some(*record.id()) != except);
    if taken {
        return Err(DomainError::duplicate_key(E::KIND, key).into());
    }
    Ok(())
}

/// In-memory ledger store.
///
/// Intended for tests/dev. One lock guards all tables, so every call is
/// atomic and `snapshot()` is consistent.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
    validator: MovementValidator,
    delete_policy: DeletePolicy,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            validator: MovementValidator::new(options.rules),
            delete_policy: options.delete_policy,
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_product(&self, input: &NewProduct) -> StoreResult<Product> {
        let product = Product::create(ProductId::new(), input)?;
        let mut tables = self.write()?;
        ensure_unique::<Product>(
            &product.sku,
            None,
            tables.products.values().map(|p| (p, p.sku.as_str())),
        )?;
        tables.products.insert(product.id, product.clone());
        tracing::debug!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, input: &NewProduct) -> StoreResult<Product> {
        let mut tables = self.write()?;
        let mut product = tables
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(EntityKind::Product, id))?;
        product.edit(input)?;
        ensure_unique::<Product>(
            &product.sku,
            Some(id),
            tables.products.values().map(|p| (p, p.sku.as_str())),
        )?;
        tables.products.insert(id, product.clone());
        tracing::debug!(product_id = %id, "product updated");
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.sorted_products())
    }

    async fn create_location(&self, input: &NewLocation) -> StoreResult<Location> {
        let location = Location::create(LocationId::new(), input)?;
        let mut tables = self.write()?;
        ensure_unique::<Location>(
            &location.code,
            None,
            tables.locations.values().map(|l| (l, l.code.as_str())),
        )?;
        tables.locations.insert(location.id, location.clone());
        tracing::debug!(location_id = %location.id, code = %location.code, "location created");
        Ok(location)
    }

    async fn update_location(&self, id: LocationId, input: &NewLocation) -> StoreResult<Location> {
        let mut tables = self.write()?;
        let mut location = tables
            .locations
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(EntityKind::Location, id))?;
        location.edit(input)?;
        ensure_unique::<Location>(
            &location.code,
            Some(id),
            tables.locations.values().map(|l| (l, l.code.as_str())),
        )?;
        tables.locations.insert(id, location.clone());
        tracing::debug!(location_id = %id, "location updated");
        Ok(location)
    }

    async fn get_location(&self, id: LocationId) -> StoreResult<Option<Location>> {
        Ok(self.read()?.locations.get(&id).cloned())
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        Ok(self.read()?.sorted_locations())
    }

    async fn create_movement(&self, draft: &MovementDraft) -> StoreResult<Movement> {
        let mut tables = self.write()?;
        let valid = self.validator.validate(draft, &*tables)?;
        let movement = Movement::record(MovementId::new(), valid, timestamp_now());
        tables.movements.insert(movement.id, movement.clone());
        tracing::debug!(
            movement_id = %movement.id,
            kind = movement.kind().as_str(),
            qty = movement.qty,
            "movement recorded"
        );
        Ok(movement)
    }

    async fn get_movement(&self, id: MovementId) -> StoreResult<Option<Movement>> {
        Ok(self.read()?.movements.get(&id).cloned())
    }

    async fn list_movements(&self, limit: Option<usize>) -> StoreResult<Vec<Movement>> {
        let mut out = self.read()?.movements_oldest_first();
        out.reverse();
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    async fn list_all_movements(&self) -> StoreResult<Vec<Movement>> {
        Ok(self.read()?.movements_oldest_first())
    }

    async fn delete_entity(&self, entity: EntityRef) -> StoreResult<()> {
        let mut tables = self.write()?;
        match entity {
            EntityRef::Product(id) => {
                let sku = tables
                    .products
                    .get(&id)
                    .map(|p| p.sku.clone())
                    .ok_or_else(|| DomainError::not_found(EntityKind::Product, id))?;
                let references = tables.movements.values().filter(|m| m.product_id == id).count();
                if references > 0 {
                    if self.delete_policy == DeletePolicy::Restrict {
                        return Err(still_referenced(entity, &sku, references));
                    }
                    tables.movements.retain(|_, m| m.product_id != id);
                }
                tables.products.remove(&id);
                tracing::debug!(product_id = %id, cascaded = references, "product deleted");
            }
            EntityRef::Location(id) => {
                let code = tables
                    .locations
                    .get(&id)
                    .map(|l| l.code.clone())
                    .ok_or_else(|| DomainError::not_found(EntityKind::Location, id))?;
                let references = tables
                    .movements
                    .values()
                    .filter(|m| m.references_location(id))
                    .count();
                if references > 0 {
                    if self.delete_policy == DeletePolicy::Restrict {
                        return Err(still_referenced(entity, &code, references));
                    }
                    tables.movements.retain(|_, m| !m.references_location(id));
                }
                tables.locations.remove(&id);
                tracing::debug!(location_id = %id, cascaded = references, "location deleted");
            }
            EntityRef::Movement(id) => {
                tables
                    .movements
                    .remove(&id)
                    .ok_or_else(|| DomainError::not_found(EntityKind::Movement, id))?;
                tracing::debug!(movement_id = %id, "movement deleted");
            }
        }
        Ok(())
    }

    async fn snapshot(&self) -> StoreResult<LedgerSnapshot> {
        let tables = self.read()?;
        Ok(LedgerSnapshot {
            products: tables.sorted_products(),
            locations: tables.sorted_locations(),
            movements: tables.movements_oldest_first(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_inventory::MovementRules;

    async fn catalog(store: &InMemoryLedgerStore) -> (Product, Location, Location) {
        let p = store
            .create_product(&NewProduct::new("PROD-A", "Product A", None))
            .await
            .unwrap();
        let w1 = store
            .create_location(&NewLocation::new("W1", "Warehouse 1", None))
            .await
            .unwrap();
        let w2 = store
            .create_location(&NewLocation::new("W2", "Warehouse 2", None))
            .await
            .unwrap();
        (p, w1, w2)
    }

    #[tokio::test]
    async fn duplicate_sku_is_rejected_and_store_unchanged() {
        let store = InMemoryLedgerStore::new();
        let (p, _, _) = catalog(&store).await;

        let err = store
            .create_product(&NewProduct::new("PROD-A", "Another", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::DuplicateKey { kind: EntityKind::Product, .. })));
        assert_eq!(store.list_products().await.unwrap(), vec![p]);
    }

    #[tokio::test]
    async fn update_rechecks_uniqueness_against_other_records() {
        let store = InMemoryLedgerStore::new();
        let (_, w1, w2) = catalog(&store).await;

        let err = store
            .update_location(w2.id, &NewLocation::new("W1", "Renamed", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::DuplicateKey { .. })));

        // Keeping its own code is fine.
        let renamed = store
            .update_location(w1.id, &NewLocation::new("W1", "Main Warehouse", Some("1 Dock Rd")))
            .await
            .unwrap();
        assert_eq!(renamed.name, "Main Warehouse");
        assert_eq!(store.get_location(w2.id).await.unwrap().unwrap().code, "W2");
    }

    #[tokio::test]
    async fn rejected_movement_writes_nothing() {
        let store = InMemoryLedgerStore::new();
        let (p, w1, _) = catalog(&store).await;

        let err = store
            .create_movement(&MovementDraft::inbound(p.id, w1.id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation { field: "qty", .. })));
        assert!(store.list_all_movements().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn movements_list_newest_first_with_limit() {
        let store = InMemoryLedgerStore::new();
        let (p, w1, w2) = catalog(&store).await;

        let first = store.create_movement(&MovementDraft::inbound(p.id, w1.id, 5)).await.unwrap();
        let second = store
            .create_movement(&MovementDraft::transfer(p.id, w1.id, w2.id, 2))
            .await
            .unwrap();

        let latest = store.list_movements(Some(1)).await.unwrap();
        assert_eq!(latest, vec![second.clone()]);
        let all = store.list_all_movements().await.unwrap();
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn restricted_delete_of_referenced_location_conflicts() {
        let store = InMemoryLedgerStore::new();
        let (p, w1, w2) = catalog(&store).await;
        store.create_movement(&MovementDraft::inbound(p.id, w1.id, 5)).await.unwrap();

        let err = store.delete_entity(EntityRef::Location(w1.id)).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
        assert!(store.get_location(w1.id).await.unwrap().is_some());

        // Unreferenced records delete freely.
        store.delete_entity(EntityRef::Location(w2.id)).await.unwrap();
        assert!(store.get_location(w2.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cascade_delete_removes_dependent_movements() {
        let store = InMemoryLedgerStore::with_options(StoreOptions {
            rules: MovementRules::default(),
            delete_policy: DeletePolicy::Cascade,
        });
        let (p, w1, w2) = catalog(&store).await;
        store.create_movement(&MovementDraft::inbound(p.id, w1.id, 5)).await.unwrap();
        let kept = store.create_movement(&MovementDraft::inbound(p.id, w2.id, 3)).await.unwrap();

        store.delete_entity(EntityRef::Location(w1.id)).await.unwrap();
        assert_eq!(store.list_all_movements().await.unwrap(), vec![kept]);

        store.delete_entity(EntityRef::Product(p.id)).await.unwrap();
        assert!(store.list_all_movements().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_records_is_not_found() {
        let store = InMemoryLedgerStore::new();
        let err = store
            .delete_entity(EntityRef::Movement(MovementId::new()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::NotFound { kind: EntityKind::Movement, .. })
        ));
    }
}

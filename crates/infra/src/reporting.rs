//! Balance report service.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_core::{DomainError, EntityKind};
use stockroom_inventory::{BalanceFilter, BalanceRow, BalanceSheet};

use crate::store::{LedgerStore, StoreResult};

/// Current stock per (product, location), computed from one ledger snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    pub generated_at: DateTime<Utc>,
    pub filter: BalanceFilter,
    pub rows: Vec<BalanceRow>,
    pub product_count: usize,
    pub location_count: usize,
    pub movement_count: usize,
    /// Movement legs skipped because their product or location no longer exists.
    pub orphaned_legs: usize,
}

/// Replay the full ledger and return the non-zero balances matching `filter`.
///
/// A filter naming an unknown product or location is `NotFound`, not an
/// empty report.
pub async fn balance_report(store: &dyn LedgerStore, filter: BalanceFilter) -> StoreResult<BalanceReport> {
    let snapshot = store.snapshot().await?;

    if let Some(id) = filter.product_id {
        if !snapshot.products.iter().any(|p| p.id == id) {
            return Err(DomainError::not_found(EntityKind::Product, id).into());
        }
    }
    if let Some(id) = filter.location_id {
        if !snapshot.locations.iter().any(|l| l.id == id) {
            return Err(DomainError::not_found(EntityKind::Location, id).into());
        }
    }

    let sheet = BalanceSheet::compute(&snapshot.products, &snapshot.locations, &snapshot.movements);
    if sheet.orphaned() > 0 {
        tracing::warn!(
            orphaned_legs = sheet.orphaned(),
            "balance report skipped movements referencing missing records"
        );
    }

    let rows = sheet.rows_matching(&filter);
    tracing::debug!(
        rows = rows.len(),
        movements = snapshot.movements.len(),
        "balance report computed"
    );

    Ok(BalanceReport {
        generated_at: Utc::now(),
        filter,
        rows,
        product_count: snapshot.products.len(),
        location_count: snapshot.locations.len(),
        movement_count: snapshot.movements.len(),
        orphaned_legs: sheet.orphaned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryLedgerStore, StoreError};
    use stockroom_core::{LocationId, ProductId};
    use stockroom_inventory::{MovementDraft, NewLocation, NewProduct};

    #[tokio::test]
    async fn scenario_balances() {
        let store = InMemoryLedgerStore::new();
        let a = store.create_product(&NewProduct::new("A", "A", None)).await.unwrap();
        let w1 = store.create_location(&NewLocation::new("W1", "W1", None)).await.unwrap();
        let w2 = store.create_location(&NewLocation::new("W2", "W2", None)).await.unwrap();
        store.create_movement(&MovementDraft::inbound(a.id, w1.id, 50)).await.unwrap();
        store.create_movement(&MovementDraft::transfer(a.id, w1.id, w2.id, 10)).await.unwrap();
        store.create_movement(&MovementDraft::outbound(a.id, w2.id, 3)).await.unwrap();

        let report = balance_report(&store, BalanceFilter::default()).await.unwrap();
        let got: Vec<_> = report.rows.iter().map(|r| (r.location_code.as_str(), r.quantity)).collect();
        assert_eq!(got, vec![("W1", 40), ("W2", 7)]);
        assert_eq!(report.movement_count, 3);
        assert_eq!(report.orphaned_legs, 0);

        let only_w2 = balance_report(
            &store,
            BalanceFilter {
                product_id: None,
                location_id: Some(w2.id),
            },
        )
        .await
        .unwrap();
        assert_eq!(only_w2.rows.len(), 1);
        assert_eq!(only_w2.rows[0].quantity, 7);
    }

    #[tokio::test]
    async fn unknown_filter_ids_are_not_found() {
        let store = InMemoryLedgerStore::new();
        let err = balance_report(
            &store,
            BalanceFilter {
                product_id: Some(ProductId::new()),
                location_id: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::NotFound { kind: EntityKind::Product, .. })
        ));

        let err = balance_report(
            &store,
            BalanceFilter {
                product_id: None,
                location_id: Some(LocationId::new()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::NotFound { kind: EntityKind::Location, .. })
        ));
    }

    #[tokio::test]
    async fn empty_store_reports_nothing() {
        let store = InMemoryLedgerStore::new();
        let report = balance_report(&store, BalanceFilter::default()).await.unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.product_count, 0);
    }
}

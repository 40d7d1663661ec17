//! Sample catalog and movement history for demos and local development.

use serde::Serialize;

use stockroom_core::{LocationId, ProductId};
use stockroom_inventory::{MovementDraft, NewLocation, NewProduct};

use crate::store::{LedgerStore, StoreResult};

const PRODUCTS: [(&str, &str, &str); 4] = [
    ("PROD-A", "Product A", "Sample product A"),
    ("PROD-B", "Product B", "Sample product B"),
    ("PROD-C", "Product C", "Sample product C"),
    ("PROD-D", "Product D", "Sample product D"),
];

const LOCATIONS: [(&str, &str, &str); 4] = [
    ("WH-1", "Warehouse 1", "100 Main St"),
    ("WH-2", "Warehouse 2", "200 Side St"),
    ("STORE-1", "Retail Store 1", "300 Market Rd"),
    ("QUARANTINE", "Quarantine", "Holding"),
];

/// `(from, to, product, qty)` as indexes into `LOCATIONS` / `PRODUCTS`.
const MOVEMENTS: [(Option<usize>, Option<usize>, usize, i64); 20] = [
    // receipts
    (None, Some(0), 0, 50),
    (None, Some(0), 1, 30),
    (None, Some(1), 0, 20),
    (None, Some(2), 2, 15),
    (None, Some(1), 3, 40),
    (None, Some(0), 2, 25),
    (None, Some(2), 1, 10),
    // transfers
    (Some(0), Some(1), 0, 10),
    (Some(1), Some(2), 3, 5),
    (Some(0), Some(2), 2, 3),
    // shipments
    (Some(2), None, 2, 2),
    (Some(1), None, 3, 7),
    (None, Some(0), 3, 8),
    (Some(0), Some(3), 1, 5),
    (Some(3), Some(0), 1, 2),
    (None, Some(2), 0, 6),
    (Some(2), Some(1), 0, 1),
    (Some(1), Some(0), 0, 4),
    (None, Some(3), 3, 10),
    (Some(3), None, 3, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeedOutcome {
    /// The store already had catalog records; nothing was written.
    Skipped,
    Seeded {
        products: usize,
        locations: usize,
        movements: usize,
    },
}

/// Load the sample data set into an empty store.
///
/// No-op when any product or location already exists.
pub async fn seed_sample_data(store: &dyn LedgerStore) -> StoreResult<SeedOutcome> {
    if !store.list_products().await?.is_empty() || !store.list_locations().await?.is_empty() {
        tracing::info!("store already has catalog records; skipping sample data");
        return Ok(SeedOutcome::Skipped);
    }

    let mut products: Vec<ProductId> = Vec::with_capacity(PRODUCTS.len());
    for (sku, name, description) in PRODUCTS {
        let product = store
            .create_product(&NewProduct::new(sku, name, Some(description)))
            .await?;
        products.push(product.id);
    }

    let mut locations: Vec<LocationId> = Vec::with_capacity(LOCATIONS.len());
    for (code, name, address) in LOCATIONS {
        let location = store
            .create_location(&NewLocation::new(code, name, Some(address)))
            .await?;
        locations.push(location.id);
    }

    for (from, to, product, qty) in MOVEMENTS {
        let draft = MovementDraft {
            product_id: products[product],
            qty,
            from_location_id: from.map(|i| locations[i]),
            to_location_id: to.map(|i| locations[i]),
        };
        store.create_movement(&draft).await?;
    }

    let outcome = SeedOutcome::Seeded {
        products: products.len(),
        locations: locations.len(),
        movements: MOVEMENTS.len(),
    };
    tracing::info!(?outcome, "sample data loaded");
    Ok(outcome)
}

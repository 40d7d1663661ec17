use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, LocationId, MovementId, ProductId};
use stockroom_inventory::{Location, Movement, MovementDraft, NewLocation, NewProduct, Product};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ProductRequest> for NewProduct {
    fn from(body: ProductRequest) -> Self {
        NewProduct {
            sku: body.sku,
            name: body.name,
            description: body.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl From<LocationRequest> for NewLocation {
    fn from(body: LocationRequest) -> Self {
        NewLocation {
            code: body.code,
            name: body.name,
            address: body.address,
        }
    }
}

/// Ids arrive as strings; an empty string means "no location", as HTML-style
/// form clients send it.
#[derive(Debug, Deserialize)]
pub struct MovementRequest {
    pub product_id: String,
    pub qty: i64,
    #[serde(default)]
    pub from_location_id: Option<String>,
    #[serde(default)]
    pub to_location_id: Option<String>,
}

impl MovementRequest {
    pub fn into_draft(self) -> Result<MovementDraft, DomainError> {
        let product_id = self
            .product_id
            .trim()
            .parse::<ProductId>()
            .map_err(|_| DomainError::validation("product_id", "product_id must be a valid id"))?;
        Ok(MovementDraft {
            product_id,
            qty: self.qty,
            from_location_id: optional_location("from_location_id", self.from_location_id)?,
            to_location_id: optional_location("to_location_id", self.to_location_id)?,
        })
    }
}

fn optional_location(field: &'static str, raw: Option<String>) -> Result<Option<LocationId>, DomainError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| DomainError::validation(field, format!("{field} must be a valid id"))),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListMovementsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub product_id: Option<String>,
    pub location_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// A movement with the names a ledger view needs next to the raw ids.
#[derive(Debug, Serialize)]
pub struct MovementView {
    pub id: MovementId,
    pub recorded_at: DateTime<Utc>,
    pub kind: &'static str,
    pub product_id: ProductId,
    pub product_sku: Option<String>,
    pub product_name: Option<String>,
    pub from_location_id: Option<LocationId>,
    pub from_location_name: Option<String>,
    pub to_location_id: Option<LocationId>,
    pub to_location_name: Option<String>,
    pub qty: i64,
}

/// Name lookups for rendering movements.
#[derive(Debug, Default)]
pub struct Catalog {
    products: HashMap<ProductId, Product>,
    locations: HashMap<LocationId, Location>,
}

impl Catalog {
    pub fn new(products: Vec<Product>, locations: Vec<Location>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            locations: locations.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    fn location_name(&self, id: Option<LocationId>) -> Option<String> {
        id.and_then(|id| self.locations.get(&id)).map(|l| l.name.clone())
    }

    pub fn movement_view(&self, m: &Movement) -> MovementView {
        let product = self.products.get(&m.product_id);
        MovementView {
            id: m.id,
            recorded_at: m.recorded_at,
            kind: m.kind().as_str(),
            product_id: m.product_id,
            product_sku: product.map(|p| p.sku.clone()),
            product_name: product.map(|p| p.name.clone()),
            from_location_id: m.from_location_id,
            from_location_name: self.location_name(m.from_location_id),
            to_location_id: m.to_location_id,
            to_location_name: self.location_name(m.to_location_id),
            qty: m.qty,
        }
    }
}

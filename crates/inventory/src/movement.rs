use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, EntityKind, LocationId, MovementId, ProductId};

use crate::validator::ValidMovement;

/// Direction of a movement, derived from which location fields are set.
///
/// The sign of `qty` never encodes direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock enters the system at `to` (receiving).
    Inbound,
    /// Stock leaves the system from `from` (shipping, scrap).
    Outbound,
    /// Stock moves from `from` to `to` with no net change.
    Transfer,
    /// Neither location set; contributes nothing to any balance.
    Unplaced,
}

impl MovementKind {
    pub fn classify(from: Option<LocationId>, to: Option<LocationId>) -> Self {
        match (from, to) {
            (None, Some(_)) => MovementKind::Inbound,
            (Some(_), None) => MovementKind::Outbound,
            (Some(_), Some(_)) => MovementKind::Transfer,
            (None, None) => MovementKind::Unplaced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Inbound => "inbound",
            MovementKind::Outbound => "outbound",
            MovementKind::Transfer => "transfer",
            MovementKind::Unplaced => "unplaced",
        }
    }
}

/// A movement as submitted, before validation and timestamping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub product_id: ProductId,
    pub qty: i64,
    #[serde(default)]
    pub from_location_id: Option<LocationId>,
    #[serde(default)]
    pub to_location_id: Option<LocationId>,
}

impl MovementDraft {
    pub fn inbound(product_id: ProductId, to: LocationId, qty: i64) -> Self {
        Self {
            product_id,
            qty,
            from_location_id: None,
            to_location_id: Some(to),
        }
    }

    pub fn outbound(product_id: ProductId, from: LocationId, qty: i64) -> Self {
        Self {
            product_id,
            qty,
            from_location_id: Some(from),
            to_location_id: None,
        }
    }

    pub fn transfer(product_id: ProductId, from: LocationId, to: LocationId, qty: i64) -> Self {
        Self {
            product_id,
            qty,
            from_location_id: Some(from),
            to_location_id: Some(to),
        }
    }

    pub fn kind(&self) -> MovementKind {
        MovementKind::classify(self.from_location_id, self.to_location_id)
    }
}

/// A recorded movement. Immutable; the only lifecycle step left is deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub recorded_at: DateTime<Utc>,
    pub product_id: ProductId,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    pub qty: i64,
}

impl Movement {
    /// Stamp a validated draft with its id and creation time.
    pub fn record(id: MovementId, movement: ValidMovement, recorded_at: DateTime<Utc>) -> Self {
        let draft = movement.into_draft();
        Self {
            id,
            recorded_at,
            product_id: draft.product_id,
            from_location_id: draft.from_location_id,
            to_location_id: draft.to_location_id,
            qty: draft.qty,
        }
    }

    pub fn kind(&self) -> MovementKind {
        MovementKind::classify(self.from_location_id, self.to_location_id)
    }

    pub fn references_location(&self, location_id: LocationId) -> bool {
        self.from_location_id == Some(location_id) || self.to_location_id == Some(location_id)
    }

    /// Signed per-location effect: `+qty` at `to`, `-qty` at `from`.
    ///
    /// Widened to `i128` so negating `i64::MIN` cannot overflow.
    pub fn contributions(&self) -> impl Iterator<Item = (LocationId, i128)> {
        let qty = i128::from(self.qty);
        [
            self.to_location_id.map(|loc| (loc, qty)),
            self.from_location_id.map(|loc| (loc, -qty)),
        ]
        .into_iter()
        .flatten()
    }
}

impl Entity for Movement {
    type Id = MovementId;
    const KIND: EntityKind = EntityKind::Movement;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

//! Movement validation.
//!
//! A draft only becomes a [`ValidMovement`] (and from there a recorded
//! [`Movement`](crate::Movement)) by passing [`MovementValidator::validate`].
//! Validation is side-effect free: a rejected draft leaves nothing behind.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, LocationId, ProductId};

use crate::movement::{MovementDraft, MovementKind};

/// Existence checks the validator needs from whoever holds the catalog.
pub trait ReferenceLookup {
    fn product_exists(&self, id: ProductId) -> bool;
    fn location_exists(&self, id: LocationId) -> bool;
}

/// Fixed set of known ids, for callers that resolve references up front.
#[derive(Debug, Clone, Default)]
pub struct KnownReferences {
    products: HashSet<ProductId>,
    locations: HashSet<LocationId>,
}

impl KnownReferences {
    pub fn new(
        products: impl IntoIterator<Item = ProductId>,
        locations: impl IntoIterator<Item = LocationId>,
    ) -> Self {
        Self {
            products: products.into_iter().collect(),
            locations: locations.into_iter().collect(),
        }
    }
}

impl ReferenceLookup for KnownReferences {
    fn product_exists(&self, id: ProductId) -> bool {
        self.products.contains(&id)
    }

    fn location_exists(&self, id: LocationId) -> bool {
        self.locations.contains(&id)
    }
}

/// Switches for the two lenient movement behaviours.
///
/// Both default to `false`, i.e. strict.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRules {
    /// Accept `qty < 0`. A negative quantity silently inverts direction.
    pub allow_negative_qty: bool,
    /// Accept movements with neither `from` nor `to` set (inert records).
    pub allow_unplaced: bool,
}

/// Largest accepted `|qty|` for a single movement.
pub const MAX_MOVEMENT_QTY: i64 = 1_000_000_000_000;

/// A draft that passed validation. Only [`MovementValidator`] can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMovement(MovementDraft);

impl ValidMovement {
    pub fn draft(&self) -> &MovementDraft {
        &self.0
    }

    pub(crate) fn into_draft(self) -> MovementDraft {
        self.0
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MovementValidator {
    rules: MovementRules,
}

impl MovementValidator {
    pub fn new(rules: MovementRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> MovementRules {
        self.rules
    }

    /// Check a draft against the quantity rules and the current catalog.
    ///
    /// Shape checks run before reference checks, so a malformed draft is
    /// reported the same way whatever the catalog holds.
    pub fn validate(
        &self,
        draft: &MovementDraft,
        refs: &impl ReferenceLookup,
    ) -> DomainResult<ValidMovement> {
        if draft.qty == 0 {
            return Err(DomainError::validation("qty", "quantity must be non-zero"));
        }
        if draft.qty < 0 && !self.rules.allow_negative_qty {
            return Err(DomainError::validation(
                "qty",
                "quantity must be positive; direction is given by the from/to locations",
            ));
        }
        if draft.qty.unsigned_abs() > MAX_MOVEMENT_QTY.unsigned_abs() {
            return Err(DomainError::validation(
                "qty",
                format!("quantity must not exceed {MAX_MOVEMENT_QTY} units per movement"),
            ));
        }

        match draft.kind() {
            MovementKind::Unplaced if !self.rules.allow_unplaced => {
                return Err(DomainError::validation(
                    "location",
                    "at least one of from_location_id or to_location_id is required",
                ));
            }
            MovementKind::Transfer if draft.from_location_id == draft.to_location_id => {
                return Err(DomainError::validation(
                    "location",
                    "from and to locations must differ",
                ));
            }
            _ => {}
        }

        if !refs.product_exists(draft.product_id) {
            return Err(DomainError::validation(
                "product_id",
                format!("unknown product {}", draft.product_id),
            ));
        }
        if let Some(from) = draft.from_location_id {
            if !refs.location_exists(from) {
                return Err(DomainError::validation(
                    "from_location_id",
                    format!("unknown location {from}"),
                ));
            }
        }
        if let Some(to) = draft.to_location_id {
            if !refs.location_exists(to) {
                return Err(DomainError::validation(
                    "to_location_id",
                    format!("unknown location {to}"),
                ));
            }
        }

        Ok(ValidMovement(draft.clone()))
    }
}

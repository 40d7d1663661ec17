//! Inventory domain module.
//!
//! Products, locations and the movement ledger between them, plus the two
//! pieces of real logic: the movement validator and the balance aggregator.
//! Everything here is deterministic domain code (no IO, no HTTP, no storage).

pub mod balance;
pub mod location;
pub mod movement;
pub mod policy;
pub mod product;
pub mod validator;

mod text;

pub use balance::{BalanceFilter, BalanceRow, BalanceSheet};
pub use location::{Location, NewLocation};
pub use movement::{Movement, MovementDraft, MovementKind};
pub use policy::DeletePolicy;
pub use product::{NewProduct, Product};
pub use validator::{
    KnownReferences, MovementRules, MovementValidator, ReferenceLookup, ValidMovement, MAX_MOVEMENT_QTY,
};

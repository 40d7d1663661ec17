use axum::Router;

pub mod locations;
pub mod movements;
pub mod products;
pub mod reports;
pub mod system;

/// Router for the ledger resources.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/locations", locations::router())
        .nest("/movements", movements::router())
        .nest("/reports", reports::router())
}

use axum::{http::StatusCode, response::Redirect};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn index() -> Redirect {
    Redirect::to("/products")
}

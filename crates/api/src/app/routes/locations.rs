use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_core::{DomainError, EntityKind, LocationId};
use stockroom_infra::store::EntityRef;
use stockroom_inventory::NewLocation;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route("/:id", get(get_location).put(update_location).delete(delete_location))
}

fn parse_id(id: &str) -> Result<LocationId, axum::response::Response> {
    id.parse().map_err(|_| errors::invalid_id("location"))
}

pub async fn list_locations(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store.list_locations().await {
        Ok(locations) => Json(locations).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::LocationRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    match services.store.create_location(&NewLocation::from(body)).await {
        Ok(location) => (StatusCode::CREATED, Json(location)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_location(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.get_location(id).await {
        Ok(Some(location)) => Json(location).into_response(),
        Ok(None) => errors::domain_error_to_response(DomainError::not_found(EntityKind::Location, id)),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_location(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::LocationRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match payload {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.store.update_location(id, &NewLocation::from(body)).await {
        Ok(location) => Json(location).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_location(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.store.delete_entity(EntityRef::Location(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

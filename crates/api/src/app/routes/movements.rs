use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_core::{DomainError, EntityKind, MovementId};
use stockroom_infra::store::{EntityRef, StoreResult};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_movements).post(create_movement))
        .route("/:id", get(get_movement).delete(delete_movement))
}

async fn catalog(services: &AppServices) -> StoreResult<dto::Catalog> {
    Ok(dto::Catalog::new(
        services.store.list_products().await?,
        services.store.list_locations().await?,
    ))
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListMovementsQuery>,
) -> axum::response::Response {
    let limit = query.limit.unwrap_or(services.config.movement_list_limit);
    if limit == 0 {
        return errors::validation_error("limit", "limit must be at least 1");
    }

    let movements = match services.store.list_movements(Some(limit)).await {
        Ok(v) => v,
        Err(e) => return errors::store_error_to_response(e),
    };
    let catalog = match catalog(&services).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };

    let views: Vec<dto::MovementView> = movements.iter().map(|m| catalog.movement_view(m)).collect();
    Json(views).into_response()
}

pub async fn create_movement(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::MovementRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(v) => v,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let movement = match services.store.create_movement(&draft).await {
        Ok(m) => m,
        Err(e) => return errors::store_error_to_response(e),
    };
    let catalog = match catalog(&services).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };

    (StatusCode::CREATED, Json(catalog.movement_view(&movement))).into_response()
}

pub async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MovementId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("movement"),
    };

    let movement = match services.store.get_movement(id).await {
        Ok(Some(m)) => m,
        Ok(None) => return errors::domain_error_to_response(DomainError::not_found(EntityKind::Movement, id)),
        Err(e) => return errors::store_error_to_response(e),
    };
    let catalog = match catalog(&services).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response(e),
    };

    Json(catalog.movement_view(&movement)).into_response()
}

pub async fn delete_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: MovementId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::invalid_id("movement"),
    };

    match services.store.delete_entity(EntityRef::Movement(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

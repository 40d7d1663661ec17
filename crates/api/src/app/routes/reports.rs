use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_core::{LocationId, ProductId};
use stockroom_infra::reporting;
use stockroom_inventory::BalanceFilter;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/balance", get(balance))
}

/// Parse an optional id query parameter; blank means "no filter".
fn filter_id<T: core::str::FromStr>(
    raw: Option<&str>,
    what: &str,
) -> Result<Option<T>, axum::response::Response> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| errors::invalid_id(what)),
    }
}

pub async fn balance(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::BalanceQuery>,
) -> axum::response::Response {
    let filter = match (
        filter_id::<ProductId>(query.product_id.as_deref(), "product"),
        filter_id::<LocationId>(query.location_id.as_deref(), "location"),
    ) {
        (Ok(product_id), Ok(location_id)) => BalanceFilter {
            product_id,
            location_id,
        },
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    match reporting::balance_report(services.store.as_ref(), filter).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

//! Read-only proxies to the external card catalog.

use crate::infra::catalog::SearchOrdering;
use crate::transport::http::types::{
    error_response, ApiResponse, AppState, AutocompleteParams, SearchParams,
};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/cards/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Normalized card records; unmatched queries are empty, not errors", body = ApiResponse),
        (status = 502, description = "Catalog gateway unreachable", body = ApiResponse)
    )
)]
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let ordering = if params.browse {
        SearchOrdering::Popularity
    } else {
        SearchOrdering::ReleaseDate
    };
    match state.catalog.search(&params.q, ordering).await {
        Ok(cards) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({ "cards": cards }))),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/cards/autocomplete",
    params(AutocompleteParams),
    responses(
        (status = 200, description = "Candidate full names for a partial name", body = ApiResponse),
        (status = 502, description = "Catalog gateway unreachable", body = ApiResponse)
    )
)]
pub async fn autocomplete_handler(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteParams>,
) -> impl IntoResponse {
    match state.catalog.autocomplete(&params.q).await {
        Ok(suggestions) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                serde_json::json!({ "suggestions": suggestions }),
            )),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

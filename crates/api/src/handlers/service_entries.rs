//! Handlers for the `/service-entries` resource.
//!
//! Every route requires a bearer token.

use autoservice_core::entities::ServiceEntry;
use autoservice_core::ports::Page;
use autoservice_core::service_entries::{
    CreateServiceEntry, DeleteServiceEntry, GetServiceEntry, ListServiceEntries,
    ServiceEntryPayload, UpdateServiceEntry,
};
use autoservice_core::types::DbId;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{resolve, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/service-entries
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ServiceEntryPayload>,
) -> AppResult<(StatusCode, Json<DataResponse<ServiceEntry>>)> {
    let cancel = state.request_token();
    let entry = resolve(
        state
            .desk
            .create_entry(CreateServiceEntry { payload }, &cancel)
            .await,
    )?;

    tracing::debug!(entry_id = %entry.id(), user_id = %user.user_id, "Created by user");
    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// GET /api/v1/service-entries?page_number=&page_size=&license_plate=
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(request): Query<ListServiceEntries>,
) -> AppResult<Json<DataResponse<Page<ServiceEntry>>>> {
    let cancel = state.request_token();
    let page = resolve(state.desk.list_entries(request, &cancel).await)?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/service-entries/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ServiceEntry>>> {
    let cancel = state.request_token();
    let entry = resolve(state.desk.get_entry(GetServiceEntry { id }, &cancel).await)?;
    Ok(Json(DataResponse { data: entry }))
}

/// PUT /api/v1/service-entries/{id}
///
/// Full replace; every required field must be present.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(payload): Json<ServiceEntryPayload>,
) -> AppResult<Json<DataResponse<ServiceEntry>>> {
    let cancel = state.request_token();
    let entry = resolve(
        state
            .desk
            .update_entry(UpdateServiceEntry { id, payload }, &cancel)
            .await,
    )?;

    tracing::debug!(entry_id = %id, user_id = %user.user_id, "Updated by user");
    Ok(Json(DataResponse { data: entry }))
}

/// DELETE /api/v1/service-entries/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let cancel = state.request_token();
    resolve(
        state
            .desk
            .delete_entry(DeleteServiceEntry { id }, &cancel)
            .await,
    )?;

    tracing::debug!(entry_id = %id, user_id = %user.user_id, "Deleted by user");
    Ok(StatusCode::NO_CONTENT)
}

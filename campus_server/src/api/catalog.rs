//! Fee catalog handlers.
//!
//! Everyone logged in may read the catalog; only admins change it.

use super::{AppState, error::ApiResult, middleware::require_role};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use campus_ledger::catalog::{
    FeeCategory, FeeStructure, NewCategory, NewStructure, PaymentPolicy, StructureUpdate,
    StructureView,
};
use campus_ledger::directory::Role;
use campus_ledger::session::SessionUser;

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<FeeCategory>>> {
    Ok(Json(state.campus.catalog.list_categories().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(new): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<FeeCategory>)> {
    require_role(&user, &[Role::Admin])?;
    let category = state.campus.catalog.create_category(new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Templates with the live name of their category
pub async fn list_structures(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StructureView>>> {
    Ok(Json(state.campus.catalog.structure_views().await?))
}

/// Create a template; an active one is assigned to every active student.
pub async fn create_structure(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(new): Json<NewStructure>,
) -> ApiResult<(StatusCode, Json<FeeStructure>)> {
    require_role(&user, &[Role::Admin])?;
    let structure = state.campus.create_structure(new).await?;
    Ok((StatusCode::CREATED, Json(structure)))
}

pub async fn update_structure(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(changes): Json<StructureUpdate>,
) -> ApiResult<Json<FeeStructure>> {
    require_role(&user, &[Role::Admin])?;
    Ok(Json(state.campus.update_structure(&id, changes).await?))
}

pub async fn list_policies(State(state): State<AppState>) -> ApiResult<Json<Vec<PaymentPolicy>>> {
    Ok(Json(state.campus.catalog.list_policies().await?))
}

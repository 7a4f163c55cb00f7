//! Organization manager API handlers
//!
//! An organization is the account that authors its projects. The
//! organization itself and administrators maintain its manager list.

use atelier_auth::{AuthContext, AuthUser, Role};
use atelier_common::{Error, Result, ValidatedJson};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ProjectsState;

#[derive(Debug, Deserialize, Validate)]
pub struct AddManagerRequest {
    pub manager_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ManagersResponse {
    pub organization_id: Uuid,
    pub managers: Vec<Uuid>,
}

fn ensure_can_manage(ctx: &AuthContext, organization_id: Uuid) -> Result<()> {
    if ctx.user_id() == organization_id || ctx.has_role(Role::Administrator) {
        Ok(())
    } else {
        Err(Error::Authorization(
            "Only the organization or an administrator may manage its managers".to_string(),
        ))
    }
}

pub async fn list_managers(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    Path(organization_id): Path<Uuid>,
) -> Result<Json<ManagersResponse>> {
    let managers = state.store.organization_managers(organization_id).await?;
    let is_member = managers.contains(&ctx.user_id());
    if !is_member {
        ensure_can_manage(&ctx, organization_id)?;
    }

    Ok(Json(ManagersResponse {
        organization_id,
        managers,
    }))
}

pub async fn add_manager(
    AuthUser(ctx): AuthUser,
    State(state): State<ProjectsState>,
    Path(organization_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AddManagerRequest>,
) -> Result<(StatusCode, Json<ManagersResponse>)> {
    ensure_can_manage(&ctx, organization_id)?;

    state
        .store
        .add_manager(organization_id, req.manager_id)
        .await?;
    tracing::info!(
        organization_id = %organization_id,
        manager_id = %req.manager_id,
        "Added organization manager"
    );

    let managers = state.store.organization_managers(organization_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ManagersResponse {
            organization_id,
            managers,
        }),
    ))
}

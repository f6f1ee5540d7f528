//! Assignment handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::dto::{ListQuery, Paginated};
use crate::api::SharedState;
use crate::error::Result;
use crate::services::asignacion_service::{AsignacionDetail, AsignacionPayload};

const MAX_PAGE_SIZE: u32 = 50;

/// Assignment routes; every authenticated user may read and write.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_asignaciones).post(create_asignacion))
        .route(
            "/:id",
            get(get_asignacion)
                .put(update_asignacion)
                .delete(delete_asignacion),
        )
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct DeletedResponse {
    pub message: String,
}

/// List assignments, newest first, with optional name/semana search
#[utoipa::path(
    get,
    path = "/api/v1/asignaciones",
    params(ListQuery),
    responses((status = 200, description = "Assignment list", body = Paginated<AsignacionDetail>)),
    security(("bearer_auth" = [])),
    tag = "asignaciones"
)]
pub async fn list_asignaciones(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<AsignacionDetail>>> {
    let page = query.page();
    let limit = query.limit(20, MAX_PAGE_SIZE);
    let (items, total) = state
        .asignacion_service()
        .list(page, limit, query.search())
        .await?;
    Ok(Json(Paginated::new(items, total, page, limit)))
}

/// Get one assignment with items, parent and children
#[utoipa::path(
    get,
    path = "/api/v1/asignaciones/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment", body = AsignacionDetail),
        (status = 404, description = "Assignment not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "asignaciones"
)]
pub async fn get_asignacion(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AsignacionDetail>> {
    let detail = state.asignacion_service().get(id).await?;
    Ok(Json(detail))
}

/// Create an assignment with its item collections
#[utoipa::path(
    post,
    path = "/api/v1/asignaciones",
    request_body = AsignacionPayload,
    responses(
        (status = 201, description = "Assignment created", body = AsignacionDetail),
        (status = 400, description = "Invalid assignment data"),
    ),
    security(("bearer_auth" = [])),
    tag = "asignaciones"
)]
pub async fn create_asignacion(
    State(state): State<SharedState>,
    Json(payload): Json<AsignacionPayload>,
) -> Result<impl IntoResponse> {
    let detail = state.asignacion_service().create(payload).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Replace an assignment's fields and item collections
#[utoipa::path(
    put,
    path = "/api/v1/asignaciones/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    request_body = AsignacionPayload,
    responses(
        (status = 200, description = "Updated assignment", body = AsignacionDetail),
        (status = 400, description = "Invalid assignment data"),
        (status = 404, description = "Assignment not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "asignaciones"
)]
pub async fn update_asignacion(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AsignacionPayload>,
) -> Result<Json<AsignacionDetail>> {
    let detail = state.asignacion_service().update(id, payload).await?;
    Ok(Json(detail))
}

/// Delete an assignment. Refused when child assignments reference it.
#[utoipa::path(
    delete,
    path = "/api/v1/asignaciones/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment deleted", body = DeletedResponse),
        (status = 400, description = "Assignment has dependent children"),
        (status = 404, description = "Assignment not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "asignaciones"
)]
pub async fn delete_asignacion(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>> {
    state.asignacion_service().delete(id).await?;
    Ok(Json(DeletedResponse {
        message: "Assignment deleted".to_string(),
    }))
}

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        list_asignaciones,
        get_asignacion,
        create_asignacion,
        update_asignacion,
        delete_asignacion
    ),
    components(schemas(
        AsignacionPayload,
        AsignacionDetail,
        DeletedResponse,
        crate::services::asignacion_service::ItemPayload,
        crate::services::asignacion_service::ItemDetail,
        crate::services::asignacion_service::ParentRef,
        crate::services::asignacion_service::ChildRef,
        crate::services::asignacion_service::AsignacionCounts,
        crate::models::asignacion::Month,
        crate::models::user::UserRef
    ))
)]
pub struct AsignacionesApiDoc;

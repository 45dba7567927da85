use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bezz_core::{Brief, BriefInput, BriefStatus, RenderedCreative};
use serde::{Deserialize, Serialize};

use crate::middleware::{Owner, RequestId};

use super::{map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct BriefsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedBrief {
    id: String,
    deleted: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct RetryAccepted {
    id: String,
    status: BriefStatus,
}

/// Persists the brief and returns at once; generation continues detached.
pub(super) async fn create_brief(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Json(input): Json<BriefInput>,
) -> Result<(StatusCode, Json<ApiResponse<Brief>>), ApiError> {
    let (brief, _run) = state
        .orchestrator
        .submit(&owner.0, input)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: brief,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn list_briefs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Query(query): Query<BriefsQuery>,
) -> Result<Json<ApiResponse<Vec<Brief>>>, ApiError> {
    let briefs = state
        .orchestrator
        .list(&owner.0, query.limit)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: briefs,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_brief(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Brief>>, ApiError> {
    let brief = state
        .orchestrator
        .get_owned(&id, &owner.0)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: brief,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_brief(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedBrief>>, ApiError> {
    state
        .orchestrator
        .delete_owned(&id, &owner.0)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: DeletedBrief { id, deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn retry_brief(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<RetryAccepted>>), ApiError> {
    let _run = state
        .orchestrator
        .retry_pipeline(&id, Some(&owner.0))
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: RetryAccepted {
                id,
                status: BriefStatus::Processing,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn refresh_image_urls(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<RenderedCreative>>>, ApiError> {
    let ads = state
        .orchestrator
        .refresh_image_urls(&id, &owner.0)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ads,
        meta: ResponseMeta::new(req_id.0),
    }))
}

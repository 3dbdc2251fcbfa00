//! shopcast-server/src/routes.rs
//!
//! JSON routes over `CoreApi`. Domain errors map to 4xx with a stable
//! `error` code; infrastructure errors map to 5xx.

use std::sync::Arc;
use std::time::Duration;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use uuid::Uuid;

use shopcast_common::models::{
    AvailableQuota, NewShop, PaymentOutcome, Penalty, PurchaseOrder, PurchaseRequest, Reel,
    ScheduleStreamRequest, Shop, ShopStatus, SocialPlatform, Stream, StreamPatch, SweeperKind,
    SystemStatus,
};
use shopcast_common::traits::api::{OperationsApi, PurchaseApi, ReelApi, ShopApi, StreamApi};
use shopcast_core::{CoreApi, Error};

type ApiState = Arc<CoreApi>;
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Longest wait a client may request from the confirmation endpoint.
const MAX_AWAIT_SECS: u64 = 120;

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) | Error::AlreadyProcessed { .. } => StatusCode::CONFLICT,
        Error::Parse(_) | Error::Json(_) | Error::InvalidSchedule(_) => StatusCode::BAD_REQUEST,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::PaymentNotInitiated(_) => StatusCode::BAD_GATEWAY,
        e if e.is_domain() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        let body = json!({ "error": self.0.code(), "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub fn router(api: ApiState) -> Router {
    Router::new()
        .route("/shops", post(create_shop))
        .route("/shops/{id}", get(get_shop))
        .route("/shops/{id}/status", put(set_shop_status))
        .route("/shops/{id}/handles/{platform}", put(set_social_handle))
        .route("/shops/{id}/penalties", get(list_penalties).post(penalize_shop))
        .route("/shops/{id}/lift-suspension", post(lift_suspension))
        .route("/shops/{id}/quota", get(available_quota))
        .route("/shops/{id}/streams", get(list_shop_streams))
        .route("/shops/{id}/reels", get(list_shop_reels).post(publish_reel))
        .route("/streams", post(schedule_stream))
        .route("/streams/{id}", get(get_stream).patch(update_stream))
        .route("/streams/{id}/cancel", post(cancel_stream))
        .route("/streams/{id}/ban", post(ban_stream))
        .route("/streams/{id}/extend", post(extend_stream))
        .route("/streams/{id}/start", post(start_stream))
        .route("/streams/{id}/finish", post(finish_stream))
        .route("/streams/{id}/report", post(report_stream))
        .route("/reels/{id}/hide", post(hide_reel))
        .route("/reels/{id}/reactivate", post(reactivate_reel))
        .route("/purchases", post(create_purchase))
        .route("/purchases/{id}", get(get_purchase))
        .route("/purchases/{id}/approve", post(approve_purchase))
        .route("/purchases/{id}/reject", post(reject_purchase))
        .route("/purchases/{id}/cancel", post(cancel_purchase))
        .route("/purchases/{id}/await", get(await_purchase))
        .route("/payments/notifications", post(payment_notification))
        .route("/ops/status", get(system_status))
        .route("/ops/sweepers/{kind}", put(set_sweeper_enabled))
        .route("/ops/sweepers/{kind}/run", post(run_sweeper))
        .with_state(api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

// ---------------------------------------------------------------------
// Shops
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: ShopStatus,
}

#[derive(Debug, Deserialize)]
struct HandleBody {
    handle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReasonBody {
    reason: String,
}

async fn create_shop(State(api): State<ApiState>, Json(body): Json<NewShop>) -> Result<(StatusCode, Json<Shop>), ApiError> {
    let shop = api.create_shop(body).await?;
    Ok((StatusCode::CREATED, Json(shop)))
}

async fn get_shop(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Shop> {
    Ok(Json(api.get_shop(id).await?))
}

async fn set_shop_status(
    State(api): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Shop> {
    let shop = api.set_shop_status(id, body.status).await?;
    Ok(Json(shop))
}

async fn set_social_handle(
    State(api): State<ApiState>,
    Path((id, platform)): Path<(Uuid, SocialPlatform)>,
    Json(body): Json<HandleBody>,
) -> ApiResult<Shop> {
    let shop = api.set_social_handle(id, platform, body.handle).await?;
    Ok(Json(shop))
}

async fn penalize_shop(
    State(api): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReasonBody>,
) -> ApiResult<Penalty> {
    let penalty = api.penalize_shop(id, &body.reason).await?;
    Ok(Json(penalty))
}

async fn list_penalties(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Vec<Penalty>> {
    Ok(Json(api.list_penalties(id).await?))
}

async fn lift_suspension(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Shop> {
    Ok(Json(api.lift_suspension(id).await?))
}

async fn available_quota(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<AvailableQuota> {
    Ok(Json(api.available_quota(id).await?))
}

// ---------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UpdateStreamBody {
    #[serde(flatten)]
    patch: StreamPatch,
    #[serde(default)]
    admin_override: bool,
}

async fn schedule_stream(
    State(api): State<ApiState>,
    Json(body): Json<ScheduleStreamRequest>,
) -> Result<(StatusCode, Json<Stream>), ApiError> {
    let stream = api.schedule_stream(body).await?;
    Ok((StatusCode::CREATED, Json(stream)))
}

async fn get_stream(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Stream> {
    Ok(Json(api.get_stream(id).await?))
}

async fn list_shop_streams(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Vec<Stream>> {
    Ok(Json(api.list_shop_streams(id).await?))
}

async fn update_stream(
    State(api): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStreamBody>,
) -> ApiResult<Stream> {
    let stream = api.update_stream(id, body.patch, body.admin_override).await?;
    Ok(Json(stream))
}

async fn cancel_stream(
    State(api): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReasonBody>,
) -> ApiResult<Stream> {
    Ok(Json(api.cancel_stream(id, &body.reason).await?))
}

async fn ban_stream(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Stream> {
    Ok(Json(api.ban_stream(id).await?))
}

async fn extend_stream(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Stream> {
    Ok(Json(api.extend_stream(id).await?))
}

async fn start_stream(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Stream> {
    Ok(Json(api.start_stream(id).await?))
}

async fn finish_stream(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Stream> {
    Ok(Json(api.finish_stream(id).await?))
}

async fn report_stream(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Stream> {
    Ok(Json(api.report_stream(id).await?))
}

// ---------------------------------------------------------------------
// Reels
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PublishReelBody {
    platform: SocialPlatform,
    content: String,
}

async fn publish_reel(
    State(api): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PublishReelBody>,
) -> Result<(StatusCode, Json<Reel>), ApiError> {
    let reel = api.publish_reel(id, body.platform, &body.content).await?;
    Ok((StatusCode::CREATED, Json(reel)))
}

async fn list_shop_reels(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Vec<Reel>> {
    Ok(Json(api.list_shop_reels(id).await?))
}

async fn hide_reel(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Reel> {
    Ok(Json(api.hide_reel(id).await?))
}

async fn reactivate_reel(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<Reel> {
    Ok(Json(api.reactivate_reel(id).await?))
}

// ---------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RejectBody {
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
struct AwaitQuery {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct NotificationBody {
    external_reference: String,
    outcome: PaymentOutcome,
}

async fn create_purchase(
    State(api): State<ApiState>,
    Json(body): Json<PurchaseOrder>,
) -> Result<(StatusCode, Json<PurchaseRequest>), ApiError> {
    let purchase = api.create_purchase_preference(body).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

async fn get_purchase(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<PurchaseRequest> {
    Ok(Json(api.get_purchase(id).await?))
}

async fn approve_purchase(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<PurchaseRequest> {
    Ok(Json(api.approve_purchase(id).await?))
}

async fn reject_purchase(
    State(api): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectBody>,
) -> ApiResult<PurchaseRequest> {
    Ok(Json(api.reject_purchase(id, &body.notes).await?))
}

async fn cancel_purchase(State(api): State<ApiState>, Path(id): Path<Uuid>) -> ApiResult<PurchaseRequest> {
    Ok(Json(api.cancel_purchase(id).await?))
}

async fn await_purchase(
    State(api): State<ApiState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AwaitQuery>,
) -> ApiResult<PurchaseRequest> {
    let secs = query.timeout_secs.unwrap_or(30).min(MAX_AWAIT_SECS);
    let purchase = api.await_confirmation(id, Duration::from_secs(secs)).await?;
    Ok(Json(purchase))
}

async fn payment_notification(
    State(api): State<ApiState>,
    Json(body): Json<NotificationBody>,
) -> ApiResult<PurchaseRequest> {
    let purchase = api
        .handle_payment_notification(&body.external_reference, body.outcome)
        .await?;
    Ok(Json(purchase))
}

// ---------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EnabledBody {
    enabled: bool,
}

async fn system_status(State(api): State<ApiState>) -> ApiResult<SystemStatus> {
    Ok(Json(api.fetch_system_status().await?))
}

async fn set_sweeper_enabled(
    State(api): State<ApiState>,
    Path(kind): Path<SweeperKind>,
    Json(body): Json<EnabledBody>,
) -> ApiResult<SystemStatus> {
    let status = api.set_sweeper_enabled(kind, body.enabled).await?;
    Ok(Json(status))
}

async fn run_sweeper(State(api): State<ApiState>, Path(kind): Path<SweeperKind>) -> ApiResult<serde_json::Value> {
    Ok(Json(api.run_sweeper(kind).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(status_for(&Error::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&Error::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&Error::DuplicateDailySlot { day: "2025-06-10".into() }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&Error::AlreadyProcessed { purchase_id: Uuid::nil(), status: "APPROVED".into() }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&Error::EventBus("closed".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use crate::adapter::driven::{MySqlCarRepository, MySqlReservationRepository};
use crate::adapter::driver::request_dto::{
    CreateCarRequest, CreateReservationRequest, UpdateCarRequest, UpdateReservationStatusRequest,
};
use crate::adapter::driver::response_dto::{
    CalendarEntryResponse, CarResponse, ReservationResponse, ReservationWithCarResponse,
};
use crate::application::service::{
    CarApplicationService, CarQueryService, ReservationApplicationService, ReservationQueryService,
};
use crate::application::ApplicationError;
use crate::domain::model::{Car, CarId, Money, ReservationId, ReservationStatus, UserId};

use axum::async_trait;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// APIエラーレスポンス
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

/// RESTアダプターの共有状態
#[derive(Clone)]
pub struct AppState {
    pub reservation_service:
        Arc<ReservationApplicationService<MySqlReservationRepository, MySqlCarRepository>>,
    pub car_service: Arc<CarApplicationService<MySqlCarRepository>>,
    pub reservation_query_service: Arc<ReservationQueryService>,
    pub car_query_service: Arc<CarQueryService>,
}

/// 認証済み利用者
/// 認証はAPIゲートウェイなど上流の責務であり、このサービスは
/// 信頼された `x-user-id` ヘッダーから利用者IDを受け取る
pub struct CurrentUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get("x-user-id").ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiError {
                error: "認証情報がありません".to_string(),
                code: "UNAUTHORIZED".to_string(),
            }),
        ))?;

        let value = header.to_str().map_err(|_| invalid_user_id())?;
        let user_id = UserId::from_string(value).map_err(|_| invalid_user_id())?;

        Ok(CurrentUser(user_id))
    }
}

fn invalid_user_id() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: "利用者IDの形式が不正です".to_string(),
            code: "INVALID_USER_ID".to_string(),
        }),
    )
}

/// アプリケーションエラーをHTTPレスポンスに変換
///
/// - Conflict: 409（期間競合。クライアントは別日程で再試行できる）
/// - NotFound: 404
/// - DomainError: 422（入力値がビジネスルールに違反）
/// - RepositoryError: 500
fn map_application_error(error: ApplicationError) -> (StatusCode, Json<ApiError>) {
    let (status, code, message) = match &error {
        ApplicationError::Conflict(msg) => (
            StatusCode::CONFLICT,
            "RESERVATION_CONFLICT",
            msg.clone(),
        ),
        ApplicationError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
        ApplicationError::DomainError(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "UNPROCESSABLE_ENTITY",
            err.to_string(),
        ),
        ApplicationError::RepositoryError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "内部エラーが発生しました".to_string(),
        ),
    };

    (
        status,
        Json(ApiError {
            error: message,
            code: code.to_string(),
        }),
    )
}

/// ルーターを作成
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/reservations", post(create_reservation).get(list_reservations))
        .route("/my-reservations", get(list_own_reservations))
        .route(
            "/reservations/:reservation_id/status",
            put(update_reservation_status),
        )
        .route("/cars", get(list_cars).post(create_car))
        .route(
            "/cars/:car_id",
            get(get_car).put(update_car).delete(delete_car),
        )
        .route("/cars/:car_id/calendar", get(get_calendar))
        .with_state(state)
}

/// ヘルスチェック
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// 予約を作成
/// 成功時は201 Createdと作成された予約を返す
async fn create_reservation(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let reservation = state
        .reservation_service
        .create_reservation(
            user_id,
            CarId::from_uuid(request.car_id),
            request.start_date,
            request.end_date,
        )
        .await
        .map_err(map_application_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse::from_reservation(&reservation)),
    ))
}

/// すべての予約を一覧取得（管理者向け）
/// 車両情報を埋め込んで返す
async fn list_reservations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let reservations = state
        .reservation_query_service
        .get_all_reservations()
        .await
        .map_err(map_application_error)?;

    let cars = car_index(&state).await?;
    let response: Vec<ReservationWithCarResponse> = reservations
        .iter()
        .map(|r| ReservationWithCarResponse::from_parts(r, cars.get(&r.car_id())))
        .collect();

    Ok(Json(response))
}

/// 自分の予約を一覧取得
async fn list_own_reservations(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let reservations = state
        .reservation_query_service
        .get_reservations_by_user(user_id)
        .await
        .map_err(map_application_error)?;

    let cars = car_index(&state).await?;
    let response: Vec<ReservationWithCarResponse> = reservations
        .iter()
        .map(|r| ReservationWithCarResponse::from_parts(r, cars.get(&r.car_id())))
        .collect();

    Ok(Json(response))
}

/// 一覧埋め込み用に車両をIDで引けるようにする
async fn car_index(
    state: &AppState,
) -> Result<HashMap<CarId, Car>, (StatusCode, Json<ApiError>)> {
    let cars = state
        .car_query_service
        .get_all_cars()
        .await
        .map_err(map_application_error)?;
    Ok(cars.into_iter().map(|car| (car.id(), car)).collect())
}

/// 予約ステータスを更新（管理者向け）
/// 更新後の予約を返す。利用者への通知はバックグラウンドで
/// 送信されるため、レスポンスは通知の完了を待たない
async fn update_reservation_status(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
    Json(request): Json<UpdateReservationStatusRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let new_status = ReservationStatus::from_string(&request.status)
        .map_err(|e| map_application_error(ApplicationError::DomainError(e)))?;

    let reservation = state
        .reservation_service
        .update_reservation_status(ReservationId::from_uuid(reservation_id), new_status)
        .await
        .map_err(map_application_error)?;

    Ok(Json(ReservationResponse::from_reservation(&reservation)))
}

/// 指定車両の予約カレンダーを取得
/// 認証不要の読み取り専用エンドポイント
async fn get_calendar(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let periods = state
        .reservation_query_service
        .get_calendar(CarId::from_uuid(car_id))
        .await
        .map_err(map_application_error)?;

    let response: Vec<CalendarEntryResponse> =
        periods.iter().map(CalendarEntryResponse::from_range).collect();

    Ok(Json(response))
}

/// 車両の一覧を取得
async fn list_cars(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let cars = state
        .car_query_service
        .get_all_cars()
        .await
        .map_err(map_application_error)?;

    let response: Vec<CarResponse> = cars.iter().map(CarResponse::from_car).collect();
    Ok(Json(response))
}

/// 車両を取得
async fn get_car(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let car = state
        .car_query_service
        .get_car_by_id(CarId::from_uuid(car_id))
        .await
        .map_err(map_application_error)?
        .ok_or_else(|| {
            map_application_error(ApplicationError::NotFound(format!(
                "車両が見つかりません: {}",
                car_id
            )))
        })?;

    Ok(Json(CarResponse::from_car(&car)))
}

/// 車両を登録（管理者向け）
async fn create_car(
    State(state): State<AppState>,
    Json(request): Json<CreateCarRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let car = state
        .car_service
        .create_car(
            request.brand,
            request.model,
            request.plate_number,
            request.year,
            Money::jpy(request.price_per_day),
        )
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(CarResponse::from_car(&car))))
}

/// 車両情報を更新（管理者向け）
async fn update_car(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
    Json(request): Json<UpdateCarRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let car = state
        .car_service
        .update_car(
            CarId::from_uuid(car_id),
            request.brand,
            request.model,
            request.plate_number,
            request.year,
            Money::jpy(request.price_per_day),
        )
        .await
        .map_err(map_application_error)?;

    Ok(Json(CarResponse::from_car(&car)))
}

/// 車両を削除（管理者向け）
/// 既存の予約は削除されない
async fn delete_car(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    state
        .car_service
        .delete_car(CarId::from_uuid(car_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(serde_json::json!({ "message": "車両を削除しました" })))
}

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

/// 予約作成リクエスト
/// 利用者IDはリクエストボディには含まれず、認証済みの
/// リクエストコンテキストから取得する
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// 予約ステータス更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateReservationStatusRequest {
    /// "accepted" または "declined"
    pub status: String,
}

/// 車両登録リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateCarRequest {
    pub brand: String,
    pub model: String,
    pub plate_number: String,
    pub year: i32,
    /// 日額料金（円）
    pub price_per_day: i64,
}

/// 車両更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateCarRequest {
    pub brand: String,
    pub model: String,
    pub plate_number: String,
    pub year: i32,
    pub price_per_day: i64,
}

use crate::domain::model::{CarId, DateRange, Money, ReservationId, ReservationStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// イベントメタデータ
/// すべてのドメインイベントに共通する識別・追跡情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// イベントの一意識別子
    pub event_id: Uuid,
    /// 一連の処理を紐付ける相関ID
    pub correlation_id: Uuid,
    /// イベントスキーマのバージョン
    pub event_version: u32,
    /// イベント発生日時
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// 新しいメタデータを作成
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            event_version: 1,
            occurred_at: Utc::now(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// ドメインイベント列挙型
/// ビジネス上の重要なイベントを表現する
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// 予約ステータスが更新された
    ReservationStatusUpdated(ReservationStatusUpdated),
}

impl DomainEvent {
    /// イベントタイプ名を取得
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ReservationStatusUpdated(_) => "ReservationStatusUpdated",
        }
    }

    /// メタデータへの参照を取得
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            DomainEvent::ReservationStatusUpdated(e) => &e.metadata,
        }
    }
}

/// 予約ステータス更新イベント
/// 管理者によるステータス変更時に発生し、利用者への通知の起点となる。
/// 予約作成時には通知しない
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusUpdated {
    /// 予約ID
    pub reservation_id: ReservationId,
    /// 通知先の利用者ID
    pub user_id: UserId,
    /// 車両ID
    pub car_id: CarId,
    /// 予約期間
    pub period: DateRange,
    /// 更新後のステータス
    pub status: ReservationStatus,
    /// 料金見積り
    pub price_estimate: Money,
    /// イベントメタデータ
    pub metadata: EventMetadata,
}

impl ReservationStatusUpdated {
    /// 新しい予約ステータス更新イベントを作成
    pub fn new(
        reservation_id: ReservationId,
        user_id: UserId,
        car_id: CarId,
        period: DateRange,
        status: ReservationStatus,
        price_estimate: Money,
    ) -> Self {
        Self {
            reservation_id,
            user_id,
            car_id,
            period,
            status,
            price_estimate,
            metadata: EventMetadata::new(),
        }
    }
}

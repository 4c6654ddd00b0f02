use crate::domain::error::DomainError;
use crate::domain::event::{DomainEvent, ReservationStatusUpdated};
use crate::domain::model::{CarId, DateRange, Money, ReservationId, ReservationStatus, UserId};
use chrono::{DateTime, Utc};

/// Reservation集約
/// 予約のライフサイクルを管理し、ビジネスルールを適用する。
/// 作成は予約操作のみを経由し、作成後に変更できるのはステータスだけ。
/// 期間・車両・利用者・料金見積りは作成時点で確定する
#[derive(Debug, Clone)]
pub struct Reservation {
    id: ReservationId,
    car_id: CarId,
    user_id: UserId,
    period: DateRange,
    status: ReservationStatus,
    price_estimate: Money,
    created_at: DateTime<Utc>,
    domain_events: Vec<DomainEvent>,
}

impl Reservation {
    /// 新しい予約を作成
    /// 初期ステータスはPending、作成日時はサーバー側で付与
    pub fn new(
        id: ReservationId,
        car_id: CarId,
        user_id: UserId,
        period: DateRange,
        price_estimate: Money,
    ) -> Self {
        Self {
            id,
            car_id,
            user_id,
            period,
            status: ReservationStatus::Pending,
            price_estimate,
            created_at: Utc::now(),
            domain_events: Vec::new(),
        }
    }

    /// データベースから取得したデータで予約を再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(
        id: ReservationId,
        car_id: CarId,
        user_id: UserId,
        period: DateRange,
        status: ReservationStatus,
        price_estimate: Money,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            car_id,
            user_id,
            period,
            status,
            price_estimate,
            created_at,
            domain_events: Vec::new(),
        })
    }

    /// 予約IDを取得
    pub fn id(&self) -> ReservationId {
        self.id
    }

    /// 車両IDを取得
    pub fn car_id(&self) -> CarId {
        self.car_id
    }

    /// 利用者IDを取得
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// 予約期間を取得
    pub fn period(&self) -> DateRange {
        self.period
    }

    /// 予約ステータスを取得
    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    /// 料金見積りを取得（作成時に一度だけ計算されたスナップショット）
    pub fn price_estimate(&self) -> Money {
        self.price_estimate
    }

    /// 作成日時を取得
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// ドメインイベントを取得してクリア
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    /// この予約が指定期間の新規予約を妨げるか判定
    /// 却下済みの予約は競合判定から永久に除外される
    pub fn blocks(&self, period: &DateRange) -> bool {
        self.status.blocks_booking() && self.period.overlaps(period)
    }

    /// 予約ステータスを更新（管理者操作）
    /// 事前条件:
    /// - 新しいステータスがAcceptedまたはDeclined
    ///
    /// 承認済み・却下済みの間の再遷移は制限しない。確定後の再変更を
    /// 禁止しないのは元の業務ポリシーであり、却下によって期間が
    /// 解放され再予約可能になる
    pub fn update_status(&mut self, new_status: ReservationStatus) -> Result<(), DomainError> {
        if new_status == ReservationStatus::Pending {
            return Err(DomainError::InvalidStatus(
                "ステータスはacceptedまたはdeclinedのみ指定できます".to_string(),
            ));
        }

        self.status = new_status;

        // ReservationStatusUpdatedイベントを生成
        let event = ReservationStatusUpdated::new(
            self.id,
            self.user_id,
            self.car_id,
            self.period,
            new_status,
            self.price_estimate,
        );
        self.domain_events
            .push(DomainEvent::ReservationStatusUpdated(event));

        Ok(())
    }
}

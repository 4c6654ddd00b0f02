mod car_query_service;
mod reservation_query_service;

pub use car_query_service::CarQueryService;
pub use reservation_query_service::ReservationQueryService;

use crate::application::ApplicationError;
use crate::domain::model::{
    Car, CarId, Money, Reservation, ReservationId, ReservationStatus, UserId,
};
use crate::domain::model::DateRange;
use crate::domain::port::{CarRepository, EventBus, Logger, ReservationRepository};
use chrono::NaiveDate;
use std::sync::Arc;

/// 予約アプリケーションサービス
/// 予約作成（重複検知・料金見積り）とステータス遷移を担当する
pub struct ReservationApplicationService<RR, CR>
where
    RR: ReservationRepository,
    CR: CarRepository,
{
    reservation_repository: RR,
    car_repository: CR,
    event_bus: Arc<dyn EventBus>,
    logger: Arc<dyn Logger>,
}

impl<RR, CR> ReservationApplicationService<RR, CR>
where
    RR: ReservationRepository,
    CR: CarRepository,
{
    /// 新しい予約アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `reservation_repository` - 予約リポジトリ
    /// * `car_repository` - 車両リポジトリ（読み取り専用で使用）
    /// * `event_bus` - イベントバス
    /// * `logger` - ロガー
    pub fn new(
        reservation_repository: RR,
        car_repository: CR,
        event_bus: Arc<dyn EventBus>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            reservation_repository,
            car_repository,
            event_bus,
            logger,
        }
    }

    /// 新しい予約を作成
    ///
    /// 処理の流れ:
    /// 1. 日付範囲のバリデーション（終了日 < 開始日は即時エラー）
    /// 2. 車両の解決（存在しなければNotFound）
    /// 3. 料金見積りの計算（両端を含む日数 × 日額料金）
    /// 4. 重複チェック付き登録。チェックと挿入はリポジトリ内で
    ///    車両単位のアトミックな操作として実行される
    ///
    /// 作成時に通知は送信しない
    ///
    /// # Arguments
    /// * `user_id` - 認証済み利用者のID（クライアント入力ではない）
    /// * `car_id` - 車両ID
    /// * `start_date` - 開始日
    /// * `end_date` - 終了日（開始日と同日なら1日予約）
    ///
    /// # Returns
    /// * `Ok(Reservation)` - 作成された予約
    /// * `Err(ApplicationError)` - バリデーション失敗、車両未発見、期間競合など
    pub async fn create_reservation(
        &self,
        user_id: UserId,
        car_id: CarId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Reservation, ApplicationError> {
        let period = DateRange::new(start_date, end_date)?;

        let car = self
            .car_repository
            .find_by_id(car_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("車両が見つかりません: {}", car_id))
            })?;

        // 見積りは作成時点の日額料金によるスナップショット
        let price_estimate = car.price_for(&period)?;

        let reservation_id = self.reservation_repository.next_identity();
        let reservation =
            Reservation::new(reservation_id, car_id, user_id, period, price_estimate);

        let created = self
            .reservation_repository
            .create_if_available(&reservation)
            .await?;
        if !created {
            return Err(ApplicationError::Conflict(
                "指定された期間はすでに予約されています".to_string(),
            ));
        }

        self.logger.info(
            "ReservationApplicationService",
            &format!(
                "Reservation created: {} (car: {}, period: {})",
                reservation.id(),
                car_id,
                reservation.period()
            ),
            None,
            None,
        );

        Ok(reservation)
    }

    /// 予約ステータスを更新（管理者操作）
    ///
    /// ステータスの保存後、利用者向けの通知イベントを
    /// ファイアアンドフォーゲットで発行する。発行はレスポンスを
    /// ブロックせず、失敗してもステータス更新の結果には影響しない
    ///
    /// # Arguments
    /// * `reservation_id` - 予約ID
    /// * `new_status` - 新しいステータス（accepted / declined）
    ///
    /// # Returns
    /// * `Ok(Reservation)` - 更新された予約
    /// * `Err(ApplicationError)` - 予約未発見、無効なステータスなど
    pub async fn update_reservation_status(
        &self,
        reservation_id: ReservationId,
        new_status: ReservationStatus,
    ) -> Result<Reservation, ApplicationError> {
        let mut reservation = self
            .reservation_repository
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "予約が見つかりません: {}",
                    reservation_id
                ))
            })?;

        reservation.update_status(new_status)?;
        self.reservation_repository.save(&reservation).await?;

        // 通知イベントの発行はステータス書き込みと切り離す
        for event in reservation.take_domain_events() {
            let event_bus = self.event_bus.clone();
            let logger = self.logger.clone();
            let correlation_id = event.metadata().correlation_id;
            tokio::spawn(async move {
                if let Err(err) = event_bus.publish(event).await {
                    logger.error(
                        "ReservationApplicationService",
                        &format!("Status notification dispatch failed: {}", err),
                        Some(correlation_id),
                        None,
                    );
                }
            });
        }

        Ok(reservation)
    }
}

/// 車両アプリケーションサービス
/// カタログ側の車両管理（管理者操作）を担当する
pub struct CarApplicationService<CR>
where
    CR: CarRepository,
{
    car_repository: CR,
}

impl<CR> CarApplicationService<CR>
where
    CR: CarRepository,
{
    /// 新しい車両アプリケーションサービスを作成
    pub fn new(car_repository: CR) -> Self {
        Self { car_repository }
    }

    /// 新しい車両を登録
    ///
    /// # Returns
    /// * `Ok(Car)` - 登録された車両
    /// * `Err(ApplicationError)` - バリデーション失敗または保存失敗
    pub async fn create_car(
        &self,
        brand: String,
        model: String,
        plate_number: String,
        year: i32,
        price_per_day: Money,
    ) -> Result<Car, ApplicationError> {
        let car_id = self.car_repository.next_identity();
        let car = Car::new(car_id, brand, model, plate_number, year, price_per_day)?;
        self.car_repository.save(&car).await?;
        Ok(car)
    }

    /// 車両情報を更新
    ///
    /// # Returns
    /// * `Ok(Car)` - 更新された車両
    /// * `Err(ApplicationError)` - 車両未発見またはバリデーション失敗
    pub async fn update_car(
        &self,
        car_id: CarId,
        brand: String,
        model: String,
        plate_number: String,
        year: i32,
        price_per_day: Money,
    ) -> Result<Car, ApplicationError> {
        let mut car = self
            .car_repository
            .find_by_id(car_id)
            .await?
            .ok_or_else(|| {
                ApplicationError::NotFound(format!("車両が見つかりません: {}", car_id))
            })?;
        car.update_details(brand, model, plate_number, year, price_per_day)?;
        self.car_repository.save(&car).await?;
        Ok(car)
    }

    /// 車両を削除
    /// 車両削除は予約の削除を伴わない（予約コアは予約を削除しない）
    ///
    /// # Returns
    /// * `Ok(())` - 削除成功
    /// * `Err(ApplicationError)` - 車両未発見または削除失敗
    pub async fn delete_car(&self, car_id: CarId) -> Result<(), ApplicationError> {
        let deleted = self.car_repository.delete(car_id).await?;
        if !deleted {
            return Err(ApplicationError::NotFound(format!(
                "車両が見つかりません: {}",
                car_id
            )));
        }
        Ok(())
    }
}

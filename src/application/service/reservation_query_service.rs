use crate::application::ApplicationError;
use crate::domain::model::{CarId, DateRange, Reservation, UserId};
use crate::domain::port::ReservationRepository;
use std::sync::Arc;

/// 予約クエリサービス
/// 読み取り専用の予約操作を提供する
pub struct ReservationQueryService {
    reservation_repository: Arc<dyn ReservationRepository>,
}

impl ReservationQueryService {
    /// 新しい予約クエリサービスを作成
    ///
    /// # Arguments
    /// * `reservation_repository` - 予約リポジトリ
    pub fn new(reservation_repository: Arc<dyn ReservationRepository>) -> Self {
        Self {
            reservation_repository,
        }
    }

    /// 指定された車両の予約カレンダーを取得
    /// 却下済みでない予約の期間のみを返す読み取り専用プロジェクション。
    /// 個人情報を含まないため認証不要で公開できる
    ///
    /// # Arguments
    /// * `car_id` - 車両ID
    ///
    /// # Returns
    /// * `Ok(Vec<DateRange>)` - 占有されている期間のリスト
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_calendar(&self, car_id: CarId) -> Result<Vec<DateRange>, ApplicationError> {
        self.reservation_repository
            .find_active_periods(car_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// 指定された利用者の予約を取得
    /// 作成日時の降順で並べて返す
    ///
    /// # Arguments
    /// * `user_id` - 利用者ID
    pub async fn get_reservations_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Reservation>, ApplicationError> {
        self.reservation_repository
            .find_by_user(user_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// すべての予約を取得（管理者向け）
    /// 作成日時の降順で並べて返す
    pub async fn get_all_reservations(&self) -> Result<Vec<Reservation>, ApplicationError> {
        self.reservation_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Money, Reservation, ReservationId, ReservationStatus};
    use crate::domain::port::RepositoryError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// テスト用のインメモリ予約リポジトリ
    struct InMemoryReservationRepository {
        reservations: Mutex<HashMap<ReservationId, Reservation>>,
    }

    impl InMemoryReservationRepository {
        fn new() -> Self {
            Self {
                reservations: Mutex::new(HashMap::new()),
            }
        }

        fn insert(&self, reservation: Reservation) {
            self.reservations
                .lock()
                .unwrap()
                .insert(reservation.id(), reservation);
        }
    }

    #[async_trait]
    impl ReservationRepository for InMemoryReservationRepository {
        async fn create_if_available(
            &self,
            reservation: &Reservation,
        ) -> Result<bool, RepositoryError> {
            let mut reservations = self.reservations.lock().unwrap();
            let conflict = reservations
                .values()
                .any(|r| r.car_id() == reservation.car_id() && r.blocks(&reservation.period()));
            if conflict {
                return Ok(false);
            }
            reservations.insert(reservation.id(), reservation.clone());
            Ok(true)
        }

        async fn find_by_id(
            &self,
            reservation_id: ReservationId,
        ) -> Result<Option<Reservation>, RepositoryError> {
            Ok(self
                .reservations
                .lock()
                .unwrap()
                .get(&reservation_id)
                .cloned())
        }

        async fn find_all(&self) -> Result<Vec<Reservation>, RepositoryError> {
            let mut all: Vec<Reservation> =
                self.reservations.lock().unwrap().values().cloned().collect();
            all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            Ok(all)
        }

        async fn find_by_user(
            &self,
            user_id: UserId,
        ) -> Result<Vec<Reservation>, RepositoryError> {
            let mut owned: Vec<Reservation> = self
                .reservations
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.user_id() == user_id)
                .cloned()
                .collect();
            owned.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            Ok(owned)
        }

        async fn find_active_periods(
            &self,
            car_id: CarId,
        ) -> Result<Vec<DateRange>, RepositoryError> {
            let mut periods: Vec<DateRange> = self
                .reservations
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.car_id() == car_id && r.status().blocks_booking())
                .map(|r| r.period())
                .collect();
            periods.sort_by_key(|p| p.start());
            Ok(periods)
        }

        async fn save(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
            self.reservations
                .lock()
                .unwrap()
                .insert(reservation.id(), reservation.clone());
            Ok(())
        }

        fn next_identity(&self) -> ReservationId {
            ReservationId::new()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reservation_for(car_id: CarId, user_id: UserId, start: NaiveDate, end: NaiveDate) -> Reservation {
        Reservation::new(
            ReservationId::new(),
            car_id,
            user_id,
            DateRange::new(start, end).unwrap(),
            Money::jpy(150),
        )
    }

    #[tokio::test]
    async fn test_calendar_contains_only_non_declined_periods() {
        let repository = Arc::new(InMemoryReservationRepository::new());
        let car_id = CarId::new();
        let user_id = UserId::new();

        let active = reservation_for(car_id, user_id, date(2024, 6, 10), date(2024, 6, 12));
        let mut declined =
            reservation_for(car_id, user_id, date(2024, 6, 20), date(2024, 6, 22));
        declined
            .update_status(ReservationStatus::Declined)
            .unwrap();
        repository.insert(active);
        repository.insert(declined);

        let service = ReservationQueryService::new(repository);
        let calendar = service.get_calendar(car_id).await.unwrap();

        assert_eq!(calendar.len(), 1);
        assert_eq!(calendar[0].start(), date(2024, 6, 10));
    }

    #[tokio::test]
    async fn test_calendar_for_unknown_car_is_empty() {
        let repository = Arc::new(InMemoryReservationRepository::new());
        let service = ReservationQueryService::new(repository);

        let calendar = service.get_calendar(CarId::new()).await.unwrap();
        assert!(calendar.is_empty());
    }

    #[tokio::test]
    async fn test_reservations_by_user_excludes_other_users() {
        let repository = Arc::new(InMemoryReservationRepository::new());
        let car_id = CarId::new();
        let owner = UserId::new();
        let other = UserId::new();

        repository.insert(reservation_for(car_id, owner, date(2024, 6, 10), date(2024, 6, 12)));
        repository.insert(reservation_for(car_id, other, date(2024, 7, 1), date(2024, 7, 3)));

        let service = ReservationQueryService::new(repository);
        let owned = service.get_reservations_by_user(owner).await.unwrap();

        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].user_id(), owner);
    }

    #[tokio::test]
    async fn test_all_reservations_returns_everything() {
        let repository = Arc::new(InMemoryReservationRepository::new());
        let car_id = CarId::new();

        repository.insert(reservation_for(car_id, UserId::new(), date(2024, 6, 10), date(2024, 6, 12)));
        repository.insert(reservation_for(car_id, UserId::new(), date(2024, 7, 1), date(2024, 7, 3)));

        let service = ReservationQueryService::new(repository);
        let all = service.get_all_reservations().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}

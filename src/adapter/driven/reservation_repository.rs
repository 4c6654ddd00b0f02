use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{
    CarId, DateRange, Money, Reservation, ReservationId, ReservationStatus, UserId,
};
use crate::domain::port::{RepositoryError, ReservationRepository};
use async_trait::async_trait;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySql, Pool, Row};

/// MySQL予約リポジトリ
/// MySQLデータベースを使用して予約を永続化する
pub struct MySqlReservationRepository {
    pool: Pool<MySql>,
}

impl MySqlReservationRepository {
    /// 新しいMySQL予約リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// データベースの行から予約集約を再構築する
    fn build_reservation_from_row(
        row: &sqlx::mysql::MySqlRow,
    ) -> Result<Reservation, RepositoryError> {
        let reservation_id =
            ReservationId::from_string(row.get("id")).map_err(|e| {
                RepositoryError::FetchFailed(format!("予約IDの解析に失敗しました: {}", e))
            })?;

        let car_id = CarId::from_string(row.get("car_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("車両IDの解析に失敗しました: {}", e))
        })?;

        let user_id = UserId::from_string(row.get("user_id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("利用者IDの解析に失敗しました: {}", e))
        })?;

        let start_date: NaiveDate = row.get("start_date");
        let end_date: NaiveDate = row.get("end_date");
        let period = DateRange::new(start_date, end_date).map_err(|e| {
            RepositoryError::FetchFailed(format!("予約期間の構築に失敗しました: {}", e))
        })?;

        let status = ReservationStatus::from_string(row.get("status")).map_err(|e| {
            RepositoryError::FetchFailed(format!("予約ステータスの解析に失敗しました: {}", e))
        })?;

        let price_estimate = Money::new(
            row.get::<i64, _>("price_estimate_amount"),
            row.get::<String, _>("price_estimate_currency"),
        )
        .map_err(|e| {
            RepositoryError::FetchFailed(format!("料金見積りの構築に失敗しました: {}", e))
        })?;

        let created_at: DateTime<Utc> = row.get("created_at");

        Reservation::reconstruct(
            reservation_id,
            car_id,
            user_id,
            period,
            status,
            price_estimate,
            created_at,
        )
        .map_err(|e| {
            RepositoryError::FetchFailed(format!("予約集約の再構築に失敗しました: {}", e))
        })
    }

    fn build_reservations_from_rows(
        rows: Vec<sqlx::mysql::MySqlRow>,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        rows.iter().map(Self::build_reservation_from_row).collect()
    }

    /// 重複チェックと挿入を単一トランザクションで実行する。
    /// FOR UPDATEにより(car_id, start_date)インデックスの走査範囲に
    /// ネクストキーロックがかかり、同一車両への同時挿入は直列化される
    async fn try_create(&self, reservation: &Reservation) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let conflict = sqlx::query(
            r#"
            SELECT id FROM reservations
            WHERE car_id = ?
              AND status <> 'declined'
              AND start_date <= ?
              AND end_date >= ?
            FOR UPDATE
            "#,
        )
        .bind(reservation.car_id().to_string())
        .bind(reservation.period().end())
        .bind(reservation.period().start())
        .fetch_optional(&mut *tx)
        .await?;

        if conflict.is_some() {
            // 期間が重複しているため挿入しない
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO reservations
                (id, car_id, user_id, start_date, end_date, status,
                 price_estimate_amount, price_estimate_currency, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reservation.id().to_string())
        .bind(reservation.car_id().to_string())
        .bind(reservation.user_id().to_string())
        .bind(reservation.period().start())
        .bind(reservation.period().end())
        .bind(reservation.status().to_string())
        .bind(reservation.price_estimate().amount())
        .bind(reservation.price_estimate().currency())
        .bind(reservation.created_at())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }
}

/// InnoDBのデッドロック検出によるロールバックか判定（SQLSTATE 40001）
fn is_deadlock(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("40001"))
}

fn map_create_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::from(DatabaseError::QueryError(format!(
        "予約の登録に失敗しました: {}",
        err
    )))
}

#[async_trait]
impl ReservationRepository for MySqlReservationRepository {
    async fn create_if_available(
        &self,
        reservation: &Reservation,
    ) -> Result<bool, RepositoryError> {
        match self.try_create(reservation).await {
            Ok(created) => Ok(created),
            // 同一ギャップへの同時挿入はInnoDBがデッドロックとして解決し、
            // 片方のトランザクションをロールバックする。一度だけ再試行
            // すると勝者のコミット済み行が見えるため、重複として
            // Ok(false)を返せる
            Err(e) if is_deadlock(&e) => {
                self.try_create(reservation).await.map_err(map_create_error)
            }
            Err(e) => Err(map_create_error(e)),
        }
    }

    async fn find_by_id(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, car_id, user_id, start_date, end_date, status,
                   price_estimate_amount, price_estimate_currency, created_at
            FROM reservations
            WHERE id = ?
            "#,
        )
        .bind(reservation_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(Self::build_reservation_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Reservation>, RepositoryError> {
        // 作成日時の降順で全予約を取得
        let rows = sqlx::query(
            r#"
            SELECT id, car_id, user_id, start_date, end_date, status,
                   price_estimate_amount, price_estimate_currency, created_at
            FROM reservations
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約一覧の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Self::build_reservations_from_rows(rows)
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, car_id, user_id, start_date, end_date, status,
                   price_estimate_amount, price_estimate_currency, created_at
            FROM reservations
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::QueryError(format!("利用者別予約一覧の取得に失敗しました: {}", e))
        })
        .map_err(RepositoryError::from)?;

        Self::build_reservations_from_rows(rows)
    }

    async fn find_active_periods(
        &self,
        car_id: CarId,
    ) -> Result<Vec<DateRange>, RepositoryError> {
        // カレンダー用に却下済みでない予約期間のみを取得
        let rows = sqlx::query(
            r#"
            SELECT start_date, end_date
            FROM reservations
            WHERE car_id = ? AND status <> 'declined'
            ORDER BY start_date ASC
            "#,
        )
        .bind(car_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::QueryError(format!("予約カレンダーの取得に失敗しました: {}", e))
        })
        .map_err(RepositoryError::from)?;

        rows.iter()
            .map(|row| {
                let start_date: NaiveDate = row.get("start_date");
                let end_date: NaiveDate = row.get("end_date");
                DateRange::new(start_date, end_date).map_err(|e| {
                    RepositoryError::FetchFailed(format!(
                        "予約期間の構築に失敗しました: {}",
                        e
                    ))
                })
            })
            .collect()
    }

    async fn save(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        // ステータス以外のフィールドは作成後に変更されない
        sqlx::query(
            r#"
            INSERT INTO reservations
                (id, car_id, user_id, start_date, end_date, status,
                 price_estimate_amount, price_estimate_currency, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status)
            "#,
        )
        .bind(reservation.id().to_string())
        .bind(reservation.car_id().to_string())
        .bind(reservation.user_id().to_string())
        .bind(reservation.period().start())
        .bind(reservation.period().end())
        .bind(reservation.status().to_string())
        .bind(reservation.price_estimate().amount())
        .bind(reservation.price_estimate().currency())
        .bind(reservation.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("予約の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    fn next_identity(&self) -> ReservationId {
        ReservationId::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error;
    use std::fmt;

    /// SQLSTATEを指定できるテスト用データベースエラー
    #[derive(Debug)]
    struct StubDatabaseError {
        sqlstate: &'static str,
    }

    impl fmt::Display for StubDatabaseError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "database error (SQLSTATE {})", self.sqlstate)
        }
    }

    impl Error for StubDatabaseError {}

    impl sqlx::error::DatabaseError for StubDatabaseError {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.sqlstate))
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }

        fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static> {
            self
        }
    }

    fn database_error(sqlstate: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDatabaseError { sqlstate }))
    }

    #[test]
    fn test_deadlock_rollback_is_detected() {
        // InnoDBのデッドロック検出はSQLSTATE 40001で報告される
        assert!(is_deadlock(&database_error("40001")));
    }

    #[test]
    fn test_other_database_errors_are_not_deadlocks() {
        // 一意制約違反など
        assert!(!is_deadlock(&database_error("23000")));
        assert!(!is_deadlock(&sqlx::Error::RowNotFound));
        assert!(!is_deadlock(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_create_error_maps_to_operation_failed() {
        let mapped = map_create_error(database_error("HY000"));
        assert!(matches!(mapped, RepositoryError::OperationFailed(_)));
    }
}

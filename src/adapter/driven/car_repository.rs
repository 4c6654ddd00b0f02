use crate::adapter::database_error::DatabaseError;
use crate::domain::model::{Car, CarId, Money};
use crate::domain::port::{CarRepository, RepositoryError};
use async_trait::async_trait;

use sqlx::{MySql, Pool, Row};

/// MySQL車両リポジトリ
/// MySQLデータベースを使用して車両カタログを永続化する
pub struct MySqlCarRepository {
    pool: Pool<MySql>,
}

impl MySqlCarRepository {
    /// 新しいMySQL車両リポジトリを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// データベースの行から車両エンティティを再構築する
    fn build_car_from_row(row: &sqlx::mysql::MySqlRow) -> Result<Car, RepositoryError> {
        let car_id = CarId::from_string(row.get("id")).map_err(|e| {
            RepositoryError::FetchFailed(format!("車両IDの解析に失敗しました: {}", e))
        })?;

        let price_per_day = Money::new(
            row.get::<i64, _>("price_per_day_amount"),
            row.get::<String, _>("price_per_day_currency"),
        )
        .map_err(|e| {
            RepositoryError::FetchFailed(format!("日額料金の構築に失敗しました: {}", e))
        })?;

        Car::reconstruct(
            car_id,
            row.get("brand"),
            row.get("model"),
            row.get("plate_number"),
            row.get("year"),
            price_per_day,
        )
        .map_err(|e| {
            RepositoryError::FetchFailed(format!("車両エンティティの再構築に失敗しました: {}", e))
        })
    }
}

#[async_trait]
impl CarRepository for MySqlCarRepository {
    async fn save(&self, car: &Car) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO cars
                (id, brand, model, plate_number, year,
                 price_per_day_amount, price_per_day_currency)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                brand = VALUES(brand),
                model = VALUES(model),
                plate_number = VALUES(plate_number),
                year = VALUES(year),
                price_per_day_amount = VALUES(price_per_day_amount),
                price_per_day_currency = VALUES(price_per_day_currency)
            "#,
        )
        .bind(car.id().to_string())
        .bind(car.brand())
        .bind(car.model())
        .bind(car.plate_number())
        .bind(car.year())
        .bind(car.price_per_day().amount())
        .bind(car.price_per_day().currency())
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("車両の保存に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, car_id: CarId) -> Result<Option<Car>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, brand, model, plate_number, year,
                   price_per_day_amount, price_per_day_currency
            FROM cars
            WHERE id = ?
            "#,
        )
        .bind(car_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("車両の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        match row {
            Some(row) => Ok(Some(Self::build_car_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Car>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, brand, model, plate_number, year,
                   price_per_day_amount, price_per_day_currency
            FROM cars
            ORDER BY brand ASC, model ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(format!("車両一覧の取得に失敗しました: {}", e)))
        .map_err(RepositoryError::from)?;

        rows.iter().map(Self::build_car_from_row).collect()
    }

    async fn delete(&self, car_id: CarId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = ?")
            .bind(car_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryError(format!("車両の削除に失敗しました: {}", e)))
            .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() > 0)
    }

    fn next_identity(&self) -> CarId {
        CarId::new()
    }
}

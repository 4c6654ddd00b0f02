use crate::application::ApplicationError;
use crate::domain::model::{Car, CarId};
use crate::domain::port::CarRepository;
use std::sync::Arc;

/// 車両クエリサービス
/// 読み取り専用の車両カタログ操作を提供する
pub struct CarQueryService {
    car_repository: Arc<dyn CarRepository>,
}

impl CarQueryService {
    /// 新しい車両クエリサービスを作成
    ///
    /// # Arguments
    /// * `car_repository` - 車両リポジトリ
    pub fn new(car_repository: Arc<dyn CarRepository>) -> Self {
        Self { car_repository }
    }

    /// 車両IDで車両を取得
    ///
    /// # Returns
    /// * `Ok(Some(Car))` - 車両が見つかった
    /// * `Ok(None)` - 車両が見つからなかった
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_car_by_id(&self, car_id: CarId) -> Result<Option<Car>, ApplicationError> {
        self.car_repository
            .find_by_id(car_id)
            .await
            .map_err(ApplicationError::from)
    }

    /// すべての車両を取得
    /// ブランド・モデルの昇順で並べて返す
    pub async fn get_all_cars(&self) -> Result<Vec<Car>, ApplicationError> {
        self.car_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}

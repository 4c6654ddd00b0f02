use crate::domain::error::DomainError;
use crate::domain::model::{CarId, DateRange, Money};

/// 車両エンティティ
/// カタログが保持する貸出車両。予約コアからは読み取り専用で、
/// 日額料金の参照と料金見積りにのみ使用される
#[derive(Debug, Clone, PartialEq)]
pub struct Car {
    id: CarId,
    brand: String,
    model: String,
    plate_number: String,
    year: i32,
    price_per_day: Money,
}

impl Car {
    /// 新しい車両を作成
    /// バリデーション:
    /// - ブランド、モデル、ナンバープレートは空でない必要がある
    /// - 日額料金は正の金額である必要がある
    pub fn new(
        id: CarId,
        brand: String,
        model: String,
        plate_number: String,
        year: i32,
        price_per_day: Money,
    ) -> Result<Self, DomainError> {
        Self::validate(&brand, &model, &plate_number, &price_per_day)?;
        Ok(Self {
            id,
            brand,
            model,
            plate_number,
            year,
            price_per_day,
        })
    }

    /// データベースから取得したデータで車両を再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(
        id: CarId,
        brand: String,
        model: String,
        plate_number: String,
        year: i32,
        price_per_day: Money,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            brand,
            model,
            plate_number,
            year,
            price_per_day,
        })
    }

    fn validate(
        brand: &str,
        model: &str,
        plate_number: &str,
        price_per_day: &Money,
    ) -> Result<(), DomainError> {
        if brand.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "ブランドは空にできません".to_string(),
            ));
        }
        if model.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "モデルは空にできません".to_string(),
            ));
        }
        if plate_number.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "ナンバープレートは空にできません".to_string(),
            ));
        }
        if price_per_day.amount() <= 0 {
            return Err(DomainError::InvalidValue(
                "日額料金は正の金額である必要があります".to_string(),
            ));
        }
        Ok(())
    }

    /// 車両IDを取得
    pub fn id(&self) -> CarId {
        self.id
    }

    /// ブランドを取得
    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// モデルを取得
    pub fn model(&self) -> &str {
        &self.model
    }

    /// ナンバープレートを取得
    pub fn plate_number(&self) -> &str {
        &self.plate_number
    }

    /// 年式を取得
    pub fn year(&self) -> i32 {
        self.year
    }

    /// 日額料金を取得
    pub fn price_per_day(&self) -> Money {
        self.price_per_day
    }

    /// 指定期間の料金見積りを計算
    /// 両端を含む日数 × 日額料金の純粋な計算。
    /// 見積りは予約作成時点のスナップショットであり、
    /// 以後の料金変更で再計算されることはない。
    /// 計算がオーバーフローする期間はエラー
    pub fn price_for(&self, period: &DateRange) -> Result<Money, DomainError> {
        self.price_per_day.multiply(period.duration_days())
    }

    /// 車両情報を更新
    /// 作成時と同じバリデーションを適用する
    pub fn update_details(
        &mut self,
        brand: String,
        model: String,
        plate_number: String,
        year: i32,
        price_per_day: Money,
    ) -> Result<(), DomainError> {
        Self::validate(&brand, &model, &plate_number, &price_per_day)?;
        self.brand = brand;
        self.model = model;
        self.plate_number = plate_number;
        self.year = year;
        self.price_per_day = price_per_day;
        Ok(())
    }
}

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 無効な日付範囲（例: 終了日が開始日より前）
    InvalidDateRange(String),
    /// 無効な予約ステータス値
    InvalidStatus(String),
    /// 無効な値（例: 空の車両名、0以下の料金）
    InvalidValue(String),
    /// 通貨の不一致
    CurrencyMismatch,
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::InvalidDateRange(msg) => write!(f, "Invalid date range: {}", msg),
            DomainError::InvalidStatus(msg) => write!(f, "Invalid status: {}", msg),
            DomainError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
            DomainError::CurrencyMismatch => write!(f, "Currency mismatch"),
        }
    }
}

impl std::error::Error for DomainError {}

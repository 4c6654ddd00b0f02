use crate::domain::error::DomainError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// 予約の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// 新しい一意のReservationIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから ReservationId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からReservationIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

/// 車両の一意識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarId(Uuid);

impl CarId {
    /// 新しい一意のCarIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから CarId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からCarIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for CarId {
    fn default() -> Self {
        Self::new()
    }
}

/// 利用者の一意識別子
/// 認証・セッション管理は外部コラボレーターの責務であり、
/// ドメインは識別子のみを扱う
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// 新しい一意のUserIdを生成
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// UUIDから UserId を作成
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 文字列からUserIdを作成
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        let uuid = Uuid::parse_str(s)?;
        Ok(Self(uuid))
    }

    /// 内部のUUIDを取得
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 通貨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// 日本円
    #[allow(clippy::upper_case_acronyms)]
    JPY,
}

/// 金額を表す値オブジェクト
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// 金額と通貨から作成
    pub fn new(amount: i64, currency: String) -> Result<Self, DomainError> {
        let currency = match currency.as_str() {
            "JPY" => Currency::JPY,
            _ => {
                return Err(DomainError::InvalidValue(format!(
                    "サポートされていない通貨: {}",
                    currency
                )))
            }
        };
        Ok(Self { amount, currency })
    }

    /// 日本円の金額を作成
    pub fn jpy(amount: i64) -> Self {
        Self {
            amount,
            currency: Currency::JPY,
        }
    }

    /// 金額を取得
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 通貨を文字列として取得
    pub fn currency(&self) -> String {
        match self.currency {
            Currency::JPY => "JPY".to_string(),
        }
    }

    /// 金額を加算
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch);
        }
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency,
        })
    }

    /// 金額を乗算
    /// オーバーフローする場合はエラー
    pub fn multiply(&self, factor: u32) -> Result<Money, DomainError> {
        let amount = self.amount.checked_mul(factor as i64).ok_or_else(|| {
            DomainError::InvalidValue("金額の計算がオーバーフローしました".to_string())
        })?;
        Ok(Money {
            amount,
            currency: self.currency,
        })
    }
}

/// 予約期間を表す値オブジェクト
/// 開始日・終了日をともに含む閉区間（終了日 >= 開始日）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// 新しい予約期間を作成
    /// 終了日が開始日より前の場合はエラー（同日指定は1日予約として有効）
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidDateRange(
                "終了日は開始日以降である必要があります".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// 開始日を取得
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// 終了日を取得
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 他の期間と重なるか判定
    /// 閉区間同士の標準的な重なり判定: 双方の開始日が相手の終了日以前
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    /// 期間の日数を取得（両端を含むため同日予約は1日）
    pub fn duration_days(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 〜 {}", self.start, self.end)
    }
}

/// 予約のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// 申請中（作成直後）
    Pending,
    /// 承認済み
    Accepted,
    /// 却下済み（競合判定から永久に除外される）
    Declined,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Accepted => "accepted",
            ReservationStatus::Declined => "declined",
        };
        write!(f, "{}", status_str)
    }
}

impl ReservationStatus {
    /// 文字列からReservationStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(ReservationStatus::Pending),
            "accepted" => Ok(ReservationStatus::Accepted),
            "declined" => Ok(ReservationStatus::Declined),
            _ => Err(DomainError::InvalidStatus(format!(
                "無効な予約ステータス: {}",
                s
            ))),
        }
    }

    /// 競合判定の対象になるステータスか
    /// 却下済みの予約は期間を解放し、再予約を妨げない
    pub fn blocks_booking(&self) -> bool {
        !matches!(self, ReservationStatus::Declined)
    }
}

// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::event::DomainEvent;
use crate::domain::model::{Car, CarId, DateRange, Reservation, ReservationId, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// ロガートレイト
/// ログ出力を抽象化するポート
pub trait Logger: Send + Sync {
    /// デバッグレベルのログを出力
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 情報レベルのログを出力
    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// 警告レベルのログを出力
    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );

    /// エラーレベルのログを出力
    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    );
}

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    ConnectionFailed(String),
    /// 操作に失敗
    OperationFailed(String),
    /// データの取得に失敗
    FetchFailed(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            RepositoryError::OperationFailed(msg) => write!(f, "Operation failed: {}", msg),
            RepositoryError::FetchFailed(msg) => write!(f, "Fetch failed: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// 予約リポジトリトレイト
/// 予約集約の永続化と期間重複クエリを抽象化する
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// 期間に空きがある場合のみ予約を登録する
    ///
    /// 重複チェックと挿入は車両単位で単一のアトミックな操作として
    /// 実行しなければならない。別々の呼び出しに分けると同時リクエスト
    /// が両方ともチェックを通過し、重複しない予約の不変条件が破れる
    ///
    /// # Arguments
    /// * `reservation` - 登録する予約
    ///
    /// # Returns
    /// * `Ok(true)` - 登録成功
    /// * `Ok(false)` - 同一車両の却下済みでない予約と期間が重複（未登録）
    /// * `Err(RepositoryError)` - 登録失敗
    async fn create_if_available(
        &self,
        reservation: &Reservation,
    ) -> Result<bool, RepositoryError>;

    /// 予約IDで予約を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Reservation))` - 予約が見つかった
    /// * `Ok(None)` - 予約が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError>;

    /// すべての予約を取得する
    /// 作成日時の降順で並べて返す
    async fn find_all(&self) -> Result<Vec<Reservation>, RepositoryError>;

    /// 指定された利用者の予約を取得する
    /// 作成日時の降順で並べて返す
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError>;

    /// 指定された車両の却下済みでない予約期間を取得する
    /// カレンダー表示用の読み取り専用プロジェクション。
    /// 開始日の昇順で並べて返す
    async fn find_active_periods(&self, car_id: CarId)
        -> Result<Vec<DateRange>, RepositoryError>;

    /// 予約を保存する（ステータス更新用）
    ///
    /// # Returns
    /// * `Ok(())` - 保存成功
    /// * `Err(RepositoryError)` - 保存失敗
    async fn save(&self, reservation: &Reservation) -> Result<(), RepositoryError>;

    /// 新しい一意の予約IDを生成する
    fn next_identity(&self) -> ReservationId;
}

/// 車両リポジトリトレイト
/// カタログ側の車両永続化を抽象化する。予約コアは
/// 「IDで車両を解決する」能力としてのみ参照する
#[async_trait]
pub trait CarRepository: Send + Sync {
    /// 車両を保存する
    async fn save(&self, car: &Car) -> Result<(), RepositoryError>;

    /// 車両IDで車両を検索する
    ///
    /// # Returns
    /// * `Ok(Some(Car))` - 車両が見つかった
    /// * `Ok(None)` - 車両が見つからなかった
    /// * `Err(RepositoryError)` - 検索失敗
    async fn find_by_id(&self, car_id: CarId) -> Result<Option<Car>, RepositoryError>;

    /// すべての車両を取得する
    /// ブランド・モデルの昇順で並べて返す
    async fn find_all(&self) -> Result<Vec<Car>, RepositoryError>;

    /// 車両を削除する
    ///
    /// # Returns
    /// * `Ok(true)` - 削除成功
    /// * `Ok(false)` - 車両が存在しなかった
    /// * `Err(RepositoryError)` - 削除失敗
    async fn delete(&self, car_id: CarId) -> Result<bool, RepositoryError>;

    /// 新しい一意の車両IDを生成する
    fn next_identity(&self) -> CarId;
}

/// イベントバスエラー
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event publishing failed: {0}")]
    PublishingFailed(String),
}

/// イベントバストレイト
/// イベントの発行と配信を管理するポート
#[async_trait]
pub trait EventBus: Send + Sync {
    /// イベントを発行し、登録されたハンドラーに配信
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;
}

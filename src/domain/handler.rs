// イベントハンドラー
// イベントバス経由で配信されるドメインイベントの処理を実装

use crate::domain::event::ReservationStatusUpdated;
use crate::domain::event_bus::{EventHandler, HandlerError};
use crate::domain::model::ReservationStatus;
use crate::domain::port::Logger;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 通知ハンドラー
/// 予約ステータス更新イベントを受信して利用者に通知を送信する。
/// 配信はファイアアンドフォーゲットであり、通知の失敗が
/// ステータス更新の成否に影響することはない
#[derive(Clone)]
pub struct NotificationHandler {
    logger: Arc<dyn Logger>,
}

impl NotificationHandler {
    /// 新しい通知ハンドラーを作成
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// 通知メッセージを送信（実装では外部サービスを呼び出し）
    async fn send_notification(
        &self,
        recipient: &str,
        message: &str,
        correlation_id: Uuid,
    ) -> Result<(), HandlerError> {
        // 実際の実装では外部通知サービス（メールなど）を呼び出し
        // 今回はログ出力で代用
        let mut context = HashMap::new();
        context.insert("notification_type".to_string(), "Email".to_string());
        context.insert("recipient".to_string(), recipient.to_string());

        self.logger.info(
            "NotificationHandler",
            "Notification sent",
            Some(correlation_id),
            Some(context),
        );

        // 通知内容もログに記録
        self.logger
            .info("NotificationHandler", message, Some(correlation_id), None);

        Ok(())
    }
}

#[async_trait]
impl EventHandler<ReservationStatusUpdated> for NotificationHandler {
    async fn handle(&self, event: ReservationStatusUpdated) -> Result<(), HandlerError> {
        let correlation_id = event.metadata.correlation_id;

        // ハンドラー開始ログ
        let mut context = HashMap::new();
        context.insert(
            "event_type".to_string(),
            "ReservationStatusUpdated".to_string(),
        );
        context.insert(
            "reservation_id".to_string(),
            event.reservation_id.to_string(),
        );
        self.logger.info(
            "NotificationHandler",
            "Processing ReservationStatusUpdated event",
            Some(correlation_id),
            Some(context),
        );

        let start_time = std::time::Instant::now();

        let decision = match event.status {
            ReservationStatus::Accepted => "承認されました",
            ReservationStatus::Declined => "却下されました",
            // ステータス更新はPendingへの遷移を拒否するため、
            // Pendingのイベントが配信されることはない。届いた場合は
            // 不正なイベントとしてリトライせずに失敗させる
            ReservationStatus::Pending => {
                return Err(HandlerError::PermanentError(
                    "pendingステータスの通知は定義されていません".to_string(),
                ));
            }
        };
        let message = format!(
            "ご予約が{}。予約ID: {}, 期間: {}, 料金見積り: {}円",
            decision,
            event.reservation_id,
            event.period,
            event.price_estimate.amount()
        );

        self.send_notification(&event.user_id.to_string(), &message, correlation_id)
            .await?;

        // 処理成功ログ
        let execution_time = start_time.elapsed();
        let mut context = HashMap::new();
        context.insert(
            "event_type".to_string(),
            "ReservationStatusUpdated".to_string(),
        );
        context.insert(
            "execution_time_ms".to_string(),
            execution_time.as_millis().to_string(),
        );
        self.logger.info(
            "NotificationHandler",
            "ReservationStatusUpdated event processed successfully",
            Some(correlation_id),
            Some(context),
        );

        Ok(())
    }
}

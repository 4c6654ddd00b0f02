use crate::domain::event::DomainEvent;
use crate::domain::event_bus::DynEventHandler;
use crate::domain::port::{EventBus, EventBusError, Logger};
use crate::domain::serialization::EventSerializer;
use async_trait::async_trait;

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// イベントバス設定
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 最大リトライ回数
    pub max_retry_attempts: u32,
    /// リトライ間隔
    pub retry_delay: Duration,
    /// デッドレターキューの最大サイズ
    pub dead_letter_queue_max_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            retry_delay: Duration::from_millis(100),
            dead_letter_queue_max_size: 1000,
        }
    }
}

/// デッドレターキューのエントリ
/// リトライしても処理できなかったイベントの記録
#[derive(Debug, Clone)]
pub struct DeadLetterEntry {
    /// エンベロープ形式でシリアライズされたイベント
    pub serialized_event: String,
    /// イベントタイプ
    pub event_type: String,
    /// 処理に失敗したハンドラー名
    pub handler_name: String,
    /// 最後のエラーメッセージ
    pub last_error: String,
    /// 試行回数
    pub attempts: u32,
    /// 記録日時
    pub recorded_at: DateTime<Utc>,
}

/// インメモリイベントバス
/// 登録されたハンドラーにイベントを配信する。
/// ハンドラーの失敗はリトライし、リトライ上限を超えたイベントは
/// デッドレターキューに退避する。ハンドラーの失敗が発行元の
/// ユースケースに伝播することはない
pub struct InMemoryEventBus {
    config: EventBusConfig,
    handlers: RwLock<Vec<Arc<dyn DynEventHandler>>>,
    dead_letter_queue: Mutex<VecDeque<DeadLetterEntry>>,
    serializer: EventSerializer,
    logger: Arc<dyn Logger>,
}

impl InMemoryEventBus {
    /// 新しいインメモリイベントバスを作成
    pub fn new(config: EventBusConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            handlers: RwLock::new(Vec::new()),
            dead_letter_queue: Mutex::new(VecDeque::new()),
            serializer: EventSerializer::new(),
            logger,
        }
    }

    /// ハンドラーを登録
    pub async fn subscribe(&self, handler: Arc<dyn DynEventHandler>) {
        let mut handlers = self.handlers.write().await;
        self.logger.info(
            "InMemoryEventBus",
            &format!("ハンドラーを登録しました: {}", handler.handler_name()),
            None,
            None,
        );
        handlers.push(handler);
    }

    /// デッドレターキューの内容を取得
    pub async fn dead_letter_entries(&self) -> Vec<DeadLetterEntry> {
        let queue = self.dead_letter_queue.lock().await;
        queue.iter().cloned().collect()
    }

    /// リトライ付きで単一ハンドラーにイベントを配信
    async fn dispatch_with_retry(
        &self,
        handler: &Arc<dyn DynEventHandler>,
        event: &DomainEvent,
    ) -> Result<(), String> {
        let mut last_error = String::new();

        for attempt in 1..=self.config.max_retry_attempts {
            match handler.handle_event(event).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last_error = e.to_string();

                    if !e.is_retryable() {
                        self.logger.error(
                            "InMemoryEventBus",
                            &format!(
                                "ハンドラー {} で恒久的なエラーが発生しました: {}",
                                handler.handler_name(),
                                e
                            ),
                            Some(event.metadata().correlation_id),
                            None,
                        );
                        return Err(last_error);
                    }

                    self.logger.warn(
                        "InMemoryEventBus",
                        &format!(
                            "ハンドラー {} の処理に失敗しました（{}回目）: {}",
                            handler.handler_name(),
                            attempt,
                            e
                        ),
                        Some(event.metadata().correlation_id),
                        None,
                    );

                    if attempt < self.config.max_retry_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// 処理不能なイベントをデッドレターキューに退避
    async fn move_to_dead_letter_queue(
        &self,
        event: &DomainEvent,
        handler_name: &str,
        last_error: String,
    ) {
        let serialized_event = match self.serializer.serialize_event(event) {
            Ok(json) => json,
            Err(e) => {
                // シリアライズ自体に失敗した場合はタイプ名のみ記録する
                self.logger.error(
                    "InMemoryEventBus",
                    &format!("デッドレター退避時のシリアライズに失敗しました: {}", e),
                    Some(event.metadata().correlation_id),
                    None,
                );
                format!("{{\"event_type\":\"{}\"}}", event.event_type())
            }
        };

        let entry = DeadLetterEntry {
            serialized_event,
            event_type: event.event_type().to_string(),
            handler_name: handler_name.to_string(),
            last_error,
            attempts: self.config.max_retry_attempts,
            recorded_at: Utc::now(),
        };

        let mut queue = self.dead_letter_queue.lock().await;
        if queue.len() >= self.config.dead_letter_queue_max_size {
            // 最大サイズ超過時は最古のエントリを破棄
            queue.pop_front();
        }
        queue.push_back(entry);

        let mut context = HashMap::new();
        context.insert("handler".to_string(), handler_name.to_string());
        context.insert("queue_size".to_string(), queue.len().to_string());
        self.logger.error(
            "InMemoryEventBus",
            &format!(
                "イベント {} をデッドレターキューに退避しました",
                event.event_type()
            ),
            Some(event.metadata().correlation_id),
            Some(context),
        );
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        let metadata = event.metadata().clone();
        let handlers = self.handlers.read().await;

        let matching: Vec<Arc<dyn DynEventHandler>> = handlers
            .iter()
            .filter(|h| {
                h.can_handle(&event) && h.supports_schema_version(metadata.event_version)
            })
            .cloned()
            .collect();
        drop(handlers);

        if matching.is_empty() {
            self.logger.warn(
                "InMemoryEventBus",
                &format!(
                    "イベント {} を処理するハンドラーが登録されていません",
                    event.event_type()
                ),
                Some(metadata.correlation_id),
                None,
            );
            return Ok(());
        }

        self.logger.debug(
            "InMemoryEventBus",
            &format!(
                "イベント {} を{}個のハンドラーに配信します",
                event.event_type(),
                matching.len()
            ),
            Some(metadata.correlation_id),
            None,
        );

        // ハンドラーの失敗は発行元には伝播させない
        for handler in matching {
            if let Err(last_error) = self.dispatch_with_retry(&handler, &event).await {
                self.move_to_dead_letter_queue(&event, handler.handler_name(), last_error)
                    .await;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::ReservationStatusUpdated;
    use crate::domain::event_bus::{
        EventHandler, HandlerError, ReservationStatusUpdatedHandlerWrapper,
    };
    use crate::domain::model::{
        CarId, DateRange, Money, ReservationId, ReservationStatus, UserId,
    };
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct NoopLogger;

    impl Logger for NoopLogger {
        fn debug(
            &self,
            _: &str,
            _: &str,
            _: Option<Uuid>,
            _: Option<HashMap<String, String>>,
        ) {
        }
        fn info(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
        fn warn(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
        fn error(&self, _: &str, _: &str, _: Option<Uuid>, _: Option<HashMap<String, String>>) {}
    }

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler<ReservationStatusUpdated> for CountingHandler {
        async fn handle(&self, _event: ReservationStatusUpdated) -> Result<(), HandlerError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AlwaysFailingHandler {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler<ReservationStatusUpdated> for AlwaysFailingHandler {
        async fn handle(&self, _event: ReservationStatusUpdated) -> Result<(), HandlerError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(HandlerError::TransientError("connection reset".to_string()))
        }
    }

    struct PermanentlyFailingHandler;

    #[async_trait]
    impl EventHandler<ReservationStatusUpdated> for PermanentlyFailingHandler {
        async fn handle(&self, _event: ReservationStatusUpdated) -> Result<(), HandlerError> {
            Err(HandlerError::PermanentError("schema mismatch".to_string()))
        }
    }

    fn test_config() -> EventBusConfig {
        EventBusConfig {
            max_retry_attempts: 3,
            retry_delay: Duration::from_millis(1),
            dead_letter_queue_max_size: 10,
        }
    }

    fn sample_event() -> DomainEvent {
        let period = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
        )
        .unwrap();
        DomainEvent::ReservationStatusUpdated(ReservationStatusUpdated::new(
            ReservationId::new(),
            UserId::new(),
            CarId::new(),
            period,
            ReservationStatus::Accepted,
            Money::jpy(150),
        ))
    }

    #[tokio::test]
    async fn test_publish_delivers_to_subscribed_handler() {
        let bus = InMemoryEventBus::new(test_config(), Arc::new(NoopLogger));
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Arc::new(ReservationStatusUpdatedHandlerWrapper::new(
            CountingHandler {
                count: count.clone(),
            },
        )))
        .await;

        bus.publish(sample_event()).await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(bus.dead_letter_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_without_handlers_succeeds() {
        let bus = InMemoryEventBus::new(test_config(), Arc::new(NoopLogger));
        let result = bus.publish(sample_event()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_then_dead_lettered() {
        let bus = InMemoryEventBus::new(test_config(), Arc::new(NoopLogger));
        let attempts = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Arc::new(ReservationStatusUpdatedHandlerWrapper::new(
            AlwaysFailingHandler {
                attempts: attempts.clone(),
            },
        )))
        .await;

        // ハンドラーが失敗しても発行は成功する
        bus.publish(sample_event()).await.unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let entries = bus.dead_letter_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "ReservationStatusUpdated");
        assert_eq!(entries[0].attempts, 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let bus = InMemoryEventBus::new(test_config(), Arc::new(NoopLogger));
        bus.subscribe(Arc::new(ReservationStatusUpdatedHandlerWrapper::new(
            PermanentlyFailingHandler,
        )))
        .await;

        bus.publish(sample_event()).await.unwrap();

        let entries = bus.dead_letter_entries().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].last_error.contains("schema mismatch"));
    }

    #[tokio::test]
    async fn test_one_failing_handler_does_not_affect_others() {
        let bus = InMemoryEventBus::new(test_config(), Arc::new(NoopLogger));
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Arc::new(ReservationStatusUpdatedHandlerWrapper::with_name(
            PermanentlyFailingHandler,
            "FailingHandler".to_string(),
        )))
        .await;
        bus.subscribe(Arc::new(ReservationStatusUpdatedHandlerWrapper::with_name(
            CountingHandler {
                count: count.clone(),
            },
            "CountingHandler".to_string(),
        )))
        .await;

        bus.publish(sample_event()).await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.dead_letter_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dead_letter_queue_respects_max_size() {
        let config = EventBusConfig {
            max_retry_attempts: 1,
            retry_delay: Duration::from_millis(1),
            dead_letter_queue_max_size: 2,
        };
        let bus = InMemoryEventBus::new(config, Arc::new(NoopLogger));
        bus.subscribe(Arc::new(ReservationStatusUpdatedHandlerWrapper::new(
            PermanentlyFailingHandler,
        )))
        .await;

        for _ in 0..5 {
            bus.publish(sample_event()).await.unwrap();
        }

        assert_eq!(bus.dead_letter_entries().await.len(), 2);
    }
}

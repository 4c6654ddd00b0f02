use crate::domain::event::DomainEvent;
use async_trait::async_trait;

/// イベントハンドラーエラー
#[derive(Debug, Clone, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Transient error (retryable): {0}")]
    TransientError(String),
    #[error("Permanent error (not retryable): {0}")]
    PermanentError(String),
}

impl HandlerError {
    /// リトライ可能なエラーか判定
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HandlerError::TransientError(_) | HandlerError::ProcessingFailed(_)
        )
    }
}

/// イベントハンドラートレイト
/// 特定のイベントタイプを処理するハンドラーを定義
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    async fn handle(&self, event: E) -> Result<(), HandlerError>;
}

/// 型消去されたイベントハンドラー
/// 異なるイベントタイプのハンドラーを統一的に扱うため
#[async_trait]
pub trait DynEventHandler: Send + Sync {
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError>;
    fn can_handle(&self, event: &DomainEvent) -> bool;
    fn handler_name(&self) -> &str;
    fn supports_schema_version(&self, version: u32) -> bool;
}

/// ReservationStatusUpdated用のハンドラーラッパー
pub struct ReservationStatusUpdatedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationStatusUpdated>,
{
    handler: H,
    name: String,
}

impl<H> ReservationStatusUpdatedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationStatusUpdated>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            name: "ReservationStatusUpdatedHandler".to_string(),
        }
    }

    pub fn with_name(handler: H, name: String) -> Self {
        Self { handler, name }
    }
}

#[async_trait]
impl<H> DynEventHandler for ReservationStatusUpdatedHandlerWrapper<H>
where
    H: EventHandler<crate::domain::event::ReservationStatusUpdated>,
{
    async fn handle_event(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        match event {
            DomainEvent::ReservationStatusUpdated(e) => self.handler.handle(e.clone()).await,
        }
    }

    fn can_handle(&self, event: &DomainEvent) -> bool {
        matches!(event, DomainEvent::ReservationStatusUpdated(_))
    }

    fn handler_name(&self) -> &str {
        &self.name
    }

    fn supports_schema_version(&self, version: u32) -> bool {
        // ReservationStatusUpdated supports versions 1 and above
        version >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::ReservationStatusUpdated;
    use crate::domain::model::{
        CarId, DateRange, Money, ReservationId, ReservationStatus, UserId,
    };
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

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
    async fn test_wrapper_dispatches_to_inner_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let wrapper = ReservationStatusUpdatedHandlerWrapper::new(CountingHandler {
            count: count.clone(),
        });

        let event = sample_event();
        assert!(wrapper.can_handle(&event));
        wrapper.handle_event(&event).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrapper_supports_version_one_and_above() {
        let wrapper = ReservationStatusUpdatedHandlerWrapper::new(CountingHandler {
            count: Arc::new(AtomicUsize::new(0)),
        });
        assert!(!wrapper.supports_schema_version(0));
        assert!(wrapper.supports_schema_version(1));
        assert!(wrapper.supports_schema_version(2));
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(HandlerError::TransientError("timeout".to_string()).is_retryable());
        assert!(!HandlerError::PermanentError("schema mismatch".to_string()).is_retryable());
    }
}

use crate::domain::event::{DomainEvent, ReservationStatusUpdated};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// シリアライゼーションエラー
#[derive(Debug, Error, Clone)]
pub enum SerializationError {
    #[error("JSON serialization failed: {message}. Event type: {event_type}")]
    JsonSerializationFailed { message: String, event_type: String },

    #[error("JSON deserialization failed: {message}. Input: {input_preview}")]
    JsonDeserializationFailed {
        message: String,
        input_preview: String,
    },

    #[error("Unsupported event type: {event_type}")]
    UnsupportedEventType { event_type: String },
}

impl SerializationError {
    /// 入力データのプレビューを生成（デバッグ用、最大100文字）
    fn create_input_preview(input: &str) -> String {
        if input.len() <= 100 {
            input.to_string()
        } else {
            format!("{}...", &input[..97])
        }
    }
}

/// イベントエンベロープ
/// イベントタイプとスキーマバージョンを付与したJSON表現。
/// デッドレターキューの記録と外部通知連携に使用する
#[derive(Debug, Serialize, Deserialize)]
struct EventEnvelope {
    event_type: String,
    event_version: u32,
    payload: serde_json::Value,
}

/// イベントシリアライザー
/// ドメインイベントとJSONエンベロープの相互変換を担当
#[derive(Debug, Clone, Default)]
pub struct EventSerializer;

impl EventSerializer {
    /// 新しいシリアライザーを作成
    pub fn new() -> Self {
        Self
    }

    /// ドメインイベントをJSON文字列にシリアライズ
    pub fn serialize_event(&self, event: &DomainEvent) -> Result<String, SerializationError> {
        let payload = match event {
            DomainEvent::ReservationStatusUpdated(e) => serde_json::to_value(e).map_err(|err| {
                SerializationError::JsonSerializationFailed {
                    message: err.to_string(),
                    event_type: event.event_type().to_string(),
                }
            })?,
        };

        let envelope = EventEnvelope {
            event_type: event.event_type().to_string(),
            event_version: event.metadata().event_version,
            payload,
        };

        serde_json::to_string(&envelope).map_err(|err| {
            SerializationError::JsonSerializationFailed {
                message: err.to_string(),
                event_type: event.event_type().to_string(),
            }
        })
    }

    /// JSON文字列からドメインイベントをデシリアライズ
    pub fn deserialize_event(&self, json: &str) -> Result<DomainEvent, SerializationError> {
        let envelope: EventEnvelope = serde_json::from_str(json).map_err(|err| {
            SerializationError::JsonDeserializationFailed {
                message: err.to_string(),
                input_preview: SerializationError::create_input_preview(json),
            }
        })?;

        match envelope.event_type.as_str() {
            "ReservationStatusUpdated" => {
                let event: ReservationStatusUpdated = serde_json::from_value(envelope.payload)
                    .map_err(|err| SerializationError::JsonDeserializationFailed {
                        message: err.to_string(),
                        input_preview: SerializationError::create_input_preview(json),
                    })?;
                Ok(DomainEvent::ReservationStatusUpdated(event))
            }
            other => Err(SerializationError::UnsupportedEventType {
                event_type: other.to_string(),
            }),
        }
    }
}

// 駆動される側アダプター（リポジトリ実装など）

mod car_repository;
mod console_logger;
mod event_bus;
mod reservation_repository;

pub use car_repository::MySqlCarRepository;
pub use console_logger::ConsoleLogger;
pub use event_bus::{DeadLetterEntry, EventBusConfig, InMemoryEventBus};
pub use reservation_repository::MySqlReservationRepository;

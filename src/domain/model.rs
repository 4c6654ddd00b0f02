// ドメインモデル（エンティティと値オブジェクト）

mod value_objects;
mod car;
mod reservation;

pub use value_objects::{
    ReservationId, CarId, UserId,
    Money,
    DateRange,
    ReservationStatus,
};

pub use car::Car;
pub use reservation::Reservation;

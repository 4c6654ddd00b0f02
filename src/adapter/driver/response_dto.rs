use crate::domain::model::{Car, DateRange, Reservation};
use serde::Serialize;

/// 予約レスポンス
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub id: String,
    pub car_id: String,
    pub user_id: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub price_estimate_amount: i64,
    pub price_estimate_currency: String,
    pub created_at: String,
}

impl ReservationResponse {
    /// 予約集約からレスポンスを構築
    pub fn from_reservation(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id().to_string(),
            car_id: reservation.car_id().to_string(),
            user_id: reservation.user_id().to_string(),
            start_date: reservation.period().start().to_string(),
            end_date: reservation.period().end().to_string(),
            status: reservation.status().to_string(),
            price_estimate_amount: reservation.price_estimate().amount(),
            price_estimate_currency: reservation.price_estimate().currency(),
            created_at: reservation.created_at().to_rfc3339(),
        }
    }
}

/// 車両情報付き予約レスポンス
/// 一覧表示用に車両情報を埋め込む。車両が削除済みの場合はnull
#[derive(Debug, Serialize)]
pub struct ReservationWithCarResponse {
    #[serde(flatten)]
    pub reservation: ReservationResponse,
    pub car: Option<CarResponse>,
}

impl ReservationWithCarResponse {
    pub fn from_parts(reservation: &Reservation, car: Option<&Car>) -> Self {
        Self {
            reservation: ReservationResponse::from_reservation(reservation),
            car: car.map(CarResponse::from_car),
        }
    }
}

/// 予約カレンダーのエントリ
/// 予約済み期間のみを公開し、予約者や料金は含めない
#[derive(Debug, Serialize)]
pub struct CalendarEntryResponse {
    pub start_date: String,
    pub end_date: String,
}

impl CalendarEntryResponse {
    pub fn from_range(range: &DateRange) -> Self {
        Self {
            start_date: range.start().to_string(),
            end_date: range.end().to_string(),
        }
    }
}

/// 車両レスポンス
#[derive(Debug, Serialize)]
pub struct CarResponse {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub plate_number: String,
    pub year: i32,
    pub price_per_day_amount: i64,
    pub price_per_day_currency: String,
}

impl CarResponse {
    pub fn from_car(car: &Car) -> Self {
        Self {
            id: car.id().to_string(),
            brand: car.brand().to_string(),
            model: car.model().to_string(),
            plate_number: car.plate_number().to_string(),
            year: car.year(),
            price_per_day_amount: car.price_per_day().amount(),
            price_per_day_currency: car.price_per_day().currency(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CarId, Money, ReservationId, UserId};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reservation_response_from_reservation() {
        let period = DateRange::new(date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        let reservation = Reservation::new(
            ReservationId::new(),
            CarId::new(),
            UserId::new(),
            period,
            Money::jpy(150),
        );

        let response = ReservationResponse::from_reservation(&reservation);

        assert_eq!(response.start_date, "2024-06-10");
        assert_eq!(response.end_date, "2024-06-12");
        assert_eq!(response.status, "pending");
        assert_eq!(response.price_estimate_amount, 150);
        assert_eq!(response.price_estimate_currency, "JPY");
    }

    #[test]
    fn test_reservation_with_car_embeds_car() {
        let car = Car::new(
            CarId::new(),
            "トヨタ".to_string(),
            "カローラ".to_string(),
            "品川 300 あ 12-34".to_string(),
            2022,
            Money::jpy(5000),
        )
        .unwrap();
        let period = DateRange::new(date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        let reservation = Reservation::new(
            ReservationId::new(),
            car.id(),
            UserId::new(),
            period,
            Money::jpy(15000),
        );

        let response = ReservationWithCarResponse::from_parts(&reservation, Some(&car));
        assert_eq!(response.car.as_ref().unwrap().brand, "トヨタ");

        let without_car = ReservationWithCarResponse::from_parts(&reservation, None);
        assert!(without_car.car.is_none());
    }

    #[test]
    fn test_calendar_entry_exposes_only_dates() {
        let range = DateRange::new(date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        let entry = CalendarEntryResponse::from_range(&range);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["start_date"], "2024-06-10");
        assert_eq!(json["end_date"], "2024-06-12");
        // 予約者や料金は含まれない
        assert!(json.get("user_id").is_none());
        assert!(json.get("price_estimate_amount").is_none());
    }
}

// 予約ドメインの性質ベーステスト
// 期間の重なり判定・日数計算・料金見積りの普遍的な性質を検証する

use car_rental_reservation::domain::model::{
    Car, CarId, DateRange, Money, ReservationStatus,
};
use chrono::NaiveDate;
use proptest::prelude::*;

/// 紀元からの通算日でDateRangeを構築するヘルパー
/// おおよそ2000年〜2100年の範囲に収まる値を使う
fn range_from(start_days: i32, length: i32) -> DateRange {
    let start = NaiveDate::from_num_days_from_ce_opt(start_days).unwrap();
    let end = NaiveDate::from_num_days_from_ce_opt(start_days + length).unwrap();
    DateRange::new(start, end).unwrap()
}

const DAY_MIN: i32 = 730_000;
const DAY_MAX: i32 = 766_000;

proptest! {
    /// 重なり判定は対称である
    #[test]
    fn overlap_is_symmetric(
        start1 in DAY_MIN..DAY_MAX,
        len1 in 0..60i32,
        start2 in DAY_MIN..DAY_MAX,
        len2 in 0..60i32,
    ) {
        let range1 = range_from(start1, len1);
        let range2 = range_from(start2, len2);
        prop_assert_eq!(range1.overlaps(&range2), range2.overlaps(&range1));
    }

    /// すべての期間は自分自身と重なる
    #[test]
    fn range_overlaps_itself(start in DAY_MIN..DAY_MAX, len in 0..365i32) {
        let range = range_from(start, len);
        prop_assert!(range.overlaps(&range));
    }

    /// 終了日の翌日以降に開始する期間とは重ならない
    #[test]
    fn disjoint_ranges_do_not_overlap(
        start in DAY_MIN..DAY_MAX,
        len1 in 0..60i32,
        gap in 1..30i32,
        len2 in 0..60i32,
    ) {
        let range1 = range_from(start, len1);
        let range2 = range_from(start + len1 + gap, len2);
        prop_assert!(!range1.overlaps(&range2));
        prop_assert!(!range2.overlaps(&range1));
    }

    /// 終了日を共有する期間は重なる（閉区間）
    #[test]
    fn ranges_sharing_a_day_overlap(
        start in DAY_MIN..DAY_MAX,
        len1 in 0..60i32,
        len2 in 0..60i32,
    ) {
        let range1 = range_from(start, len1);
        let range2 = range_from(start + len1, len2);
        prop_assert!(range1.overlaps(&range2));
    }

    /// 日数は常に1以上で、両端を含んだ値になる
    #[test]
    fn duration_is_inclusive_and_at_least_one(
        start in DAY_MIN..DAY_MAX,
        len in 0..365i32,
    ) {
        let range = range_from(start, len);
        prop_assert!(range.duration_days() >= 1);
        prop_assert_eq!(range.duration_days(), (len + 1) as u32);
    }

    /// 終了日が開始日より前の期間は常に構築できない
    #[test]
    fn end_before_start_is_rejected(
        start in DAY_MIN..DAY_MAX,
        back in 1..365i32,
    ) {
        let start_date = NaiveDate::from_num_days_from_ce_opt(start).unwrap();
        let end_date = NaiveDate::from_num_days_from_ce_opt(start - back).unwrap();
        prop_assert!(DateRange::new(start_date, end_date).is_err());
    }

    /// 料金見積りは日数 × 日額料金に一致する
    #[test]
    fn price_estimate_is_days_times_daily_rate(
        start in DAY_MIN..DAY_MAX,
        len in 0..365i32,
        daily_rate in 1..100_000i64,
    ) {
        let car = Car::new(
            CarId::new(),
            "トヨタ".to_string(),
            "カローラ".to_string(),
            "品川 300 あ 12-34".to_string(),
            2022,
            Money::jpy(daily_rate),
        ).unwrap();

        let range = range_from(start, len);
        let estimate = car.price_for(&range).unwrap();
        prop_assert_eq!(estimate.amount(), daily_rate * (len + 1) as i64);
    }

    /// 金額の加算は可換である
    #[test]
    fn money_addition_is_commutative(a in 0..1_000_000i64, b in 0..1_000_000i64) {
        let sum1 = Money::jpy(a).add(&Money::jpy(b)).unwrap();
        let sum2 = Money::jpy(b).add(&Money::jpy(a)).unwrap();
        prop_assert_eq!(sum1.amount(), sum2.amount());
    }

    /// 乗算は加算の繰り返しに一致する
    #[test]
    fn money_multiplication_matches_repeated_addition(
        amount in 0..100_000i64,
        factor in 1..20u32,
    ) {
        let money = Money::jpy(amount);
        let mut total = Money::jpy(0);
        for _ in 0..factor {
            total = total.add(&money).unwrap();
        }
        prop_assert_eq!(money.multiply(factor).unwrap().amount(), total.amount());
    }
}

#[test]
fn status_string_representation_round_trips() {
    for status in [
        ReservationStatus::Pending,
        ReservationStatus::Accepted,
        ReservationStatus::Declined,
    ] {
        let parsed = ReservationStatus::from_string(&status.to_string()).unwrap();
        assert_eq!(parsed, status);
    }
}

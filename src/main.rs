use car_rental_reservation::adapter::driven::{
    ConsoleLogger, EventBusConfig, InMemoryEventBus, MySqlCarRepository,
    MySqlReservationRepository,
};
use car_rental_reservation::adapter::driver::rest_api::{create_router, AppState};
use car_rental_reservation::adapter::{DatabaseConfig, DatabaseMigration};
use car_rental_reservation::application::service::{
    CarApplicationService, CarQueryService, ReservationApplicationService,
    ReservationQueryService,
};
use car_rental_reservation::domain::event_bus::ReservationStatusUpdatedHandlerWrapper;
use car_rental_reservation::domain::handler::NotificationHandler;
use car_rental_reservation::domain::port::Logger;

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== レンタカー予約システム REST API ===");
    println!();

    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // データベース設定を読み込む
    let config = DatabaseConfig::from_env()?;
    println!(
        "データベース設定を読み込みました: {}:{}",
        config.host, config.port
    );

    // 接続プールを作成
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;
    println!("データベース接続プールを作成しました");

    // マイグレーションを実行
    let migration = DatabaseMigration::new(pool.clone());
    migration.run().await?;
    println!("データベースマイグレーションを実行しました");

    // ロガーを作成
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new());

    // イベントバスを作成し、通知ハンドラーを登録
    let event_bus = Arc::new(InMemoryEventBus::new(
        EventBusConfig::default(),
        logger.clone(),
    ));
    let notification_handler = NotificationHandler::new(logger.clone());
    event_bus
        .subscribe(Arc::new(ReservationStatusUpdatedHandlerWrapper::new(
            notification_handler,
        )))
        .await;
    println!("イベントハンドラーを登録しました");
    println!("通知フロー: ステータス更新 → 利用者への通知（バックグラウンド送信）");

    // アプリケーションサービスを作成
    let reservation_service = ReservationApplicationService::new(
        MySqlReservationRepository::new(pool.clone()),
        MySqlCarRepository::new(pool.clone()),
        event_bus.clone(),
        logger.clone(),
    );
    let car_service = CarApplicationService::new(MySqlCarRepository::new(pool.clone()));

    // クエリサービスを作成
    let reservation_query_service = ReservationQueryService::new(Arc::new(
        MySqlReservationRepository::new(pool.clone()),
    ));
    let car_query_service = CarQueryService::new(Arc::new(MySqlCarRepository::new(pool.clone())));

    // アプリケーション状態を作成
    let app_state = AppState {
        reservation_service: Arc::new(reservation_service),
        car_service: Arc::new(car_service),
        reservation_query_service: Arc::new(reservation_query_service),
        car_query_service: Arc::new(car_query_service),
    };

    // REST APIルーターを作成
    let app = create_router(app_state).layer(CorsLayer::permissive());

    // サーバーを起動
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    println!("REST APIサーバーが起動しました: http://localhost:3000");
    println!("ヘルスチェック: GET http://localhost:3000/health");
    println!("API仕様:");
    println!("  POST   /reservations - 予約作成（要 x-user-id ヘッダー）");
    println!("  GET    /reservations - 予約一覧取得（管理者向け）");
    println!("  GET    /my-reservations - 自分の予約一覧取得");
    println!("  PUT    /reservations/:id/status - 予約ステータス更新（管理者向け）");
    println!("  GET    /cars - 車両一覧取得");
    println!("  GET    /cars/:id - 車両詳細取得");
    println!("  GET    /cars/:id/calendar - 予約カレンダー取得");
    println!("  POST   /cars - 車両登録（管理者向け）");
    println!("  PUT    /cars/:id - 車両更新（管理者向け）");
    println!("  DELETE /cars/:id - 車両削除（管理者向け）");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}

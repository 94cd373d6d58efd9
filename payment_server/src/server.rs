use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use payment_engine::{OrderFlowApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::gateway::RestGatewayClient,
    middleware::{HmacMiddlewareFactory, GATEWAY_SIGNATURE_HEADER},
    routes::{get_order, health, update_order_status, verify_payment},
    webhook_routes::gateway_webhook,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    config.assert_ready()?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = RestGatewayClient::new(&config.gateway).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RestGatewayClient,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let api = OrderFlowApi::new(db.clone(), config.seller_state.clone());
        let webhook_guard = HmacMiddlewareFactory::new(
            GATEWAY_SIGNATURE_HEADER,
            config.gateway.webhook_secret.clone(),
            config.gateway.hmac_checks,
        );
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("gpg::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(gateway.clone()))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(
                web::resource("/payment/verify")
                    .route(web::post().to(verify_payment::<SqliteDatabase, RestGatewayClient>)),
            )
            // The signature check wraps only the webhook resource; the sync path verifies its own
            // signature in the handler since it covers the id pair, not the body.
            .service(
                web::resource("/payment/webhook")
                    .wrap(webhook_guard)
                    .route(web::post().to(gateway_webhook::<SqliteDatabase>)),
            )
            .service(web::resource("/order/{order_id}").route(web::get().to(get_order::<SqliteDatabase>)))
            .service(
                web::resource("/order/{order_id}/status")
                    .route(web::post().to(update_order_status::<SqliteDatabase>)),
            )
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use chrono::Duration as ChronoDuration;
use donation_payment_engine::{events::EventProducers, DonationApi, ReconciliationApi, SqliteDatabase};
use log::info;
use provider_tools::{CardGatewayApi, QrProviderApi};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::notifications::create_notification_event_handlers,
    middleware::SignatureMiddlewareFactory,
    poller::StatusPoller,
    routes::{health, CampaignTotalsRoute, CancelDonationRoute, DonationRoute, NewDonationRoute, QrStatusRoute},
    sweep_worker::start_sweep_worker,
    webhook_routes::{CardWebhookRoute, QrWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let card_api = CardGatewayApi::new(config.card.api.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not create the card gateway client. {e}")))?;
    let qr_api = QrProviderApi::new(config.qr.api.clone())
        .map_err(|e| ServerError::InitializeError(format!("Could not create the bank QR client. {e}")))?;
    let handlers = create_notification_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if config.sweep_interval <= ChronoDuration::zero() {
        info!("🕰️ The QR deposit sweep worker is disabled");
    } else {
        start_sweep_worker(db.clone(), producers.clone(), qr_api.clone(), config.sweep_interval, config.sweep_grace);
    }
    let srv = create_server_instance(config, db, producers, card_api, qr_api)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    card_api: CardGatewayApi,
    qr_api: QrProviderApi,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let recon_api = ReconciliationApi::new(db.clone(), producers.clone());
        let donations_api = DonationApi::new(db.clone());
        let poller = StatusPoller::new(db.clone(), producers.clone(), qr_api.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("dpg::access_log"))
            .app_data(web::Data::new(recon_api))
            .app_data(web::Data::new(donations_api))
            .app_data(web::Data::new(poller))
            .app_data(web::Data::new(card_api.clone()))
            .app_data(web::Data::new(qr_api.clone()));
        // Each provider's webhook scope carries its own signing secret
        let card_scope = web::scope("/webhook/card")
            .wrap(SignatureMiddlewareFactory::new(config.card.webhook_secret.clone(), config.signature_checks))
            .service(CardWebhookRoute::<SqliteDatabase>::new());
        let qr_scope = web::scope("/webhook/qr")
            .wrap(SignatureMiddlewareFactory::new(config.qr.webhook_secret.clone(), config.signature_checks))
            .service(QrWebhookRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(DonationRoute::<SqliteDatabase>::new())
            .service(NewDonationRoute::<SqliteDatabase>::new())
            .service(CancelDonationRoute::<SqliteDatabase>::new())
            .service(CampaignTotalsRoute::<SqliteDatabase>::new())
            .service(QrStatusRoute::<SqliteDatabase>::new())
            .service(card_scope)
            .service(qr_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

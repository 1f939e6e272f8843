//! Webhook signature middleware for Actix Web.
//!
//! Both payment providers sign their webhook deliveries with an HMAC-SHA256 digest over the raw
//! request body. The digest arrives in the `X-Webhook-Signature` header (some older card gateway
//! accounts still send `X-Signature`), in one of the two formats handled by
//! [`crate::helpers::verify_webhook_signature`].
//!
//! Wrap every webhook scope with this middleware. Deliveries with a missing or invalid signature
//! are rejected with `401 Unauthorized` before any handler runs, and the verified body is replayed
//! into the request so extractors downstream see an untouched payload.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorUnauthorized},
    web,
    Error,
};
use dpg_common::Secret;
use futures::future::LocalBoxFuture;
use log::{debug, trace, warn};

use crate::helpers::verify_webhook_signature;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const LEGACY_SIGNATURE_HEADER: &str = "X-Signature";

pub struct SignatureMiddlewareFactory {
    key: Secret<String>,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl SignatureMiddlewareFactory {
    pub fn new(key: Secret<String>, enabled: bool) -> Self {
        SignatureMiddlewareFactory { key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService {
            key: self.key.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct SignatureMiddlewareService<S> {
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            log_delivery_headers(&req);
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let signature = req
                .headers()
                .get(SIGNATURE_HEADER)
                .or_else(|| req.headers().get(LEGACY_SIGNATURE_HEADER))
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    warn!("🔐️ No signature header found in webhook delivery. Denying access.");
                    ErrorUnauthorized("No webhook signature found.")
                })?
                .to_string();
            let validated = verify_webhook_signature(data.as_ref(), &signature, &secret);
            if validated {
                trace!("🔐️ Webhook signature check for request ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid signature found in webhook delivery. Denying access.");
                Err(ErrorUnauthorized("Invalid webhook signature."))
            }
        })
    }
}

// Providers attach delivery metadata headers that are useful when chasing a redelivery storm
// through the logs. They carry no trust and play no part in verification.
fn log_delivery_headers(req: &ServiceRequest) {
    let event = req.headers().get("X-Webhook-Event").and_then(|v| v.to_str().ok());
    let delivery_id = req.headers().get("X-Webhook-Id").and_then(|v| v.to_str().ok());
    if event.is_some() || delivery_id.is_some() {
        debug!("🔐️ Webhook delivery. event: {}, id: {}", event.unwrap_or("-"), delivery_id.unwrap_or("-"));
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}

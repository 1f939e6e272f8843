//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the ledger backend, and since actix-web cannot register generic handlers directly,
//! each route gets a small factory struct generated by the [`route!`] macro. Register the concrete type in
//! [`crate::server`], e.g. `DonationRoute::<SqliteDatabase>::new()`.
//!
//! Webhook handlers live in [`crate::webhook_routes`], since they sit behind the signature middleware and follow
//! provider conventions rather than ours.

use actix_web::{get, web, HttpResponse, Responder};
use donation_payment_engine::{
    db_types::{DonationId, NewDonation, PaymentProvider},
    traits::{DonationManagement, LedgerDatabase},
    DonationApi,
};
use dpg_common::DEFAULT_CURRENCY_CODE;
use log::*;
use provider_tools::{CardGatewayApi, CheckoutMetadata, NewCheckoutSession, NewQrCharge, QrProviderApi};
use serde_json::json;

use crate::{
    data_objects::{NewDonationRequest, NewDonationResponse, PaymentInstructions, PollResponse},
    errors::ServerError,
    poller::StatusPoller,
};

// Actix cannot handle generics in handlers, so the registration is implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Donations  ----------------------------------------------------

route!(donation => Get "/donations/{id}" impl DonationManagement);
/// Route handler for the donations/{id} endpoint
///
/// Returns the donation record, including its payment status, provider correlation fields and (once settled) the
/// payer details. Donation ids are unguessable random strings, which is the only access control this endpoint has.
pub async fn donation<B: DonationManagement>(
    path: web::Path<String>,
    api: web::Data<DonationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = DonationId::from(path.into_inner());
    trace!("💻️ GET donation {id}");
    let donation =
        api.donation(&id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Donation {id} does not exist")))?;
    Ok(HttpResponse::Ok().json(donation))
}

route!(new_donation => Post "/donations" impl LedgerDatabase);
/// Route handler for opening a new donation
///
/// The donation row is created first, in `Pending` status, and only then is the payment provider asked to create
/// the matching checkout session or QR charge. If the provider call fails the pending row stays behind, both as an
/// audit trail and so the donor can retry; the response in that case is a 502.
pub async fn new_donation<B: LedgerDatabase>(
    body: web::Json<NewDonationRequest>,
    api: web::Data<DonationApi<B>>,
    card_api: web::Data<CardGatewayApi>,
    qr_api: web::Data<QrProviderApi>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!(
        "💻️ POST new donation of {} to campaign {} via {}",
        request.amount, request.campaign_id, request.method
    );
    let provider = request.method.default_provider().ok_or_else(|| {
        ServerError::MalformedPayload(format!(
            "{} donations are recorded manually and cannot be initiated here",
            request.method
        ))
    })?;
    let mut new_donation = NewDonation::new(request.campaign_id, request.amount, request.method);
    if let Some(donor_id) = request.donor_id {
        new_donation = new_donation.with_donor(donor_id);
    }
    if let Some(tip) = request.tip_amount {
        new_donation = new_donation.with_tip(tip);
    }
    let donation = api.new_donation(new_donation).await?;
    let charge_total = donation.amount + donation.tip_amount.unwrap_or_default();
    let (donation, payment) = match provider {
        PaymentProvider::Card => {
            let metadata = CheckoutMetadata {
                donation_id: donation.id.to_string(),
                campaign_id: donation.campaign_id,
                donor_id: donation.donor_id.clone(),
                amount: donation.amount,
                tip_amount: donation.tip_amount,
            };
            let checkout = NewCheckoutSession {
                amount: charge_total,
                currency: DEFAULT_CURRENCY_CODE.to_string(),
                metadata,
                success_url: None,
                cancel_url: None,
            };
            let session = card_api.create_checkout(checkout).await.map_err(|e| {
                warn!("💻️ Could not create a checkout session for donation {}. {e}", donation.id);
                ServerError::from(e)
            })?;
            let donation =
                api.attach_provider_correlation(&donation.id, PaymentProvider::Card, None, Some(&session.id)).await?;
            info!("💻️ Donation {} opened with checkout session {}", donation.id, session.id);
            (donation, PaymentInstructions::Checkout { session_id: session.id, redirect_url: session.url })
        },
        PaymentProvider::BankQr => {
            let charge = NewQrCharge {
                amount: charge_total,
                description: Some(format!("Donation to campaign {}", donation.campaign_id)),
                metadata: Some(json!({ "donationId": donation.id.as_str(), "campaignId": donation.campaign_id })),
            };
            let charge = qr_api.create_charge(charge).await.map_err(|e| {
                warn!("💻️ Could not create a QR charge for donation {}. {e}", donation.id);
                ServerError::from(e)
            })?;
            let donation = api
                .attach_provider_correlation(&donation.id, PaymentProvider::BankQr, Some(&charge.alias), None)
                .await?;
            info!("💻️ Donation {} opened with QR charge {}", donation.id, charge.alias);
            (donation, PaymentInstructions::QrCode {
                alias: charge.alias,
                qr_code: charge.qr_code,
                image_url: charge.image_url,
            })
        },
    };
    Ok(HttpResponse::Ok().json(NewDonationResponse { donation, payment }))
}

route!(cancel_donation => Post "/donations/{id}/cancel" impl LedgerDatabase);
/// Route handler for cancelling a donation
///
/// Only pending and failed donations can be cancelled; a completed donation answers with a 409. Cancelling a QR
/// donation also asks the provider to disable the charge, so the donor cannot pay into a dead donation. That call
/// is best-effort: the local cancellation has already committed, and a provider failure only produces a warning.
/// A payment that slips through anyway is logged against the cancelled donation without resurrecting it.
pub async fn cancel_donation<B: LedgerDatabase>(
    path: web::Path<String>,
    api: web::Data<DonationApi<B>>,
    qr_api: web::Data<QrProviderApi>,
) -> Result<HttpResponse, ServerError> {
    let id = DonationId::from(path.into_inner());
    debug!("💻️ POST cancel donation {id}");
    let donation = api.cancel_donation(&id).await?;
    if donation.provider == Some(PaymentProvider::BankQr) {
        if let Some(alias) = donation.provider_payment_id.as_deref() {
            if let Err(e) = qr_api.disable_charge(alias).await {
                warn!("💻️ Donation {id} is cancelled, but its QR charge {alias} could not be disabled. {e}");
            }
        }
    }
    info!("💻️ Donation {id} cancelled");
    Ok(HttpResponse::Ok().json(donation))
}

//----------------------------------------------   Campaigns  ----------------------------------------------------

route!(campaign_totals => Get "/campaigns/{id}/totals" impl DonationManagement);
/// Route handler for the campaign fundraising totals endpoint
pub async fn campaign_totals<B: DonationManagement>(
    path: web::Path<i64>,
    api: web::Data<DonationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    trace!("💻️ GET totals for campaign {campaign_id}");
    let totals = api
        .campaign_totals(campaign_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Campaign {campaign_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(totals))
}

//----------------------------------------------   QR status  ----------------------------------------------------

route!(qr_status => Get "/qr/{alias}/status" impl LedgerDatabase);
/// Route handler for the QR deposit status endpoint
///
/// The donor-facing app polls this while waiting for a bank transfer to land. The heavy lifting happens in
/// [`StatusPoller`]; a settled deposit discovered here flows through the same reconciliation path as a webhook.
/// When the provider cannot be reached the answer is a 502 with `success: false`, which tells the app to simply
/// poll again.
pub async fn qr_status<B: LedgerDatabase>(
    path: web::Path<String>,
    poller: web::Data<StatusPoller<B>>,
) -> Result<HttpResponse, ServerError> {
    let alias = path.into_inner();
    trace!("💻️ GET QR deposit status for {alias}");
    match poller.poll_qr_status(&alias).await {
        Ok(data) => Ok(HttpResponse::Ok().json(PollResponse::success(data))),
        Err(e @ ServerError::ProviderUnavailable(_)) => {
            debug!("💻️ QR deposit status for {alias} is unavailable. {e}");
            Ok(HttpResponse::BadGateway().json(PollResponse::failure(e)))
        },
        Err(e) => Err(e),
    }
}

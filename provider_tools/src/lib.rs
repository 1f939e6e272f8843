mod card_api;
mod config;
mod data_objects;
mod error;
mod helpers;
mod qr_api;

pub use card_api::CardGatewayApi;
pub use config::{CardGatewayConfig, QrProviderConfig, DEFAULT_PROVIDER_TIMEOUT};
pub use data_objects::{
    CheckoutMetadata,
    CheckoutSession,
    DepositStatus,
    NewCheckoutSession,
    NewQrCharge,
    QrCharge,
    QrDepositState,
};
pub use error::ProviderApiError;
pub use qr_api::QrProviderApi;

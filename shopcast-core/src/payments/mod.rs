//! Payment provider adapters behind the `PaymentGateway` trait.
//!
//! `HttpPaymentGateway` talks to a checkout-preference REST endpoint.
//! `ManualPaymentGateway` mints local references for deployments where an
//! operator approves purchases by hand.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use shopcast_common::models::{PaymentPreference, PreferenceRequest};
use shopcast_common::traits::collaborator_traits::PaymentGateway;
use crate::Error;

#[derive(Debug, Serialize)]
struct PreferenceItem<'a> {
    title: &'a str,
    quantity: i32,
    unit_price: f64,
    currency_id: &'a str,
}

#[derive(Debug, Serialize)]
struct PreferenceBody<'a> {
    items: Vec<PreferenceItem<'a>>,
    external_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
    id: String,
    #[serde(default)]
    init_point: Option<String>,
}

#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
    currency: String,
}

impl HttpPaymentGateway {
    pub fn new(api_url: &str, access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            currency: "ARS".to_string(),
        }
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_preference(&self, request: &PreferenceRequest) -> Result<PaymentPreference, Error> {
        let body = PreferenceBody {
            items: vec![PreferenceItem {
                title: &request.title,
                quantity: request.quantity,
                unit_price: request.unit_price_cents as f64 / 100.0,
                currency_id: &self.currency,
            }],
            external_reference: request.purchase_id.to_string(),
            notification_url: request.notification_url.as_deref(),
        };

        let url = format!("{}/checkout/preferences", self.api_url);
        debug!("POST {} for purchase {}", url, request.purchase_id);
        let response: PreferenceResponse = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Payment preference {} created for purchase {}", response.id, request.purchase_id);
        Ok(PaymentPreference {
            preference_id: response.id,
            checkout_url: response.init_point,
        })
    }
}

/// No external provider: the reference is local and approval is manual.
#[derive(Debug, Default, Clone)]
pub struct ManualPaymentGateway;

#[async_trait]
impl PaymentGateway for ManualPaymentGateway {
    async fn create_preference(&self, request: &PreferenceRequest) -> Result<PaymentPreference, Error> {
        let preference_id = format!("manual-{}", Uuid::new_v4());
        debug!("Manual preference {} for purchase {}", preference_id, request.purchase_id);
        Ok(PaymentPreference {
            preference_id,
            checkout_url: None,
        })
    }
}

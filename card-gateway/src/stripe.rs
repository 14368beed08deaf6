//! Stripe REST client implementing the `ChargeGateway` port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use voucher_types::{
    ChargeGateway, ErrorCategory, GatewayCharge, GatewayChargeResult, GatewayError, NewCharge,
};

use crate::classify::{classify_error_type, classify_status, classify_transport};
use crate::wire::{StripeCharge, StripeErrorBody, charge_form};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the Stripe API.
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    /// Upper bound on a single gateway round-trip
    pub timeout: Duration,
}

impl StripeConfig {
    /// Creates a config for the public Stripe endpoint.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Stripe card gateway.
pub struct StripeGateway {
    config: StripeConfig,
    http: Client,
}

impl StripeGateway {
    /// Builds the HTTP client with the configured timeout.
    pub fn new(config: StripeConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// Builds an endpoint URL, escaping each segment so caller input cannot
    /// leave its segment.
    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let invalid = || {
            GatewayError::new(
                ErrorCategory::InvalidRequest,
                format!("Invalid API base: {}", self.config.api_base),
            )
        };
        let mut url = Url::parse(&self.config.api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn handle<T: DeserializeOwned>(
        &self,
        sent: Result<Response, reqwest::Error>,
    ) -> Result<T, GatewayError> {
        let resp = sent.map_err(|e| GatewayError::new(classify_transport(&e), e.to_string()))?;
        let status = resp.status();

        if status.is_success() {
            return resp.json::<T>().await.map_err(|e| {
                let category = if e.is_decode() {
                    ErrorCategory::Unknown
                } else {
                    classify_transport(&e)
                };
                GatewayError::new(category, e.to_string())
            });
        }

        let body = resp.text().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }
}

/// Stripe object ids are alphanumeric with underscores.
fn is_charge_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Builds a gateway error from a non-2xx Stripe response.
fn error_from_body(status: reqwest::StatusCode, body: &str) -> GatewayError {
    let fallback_message = || {
        status
            .canonical_reason()
            .unwrap_or("unexpected gateway response")
            .to_string()
    };

    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(StripeErrorBody { error }) => {
            tracing::debug!(
                status = status.as_u16(),
                error_type = ?error.kind,
                code = ?error.code,
                "Stripe rejected request"
            );
            let category = match error.kind.as_deref() {
                Some(kind) => classify_error_type(kind),
                None => classify_status(status),
            };
            GatewayError::new(category, error.message.unwrap_or_else(fallback_message))
        }
        Err(_) => GatewayError::new(classify_status(status), fallback_message()),
    }
}

#[async_trait]
impl ChargeGateway for StripeGateway {
    #[tracing::instrument(skip(self, charge), fields(amount = charge.amount, currency = %charge.currency))]
    async fn create_charge(&self, charge: NewCharge) -> GatewayChargeResult {
        let sent = self
            .http
            .post(self.url(&["v1", "charges"])?)
            .bearer_auth(&self.config.secret_key)
            .form(&charge_form(&charge))
            .send()
            .await;

        let created: StripeCharge = self.handle(sent).await?;
        tracing::debug!(charge_id = %created.id, "Stripe charge created");
        Ok(GatewayCharge::from(created))
    }

    #[tracing::instrument(skip(self))]
    async fn retrieve_charge(&self, id: &str) -> GatewayChargeResult {
        if !is_charge_id(id) {
            return Err(GatewayError::new(
                ErrorCategory::InvalidRequest,
                format!("No such charge: '{}'", id),
            ));
        }

        let sent = self
            .http
            .get(self.url(&["v1", "charges", id])?)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await;

        let charge: StripeCharge = self.handle(sent).await?;
        Ok(GatewayCharge::from(charge))
    }
}

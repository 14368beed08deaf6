//! # Voucher Client SDK
//!
//! A typed Rust client for the voucher charge API.

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use voucher_types::{
    Acknowledgement, ChargeBody, ChargeInfoResponse, FIXED_AMOUNT, FIXED_CURRENCY, Failure,
    VoucherStatusResponse,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server refused the request; `reason` is its failure reason.
    #[error("API error: {status} - {reason}")]
    Api { status: u16, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// The failure reason reported by the server, if the server answered.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ClientError::Api { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Voucher charge API client.
pub struct VoucherClient {
    base_url: String,
    http: Client,
}

impl VoucherClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self.http.get(self.url(&["health"])?).send().await?;
        Ok(resp.status().is_success())
    }

    /// Submits a charge exactly as given. Amount and currency are sent as
    /// strings, the way browsers post them.
    pub async fn charge(&self, body: &ChargeBody) -> Result<Acknowledgement, ClientError> {
        let resp = self
            .http
            .post(self.url(&["v1", "stripe", "charge"])?)
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Pays for a voucher at the service's fixed price.
    pub async fn pay_voucher(
        &self,
        token: &str,
        voucher: &str,
    ) -> Result<Acknowledgement, ClientError> {
        let body = ChargeBody {
            token: token.to_string(),
            voucher: voucher.to_string(),
            amount: FIXED_AMOUNT.to_string(),
            currency: FIXED_CURRENCY.code().to_string(),
        };
        self.charge(&body).await
    }

    /// Gets whether a voucher has been paid for.
    pub async fn voucher_status(&self, voucher: &str) -> Result<VoucherStatusResponse, ClientError> {
        self.get(&["v1", "vouchers", voucher]).await
    }

    /// Looks up a processor charge by id.
    pub async fn get_charge(&self, id: &str) -> Result<ChargeInfoResponse, ClientError> {
        self.get(&["v1", "charges", id]).await
    }

    /// Builds a URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let resp = self.http.get(self.url(segments)?).send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<Failure>(&body)
                .map(|failure| failure.reason)
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                reason,
            })
        }
    }
}

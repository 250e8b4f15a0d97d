//! Nequi payment gateway client.
//!
//! Authenticates with a client-credentials grant and creates payment
//! intents. The access token is cached in-process and refreshed shortly
//! before expiry so concurrent checkouts share one token.
//!
//! Bank-transfer methods never touch this client; only Nequi checkouts
//! create a gateway payment.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use comelones_core::{OrderId, PaymentId};

use crate::config::NequiConfig;

/// Refresh the token this long before its reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Errors that can occur when interacting with the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A created payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPayment {
    /// Gateway-assigned payment ID, echoed back in the callback.
    pub payment_id: PaymentId,
    /// URL the customer is redirected to for approval.
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Serialize)]
struct CreatePaymentRequest<'a> {
    order_id: &'a OrderId,
    amount: Decimal,
    currency: &'static str,
    callback_url: &'a str,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

struct Inner {
    client: reqwest::Client,
    config: NequiConfig,
    callback_url: String,
    token: RwLock<Option<CachedToken>>,
}

/// Nequi API client. Cheap to clone; the token cache is shared.
#[derive(Clone)]
pub struct NequiClient {
    inner: Arc<Inner>,
}

impl NequiClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: NequiConfig, callback_url: String) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                config,
                callback_url,
                token: RwLock::new(None),
            }),
        })
    }

    /// Create a payment intent for an order.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if authentication or the payment request
    /// fails. The caller should surface this as a gateway outage, not a
    /// checkout validation failure.
    pub async fn create_payment(
        &self,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<CreatedPayment, GatewayError> {
        let token = self.access_token().await?;

        let url = format!("{}/payments", self.inner.config.base_url.trim_end_matches('/'));
        let body = CreatePaymentRequest {
            order_id,
            amount,
            currency: "COP",
            callback_url: &self.inner.callback_url,
        };

        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CreatedPayment>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    /// Get a valid access token, reusing the cached one when possible.
    async fn access_token(&self) -> Result<String, GatewayError> {
        {
            let guard = self.inner.token.read().await;
            if let Some(cached) = guard.as_ref()
                && cached.expires_at > Instant::now()
            {
                return Ok(cached.access_token.clone());
            }
        }

        let mut guard = self.inner.token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = guard.as_ref()
            && cached.expires_at > Instant::now()
        {
            return Ok(cached.access_token.clone());
        }

        let token = self.request_token().await?;
        let expires_in = Duration::from_secs(token.expires_in);
        let expires_at = Instant::now() + expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN);

        let access_token = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });

        Ok(access_token)
    }

    async fn request_token(&self) -> Result<TokenResponse, GatewayError> {
        let url = format!(
            "{}/oauth/token",
            self.inner.config.base_url.trim_end_matches('/')
        );

        let response = self
            .inner
            .client
            .post(&url)
            .basic_auth(
                &self.inner.config.client_id,
                Some(self.inner.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

//! Payment gateway checkout API client.
//!
//! Only redirect-style methods are used: the shopper is sent to the gateway
//! (or their bank) and comes back with a `redirectResult` that we submit via
//! `/payments/details`. No card data passes through the BFF.

pub mod types;

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::config::PaymentConfig;

use types::{
    Amount, DetailsRequest, GatewayErrorBody, GatewayPaymentMethod, GatewayResult,
    MerchantPaymentRequest, PaymentMethodsRequest, PaymentMethodsResponse, PaymentRequest,
    RedirectDetails,
};

/// Gateway method types that need card data collected client-side.
const NON_REDIRECT_METHODS: &[&str] = &["scheme", "bcmc_mobile", "applepay", "googlepay"];

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("Gateway error {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PaymentError {
    /// Upstream HTTP status, if the error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
            Self::Parse(_) => None,
        }
    }
}

/// Client for the payment gateway.
#[derive(Clone)]
pub struct PaymentGateway {
    inner: Arc<PaymentGatewayInner>,
}

struct PaymentGatewayInner {
    client: reqwest::Client,
    api_url: String,
    api_key: SecretString,
    merchant_account: String,
}

impl PaymentGateway {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            inner: Arc::new(PaymentGatewayInner {
                client: reqwest::Client::new(),
                api_url: config.api_url.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                merchant_account: config.merchant_account.clone(),
            }),
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, PaymentError> {
        let response = self
            .inner
            .client
            .post(format!("{}/{path}", self.inner.api_url))
            .header("X-API-Key", self.inner.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Payment gateway returned non-success status"
            );
            return Err(gateway_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse payment gateway response"
            );
            PaymentError::Parse(e)
        })
    }

    /// Redirect payment methods available for an amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway request fails.
    #[instrument(skip(self), fields(currency = %amount.currency, value = amount.value))]
    pub async fn payment_methods(
        &self,
        amount: &Amount,
        country: &str,
        locale: &str,
    ) -> Result<Vec<GatewayPaymentMethod>, PaymentError> {
        let request = PaymentMethodsRequest {
            merchant_account: &self.inner.merchant_account,
            amount,
            country_code: country,
            shopper_locale: locale,
            channel: "Web",
        };
        let response: PaymentMethodsResponse = self.post("paymentMethods", &request).await?;
        Ok(response
            .payment_methods
            .into_iter()
            .filter(|m| !NON_REDIRECT_METHODS.contains(&m.kind.as_str()))
            .collect())
    }

    /// Start a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the request.
    #[instrument(skip(self, request), fields(reference = %request.reference, method = %request.payment_method.kind))]
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<GatewayResult, PaymentError> {
        let body = MerchantPaymentRequest {
            merchant_account: &self.inner.merchant_account,
            request,
        };
        self.post("payments", &body).await
    }

    /// Submit the `redirectResult` the shopper returned with.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the details.
    #[instrument(skip(self, redirect_result))]
    pub async fn submit_details(&self, redirect_result: &str) -> Result<GatewayResult, PaymentError> {
        let body = DetailsRequest {
            details: RedirectDetails { redirect_result },
        };
        self.post("payments/details", &body).await
    }
}

fn gateway_error(status: StatusCode, body: &str) -> PaymentError {
    let message = serde_json::from_str::<GatewayErrorBody>(body)
        .map(|e| match e.error_code {
            Some(code) => format!("{code}: {}", e.message),
            None => e.message,
        })
        .unwrap_or_else(|_| body.chars().take(200).collect());
    PaymentError::Api {
        status: status.as_u16(),
        message,
    }
}

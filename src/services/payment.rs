//! Payment provider client
//!
//! Thin HTTP client for a YooKassa-shaped checkout API. Creating a
//! payment carries a fresh Idempotence-Key so a retried request can never
//! double-charge; status reads are plain GETs.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::settings::PaymentConfig;
use crate::models::DonationStatus;
use crate::utils::errors::{AscentError, ProviderError, Result};

/// Amount object in provider requests and responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAmount {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
struct ConfirmationRequest {
    #[serde(rename = "type")]
    kind: String,
    return_url: String,
}

#[derive(Debug, Clone, Serialize)]
struct CreatePaymentRequest {
    amount: ProviderAmount,
    confirmation: ConfirmationRequest,
    capture: bool,
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationResponse {
    pub confirmation_url: Option<String>,
}

/// Provider payment object, as returned by create and status calls
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPayment {
    pub id: String,
    pub status: String,
    pub amount: ProviderAmount,
    pub confirmation: Option<ConfirmationResponse>,
}

/// A freshly created checkout: the provider payment id plus the URL the
/// user must open to pay.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub payment_id: String,
    pub confirmation_url: String,
}

#[derive(Clone, Debug)]
pub struct PaymentService {
    client: Client,
    config: PaymentConfig,
}

impl PaymentService {
    pub fn new(config: PaymentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("AscentBot/1.0")
            .build()
            .map_err(AscentError::Http)?;

        Ok(Self { client, config })
    }

    /// Create a checkout for the given amount and return the payment id
    /// and confirmation URL.
    pub async fn create_checkout(&self, amount: Decimal, description: &str) -> Result<Checkout> {
        let request = CreatePaymentRequest {
            amount: ProviderAmount {
                value: format!("{:.2}", amount),
                currency: self.config.currency.clone(),
            },
            confirmation: ConfirmationRequest {
                kind: "redirect".to_string(),
                return_url: self.config.return_url.clone(),
            },
            capture: true,
            description: description.to_string(),
        };

        let idempotence_key = Uuid::new_v4().to_string();
        debug!(idempotence_key = %idempotence_key, "Creating provider payment");

        let response = self
            .client
            .post(format!("{}/payments", self.config.api_url))
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .header("Idempotence-Key", &idempotence_key)
            .json(&request)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AscentError::Provider(ProviderError::RequestFailed(
                format!("HTTP {}: {}", status, body),
            )));
        }

        let payment: ProviderPayment = response
            .json()
            .await
            .map_err(|e| AscentError::Provider(ProviderError::InvalidResponse(e.to_string())))?;

        let confirmation_url = payment
            .confirmation
            .and_then(|c| c.confirmation_url)
            .ok_or_else(|| {
                AscentError::Provider(ProviderError::InvalidResponse(
                    "payment response carries no confirmation_url".to_string(),
                ))
            })?;

        Ok(Checkout {
            payment_id: payment.id,
            confirmation_url,
        })
    }

    /// Fetch the provider-side status of a payment
    pub async fn get_status(&self, payment_id: &str) -> Result<DonationStatus> {
        let response = self
            .client
            .get(format!("{}/payments/{}", self.config.api_url, payment_id))
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AscentError::Provider(ProviderError::RequestFailed(
                format!("HTTP {}: {}", status, body),
            )));
        }

        let payment: ProviderPayment = response
            .json()
            .await
            .map_err(|e| AscentError::Provider(ProviderError::InvalidResponse(e.to_string())))?;

        parse_status(&payment.status)
    }
}

fn map_request_error(e: reqwest::Error) -> AscentError {
    if e.is_timeout() {
        AscentError::Provider(ProviderError::Timeout)
    } else {
        AscentError::Provider(ProviderError::RequestFailed(e.to_string()))
    }
}

fn parse_status(raw: &str) -> Result<DonationStatus> {
    match raw {
        "pending" => Ok(DonationStatus::Pending),
        "waiting_for_capture" => Ok(DonationStatus::WaitingForCapture),
        "succeeded" => Ok(DonationStatus::Succeeded),
        "canceled" => Ok(DonationStatus::Canceled),
        other => {
            warn!(status = other, "Provider returned unknown payment status");
            Err(AscentError::Provider(ProviderError::UnknownStatus(
                other.to_string(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_url: String) -> PaymentConfig {
        PaymentConfig {
            api_url,
            shop_id: "shop".to_string(),
            secret_key: "secret".to_string(),
            return_url: "https://t.me/test_bot".to_string(),
            timeout_seconds: 5,
            level_amount: Decimal::from(500),
            currency: "RUB".to_string(),
        }
    }

    #[test]
    fn test_parse_status() {
        assert_matches!(parse_status("succeeded"), Ok(DonationStatus::Succeeded));
        assert_matches!(parse_status("pending"), Ok(DonationStatus::Pending));
        assert_matches!(
            parse_status("refunded"),
            Err(AscentError::Provider(ProviderError::UnknownStatus(_)))
        );
    }

    #[tokio::test]
    async fn test_create_checkout_sends_idempotence_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/payments"))
            .and(header_exists("Idempotence-Key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pay-123",
                "status": "pending",
                "amount": {"value": "500.00", "currency": "RUB"},
                "confirmation": {"confirmation_url": "https://pay.example/confirm"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = PaymentService::new(test_config(server.uri())).unwrap();
        let checkout = service
            .create_checkout(Decimal::from(500), "Level 3 donation")
            .await
            .unwrap();

        assert_eq!(checkout.payment_id, "pay-123");
        assert_eq!(checkout.confirmation_url, "https://pay.example/confirm");
    }

    #[tokio::test]
    async fn test_get_status_maps_provider_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payments/pay-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pay-123",
                "status": "succeeded",
                "amount": {"value": "500.00", "currency": "RUB"}
            })))
            .mount(&server)
            .await;

        let service = PaymentService::new(test_config(server.uri())).unwrap();
        let status = service.get_status("pay-123").await.unwrap();
        assert_eq!(status, DonationStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payments/pay-404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let service = PaymentService::new(test_config(server.uri())).unwrap();
        let err = service.get_status("pay-404").await.unwrap_err();
        assert_matches!(
            err,
            AscentError::Provider(ProviderError::RequestFailed(_))
        );
    }
}

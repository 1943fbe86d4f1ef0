//! Razorpay client.
//!
//! Orders are created before online checkout, checkout results are verified by
//! signature, and refunds are issued when an owner approves a cancellation.

use crate::config::RazorpayConfig;
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use service_core::utils::signature::verify_hmac_sha256_hex;
use std::time::Duration;

pub const CURRENCY: &str = "INR";

#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    config: RazorpayConfig,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    /// Paise.
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct RefundRequest {
    amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayRefund {
    pub id: String,
    pub payment_id: String,
    pub amount: i64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    code: String,
    description: String,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Whether both key id and secret are set.
    pub fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.expose_secret().is_empty()
    }

    /// Public key id handed to the checkout widget.
    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    pub async fn create_order(
        &self,
        amount: i64,
        receipt: &str,
        notes: Option<serde_json::Value>,
    ) -> Result<RazorpayOrder> {
        self.ensure_configured()?;

        let request = CreateOrderRequest {
            amount,
            currency: CURRENCY,
            receipt,
            notes,
        };
        let url = format!("{}/orders", self.config.api_base_url);

        let order: RazorpayOrder = self.post(&url, &request).await?;
        tracing::info!(
            order_id = %order.id,
            amount = order.amount,
            receipt,
            "Razorpay order created"
        );
        Ok(order)
    }

    /// Refunds `amount` paise of a captured payment.
    pub async fn refund_payment(
        &self,
        payment_id: &str,
        amount: i64,
        notes: Option<serde_json::Value>,
    ) -> Result<RazorpayRefund> {
        self.ensure_configured()?;

        let url = format!("{}/payments/{}/refund", self.config.api_base_url, payment_id);
        let refund: RazorpayRefund = self.post(&url, &RefundRequest { amount, notes }).await?;
        tracing::info!(
            refund_id = %refund.id,
            payment_id = %refund.payment_id,
            amount = refund.amount,
            status = %refund.status,
            "Razorpay refund issued"
        );
        Ok(refund)
    }

    /// Checks a checkout signature: `HMAC-SHA256(order_id + "|" + payment_id, key_secret)`.
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool> {
        let payload = format!("{}|{}", order_id, payment_id);
        let is_valid =
            verify_hmac_sha256_hex(self.config.key_secret.expose_secret(), &payload, signature)?;

        if is_valid {
            tracing::info!(order_id, payment_id, "Payment signature verified");
        } else {
            tracing::warn!(order_id, payment_id, "Payment signature verification failed");
        }
        Ok(is_valid)
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(anyhow!("Razorpay credentials not configured"))
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .traced_post(url)
            .basic_auth(&self.config.key_id, self.config.key_secret.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(status = %status, url, "Razorpay response");

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        let detail = serde_json::from_str::<RazorpayError>(&text)
            .map(|e| format!("{} - {}", e.error.code, e.error.description))
            .unwrap_or(text);
        tracing::error!(status = %status, error = %detail, "Razorpay request failed");
        Err(anyhow!("Razorpay error ({}): {}", status, detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;
    use service_core::utils::signature::hmac_sha256_hex;

    fn config(key_id: &str, secret: &str, base: &str) -> RazorpayConfig {
        RazorpayConfig {
            key_id: key_id.to_string(),
            key_secret: Secret::new(secret.to_string()),
            api_base_url: base.to_string(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn configured_only_with_both_keys() {
        let client = RazorpayClient::new(config("rzp_test_1", "s3cret", "http://x")).unwrap();
        assert!(client.is_configured());
        assert_eq!(client.key_id(), "rzp_test_1");

        let client = RazorpayClient::new(config("rzp_test_1", "", "http://x")).unwrap();
        assert!(!client.is_configured());
    }

    #[test]
    fn accepts_signature_over_order_and_payment() {
        let client = RazorpayClient::new(config("k", "my_secret_key", "http://x")).unwrap();
        let signature = hmac_sha256_hex("my_secret_key", "order_123|pay_456").unwrap();

        assert!(client
            .verify_payment_signature("order_123", "pay_456", &signature)
            .unwrap());
        assert!(!client
            .verify_payment_signature("order_123", "pay_999", &signature)
            .unwrap());
        assert!(!client
            .verify_payment_signature("order_123", "pay_456", "not-a-signature")
            .unwrap());
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_orders() {
        let client = RazorpayClient::new(config("", "", "http://127.0.0.1:9")).unwrap();
        let err = client.create_order(1_000, "r-1", None).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn creates_orders_and_refunds_against_api() {
        use wiremock::matchers::{body_partial_json, header_exists, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(header_exists("authorization"))
            .and(body_partial_json(serde_json::json!({ "amount": 300000, "currency": "INR" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "order_abc",
                "amount": 300000,
                "currency": "INR",
                "receipt": "b-1",
                "status": "created"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/payments/pay_1/refund"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "code": "BAD_REQUEST_ERROR", "description": "fully refunded already" }
            })))
            .mount(&server)
            .await;

        let client = RazorpayClient::new(config("k", "s", &server.uri())).unwrap();

        let order = client.create_order(300_000, "b-1", None).await.unwrap();
        assert_eq!(order.id, "order_abc");

        let err = client.refund_payment("pay_1", 100, None).await.unwrap_err();
        assert!(err.to_string().contains("fully refunded already"));
    }
}

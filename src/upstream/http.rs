use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{Upstream, UpstreamError, UpstreamResult};
use crate::models::booking::{Booking, NewPayment};
use crate::models::order::{DispatchLine, OrderDraft};
use crate::models::product::Product;
use crate::models::quotation::Quotation;

/// REST client for the order backend, rooted at e.g.
/// `https://shop.example.com/api/gift-box/`.
pub struct HttpUpstream {
    client: Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &str, timeout: Duration) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}/{}", self.base_url, path))
    }

    async fn send(&self, req: RequestBuilder) -> UpstreamResult<Response> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Request("Request timed out".to_string())
            } else {
                UpstreamError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%status, body = %body, "Upstream rejected request");
        Err(UpstreamError::Rejected {
            status: status.as_u16(),
            message: error_message(&body)
                .unwrap_or_else(|| format!("Request failed with status {status}")),
        })
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> UpstreamResult<T> {
        let response = self.send(req).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }

    async fn bytes(&self, req: RequestBuilder) -> UpstreamResult<Vec<u8>> {
        let response = self.send(req).await?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| UpstreamError::Request(e.to_string()))
    }
}

/// Pulls `message` or `error` out of an error body, falling back to the raw
/// text when it is short enough to show.
fn error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return Some(msg.to_string());
            }
        }
    }
    let trimmed = body.trim();
    (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
}

#[async_trait]
impl Upstream for HttpUpstream {
    #[instrument(skip(self))]
    async fn list_products(&self) -> UpstreamResult<Vec<Product>> {
        self.json(self.request(Method::GET, "products")).await
    }

    #[instrument(skip(self))]
    async fn set_product_active(
        &self,
        serial_number: &str,
        active: bool,
    ) -> UpstreamResult<Product> {
        let req = self
            .request(Method::PATCH, &format!("products/{serial_number}/status"))
            .json(&json!({ "active": active }));
        self.json(req).await
    }

    #[instrument(skip(self))]
    async fn list_quotations(&self) -> UpstreamResult<Vec<Quotation>> {
        self.json(self.request(Method::GET, "quotations")).await
    }

    #[instrument(skip(self, draft))]
    async fn create_quotation(&self, draft: &OrderDraft) -> UpstreamResult<Quotation> {
        self.json(self.request(Method::POST, "quotations").json(draft)).await
    }

    #[instrument(skip(self, draft))]
    async fn update_quotation(&self, id: &str, draft: &OrderDraft) -> UpstreamResult<Quotation> {
        self.json(self.request(Method::PUT, &format!("quotations/{id}")).json(draft))
            .await
    }

    #[instrument(skip(self))]
    async fn book_quotation(&self, id: &str) -> UpstreamResult<Booking> {
        self.json(self.request(Method::POST, &format!("quotations/{id}/book"))).await
    }

    #[instrument(skip(self))]
    async fn cancel_quotation(&self, id: &str) -> UpstreamResult<Quotation> {
        self.json(self.request(Method::PATCH, &format!("quotations/{id}/cancel")))
            .await
    }

    #[instrument(skip(self))]
    async fn quotation_pdf(&self, id: &str) -> UpstreamResult<Vec<u8>> {
        self.bytes(self.request(Method::GET, &format!("quotations/{id}.pdf"))).await
    }

    #[instrument(skip(self))]
    async fn list_bookings(&self) -> UpstreamResult<Vec<Booking>> {
        self.json(self.request(Method::GET, "bookings")).await
    }

    #[instrument(skip(self, draft))]
    async fn create_booking(&self, draft: &OrderDraft) -> UpstreamResult<Booking> {
        self.json(self.request(Method::POST, "bookings").json(draft)).await
    }

    #[instrument(skip(self, payment))]
    async fn record_payment(&self, id: &str, payment: &NewPayment) -> UpstreamResult<Booking> {
        self.json(
            self.request(Method::POST, &format!("bookings/{id}/payments"))
                .json(payment),
        )
        .await
    }

    #[instrument(skip(self, lines))]
    async fn dispatch_booking(&self, id: &str, lines: &[DispatchLine]) -> UpstreamResult<Booking> {
        self.json(
            self.request(Method::PATCH, &format!("bookings/{id}/dispatch"))
                .json(&json!({ "products": lines })),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn deliver_booking(&self, id: &str) -> UpstreamResult<Booking> {
        self.json(self.request(Method::PATCH, &format!("bookings/{id}/deliver")))
            .await
    }

    #[instrument(skip(self))]
    async fn booking_pdf(&self, id: &str) -> UpstreamResult<Vec<u8>> {
        self.bytes(self.request(Method::GET, &format!("bookings/{id}.pdf"))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"message":"Out of stock"}"#).as_deref(), Some("Out of stock"));
        assert_eq!(error_message(r#"{"error":"Invalid id"}"#).as_deref(), Some("Invalid id"));
        assert_eq!(error_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message("   "), None);
        assert_eq!(error_message(&"x".repeat(500)), None);
    }

    #[test]
    fn base_url_is_normalised() {
        let upstream =
            HttpUpstream::new("http://localhost:5000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(upstream.base_url, "http://localhost:5000/api");
    }
}

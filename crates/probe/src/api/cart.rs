//! Cart API client.
//!
//! Thin typed wrapper over the cart endpoints. One client is bound to one
//! bearer token. Nothing is cached: every lookup re-fetches the cart.

use crate::config::ApiSettings;
use crate::data::TestData;
use crate::report::{Attachment, SharedSink};
use crate::result::{ProbeError, ProbeResult};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `include` list requested from the top-products listing
pub const TOP_PRODUCTS_INCLUDE: &str =
    "productTexts,publisher,publisherBrand,publisherSeries,dates,literatureWorkCycle,rating";

/// Status and raw body of a cart API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as received
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the body is empty or not JSON
    pub fn json(&self) -> ProbeResult<Value> {
        if self.body.is_empty() {
            return Err(ProbeError::malformed(format!(
                "status {} with empty body, expected JSON",
                self.status
            )));
        }
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Body is the empty string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// One line of the remote cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Cart line id (used for delete/update)
    pub id: u64,
    /// Catalog product id
    pub goods_id: u64,
    /// Units of this product in the cart
    pub quantity: i64,
    /// Everything else the backend sends
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Token,
    Anonymous,
}

/// Cart API client
#[derive(Debug, Clone)]
pub struct CartApi {
    client: reqwest::Client,
    cart_url: String,
    top_products_url: String,
    token: String,
    sink: SharedSink,
}

impl CartApi {
    /// Build a client from injected settings and test data
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(settings: &ApiSettings, data: &TestData, sink: SharedSink) -> ProbeResult<Self> {
        Self::with_endpoints(
            &settings.cart_url,
            &settings.top_products_url,
            &data.token,
            sink,
        )
    }

    /// Build a client against explicit endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn with_endpoints(
        cart_url: &str,
        top_products_url: &str,
        token: &str,
        sink: SharedSink,
    ) -> ProbeResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            cart_url: cart_url.trim_end_matches('/').to_string(),
            top_products_url: top_products_url.to_string(),
            token: token.to_string(),
            sink,
        })
    }

    /// Base cart endpoint
    #[must_use]
    pub fn cart_url(&self) -> &str {
        &self.cart_url
    }

    // =========================================================================
    // RAW OPERATIONS
    // =========================================================================

    /// `GET {cart}`
    pub async fn view_cart_contents(&self) -> ProbeResult<ApiResponse> {
        self.send("view cart", Method::GET, &self.cart_url, None, Auth::Token)
            .await
    }

    /// `POST {cart}/product` with `{"id": product_id}`
    pub async fn add_product_to_cart(&self, product_id: u64) -> ProbeResult<ApiResponse> {
        let url = format!("{}/product", self.cart_url);
        self.send(
            "add product to cart",
            Method::POST,
            &url,
            Some(json!({ "id": product_id })),
            Auth::Token,
        )
        .await
    }

    /// `DELETE {cart}/product/{line_id}`
    pub async fn delete_product_from_cart(&self, line_id: u64) -> ProbeResult<ApiResponse> {
        let url = format!("{}/product/{line_id}", self.cart_url);
        self.send(
            "delete product from cart",
            Method::DELETE,
            &url,
            None,
            Auth::Token,
        )
        .await
    }

    /// `DELETE {cart}`
    pub async fn clear_cart(&self) -> ProbeResult<ApiResponse> {
        self.send("clear cart", Method::DELETE, &self.cart_url, None, Auth::Token)
            .await
    }

    /// `PUT {cart}` with a single-entry batch `[{"id", "quantity"}]`
    pub async fn update_quantity(&self, line_id: u64, quantity: i64) -> ProbeResult<ApiResponse> {
        self.send(
            "update quantity",
            Method::PUT,
            &self.cart_url,
            Some(json!([{ "id": line_id, "quantity": quantity }])),
            Auth::Token,
        )
        .await
    }

    /// Add a product with an empty `Authorization` header
    pub async fn add_product_without_auth(&self, product_id: u64) -> ProbeResult<ApiResponse> {
        let url = format!("{}/product", self.cart_url);
        self.send(
            "add product without auth",
            Method::POST,
            &url,
            Some(json!({ "id": product_id })),
            Auth::Anonymous,
        )
        .await
    }

    /// Delete a cart line with an empty `Authorization` header
    pub async fn delete_product_without_auth(&self, line_id: u64) -> ProbeResult<ApiResponse> {
        let url = format!("{}/product/{line_id}", self.cart_url);
        self.send(
            "delete product without auth",
            Method::DELETE,
            &url,
            None,
            Auth::Anonymous,
        )
        .await
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    /// Fetch the cart and return the first line holding `product_id`.
    ///
    /// A body without `products` counts as an empty cart.
    pub async fn get_product_in_cart(&self, product_id: u64) -> ProbeResult<Option<CartLine>> {
        let body = self.view_cart_contents().await?.json()?;
        let Some(products) = body.get("products") else {
            return Ok(None);
        };
        let lines: Vec<CartLine> = serde_json::from_value(products.clone())
            .map_err(|e| ProbeError::malformed(format!("cart products: {e}")))?;
        Ok(lines.into_iter().find(|line| line.goods_id == product_id))
    }

    /// Fetch the cart and return all lines.
    ///
    /// # Errors
    ///
    /// Fails with [`ProbeError::MalformedResponse`] if `products` is absent
    pub async fn get_all_products_in_cart(&self) -> ProbeResult<Vec<CartLine>> {
        let body = self.view_cart_contents().await?.json()?;
        let products = body
            .get("products")
            .ok_or_else(|| ProbeError::malformed("cart body has no \"products\" field"))?;
        serde_json::from_value(products.clone())
            .map_err(|e| ProbeError::malformed(format!("cart products: {e}")))
    }

    /// Id of the first product in the top-products listing
    pub async fn get_random_id(&self) -> ProbeResult<u64> {
        self.sink.step("pick product from top listing");
        tracing::debug!(url = %self.top_products_url, "GET");
        let response = self
            .authorized(self.client.get(&self.top_products_url), Auth::Token)
            .query(&[
                ("topCount", "200"),
                ("resultCount", "1"),
                ("include", TOP_PRODUCTS_INCLUDE),
            ])
            .send()
            .await?;
        let response = self.capture(response).await?;
        let body = response.json()?;
        body.pointer("/data/0/attributes/id")
            .and_then(Value::as_u64)
            .ok_or_else(|| ProbeError::malformed("products-top has no data[0].attributes.id"))
    }

    /// True iff `body` is an object containing every one of `fields`
    #[must_use]
    pub fn check_fields_in_body(body: &Value, fields: &[&str]) -> bool {
        body.as_object()
            .is_some_and(|map| fields.iter().all(|f| map.contains_key(*f)))
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    fn authorized(&self, request: reqwest::RequestBuilder, auth: Auth) -> reqwest::RequestBuilder {
        let token = match auth {
            Auth::Token => self.token.as_str(),
            Auth::Anonymous => "",
        };
        request.header(AUTHORIZATION, token).header(USER_AGENT, "")
    }

    async fn send(
        &self,
        step: &str,
        method: Method,
        url: &str,
        payload: Option<Value>,
        auth: Auth,
    ) -> ProbeResult<ApiResponse> {
        self.sink.step(step);
        tracing::debug!(%method, url, "cart request");

        let mut request = self.authorized(self.client.request(method, url), auth);
        if let Some(ref payload) = payload {
            self.sink
                .attach(Attachment::json("request payload", payload.to_string()));
            request = request.json(payload);
        }

        let response = request.send().await?;
        self.capture(response).await
    }

    async fn capture(&self, response: reqwest::Response) -> ProbeResult<ApiResponse> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, bytes = body.len(), "cart response");

        let attachment = if serde_json::from_str::<Value>(&body).is_ok() {
            Attachment::json("response", body.clone())
        } else {
            Attachment::text("response", body.clone())
        };
        self.sink.attach(attachment);

        Ok(ApiResponse { status, body })
    }
}

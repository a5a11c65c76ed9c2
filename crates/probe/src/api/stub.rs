//! In-process cart backend for tests.
//!
//! Mirrors the status codes and error bodies of the live cart service
//! closely enough to exercise the client, fixtures and API scenarios.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::CartApi;
use crate::report::SharedSink;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct StubCart {
    products: Vec<Value>,
    next_line: u64,
    omit_products: bool,
    user_agents: Vec<String>,
}

type Shared = Arc<Mutex<StubCart>>;

/// Running stub bound to an ephemeral localhost port
#[derive(Debug, Clone)]
pub(crate) struct StubServer {
    base: String,
    state: Shared,
}

impl StubServer {
    pub(crate) const TOP_PRODUCT_ID: u64 = 2_425_429;

    pub(crate) async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(StubCart {
            next_line: 1000,
            ..StubCart::default()
        }));
        let app = Router::new()
            .route("/api/v1/cart", get(view).delete(clear).put(update))
            .route("/api/v1/cart/product", post(add))
            .route("/api/v1/cart/product/{id}", delete(remove))
            .route("/api/v2/products-top", get(top))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            state,
        }
    }

    pub(crate) fn cart_url(&self) -> String {
        format!("{}/api/v1/cart", self.base)
    }

    pub(crate) fn top_products_url(&self) -> String {
        format!("{}/api/v2/products-top", self.base)
    }

    pub(crate) fn api(&self, sink: SharedSink) -> CartApi {
        CartApi::with_endpoints(&self.cart_url(), &self.top_products_url(), "Bearer stub", sink)
            .unwrap()
    }

    pub(crate) fn seed(&self, products: Value) {
        let mut cart = self.state.lock().unwrap();
        cart.products = products.as_array().cloned().unwrap_or_default();
    }

    pub(crate) fn drop_products_field(&self) {
        self.state.lock().unwrap().omit_products = true;
    }

    pub(crate) fn product_count(&self) -> usize {
        self.state.lock().unwrap().products.len()
    }

    pub(crate) fn user_agents(&self) -> Vec<String> {
        self.state.lock().unwrap().user_agents.clone()
    }
}

fn unauthorized(state: &Shared, headers: &HeaderMap) -> Option<Response> {
    let agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("<absent>")
        .to_string();
    state.lock().unwrap().user_agents.push(agent);

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if token.is_empty() {
        Some(message(StatusCode::UNAUTHORIZED, "Authorization обязательное поле"))
    } else {
        None
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text, "requestId": "stub-request" }))).into_response()
}

async fn view(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(denied) = unauthorized(&state, &headers) {
        return denied;
    }
    let cart = state.lock().unwrap();
    let cost: i64 = cart
        .products
        .iter()
        .map(|p| p["quantity"].as_i64().unwrap_or(0) * 100)
        .sum();
    let mut body = json!({
        "addBonuses": 0,
        "cost": cost,
        "costGiftWrap": 0,
        "costWithBonuses": cost,
        "costWithSale": cost,
        "disabledProducts": [],
        "discount": 0,
        "gifts": [],
        "preorderProducts": [],
        "promoCode": null,
        "weight": 0
    });
    if !cart.omit_products {
        body["products"] = Value::Array(cart.products.clone());
    }
    Json(body).into_response()
}

async fn add(State(state): State<Shared>, headers: HeaderMap, Json(req): Json<Value>) -> Response {
    if let Some(denied) = unauthorized(&state, &headers) {
        return denied;
    }
    let goods_id = req["id"].as_u64().unwrap_or(0);
    if goods_id == 0 {
        let body = json!({
            "errors": [{
                "code": "422",
                "source": {"pointer": "id"},
                "status": "422",
                "title": "Значение недопустимо."
            }]
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
    }
    let mut cart = state.lock().unwrap();
    cart.next_line += 1;
    let line = cart.next_line;
    cart.products
        .push(json!({ "id": line, "goodsId": goods_id, "quantity": 1 }));
    StatusCode::OK.into_response()
}

async fn remove(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    if let Some(denied) = unauthorized(&state, &headers) {
        return denied;
    }
    let mut cart = state.lock().unwrap();
    let before = cart.products.len();
    cart.products.retain(|p| p["id"].as_u64() != Some(id));
    if cart.products.len() == before {
        return message(StatusCode::NOT_FOUND, "товар в корзине не найден");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn clear(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(denied) = unauthorized(&state, &headers) {
        return denied;
    }
    state.lock().unwrap().products.clear();
    StatusCode::NO_CONTENT.into_response()
}

async fn update(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(batch): Json<Vec<Value>>,
) -> Response {
    if let Some(denied) = unauthorized(&state, &headers) {
        return denied;
    }
    let mut cart = state.lock().unwrap();
    for entry in &batch {
        let quantity = entry["quantity"].as_i64().unwrap_or(0);
        if quantity < 0 {
            return message(StatusCode::UNPROCESSABLE_ENTITY, "422 - error");
        }
        let id = entry["id"].as_u64();
        if let Some(line) = cart.products.iter_mut().find(|p| p["id"].as_u64() == id) {
            line["quantity"] = json!(quantity);
        }
    }
    (StatusCode::OK, Json(json!({ "products": cart.products.clone() }))).into_response()
}

async fn top(
    axum::extract::Query(params): axum::extract::Query<std::collections::HashMap<String, String>>,
) -> Response {
    if params.get("topCount").map(String::as_str) != Some("200")
        || params.get("resultCount").map(String::as_str) != Some("1")
        || !params.contains_key("include")
    {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!({
        "data": [{ "attributes": { "id": StubServer::TOP_PRODUCT_ID } }]
    }))
    .into_response()
}

//! Cart API scenarios.

use crate::api::{ApiResponse, CartApi};
use crate::fixture::{CartItem, FixtureManager};
use crate::harness::{TestCase, TestSuite};
use crate::result::{ensure, ensure_eq, ProbeError, ProbeResult};
use crate::session::ApiSession;
use futures::FutureExt;
use serde_json::Value;
use std::future::Future;

/// Fields every cart view must carry
pub const CART_FIELDS: [&str; 12] = [
    "addBonuses",
    "cost",
    "costGiftWrap",
    "costWithBonuses",
    "costWithSale",
    "disabledProducts",
    "discount",
    "gifts",
    "preorderProducts",
    "products",
    "promoCode",
    "weight",
];

/// Fields of one entry in a 422 `errors` list
pub const VALIDATION_ERROR_FIELDS: [&str; 4] = ["code", "source", "status", "title"];

/// Fields of a `{message, requestId}` error body
pub const MESSAGE_ERROR_FIELDS: [&str; 2] = ["message", "requestId"];

const UNAUTHORIZED_MESSAGE: &str = "Authorization обязательное поле";
const LINE_NOT_FOUND_MESSAGE: &str = "товар в корзине не найден";
const INVALID_VALUE_TITLE: &str = "Значение недопустимо.";
const NEGATIVE_QUANTITY_MESSAGE: &str = "422 - error";

/// Product used by the unauthenticated add probe
pub const UNAUTH_PRODUCT_ID: u64 = 2_425_429;
/// Cart line used by the unauthenticated delete probe
pub const UNAUTH_LINE_ID: u64 = 209_211_661;

/// Positive cart suite with the class-scope request delay
#[must_use]
pub fn positive_suite(session: &ApiSession) -> TestSuite<ApiSession> {
    TestSuite::new("api_positive")
        .with_class_fixture(session.request_delay_fixture())
        .with_test(TestCase::new("view_cart_contents", |s| view_cart_contents(s).boxed()))
        .with_test(TestCase::new("add_product_to_cart", |s| add_product_to_cart(s).boxed()))
        .with_test(TestCase::new("delete_product_from_cart", |s| {
            delete_product_from_cart(s).boxed()
        }))
        .with_test(TestCase::new("clear_cart", |s| clear_cart(s).boxed()))
        .with_test(TestCase::new("update_quantity", |s| update_quantity(s).boxed()))
}

/// Negative cart suite with the class-scope request delay
#[must_use]
pub fn negative_suite(session: &ApiSession) -> TestSuite<ApiSession> {
    TestSuite::new("api_negative")
        .with_class_fixture(session.request_delay_fixture())
        .with_test(TestCase::new("add_product_with_invalid_id", |s| {
            add_product_with_invalid_id(s).boxed()
        }))
        .with_test(TestCase::new("remove_missing_product", |s| {
            remove_missing_product(s).boxed()
        }))
        .with_test(TestCase::new("update_quantity_to_negative", |s| {
            update_quantity_to_negative(s).boxed()
        }))
        .with_test(TestCase::new("add_product_without_auth", |s| {
            add_product_without_auth(s).boxed()
        }))
        .with_test(TestCase::new("delete_product_without_auth", |s| {
            delete_product_without_auth(s).boxed()
        }))
}

/// Run `body` with an ephemeral cart item that is removed afterwards
async fn with_cart_item<F, Fut>(session: &ApiSession, body: F) -> ProbeResult<()>
where
    F: FnOnce(CartItem) -> Fut + Send,
    Fut: Future<Output = ProbeResult<()>> + Send,
{
    let fixture = session.cart_item_fixture();
    let handle = fixture.handle();
    let mut fixtures = FixtureManager::new().with(fixture);
    fixtures.run(|| async move { body(handle.get()?).await }).await
}

fn ensure_fields(body: &Value, fields: &[&str], what: &str) -> ProbeResult<()> {
    ensure(
        CartApi::check_fields_in_body(body, fields),
        format!("{what} is missing some of {fields:?}: {body}"),
    )
}

fn message_of(body: &Value) -> ProbeResult<&str> {
    body.get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| ProbeError::malformed(format!("error body has no message: {body}")))
}

async fn quantity_of(api: &CartApi, product_id: u64) -> ProbeResult<i64> {
    api.get_product_in_cart(product_id)
        .await?
        .map(|line| line.quantity)
        .ok_or_else(|| ProbeError::assertion(format!("product {product_id} is not in the cart")))
}

// =============================================================================
// POSITIVE
// =============================================================================

/// Cart view carries every required field
pub async fn view_cart_contents(session: &ApiSession) -> ProbeResult<()> {
    let response = session.api.view_cart_contents().await?;
    ensure_fields(&response.json()?, &CART_FIELDS, "cart body")?;
    ensure_eq(&response.status, &200, "view cart status")
}

/// Adding a product grows the cart by one
pub async fn add_product_to_cart(session: &ApiSession) -> ProbeResult<()> {
    let api = &session.api;
    let product_id = api.get_random_id().await?;
    let before = api.get_all_products_in_cart().await?.len();
    let response = api.add_product_to_cart(product_id).await?;
    let after = api.get_all_products_in_cart().await?.len();
    if let Some(line) = api.get_product_in_cart(product_id).await? {
        let _ = api.delete_product_from_cart(line.id).await?;
    }

    ensure_eq(&after, &(before + 1), "cart length after add")?;
    ensure_eq(&response.status, &200, "add product status")?;
    ensure(response.is_empty(), format!("add product body not empty: {}", response.body))
}

/// Deleting a line shrinks the cart and removes the product
pub async fn delete_product_from_cart(session: &ApiSession) -> ProbeResult<()> {
    let api = session.api.clone();
    with_cart_item(session, |item| async move {
        let before = api.get_all_products_in_cart().await?.len();
        let response = api.delete_product_from_cart(item.line_id).await?;
        let after = api.get_all_products_in_cart().await?.len();

        ensure_eq(&(after + 1), &before, "cart length after delete")?;
        ensure(
            api.get_product_in_cart(item.product_id).await?.is_none(),
            format!("product {} still in cart", item.product_id),
        )?;
        ensure_eq(&response.status, &204, "delete product status")?;
        ensure(response.is_empty(), format!("delete body not empty: {}", response.body))
    })
    .await
}

/// Clearing empties the cart
pub async fn clear_cart(session: &ApiSession) -> ProbeResult<()> {
    let api = session.api.clone();
    with_cart_item(session, |_item| async move {
        let response = api.clear_cart().await?;
        let remaining = api.get_all_products_in_cart().await?;

        ensure(remaining.is_empty(), format!("{} lines left after clear", remaining.len()))?;
        ensure_eq(&response.status, &204, "clear cart status")?;
        ensure(response.is_empty(), format!("clear body not empty: {}", response.body))
    })
    .await
}

/// Quantity follows 1 -> 5 -> 4
pub async fn update_quantity(session: &ApiSession) -> ProbeResult<()> {
    const INCREASED: i64 = 5;
    const DECREASED: i64 = 4;

    let api = session.api.clone();
    with_cart_item(session, |item| async move {
        let initial = quantity_of(&api, item.product_id).await?;
        let increase = api.update_quantity(item.line_id, INCREASED).await?;
        let after_increase = quantity_of(&api, item.product_id).await?;
        let decrease = api.update_quantity(item.line_id, DECREASED).await?;
        let after_decrease = quantity_of(&api, item.product_id).await?;

        ensure_eq(&initial, &1, "initial quantity")?;
        ensure_eq(&increase.status, &200, "increase status")?;
        ensure_eq(&decrease.status, &200, "decrease status")?;
        ensure_eq(&after_increase, &INCREASED, "quantity after increase")?;
        ensure_eq(&after_decrease, &DECREASED, "quantity after decrease")
    })
    .await
}

// =============================================================================
// NEGATIVE
// =============================================================================

/// Product id 0 is rejected and the cart is unchanged
pub async fn add_product_with_invalid_id(session: &ApiSession) -> ProbeResult<()> {
    let api = &session.api;
    let before = api.get_all_products_in_cart().await?.len();
    let response = api.add_product_to_cart(0).await?;
    let body = response.json()?;
    let after = api.get_all_products_in_cart().await?.len();

    let error = body
        .pointer("/errors/0")
        .ok_or_else(|| ProbeError::malformed(format!("no errors[0] in {body}")))?;
    ensure_fields(error, &VALIDATION_ERROR_FIELDS, "validation error")?;
    ensure_eq(&error["title"].as_str(), &Some(INVALID_VALUE_TITLE), "error title")?;
    ensure_eq(&after, &before, "cart length")?;
    ensure_eq(&response.status, &422, "add invalid id status")
}

/// Deleting an already removed line yields 404 and changes nothing
pub async fn remove_missing_product(session: &ApiSession) -> ProbeResult<()> {
    let api = &session.api;
    let product_id = api.get_random_id().await?;
    let _ = api.add_product_to_cart(product_id).await?;
    let line = api
        .get_product_in_cart(product_id)
        .await?
        .ok_or_else(|| ProbeError::assertion(format!("product {product_id} not added")))?;
    let _ = api.delete_product_from_cart(line.id).await?;

    let before = api.get_all_products_in_cart().await?.len();
    let response = api.delete_product_from_cart(line.id).await?;
    let body = response.json()?;
    let after = api.get_all_products_in_cart().await?.len();

    ensure_fields(&body, &MESSAGE_ERROR_FIELDS, "error body")?;
    ensure_eq(&message_of(&body)?, &LINE_NOT_FOUND_MESSAGE, "error message")?;
    ensure_eq(&after, &before, "cart length")?;
    ensure_eq(&response.status, &404, "delete missing status")
}

/// Negative quantity is rejected and the quantity is unchanged
pub async fn update_quantity_to_negative(session: &ApiSession) -> ProbeResult<()> {
    let api = session.api.clone();
    with_cart_item(session, |item| async move {
        let before = quantity_of(&api, item.product_id).await?;
        let response = api.update_quantity(item.line_id, -1).await?;
        let body = response.json()?;
        let after = quantity_of(&api, item.product_id).await?;

        ensure_fields(&body, &MESSAGE_ERROR_FIELDS, "error body")?;
        ensure_eq(&after, &before, "quantity")?;
        ensure_eq(&response.status, &422, "negative quantity status")?;
        ensure_eq(&message_of(&body)?, &NEGATIVE_QUANTITY_MESSAGE, "error message")
    })
    .await
}

fn check_unauthorized(response: &ApiResponse) -> ProbeResult<()> {
    let body = response.json()?;
    ensure_fields(&body, &MESSAGE_ERROR_FIELDS, "error body")?;
    ensure_eq(&message_of(&body)?, &UNAUTHORIZED_MESSAGE, "error message")?;
    ensure_eq(&response.status, &401, "unauthorized status")
}

/// Add without a token is refused
pub async fn add_product_without_auth(session: &ApiSession) -> ProbeResult<()> {
    check_unauthorized(&session.api.add_product_without_auth(UNAUTH_PRODUCT_ID).await?)
}

/// Delete without a token is refused
pub async fn delete_product_without_auth(session: &ApiSession) -> ProbeResult<()> {
    check_unauthorized(&session.api.delete_product_without_auth(UNAUTH_LINE_ID).await?)
}

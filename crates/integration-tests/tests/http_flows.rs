//! End-to-end browser flows against a running storefront.
//!
//! The storefront must run with immediate activation and a seeded catalog.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode, redirect::Policy};

fn base_url() -> String {
    std::env::var("SHOP_TEST_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

fn location(response: &reqwest::Response) -> String {
    response.headers()[reqwest::header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

/// First product ID with an add-to-cart form on the page.
fn first_product_id(html: &str) -> String {
    let start = html.find("/cart/add/").unwrap() + "/cart/add/".len();
    html[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect()
}

async fn signed_in(client: &Client) -> String {
    let base = base_url();
    let username = format!("http{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);

    let response = client
        .post(format!("{base}/register"))
        .form(&[
            ("username", username.as_str()),
            ("email", &format!("{username}@example.com")),
            ("password", "correct-horse-battery"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login"));

    let response = client
        .post(format!("{base}/login"))
        .form(&[("username", username.as_str()), ("password", "correct-horse-battery")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    username
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn http_anonymous_visitors_are_sent_to_login() {
    let response = client().get(format!("{}/cart", base_url())).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn http_register_shop_and_pay_on_delivery() {
    let client = client();
    let base = base_url();
    let username = signed_in(&client).await;

    let home = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(home.status(), StatusCode::OK);
    let html = home.text().await.unwrap();
    assert!(html.contains(&username));
    let product_id = first_product_id(&html);

    let response = client
        .post(format!("{base}/cart/add/{product_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");

    let cart = client.get(format!("{base}/cart")).send().await.unwrap();
    assert!(cart.text().await.unwrap().contains(&format!("/product/{product_id}")));

    let response = client
        .post(format!("{base}/checkout"))
        .form(&[("address", "12 Elm St"), ("payment_method", "COD")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let invoice = location(&response);
    assert!(invoice.starts_with("/orders/") && invoice.ends_with("/invoice"));

    let page = client.get(format!("{base}{invoice}")).send().await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("12 Elm St"));

    let orders = client.get(format!("{base}/orders")).send().await.unwrap();
    let html = orders.text().await.unwrap();
    assert!(html.contains("Placed"));

    let empty = client.get(format!("{base}/checkout")).send().await.unwrap();
    assert_eq!(empty.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&empty), "/cart");
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn http_checkout_without_address_keeps_the_cart() {
    let client = client();
    let base = base_url();
    signed_in(&client).await;

    let html = client
        .get(format!("{base}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let product_id = first_product_id(&html);
    client
        .post(format!("{base}/cart/buy-now/{product_id}"))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{base}/checkout"))
        .form(&[("address", "  "), ("payment_method", "COD")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("delivery address"));

    let checkout = client.get(format!("{base}/checkout")).send().await.unwrap();
    assert_eq!(checkout.status(), StatusCode::OK);
}

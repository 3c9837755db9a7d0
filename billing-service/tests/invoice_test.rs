//! Invoice document integration tests.

mod common;

use billing_service::models::InvoiceDocument;
use common::spawn_app;
use rust_decimal::Decimal;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

async fn fetch_invoice(
    app: &common::TestApp,
    client_id: Uuid,
    language: Option<&str>,
) -> InvoiceDocument {
    let mut url = format!("{}/clients/{}/invoice", app.address, client_id);
    if let Some(lang) = language {
        url.push_str(&format!("?language={lang}"));
    }
    app.client
        .get(url)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid invoice response")
}

#[tokio::test]
async fn vat_is_split_out_of_the_inclusive_total() {
    let app = spawn_app().await;
    let client = app.create_client("900", "0").await;

    let invoice = fetch_invoice(&app, client.client_id, Some("de")).await;

    assert_eq!(invoice.vat.net, dec("832.56"));
    assert_eq!(invoice.vat.tax, dec("67.44"));
    assert_eq!(invoice.vat.total, dec("900"));
    assert_eq!(invoice.vat.rate_pct, dec("8.1"));
}

#[tokio::test]
async fn unknown_language_falls_back_to_german() {
    let app = spawn_app().await;
    let client = app.create_client("900", "0").await;

    let invoice = fetch_invoice(&app, client.client_id, Some("it")).await;
    assert_eq!(invoice.language.as_str(), "de");
    assert!(invoice.html.contains("Rechnung"));

    let invoice = fetch_invoice(&app, client.client_id, None).await;
    assert_eq!(invoice.language.as_str(), "de");
}

#[tokio::test]
async fn french_invoice_uses_french_labels() {
    let app = spawn_app().await;
    let client = app.create_client("900", "0").await;

    let invoice = fetch_invoice(&app, client.client_id, Some("fr")).await;

    assert!(invoice.html.contains("Facture"));
    assert!(invoice.html.contains("Bulletin de versement"));
}

#[tokio::test]
async fn rebuilding_an_invoice_yields_identical_bytes() {
    let app = spawn_app().await;
    let client = app.create_client("900", "0").await;
    app.apply_payment(client.client_id, "400", "transfer").await;

    let first = fetch_invoice(&app, client.client_id, Some("en")).await;
    let second = fetch_invoice(&app, client.client_id, Some("en")).await;

    assert_eq!(first.html, second.html);
    assert_eq!(first.invoice_number, second.invoice_number);
}

#[tokio::test]
async fn slip_amount_is_the_outstanding_balance() {
    let app = spawn_app().await;
    let client = app.create_client("900", "0").await;
    app.apply_payment(client.client_id, "400", "transfer").await;

    let invoice = fetch_invoice(&app, client.client_id, Some("de")).await;

    assert_eq!(invoice.slip.amount, dec("500"));
    assert_eq!(invoice.slip.currency, "CHF");
    assert_eq!(invoice.slip.account, "CH93 0076 2011 6238 5295 7");
    assert_eq!(invoice.slip.reference, "RF18 5390 0754 7034");
    assert!(invoice.slip.debtor.contains("Anna Muster"));
}

#[tokio::test]
async fn slip_follows_further_payments() {
    let app = spawn_app().await;
    let client = app.create_client("900", "0").await;

    app.apply_payment(client.client_id, "400", "transfer").await;
    let invoice = fetch_invoice(&app, client.client_id, Some("de")).await;
    assert_eq!(invoice.slip.amount, dec("500"));

    app.apply_payment(client.client_id, "500", "cash").await;
    let invoice = fetch_invoice(&app, client.client_id, Some("de")).await;
    assert_eq!(invoice.slip.amount, dec("0"));
}

#[tokio::test]
async fn invoice_payment_history_is_newest_first() {
    let app = spawn_app().await;
    let client = app.create_client("900", "0").await;

    app.apply_payment(client.client_id, "100", "cash").await;
    app.apply_payment(client.client_id, "200", "card").await;

    let invoice = fetch_invoice(&app, client.client_id, Some("de")).await;

    assert_eq!(invoice.payments.len(), 2);
    assert_eq!(invoice.payments[0].amount, dec("200"));
    assert_eq!(invoice.payments[1].amount, dec("100"));
}

#[tokio::test]
async fn invoice_for_unknown_client_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/clients/{}/invoice", app.address, Uuid::new_v4()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

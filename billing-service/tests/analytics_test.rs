//! Analytics endpoint integration tests.

mod common;

use chrono::{Datelike, Utc};
use common::spawn_app;
use rust_decimal::Decimal;
use serde_json::json;

fn dec_field(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("expected a decimal string")
        .parse()
        .unwrap()
}

#[tokio::test]
async fn monthly_summary_has_twelve_buckets() {
    let app = spawn_app().await;
    app.create_client("900", "900").await;
    app.create_client("400", "0").await;

    let year = Utc::now().year();
    let body: serde_json::Value = app
        .client
        .get(format!(
            "{}/analytics?time_range=monthly&year={year}",
            app.address
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["time_range"], "monthly");
    assert_eq!(body["year"], year);
    let periods = body["periods"].as_array().unwrap();
    assert_eq!(periods.len(), 12);

    let month = Utc::now().month();
    let label = format!("{year}-{month:02}");
    let bucket = periods
        .iter()
        .find(|p| p["period"] == label.as_str())
        .expect("current month bucket missing");
    assert_eq!(bucket["client_count"], 2);
    assert_eq!(dec_field(&bucket["revenue"]), "1300".parse().unwrap());
    assert_eq!(dec_field(&bucket["paid_sum"]), "900".parse().unwrap());
}

#[tokio::test]
async fn annual_summary_covers_five_years() {
    let app = spawn_app().await;
    app.create_client("900", "900").await;

    let year = Utc::now().year();
    let body: serde_json::Value = app
        .client
        .get(format!(
            "{}/analytics?time_range=annual&year={year}",
            app.address
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["time_range"], "annual");
    let periods = body["periods"].as_array().unwrap();
    assert_eq!(periods.len(), 5);
    assert_eq!(periods[0]["period"], (year - 4).to_string());
    assert_eq!(periods[4]["period"], year.to_string());
    assert_eq!(dec_field(&periods[4]["revenue"]), "900".parse().unwrap());
}

#[tokio::test]
async fn unknown_time_range_defaults_to_monthly() {
    let app = spawn_app().await;

    let body: serde_json::Value = app
        .client
        .get(format!("{}/analytics?time_range=weekly", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["time_range"], "monthly");
    assert_eq!(body["periods"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn status_distribution_and_completion_rate() {
    let app = spawn_app().await;
    app.create_client("900", "900").await;
    app.create_client("400", "100").await;
    let cancelled = app.create_client("200", "0").await;
    app.set_status(cancelled.client_id, "cancelled").await;
    let completed = app.create_client("300", "0").await;
    app.set_status(completed.client_id, "completed").await;

    let body: serde_json::Value = app
        .client
        .get(format!("{}/analytics", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let distribution = &body["status_distribution"];
    assert_eq!(distribution["paid"], 1);
    assert_eq!(distribution["partial"], 1);
    assert_eq!(distribution["cancelled"], 1);
    assert_eq!(distribution["completed"], 1);

    // 2 of 4 ledgers are settled (paid or completed).
    assert_eq!(dec_field(&body["completion_rate"]), "50".parse().unwrap());
}

#[tokio::test]
async fn empty_ledger_produces_a_quiet_summary() {
    let app = spawn_app().await;

    let body: serde_json::Value = app
        .client
        .get(format!("{}/analytics", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(dec_field(&body["growth_pct"]), Decimal::ZERO);
    assert_eq!(dec_field(&body["completion_rate"]), Decimal::ZERO);
    assert_eq!(
        body["status_distribution"],
        json!({}),
        "no ledgers means an empty distribution"
    );
}

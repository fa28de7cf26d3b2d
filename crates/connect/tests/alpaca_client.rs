use std::time::Duration;

use brokersync_connect::AlpacaClient;
use brokersync_core::activities::DestinationAccount;
use brokersync_core::errors::{Error, ErrorKind};
use brokersync_core::sync::SourceActivityProvider;
use chrono::NaiveDate;
use mockito::{Matcher, Server};
use rust_decimal_macros::dec;

fn account() -> DestinationAccount {
    DestinationAccount {
        id: "acc-1".to_string(),
        name: "Alpaca".to_string(),
        currency: "USD".to_string(),
        platform_id: None,
    }
}

fn client(server: &Server) -> AlpacaClient {
    AlpacaClient::new(&server.url(), "key-id", "secret", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn follows_page_token_until_short_page() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/v2/account/activities")
        .match_query(Matcher::Regex("^direction=asc&page_size=2$".into()))
        .match_header("apca-api-key-id", "key-id")
        .match_header("apca-api-secret-key", "secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"id": "id-1", "activity_type": "FILL", "transaction_time": "2024-01-02T15:00:00Z",
                 "side": "buy", "symbol": "AAPL", "qty": "1", "price": "180"},
                {"id": "id-2", "activity_type": "DIV", "date": "2024-01-03",
                 "symbol": "KO", "net_amount": "4.60"}
            ]"#,
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/v2/account/activities")
        .match_query(Matcher::Regex("^direction=asc&page_size=2&page_token=id-2$".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": "id-3", "activity_type": "JNLC", "date": "2024-01-04", "net_amount": "100"}]"#)
        .expect(1)
        .create_async()
        .await;

    let activities = client(&server)
        .with_page_size(2)
        .fetch_activities(&account(), None)
        .await
        .unwrap();

    let ids: Vec<&str> = activities.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["id-1", "id-2", "id-3"]);
    assert_eq!(activities[0].timestamp, "2024-01-02T15:00:00Z");
    assert_eq!(activities[1].timestamp, "2024-01-03");
    assert_eq!(activities[1].amount.as_deref(), Some("4.60"));
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn passes_since_date_as_after() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/account/activities")
        .match_query(Matcher::UrlEncoded("after".into(), "2024-02-01".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let since = NaiveDate::from_ymd_opt(2024, 2, 1);
    let activities = client(&server)
        .fetch_activities(&account(), since)
        .await
        .unwrap();

    assert!(activities.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn reads_cash_balance() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/account")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"account_number": "PA123", "cash": "1234.56", "currency": "USD"}"#)
        .create_async()
        .await;

    let cash = client(&server).fetch_cash_balance(&account()).await.unwrap();
    assert_eq!(cash, dec!(1234.56));
}

#[tokio::test]
async fn classifies_error_statuses() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/account")
        .with_status(401)
        .with_body(r#"{"code": 40110000, "message": "request is not authorized"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/v2/account/activities")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("rate limit exceeded")
        .create_async()
        .await;

    let client = client(&server);
    let err = client.fetch_cash_balance(&account()).await.unwrap_err();
    assert!(matches!(err, Error::Authentication(_)));
    assert!(err.to_string().contains("request is not authorized"));

    let err = client.fetch_activities(&account(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransientNetwork);
}

#[tokio::test]
async fn undecodable_body_is_unexpected() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/account/activities")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client(&server)
        .fetch_activities(&account(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
}

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use brokersync_connect::{AlpacaClient, GhostfolioClient, TomlSymbolMapFile};
use brokersync_core::{LogProgressReporter, SyncOrchestrator, SyncReport};
use config::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let log_format = std::env::var("BROKERSYNC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn connect(config: &Config) -> brokersync_core::Result<(AlpacaClient, GhostfolioClient)> {
    let source = AlpacaClient::new(
        &config.alpaca_base_url,
        &config.alpaca_api_key,
        &config.alpaca_secret_key,
        config.http_timeout,
    )?;
    let ledger = GhostfolioClient::connect(
        &config.ghost_host,
        config.ghost_token.as_deref(),
        config.ghost_key.as_deref(),
        config.http_timeout,
    )
    .await?;
    Ok((source, ledger))
}

/// Runs the configured operation. Always yields a report; a client that
/// cannot be set up produces a `Failed` report from `Idle`.
async fn run(config: &Config) -> SyncReport {
    let (source, ledger) = match connect(config).await {
        Ok(clients) => clients,
        Err(err) => {
            tracing::error!("Failed to set up clients: {}", err);
            let mut report = SyncReport::new(config.sync.mode);
            report.fail(&err);
            return report;
        }
    };

    let orchestrator = SyncOrchestrator::new(
        Arc::new(source),
        Arc::new(ledger),
        Arc::new(TomlSymbolMapFile::new(&config.symbol_mapping_file)),
        Arc::new(LogProgressReporter),
    );
    orchestrator.run(&config.sync).await
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::from_env()?;
    init_tracing();

    tracing::info!(
        "Running {} against account '{}' on {}",
        config.sync.mode,
        config.sync.account_name,
        config.ghost_host
    );
    let report = run(&config).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_success() {
        return Ok(ExitCode::FAILURE);
    }
    if report.has_failures() {
        tracing::warn!(
            "Run finished with {} failed item(s), see the report for details",
            report.failed
        );
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokersync_core::{ErrorKind, SyncState};
    use mockito::Server;

    fn config_for(host: &str) -> Config {
        let host = host.to_string();
        Config::from_lookup(|key| match key {
            "GHOST_HOST" => Some(host.clone()),
            "GHOST_KEY" => Some("user-key".to_string()),
            "OPERATION" => Some("list".to_string()),
            "RETRY_MAX_ATTEMPTS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_rejected_access_key_yields_failed_report() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/anonymous")
            .with_status(403)
            .with_body(r#"{"message": "Forbidden", "statusCode": 403}"#)
            .create_async()
            .await;

        let report = run(&config_for(&server.url())).await;

        assert_eq!(report.state, SyncState::Failed);
        let cause = report.cause.as_ref().unwrap();
        assert_eq!(cause.kind, ErrorKind::Authentication);
        assert_eq!(cause.failed_in, SyncState::Idle);
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_list_runs_after_token_exchange() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/auth/anonymous")
            .with_status(201)
            .with_body(r#"{"authToken": "jwt-1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/account")
            .with_status(200)
            .with_body(r#"{"accounts": [{"id": "acc-1", "name": "Alpaca", "currency": "USD"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/order")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"activities": [{"id": "o-1", "accountId": "acc-1", "comment": "source_id=a-1"}]}"#)
            .create_async()
            .await;

        let report = run(&config_for(&server.url())).await;

        assert_eq!(report.state, SyncState::Done);
        assert_eq!(report.listed, 1);
    }
}

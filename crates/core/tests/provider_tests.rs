// ═══════════════════════════════════════════════════════════════════
// Provider Tests — Registry, proxy payload decoding, HTTP client
// ═══════════════════════════════════════════════════════════════════

use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;

use portfolio_aggregator_core::errors::CoreError;
use portfolio_aggregator_core::models::exchange::ExchangeInfo;
use portfolio_aggregator_core::models::settings::ServerSettings;
use portfolio_aggregator_core::providers::http_client::{
    parse_assets_body, parse_hourly_body, HttpExchangeClient,
};
use portfolio_aggregator_core::providers::registry::ExchangeRegistry;
use portfolio_aggregator_core::providers::traits::ExchangeDataSource;

// ═══════════════════════════════════════════════════════════════════
// Test Helpers — fake proxy
// ═══════════════════════════════════════════════════════════════════

const TEST_KEY: &str = "test-key";

const BINANCE_BODY: &str = r#"{
    "assets": {
        "SOL": {"symbol": "SOL", "free": "12.5", "usd_value": 1875.0, "price": "150", "price_change_24h": -0.8},
        "BTC": {"symbol": "BTC", "free": 0.5, "usd_value": "30000", "price": 60000, "price_change_24h": "2.1"}
    }
}"#;

const HOURLY_BODY: &str = r#"{
    "days": {
        "2025-01-14": [{"time": "22:00", "total_portfolio_usd": 100.0}],
        "2025-01-15": [{"time": "23:00", "total_portfolio_usd": "110"}]
    }
}"#;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("X-API-KEY")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == TEST_KEY)
}

async fn binance(headers: HeaderMap) -> (StatusCode, String) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "{}".into());
    }
    (StatusCode::OK, BINANCE_BODY.into())
}

async fn hourly(headers: HeaderMap) -> (StatusCode, String) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "{}".into());
    }
    (StatusCode::OK, HOURLY_BODY.into())
}

async fn broken() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded".into())
}

async fn no_assets() -> (StatusCode, String) {
    (StatusCode::OK, r#"{"error": "exchange offline"}"#.into())
}

/// Start the fake proxy on an ephemeral port and return its base URL.
async fn spawn_proxy() -> String {
    let app = Router::new()
        .route("/binance-data", get(binance))
        .route("/calcs-data", get(hourly))
        .route("/bybit-assets", get(broken))
        .route("/gate-assets", get(no_assets));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn server(base_url: &str, api_key: Option<&str>) -> ServerSettings {
    ServerSettings {
        base_url: base_url.to_string(),
        api_key: api_key.map(str::to_string),
        request_timeout_secs: 5,
        ..ServerSettings::default()
    }
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeRegistry
// ═══════════════════════════════════════════════════════════════════

mod registry {
    use super::*;

    #[test]
    fn new_is_empty() {
        let registry = ExchangeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn defaults_in_fetch_order() {
        let registry = ExchangeRegistry::new_with_defaults();
        let keys: Vec<&str> = registry.exchanges().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["binanceAsset", "bitgetAsset", "gate_ioAssets", "bybitAssets"]
        );
        assert_eq!(ExchangeRegistry::default(), registry);
    }

    #[test]
    fn display_name_lookup() {
        let registry = ExchangeRegistry::new_with_defaults();
        assert_eq!(registry.display_name("gate_ioAssets"), "Gate.io");
        assert_eq!(registry.display_name("krakenAssets"), "krakenAssets");
    }

    #[test]
    fn get_by_key() {
        let registry = ExchangeRegistry::new_with_defaults();
        assert_eq!(registry.get("bybitAssets").unwrap().route, "bybit-assets");
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn register_appends_new_keys() {
        let mut registry = ExchangeRegistry::new_with_defaults();
        registry.register(ExchangeInfo::new("krakenAssets", "Kraken", "kraken-assets"));
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.exchanges()[4].name, "Kraken");
    }

    #[test]
    fn register_same_key_replaces_in_place() {
        let mut registry = ExchangeRegistry::new_with_defaults();
        registry.register(ExchangeInfo::new("bitgetAsset", "Bitget Spot", "bitget-spot"));
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.exchanges()[1].name, "Bitget Spot");
        assert_eq!(registry.display_name("bitgetAsset"), "Bitget Spot");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Assets payload
// ═══════════════════════════════════════════════════════════════════

mod assets_payload {
    use super::*;

    #[test]
    fn keeps_upstream_order_and_reads_mixed_numbers() {
        let assets = parse_assets_body("binance-data", BINANCE_BODY).unwrap();
        assert_eq!(assets.len(), 2);

        assert_eq!(assets[0].symbol, "SOL");
        assert_eq!(assets[0].free_amount, 12.5);
        assert_eq!(assets[0].usd_value, Some(1875.0));
        assert_eq!(assets[0].price, Some(150.0));
        assert_eq!(assets[0].price_change_24h_percent, -0.8);

        assert_eq!(assets[1].symbol, "BTC");
        assert_eq!(assets[1].usd_value, Some(30000.0));
        assert_eq!(assets[1].price_change_24h_percent, 2.1);
    }

    #[test]
    fn optional_fields_default() {
        let body = r#"{"assets": {"DOT": {"symbol": "DOT", "free": 3}}}"#;
        let assets = parse_assets_body("bitget-assets", body).unwrap();
        assert_eq!(assets[0].usd_value, None);
        assert_eq!(assets[0].price, None);
        assert_eq!(assets[0].price_change_24h_percent, 0.0);
    }

    #[test]
    fn empty_strings_and_nulls_are_absent() {
        let body = r#"{"assets": {"DOT": {"free": "1", "usd_value": "", "price": null}}}"#;
        let assets = parse_assets_body("bitget-assets", body).unwrap();
        assert_eq!(assets[0].usd_value, None);
        assert_eq!(assets[0].price, None);
    }

    #[test]
    fn symbol_falls_back_to_key() {
        let body = r#"{"assets": {"ADA": {"free": 100}, "XRP": {"symbol": "", "free": 5}}}"#;
        let assets = parse_assets_body("gate-assets", body).unwrap();
        assert_eq!(assets[0].symbol, "ADA");
        assert_eq!(assets[1].symbol, "XRP");
    }

    #[test]
    fn key_is_kept_apart_from_symbol_field() {
        let body = r#"{"assets": {
            "BTC": {"symbol": "XBT", "free": "1", "usd_value": "100"},
            "XBT": {"free": "2", "usd_value": "200"}
        }}"#;
        let assets = parse_assets_body("binance-data", body).unwrap();
        assert_eq!(assets[0].key, "BTC");
        assert_eq!(assets[0].symbol, "XBT");
        assert_eq!(assets[1].key, "XBT");
        assert_eq!(assets[1].symbol, "XBT");
    }

    #[test]
    fn amount_used_when_free_missing() {
        let body = r#"{"assets": {"ADA": {"amount": "7.25"}, "XRP": {}}}"#;
        let assets = parse_assets_body("gate-assets", body).unwrap();
        assert_eq!(assets[0].free_amount, 7.25);
        assert_eq!(assets[1].free_amount, 0.0);
    }

    #[test]
    fn empty_assets_object() {
        let assets = parse_assets_body("bybit-assets", r#"{"assets": {}}"#).unwrap();
        assert!(assets.is_empty());
    }

    #[test]
    fn missing_assets_object_is_malformed() {
        let err = parse_assets_body("bybit-assets", r#"{"error": "down"}"#).unwrap_err();
        match err {
            CoreError::MalformedData { context, message } => {
                assert_eq!(context, "bybit-assets");
                assert!(message.contains("assets"));
            }
            other => panic!("expected MalformedData, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = parse_assets_body("bybit-assets", "<html>502</html>").unwrap_err();
        assert!(matches!(err, CoreError::MalformedData { .. }));
    }

    #[test]
    fn non_numeric_string_is_malformed() {
        let body = r#"{"assets": {"BTC": {"free": "lots"}}}"#;
        let err = parse_assets_body("binance-data", body).unwrap_err();
        assert!(err.to_string().contains("asset BTC"));
    }

    #[test]
    fn nan_is_rejected() {
        let body = r#"{"assets": {"BTC": {"free": 1, "usd_value": "NaN"}}}"#;
        let err = parse_assets_body("binance-data", body).unwrap_err();
        assert!(matches!(err, CoreError::MalformedData { .. }));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Hourly payload
// ═══════════════════════════════════════════════════════════════════

mod hourly_payload {
    use super::*;

    #[test]
    fn days_keep_upstream_order() {
        let series = parse_hourly_body("calcs-data", HOURLY_BODY).unwrap();
        assert_eq!(series.days.len(), 2);
        assert_eq!(series.days[0].day, "2025-01-14");
        assert_eq!(series.days[1].samples[0].total_portfolio_usd, 110.0);
        assert_eq!(series.total_samples(), 2);
    }

    #[test]
    fn missing_days_object_is_malformed() {
        let err = parse_hourly_body("calcs-data", r#"{"hours": []}"#).unwrap_err();
        assert!(matches!(err, CoreError::MalformedData { .. }));
    }

    #[test]
    fn bad_day_is_malformed() {
        let body = r#"{"days": {"2025-01-15": [{"time": "01:00"}]}}"#;
        let err = parse_hourly_body("calcs-data", body).unwrap_err();
        assert!(err.to_string().contains("day 2025-01-15"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// HttpExchangeClient
// ═══════════════════════════════════════════════════════════════════

mod http_client {
    use super::*;

    #[test]
    fn missing_api_key_is_config_error() {
        let err = HttpExchangeClient::new(&server("http://127.0.0.1:5001", None))
            .err()
            .unwrap();
        match err {
            CoreError::Config(message) => assert!(message.contains("PORTFOLIO_API_KEY")),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn blank_api_key_is_config_error() {
        let result = HttpExchangeClient::new(&server("http://127.0.0.1:5001", Some("  ")));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn url_joins_base_and_route() {
        let client =
            HttpExchangeClient::new(&server("http://127.0.0.1:5001/", Some(TEST_KEY))).unwrap();
        assert_eq!(client.url_for("binance-data"), "http://127.0.0.1:5001/binance-data");
        assert_eq!(client.url_for("/calcs-data"), "http://127.0.0.1:5001/calcs-data");
        assert_eq!(client.name(), "ExchangeProxy");
    }

    #[tokio::test]
    async fn fetches_assets_with_api_key() {
        let base = spawn_proxy().await;
        let client = HttpExchangeClient::new(&server(&base, Some(TEST_KEY))).unwrap();
        let assets = client.fetch_exchange_assets("binance-data").await.unwrap();
        let symbols: Vec<&str> = assets.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["SOL", "BTC"]);
    }

    #[tokio::test]
    async fn wrong_api_key_is_fetch_error() {
        let base = spawn_proxy().await;
        let client = HttpExchangeClient::new(&server(&base, Some("wrong"))).unwrap();
        let err = client.fetch_exchange_assets("binance-data").await.unwrap_err();
        match err {
            CoreError::Fetch { route, message } => {
                assert_eq!(route, "binance-data");
                assert!(message.contains("401"));
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_fetch_error() {
        let base = spawn_proxy().await;
        let client = HttpExchangeClient::new(&server(&base, Some(TEST_KEY))).unwrap();
        let err = client.fetch_exchange_assets("bybit-assets").await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn body_without_assets_is_malformed() {
        let base = spawn_proxy().await;
        let client = HttpExchangeClient::new(&server(&base, Some(TEST_KEY))).unwrap();
        let err = client.fetch_exchange_assets("gate-assets").await.unwrap_err();
        assert!(matches!(err, CoreError::MalformedData { .. }));
    }

    #[tokio::test]
    async fn fetches_hourly_series() {
        let base = spawn_proxy().await;
        let client = HttpExchangeClient::new(&server(&base, Some(TEST_KEY))).unwrap();
        let series = client.fetch_hourly_series().await.unwrap();
        assert_eq!(series.days.len(), 2);
    }

    #[tokio::test]
    async fn unreachable_proxy_is_fetch_error() {
        let client = HttpExchangeClient::new(&server("http://127.0.0.1:1", Some(TEST_KEY))).unwrap();
        let err = client.fetch_exchange_assets("binance-data").await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch { .. }));
    }
}

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::krx::client::KrxClient;
use crate::krx::{KrxMarket, MarketDataProvider};

mod config;
mod kr_market;
mod krx;
mod rank;

const TOP_N: usize = 3;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let provider = KrxClient::from_settings(&settings)?;
    let state = AppState {
        provider: Arc::new(provider),
    };

    // Only the web frontend is allowed to call this service.
    let allowed_origin = settings
        .cors_allow_origin
        .as_deref()
        .unwrap_or(DEFAULT_ALLOWED_ORIGIN)
        .parse::<HeaderValue>()?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/top-stocks", get(top_stocks))
        .route("/api/kospi-stocks", get(kospi_stocks))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "market api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn MarketDataProvider>,
}

#[derive(Debug, Serialize)]
struct StockInfo {
    rank: i32,
    name: String,
    code: String,
    #[serde(rename = "changeRate")]
    change_rate: f64,
}

#[derive(Debug, Serialize)]
struct TickerEntry {
    code: String,
    name: String,
}

async fn top_stocks(State(state): State<AppState>) -> Result<Json<Vec<StockInfo>>, StatusCode> {
    let trade_date = kr_market::today_kst(Utc::now()).map_err(internal_error)?;

    let quotes = state
        .provider
        .fetch_market_ohlcv(trade_date, KrxMarket::Kospi)
        .await
        .map_err(internal_error)?;

    let movers = rank::top_movers(&quotes, TOP_N);

    let mut out = Vec::with_capacity(movers.len());
    for (idx, mover) in movers.into_iter().enumerate() {
        let name = state
            .provider
            .fetch_ticker_name(&mover.ticker)
            .await
            .map_err(internal_error)?;
        out.push(StockInfo {
            rank: idx as i32 + 1,
            name,
            code: mover.ticker,
            change_rate: mover.change_rate,
        });
    }

    Ok(Json(out))
}

async fn kospi_stocks(State(state): State<AppState>) -> Result<Json<Vec<TickerEntry>>, StatusCode> {
    let trade_date = kr_market::today_kst(Utc::now()).map_err(internal_error)?;

    let codes = state
        .provider
        .fetch_ticker_list(trade_date, KrxMarket::Kospi)
        .await
        .map_err(internal_error)?;

    let mut out = Vec::with_capacity(codes.len());
    for code in codes {
        let name = state
            .provider
            .fetch_ticker_name(&code)
            .await
            .map_err(internal_error)?;
        out.push(TickerEntry { code, name });
    }

    Ok(Json(out))
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %e, "market data request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::krx::MarketQuote;
    use anyhow::Context;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct StubProvider {
        quotes: Vec<MarketQuote>,
        tickers: Vec<String>,
        names: HashMap<String, String>,
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for StubProvider {
        async fn fetch_market_ohlcv(
            &self,
            _trade_date: NaiveDate,
            _market: KrxMarket,
        ) -> anyhow::Result<Vec<MarketQuote>> {
            Ok(self.quotes.clone())
        }

        async fn fetch_ticker_list(
            &self,
            _trade_date: NaiveDate,
            _market: KrxMarket,
        ) -> anyhow::Result<Vec<String>> {
            Ok(self.tickers.clone())
        }

        async fn fetch_ticker_name(&self, code: &str) -> anyhow::Result<String> {
            self.names
                .get(code)
                .cloned()
                .with_context(|| format!("no listing found for ticker {code}"))
        }
    }

    fn quote(ticker: &str, change_rate: f64) -> MarketQuote {
        MarketQuote {
            ticker: ticker.to_string(),
            open: None,
            high: None,
            low: None,
            close: None,
            change_rate: Some(change_rate),
            volume: None,
            trading_value: None,
        }
    }

    fn state_with(quotes: Vec<MarketQuote>, tickers: Vec<&str>) -> AppState {
        let names: HashMap<String, String> = [
            ("005930", "삼성전자"),
            ("000660", "SK하이닉스"),
            ("035420", "NAVER"),
            ("051910", "LG화학"),
        ]
        .into_iter()
        .map(|(c, n)| (c.to_string(), n.to_string()))
        .collect();

        AppState {
            provider: Arc::new(StubProvider {
                quotes,
                tickers: tickers.into_iter().map(str::to_string).collect(),
                names,
            }),
        }
    }

    #[tokio::test]
    async fn top_stocks_returns_dense_ranks_in_descending_change_order() {
        let state = state_with(
            vec![
                quote("005930", 0.14),
                quote("000660", 4.72),
                quote("035420", -1.05),
                quote("051910", 2.30),
            ],
            vec![],
        );

        let Json(res) = top_stocks(State(state)).await.unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(
            res.iter().map(|s| s.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(res[0].code, "000660");
        assert_eq!(res[0].name, "SK하이닉스");
        assert_eq!(res[1].code, "051910");
        assert_eq!(res[2].code, "005930");
        assert!(res[0].change_rate >= res[1].change_rate);
        assert!(res[1].change_rate >= res[2].change_rate);
    }

    #[tokio::test]
    async fn top_stocks_with_short_table_returns_fewer_entries() {
        let state = state_with(vec![quote("005930", 0.14), quote("000660", -0.33)], vec![]);

        let Json(res) = top_stocks(State(state)).await.unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].rank, 1);
        assert_eq!(res[1].rank, 2);
    }

    #[tokio::test]
    async fn top_stocks_surfaces_name_lookup_failure_as_500() {
        // 999999 has no listing entry in the stub.
        let state = state_with(vec![quote("999999", 9.99)], vec![]);

        let status = top_stocks(State(state)).await.unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn kospi_stocks_returns_one_entry_per_ticker_in_provider_order() {
        let state = state_with(vec![], vec!["005930", "000660", "035420"]);

        let Json(res) = kospi_stocks(State(state)).await.unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(res[0].code, "005930");
        assert_eq!(res[0].name, "삼성전자");
        assert_eq!(res[1].code, "000660");
        assert_eq!(res[2].code, "035420");

        let mut codes: Vec<&str> = res.iter().map(|e| e.code.as_str()).collect();
        codes.dedup();
        assert_eq!(codes.len(), 3);
    }

    #[test]
    fn stock_info_serializes_change_rate_camel_case() {
        let info = StockInfo {
            rank: 1,
            name: "삼성전자".to_string(),
            code: "005930".to_string(),
            change_rate: 1.5,
        };

        let v = serde_json::to_value(&info).unwrap();
        assert_eq!(v["changeRate"], 1.5);
        assert_eq!(v["rank"], 1);
        assert_eq!(v["code"], "005930");
    }
}

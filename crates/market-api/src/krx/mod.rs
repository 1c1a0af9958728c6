use chrono::NaiveDate;

pub mod client;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrxMarket {
    Kospi,
    Kosdaq,
    Konex,
}

impl KrxMarket {
    /// Market code the data portal uses for both the daily-quote screen
    /// (`mktId`) and the issue finder (`mktsel`).
    pub fn portal_code(self) -> &'static str {
        match self {
            KrxMarket::Kospi => "STK",
            KrxMarket::Kosdaq => "KSQ",
            KrxMarket::Konex => "KNX",
        }
    }
}

/// One row of the per-ticker daily table. Only the change rate is ranked on;
/// the remaining fields ride along as the portal reports them.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct MarketQuote {
    pub ticker: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub change_rate: Option<f64>,
    pub volume: Option<f64>,
    pub trading_value: Option<f64>,
}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Full per-ticker daily table for one market and trading date.
    async fn fetch_market_ohlcv(
        &self,
        trade_date: NaiveDate,
        market: KrxMarket,
    ) -> anyhow::Result<Vec<MarketQuote>>;

    /// Active ticker codes for the market, in provider order.
    async fn fetch_ticker_list(
        &self,
        trade_date: NaiveDate,
        market: KrxMarket,
    ) -> anyhow::Result<Vec<String>>;

    /// Display name for one ticker code.
    async fn fetch_ticker_name(&self, code: &str) -> anyhow::Result<String>;
}

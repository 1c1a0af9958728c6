use crate::config::Settings;
use crate::krx::{KrxMarket, MarketDataProvider, MarketQuote};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

const PROD_BASE_URL: &str = "http://data.krx.co.kr";
const JSON_DATA_PATH: &str = "/comm/bldAttendant/getJsonData.cmd";

// Screen ids behind the portal's daily-quote and issue-search views.
const DAILY_QUOTES_BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";
const ISSUE_FINDER_BLD: &str = "dbms/comm/finder/finder_stkisu";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the KRX public data portal. The portal only answers
/// form-POSTs carrying a `bld` screen id and a same-site `Referer`.
#[derive(Debug, Clone)]
pub struct KrxClient {
    http: reqwest::Client,
    base_url: String,
}

impl KrxClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .krx_base_url
            .clone()
            .unwrap_or_else(|| PROD_BASE_URL.to_string());

        let timeout_secs = std::env::var("KRX_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build KRX http client")?;

        Ok(Self { http, base_url })
    }

    async fn post_screen(&self, form: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), JSON_DATA_PATH);
        let referer = format!(
            "{}/mdc/mdi/mdiLoader",
            self.base_url.trim_end_matches('/')
        );

        let res = self
            .http
            .post(url)
            .header("Referer", referer)
            .form(form)
            .send()
            .await
            .context("KRX request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read KRX response")?;
        if !status.is_success() {
            anyhow::bail!("KRX HTTP {status}: {text}");
        }
        Ok(text)
    }

    async fn search_issues(&self, market: KrxMarket, search_text: &str) -> Result<Vec<IssueRow>> {
        let text = self
            .post_screen(&[
                ("bld", ISSUE_FINDER_BLD),
                ("locale", "ko_KR"),
                ("mktsel", market.portal_code()),
                ("typeNo", "0"),
                ("searchText", search_text),
            ])
            .await?;

        let body = serde_json::from_str::<IssueFinderResponse>(&text)
            .with_context(|| format!("failed to parse KRX issue finder response: {text}"))?;
        Ok(body.block1)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for KrxClient {
    async fn fetch_market_ohlcv(
        &self,
        trade_date: NaiveDate,
        market: KrxMarket,
    ) -> Result<Vec<MarketQuote>> {
        let trd_dd = trade_date.format("%Y%m%d").to_string();
        let text = self
            .post_screen(&[
                ("bld", DAILY_QUOTES_BLD),
                ("locale", "ko_KR"),
                ("mktId", market.portal_code()),
                ("trdDd", trd_dd.as_str()),
                ("share", "1"),
                ("money", "1"),
            ])
            .await?;

        let body = serde_json::from_str::<DailyQuotesResponse>(&text)
            .with_context(|| format!("failed to parse KRX daily quotes response: {text}"))?;

        tracing::debug!(%trade_date, rows = body.out_block_1.len(), "fetched KRX daily table");

        Ok(body.out_block_1.into_iter().map(MarketQuote::from).collect())
    }

    async fn fetch_ticker_list(
        &self,
        _trade_date: NaiveDate,
        market: KrxMarket,
    ) -> Result<Vec<String>> {
        // The finder reflects current listings; the portal does not filter
        // the issue list by date.
        let rows = self.search_issues(market, "").await?;
        Ok(rows.into_iter().map(|r| r.short_code).collect())
    }

    async fn fetch_ticker_name(&self, code: &str) -> Result<String> {
        let rows = self.search_issues(KrxMarket::Kospi, code).await?;
        let row = rows
            .into_iter()
            .find(|r| r.short_code == code)
            .with_context(|| format!("no listing found for ticker {code}"))?;
        Ok(row.code_name)
    }
}

#[derive(Debug, Deserialize)]
struct DailyQuotesResponse {
    #[serde(default, rename = "OutBlock_1")]
    out_block_1: Vec<DailyQuoteRow>,
}

#[derive(Debug, Deserialize)]
struct DailyQuoteRow {
    #[serde(default, rename = "ISU_SRT_CD")]
    isu_srt_cd: String,
    #[serde(default, rename = "TDD_OPNPRC")]
    tdd_opnprc: String,
    #[serde(default, rename = "TDD_HGPRC")]
    tdd_hgprc: String,
    #[serde(default, rename = "TDD_LWPRC")]
    tdd_lwprc: String,
    #[serde(default, rename = "TDD_CLSPRC")]
    tdd_clsprc: String,
    #[serde(default, rename = "FLUC_RT")]
    fluc_rt: String,
    #[serde(default, rename = "ACC_TRDVOL")]
    acc_trdvol: String,
    #[serde(default, rename = "ACC_TRDVAL")]
    acc_trdval: String,
}

impl From<DailyQuoteRow> for MarketQuote {
    fn from(row: DailyQuoteRow) -> Self {
        MarketQuote {
            ticker: row.isu_srt_cd,
            open: parse_num(&row.tdd_opnprc),
            high: parse_num(&row.tdd_hgprc),
            low: parse_num(&row.tdd_lwprc),
            close: parse_num(&row.tdd_clsprc),
            change_rate: parse_num(&row.fluc_rt),
            volume: parse_num(&row.acc_trdvol),
            trading_value: parse_num(&row.acc_trdval),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IssueFinderResponse {
    #[serde(default)]
    block1: Vec<IssueRow>,
}

#[derive(Debug, Deserialize)]
struct IssueRow {
    #[serde(default)]
    short_code: String,
    #[serde(default, rename = "codeName")]
    code_name: String,
}

/// The portal reports numbers as comma-grouped strings ("71,900", "-0.56").
/// Blank and dash placeholders parse to None.
fn parse_num(s: &str) -> Option<f64> {
    let t = s.trim().replace(',', "");
    if t.is_empty() || t == "-" {
        return None;
    }
    t.parse::<f64>().ok()
}

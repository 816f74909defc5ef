//! Eastmoney / Shenwan HTTP provider.
//!
//! Stock bars and broad-market indices come from Eastmoney's daily k-line API
//! (back-adjusted prices for stocks). Industry indices come from the Shenwan
//! Research index trend API. Display names come from Eastmoney's quote API.
//!
//! Neither service has a documented public contract; parse failures surface as
//! `DataError::ResponseFormatChanged` rather than as empty series.

use super::dates::{format_yyyymmdd, parse_flexible};
use super::provider::{
    clip_to_range, fallback_display_name, DataError, DataSource, MarketDataProvider,
};
use crate::domain::{DailyBar, IndexPoint};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const KLINE_ENDPOINT: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
const QUOTE_ENDPOINT: &str = "https://push2.eastmoney.com/api/qt/stock/get";
const SW_TREND_ENDPOINT: &str = "https://www.swsresearch.com/institute-sw/api/index_publish/trend/";
const EASTMONEY_UT: &str = "7eea3edcaed734bea9cbfc24409ed989";

/// Eastmoney k-line response.
#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

/// Eastmoney quote response (only the name fields are requested).
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    data: Option<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    f58: Option<String>,
}

/// Shenwan index trend response.
#[derive(Debug, Deserialize)]
struct SwTrendResponse {
    #[serde(default)]
    data: Vec<SwTrendPoint>,
}

#[derive(Debug, Deserialize)]
struct SwTrendPoint {
    bargaindate: String,
    closeindex: serde_json::Value,
}

/// Price adjustment requested from the k-line API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Adjust {
    None,
    Backward,
}

impl Adjust {
    fn fqt(self) -> u8 {
        match self {
            Adjust::None => 0,
            Adjust::Backward => 2,
        }
    }
}

/// One parsed k-line row: date, close, volume.
type KlineRow = (NaiveDate, f64, f64);

/// HTTP provider backed by Eastmoney and Shenwan Research.
pub struct EastmoneyProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl EastmoneyProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Eastmoney security id for an A-share stock: `1.` for Shanghai, `0.` otherwise.
    fn stock_secid(symbol: &str) -> String {
        let market = if symbol.starts_with('6') || symbol.starts_with('9') {
            1
        } else {
            0
        };
        format!("{market}.{symbol}")
    }

    /// Eastmoney security id for an exchange-prefixed index code ("sh000001").
    fn index_secid(code: &str) -> Result<String, DataError> {
        let lower = code.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("sh") {
            Ok(format!("1.{rest}"))
        } else if let Some(rest) = lower.strip_prefix("sz") {
            Ok(format!("0.{rest}"))
        } else {
            Err(DataError::SymbolNotFound {
                symbol: code.to_string(),
            })
        }
    }

    fn kline_url(secid: &str, start: NaiveDate, end: NaiveDate, adjust: Adjust) -> String {
        format!(
            "{KLINE_ENDPOINT}?secid={secid}&ut={EASTMONEY_UT}\
             &fields1=f1,f2,f3,f4,f5,f6\
             &fields2=f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61\
             &klt=101&fqt={}&beg={}&end={}",
            adjust.fqt(),
            format_yyyymmdd(start),
            format_yyyymmdd(end),
        )
    }

    fn quote_url(secid: &str) -> String {
        format!("{QUOTE_ENDPOINT}?secid={secid}&ut={EASTMONEY_UT}&fields=f57,f58")
    }

    fn sw_trend_url(code: &str) -> String {
        format!("{SW_TREND_ENDPOINT}?swindexcode={code}&period=DAY")
    }

    /// Parse k-line rows of the form `date,open,close,high,low,volume,...`.
    fn parse_klines(symbol: &str, resp: KlineResponse) -> Result<Vec<KlineRow>, DataError> {
        let data = resp.data.ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;

        data.klines
            .iter()
            .map(|line| {
                let fields: Vec<&str> = line.split(',').collect();
                if fields.len() < 6 {
                    return Err(DataError::ResponseFormatChanged(format!(
                        "k-line row has {} fields: '{line}'",
                        fields.len()
                    )));
                }
                let date = parse_flexible(fields[0])?;
                let close = parse_number(fields[2], "close")?;
                let volume = parse_number(fields[5], "volume")?;
                Ok((date, close, volume))
            })
            .collect()
    }

    fn parse_sw_trend(code: &str, resp: SwTrendResponse) -> Result<Vec<IndexPoint>, DataError> {
        if resp.data.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: code.to_string(),
            });
        }
        resp.data
            .into_iter()
            .map(|p| {
                let date = parse_flexible(&p.bargaindate)?;
                let close = json_number(&p.closeindex).ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!(
                        "non-numeric closeindex for {code}: {}",
                        p.closeindex
                    ))
                })?;
                Ok(IndexPoint::new(date, close))
            })
            .collect()
    }

    /// GET a JSON document with retry and exponential backoff.
    ///
    /// Retries connect errors, timeouts, 429 and 5xx. Other statuses fail fast.
    fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                warn!(what, attempt, delay_ms = delay.as_millis() as u64, "retrying request");
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = Some(DataError::HttpStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                        continue;
                    }

                    if !status.is_success() {
                        return Err(DataError::HttpStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }

                    debug!(what, %status, "response received");
                    return resp.json::<T>().map_err(|e| {
                        DataError::ResponseFormatChanged(format!("failed to parse {what}: {e}"))
                    });
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    fn fetch_klines(
        &self,
        label: &str,
        secid: &str,
        start: NaiveDate,
        end: NaiveDate,
        adjust: Adjust,
    ) -> Result<Vec<KlineRow>, DataError> {
        let url = Self::kline_url(secid, start, end, adjust);
        let resp: KlineResponse = self.get_json(&url, label)?;
        let rows = Self::parse_klines(label, resp)?;
        Ok(clip_to_range(rows, start, end, |r| r.0))
    }
}

impl MarketDataProvider for EastmoneyProvider {
    fn name(&self) -> &str {
        "eastmoney"
    }

    fn source(&self) -> DataSource {
        DataSource::Eastmoney
    }

    fn fetch_stock_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        let secid = Self::stock_secid(symbol);
        let rows = self.fetch_klines(symbol, &secid, start, end, Adjust::Backward)?;
        Ok(rows
            .into_iter()
            .map(|(date, close, volume)| DailyBar::new(date, close, volume))
            .collect())
    }

    fn fetch_industry_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        // The trend endpoint returns the full history; clip locally.
        let resp: SwTrendResponse = self.get_json(&Self::sw_trend_url(code), code)?;
        let points = Self::parse_sw_trend(code, resp)?;
        Ok(clip_to_range(points, start, end, |p| p.date))
    }

    fn fetch_market_index(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexPoint>, DataError> {
        let secid = Self::index_secid(code)?;
        let rows = self.fetch_klines(code, &secid, start, end, Adjust::None)?;
        Ok(rows
            .into_iter()
            .map(|(date, close, _)| IndexPoint::new(date, close))
            .collect())
    }

    fn resolve_display_name(&self, symbol: &str) -> String {
        let url = Self::quote_url(&Self::stock_secid(symbol));
        match self.get_json::<QuoteResponse>(&url, "quote") {
            Ok(QuoteResponse {
                data: Some(QuoteData { f58: Some(name) }),
            }) if !name.trim().is_empty() => name.trim().to_string(),
            Ok(_) => fallback_display_name(symbol),
            Err(e) => {
                warn!(symbol, error = %e, "display name lookup failed");
                fallback_display_name(symbol)
            }
        }
    }
}

fn parse_number(field: &str, name: &str) -> Result<f64, DataError> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| DataError::ResponseFormatChanged(format!("non-numeric {name}: '{field}'")))
}

/// Accept either a JSON number or a numeric string.
fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

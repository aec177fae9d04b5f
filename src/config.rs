/// 서비스 설정
/// .env 파일을 먼저 읽고, 환경 변수로 덮어쓴다.
// region:    --- Imports
use crate::error::{MarketError, Result};
use crate::marketplace::offers::MAX_EXPIRY_DAYS;
use std::env;
use std::str::FromStr;
use tracing::info;

// endregion: --- Imports

// region:    --- Config
#[derive(Debug, Clone)]
pub struct Config {
    /// 없으면 메모리 저장소로 동작
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_reset: bool,
    pub server_addr: String,
    pub currency: String,
    pub offer_expiry_days: i64,
    /// 0 이면 만료 스케줄러를 띄우지 않는다.
    pub offer_sweep_interval_secs: u64,
    pub kafka_brokers: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            database_reset: false,
            server_addr: "0.0.0.0:3000".to_string(),
            currency: "USD".to_string(),
            offer_expiry_days: 7,
            offer_sweep_interval_secs: 60,
            kafka_brokers: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        info!(
            "{:<12} --> 설정 로드 완료 (저장소: {}, 주소: {})",
            "Config",
            if config.database_url.is_some() { "postgres" } else { "memory" },
            config.server_addr
        );
        Ok(config)
    }

    /// 키 조회 함수로부터 설정 구성
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let offer_expiry_days = parse_or(&get, "OFFER_EXPIRY_DAYS", defaults.offer_expiry_days)?;
        if !(1..=MAX_EXPIRY_DAYS).contains(&offer_expiry_days) {
            return Err(MarketError::Config(format!(
                "OFFER_EXPIRY_DAYS 는 1~{} 사이여야 합니다: {}",
                MAX_EXPIRY_DAYS, offer_expiry_days
            )));
        }

        Ok(Self {
            database_url: get("DATABASE_URL"),
            database_max_connections: parse_or(
                &get,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            database_reset: parse_or(&get, "DATABASE_RESET", defaults.database_reset)?,
            server_addr: get("SERVER_ADDR").unwrap_or(defaults.server_addr),
            currency: get("MARKET_CURRENCY")
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or(defaults.currency),
            offer_expiry_days,
            offer_sweep_interval_secs: parse_or(
                &get,
                "OFFER_SWEEP_INTERVAL_SECS",
                defaults.offer_sweep_interval_secs,
            )?,
            kafka_brokers: get("KAFKA_BROKERS"),
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| MarketError::Config(format!("{} 값이 올바르지 않습니다 ({}): {}", key, raw, e))),
        None => Ok(default),
    }
}
// endregion: --- Config

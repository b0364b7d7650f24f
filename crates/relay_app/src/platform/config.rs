//! Runtime configuration read from the environment (and `.env`).

use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use relay_core::{PlanPolicy, SizeVariant, ThumbnailSharing};
use relay_engine::{FetchSettings, PipelineSettings, DEFAULT_BASE_URL};

use super::logging::LogDestination;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct RelayConfig {
    pub bot_token: String,
    pub trigger_prefix: String,
    pub pixiv_base_url: String,
    pub fetch: FetchSettings,
    pub pipeline: PipelineSettings,
    pub log_level: LevelFilter,
    pub log_destination: LogDestination,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let mut pipeline = PipelineSettings::default();
        if let Some(value) = get("IMAGE_BYTE_CEILING") {
            pipeline.resolve.image_byte_ceiling = parse_number("IMAGE_BYTE_CEILING", &value)?;
        }
        if let Some(value) = get("BUNDLE_BYTE_CEILING") {
            pipeline.assemble.bundle_byte_ceiling = parse_number("BUNDLE_BYTE_CEILING", &value)?;
        }
        if pipeline.assemble.bundle_byte_ceiling < pipeline.resolve.image_byte_ceiling {
            return Err(ConfigError::Invalid {
                name: "BUNDLE_BYTE_CEILING",
                value: pipeline.assemble.bundle_byte_ceiling.to_string(),
                reason: "must not be below IMAGE_BYTE_CEILING".to_string(),
            });
        }
        if let Some(value) = get("MAX_PAGES") {
            pipeline.max_pages = parse_number("MAX_PAGES", &value)?;
        }
        if let Some(value) = get("VARIANT_ORDER") {
            pipeline.resolve.variant_order = parse_variant_order(&value)?;
        }
        if let Some(value) = get("PAGE_CONCURRENCY") {
            let concurrency: usize = parse_number("PAGE_CONCURRENCY", &value)?;
            if concurrency == 0 {
                return Err(invalid("PAGE_CONCURRENCY", &value, "must be at least 1"));
            }
            pipeline.resolve.page_concurrency = concurrency;
        }
        if let Some(value) = get("STRICT_PAGES") {
            pipeline.plan_policy = if parse_flag("STRICT_PAGES", &value)? {
                PlanPolicy::Strict
            } else {
                PlanPolicy::Compatible
            };
        }
        if let Some(value) = get("THUMBNAIL_SHARING") {
            pipeline.assemble.thumbnail_sharing = match value.trim() {
                "copy" => ThumbnailSharing::CopyPerBundle,
                "first" => ThumbnailSharing::FirstBundleOnly,
                _ => return Err(invalid("THUMBNAIL_SHARING", &value, "expected copy or first")),
            };
        }
        if let Some(value) = get("ESCALATION_HINT") {
            pipeline.escalation_hint = value;
        }

        let mut fetch = FetchSettings::default();
        if let Some(value) = get("FETCH_TIMEOUT_SECS") {
            let secs: u64 = parse_number("FETCH_TIMEOUT_SECS", &value)?;
            fetch.request_timeout = Duration::from_secs(secs.max(1));
        }

        let log_level = match get("LOG_LEVEL") {
            Some(value) => relay_logging::parse_level(&value)
                .ok_or_else(|| invalid("LOG_LEVEL", &value, "unknown level"))?,
            None => LevelFilter::Info,
        };
        let log_destination = match get("LOG_DESTINATION") {
            Some(value) => value
                .parse()
                .map_err(|reason| invalid("LOG_DESTINATION", &value, reason))?,
            None => LogDestination::Terminal,
        };

        Ok(Self {
            bot_token,
            trigger_prefix: get("TRIGGER_PREFIX").unwrap_or_else(|| "!nya".to_string()),
            pixiv_base_url: get("PIXIV_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fetch,
            pipeline,
            log_level,
            log_destination,
        })
    }
}

fn invalid(name: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .replace('_', "")
        .parse()
        .map_err(|err: T::Err| invalid(name, value, err.to_string()))
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value, "expected true or false")),
    }
}

fn parse_variant_order(value: &str) -> Result<Vec<SizeVariant>, ConfigError> {
    let mut order = Vec::new();
    for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let variant: SizeVariant = name
            .parse()
            .map_err(|err: relay_core::UnknownVariant| invalid("VARIANT_ORDER", value, err.to_string()))?;
        if !order.contains(&variant) {
            order.push(variant);
        }
    }
    if order.is_empty() {
        return Err(invalid("VARIANT_ORDER", value, "no variants listed"));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use log::LevelFilter;
    use relay_core::{PlanPolicy, SizeVariant, ThumbnailSharing};

    use super::{ConfigError, RelayConfig};
    use crate::platform::logging::LogDestination;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RelayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_token_is_set() {
        let config = load(&[("BOT_TOKEN", "secret")]).unwrap();

        assert_eq!(config.bot_token, "secret");
        assert_eq!(config.trigger_prefix, "!nya");
        assert_eq!(config.pixiv_base_url, "https://www.pixiv.net");
        assert_eq!(config.pipeline.max_pages, 9);
        assert_eq!(config.pipeline.resolve.image_byte_ceiling, 7_864_320);
        assert_eq!(config.pipeline.assemble.bundle_byte_ceiling, 8 * 1024 * 1024);
        assert_eq!(
            config.pipeline.resolve.variant_order,
            SizeVariant::DEFAULT_ORDER.to_vec()
        );
        assert_eq!(config.pipeline.plan_policy, PlanPolicy::Compatible);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.log_destination, LogDestination::Terminal);
    }

    #[test]
    fn missing_token_is_an_error() {
        assert_eq!(load(&[]).err(), Some(ConfigError::Missing("BOT_TOKEN")));
        assert_eq!(
            load(&[("BOT_TOKEN", "  ")]).err(),
            Some(ConfigError::Missing("BOT_TOKEN"))
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("BOT_TOKEN", "t"),
            ("TRIGGER_PREFIX", "!pix"),
            ("IMAGE_BYTE_CEILING", "25_000_000"),
            ("BUNDLE_BYTE_CEILING", "26214400"),
            ("MAX_PAGES", "4"),
            ("VARIANT_ORDER", "regular, small, regular"),
            ("PAGE_CONCURRENCY", "3"),
            ("STRICT_PAGES", "yes"),
            ("THUMBNAIL_SHARING", "first"),
            ("FETCH_TIMEOUT_SECS", "5"),
            ("LOG_LEVEL", "debug"),
            ("LOG_DESTINATION", "both"),
        ])
        .unwrap();

        assert_eq!(config.trigger_prefix, "!pix");
        assert_eq!(config.pipeline.resolve.image_byte_ceiling, 25_000_000);
        assert_eq!(config.pipeline.max_pages, 4);
        assert_eq!(
            config.pipeline.resolve.variant_order,
            vec![SizeVariant::Regular, SizeVariant::Small]
        );
        assert_eq!(config.pipeline.resolve.page_concurrency, 3);
        assert_eq!(config.pipeline.plan_policy, PlanPolicy::Strict);
        assert_eq!(
            config.pipeline.assemble.thumbnail_sharing,
            ThumbnailSharing::FirstBundleOnly
        );
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_destination, LogDestination::Both);
    }

    #[test]
    fn bundle_ceiling_below_image_ceiling_is_rejected() {
        let err = load(&[
            ("BOT_TOKEN", "t"),
            ("IMAGE_BYTE_CEILING", "1000"),
            ("BUNDLE_BYTE_CEILING", "999"),
        ])
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::Invalid { name: "BUNDLE_BYTE_CEILING", .. }));
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = load(&[("BOT_TOKEN", "t"), ("VARIANT_ORDER", "huge")])
            .err()
            .unwrap();
        assert!(err.to_string().starts_with("VARIANT_ORDER has invalid value"));

        let err = load(&[("BOT_TOKEN", "t"), ("MAX_PAGES", "many")])
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_PAGES", .. }));
    }
}

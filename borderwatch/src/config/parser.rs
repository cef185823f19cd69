//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! Starts from defaults and overlays whatever keys are present. This is the
//! single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("detection")) {
        if let Some(v) = section.get("min_accuracy_m") {
            config.detection.min_accuracy_m = parse_positive_f64("detection", "min_accuracy_m", v)?;
        }
        if let Some(v) = section.get("near_border_km") {
            config.detection.near_border_km = parse_non_negative_f64("detection", "near_border_km", v)?;
        }
    }

    if let Some(section) = ini.section(Some("hysteresis")) {
        if let Some(v) = section.get("window_size") {
            config.hysteresis.window_size =
                parse_value("hysteresis", "window_size", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("min_matches") {
            config.hysteresis.min_matches =
                parse_value("hysteresis", "min_matches", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("dwell_time_secs") {
            config.hysteresis.dwell_time = parse_secs("hysteresis", "dwell_time_secs", v)?;
        }
        if let Some(v) = section.get("min_distance_m") {
            config.hysteresis.min_distance_m =
                parse_non_negative_f64("hysteresis", "min_distance_m", v)?;
        }

        config
            .hysteresis
            .validate()
            .map_err(|e| ConfigFileError::InvalidValue {
                section: "hysteresis".to_string(),
                key: e.key().to_string(),
                value: e.value(),
                reason: e.to_string(),
            })?;
    }

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            if !v.trim().is_empty() {
                config.cache.directory = expand_home(v.trim());
            }
        }
        if let Some(v) = section.get("ttl_secs") {
            config.cache.ttl = parse_secs("cache", "ttl_secs", v)?;
        }
        if let Some(v) = section.get("sweep_interval_secs") {
            let interval = parse_secs("cache", "sweep_interval_secs", v)?;
            if interval.is_zero() {
                return Err(invalid("cache", "sweep_interval_secs", v, "must be greater than 0"));
            }
            config.cache.sweep_interval = interval;
        }
    }

    if let Some(section) = ini.section(Some("resolver")) {
        if let Some(v) = section.get("endpoint") {
            let v = v.trim();
            if !v.is_empty() && !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid("resolver", "endpoint", v, "must be an http(s) URL"));
            }
            config.resolver.endpoint = non_empty(v);
        }
        if let Some(v) = section.get("api_key") {
            config.resolver.api_key = non_empty(v);
        }
        if let Some(v) = section.get("timeout_secs") {
            let timeout = parse_secs("resolver", "timeout_secs", v)?;
            if timeout.is_zero() {
                return Err(invalid("resolver", "timeout_secs", v, "must be greater than 0"));
            }
            config.resolver.timeout = timeout;
        }
    }

    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = section.get("interval_secs") {
            config.location.interval = parse_secs("location", "interval_secs", v)?;
        }
        if let Some(v) = section.get("min_distance_m") {
            config.location.min_distance_m =
                parse_non_negative_f64("location", "min_distance_m", v)?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            if !v.trim().is_empty() {
                config.logging.directory = expand_home(v.trim());
            }
        }
        if let Some(v) = section.get("file") {
            if !v.trim().is_empty() {
                config.logging.file = v.trim().to_string();
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_secs(section: &str, key: &str, value: &str) -> Result<Duration, ConfigFileError> {
    parse_value::<u64>(section, key, value, "must be a non-negative integer (seconds)")
        .map(Duration::from_secs)
}

fn parse_non_negative_f64(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let parsed: f64 = parse_value(section, key, value, "must be a number")?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid(section, key, value, "must be a non-negative number"));
    }
    Ok(parsed)
}

fn parse_positive_f64(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let parsed = parse_non_negative_f64(section, key, value)?;
    if parsed == 0.0 {
        return Err(invalid(section, key, value, "must be greater than 0"));
    }
    Ok(parsed)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(text).unwrap())
    }

    #[test]
    fn test_empty_ini_is_default() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlays_values() {
        let config = parse(
            "[detection]\nmin_accuracy_m = 50\nnear_border_km = 35.5\n\
             [hysteresis]\nwindow_size = 6\nmin_matches = 4\ndwell_time_secs = 120\n\
             [cache]\nttl_secs = 3600\n\
             [resolver]\nendpoint = https://geo.example.com/lookup\napi_key = \ntimeout_secs = 3\n\
             [location]\ninterval_secs = 5\nmin_distance_m = 50\n",
        )
        .unwrap();

        assert_eq!(config.detection.min_accuracy_m, 50.0);
        assert_eq!(config.detection.near_border_km, 35.5);
        assert_eq!(config.hysteresis.window_size, 6);
        assert_eq!(config.hysteresis.min_matches, 4);
        assert_eq!(config.hysteresis.dwell_time, Duration::from_secs(120));
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
        assert_eq!(
            config.resolver.endpoint.as_deref(),
            Some("https://geo.example.com/lookup")
        );
        assert!(config.resolver.api_key.is_none());
        assert_eq!(config.resolver.timeout, Duration::from_secs(3));
        assert_eq!(config.location.interval, Duration::from_secs(5));
        assert_eq!(config.location.min_distance_m, 50.0);
    }

    #[test]
    fn test_invalid_number() {
        let err = parse("[detection]\nmin_accuracy_m = lots\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "detection");
                assert_eq!(key, "min_accuracy_m");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_zero_accuracy_and_negative_distance() {
        assert!(parse("[detection]\nmin_accuracy_m = 0\n").is_err());
        assert!(parse("[location]\nmin_distance_m = -5\n").is_err());
    }

    #[test]
    fn test_hysteresis_consistency_checked() {
        let err = parse("[hysteresis]\nwindow_size = 2\n").unwrap_err();
        assert!(err.to_string().contains("hysteresis.min_matches"), "{}", err);
    }

    #[test]
    fn test_hysteresis_error_reports_its_own_key() {
        match parse("[hysteresis]\nwindow_size = 0\n").unwrap_err() {
            ConfigFileError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "window_size");
                assert_eq!(value, "0");
            }
            other => panic!("unexpected {:?}", other),
        }

        match parse("[hysteresis]\nwindow_size = 5\nmin_matches = 6\n").unwrap_err() {
            ConfigFileError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "min_matches");
                assert_eq!(value, "6");
            }
            other => panic!("unexpected {:?}", other),
        }

        match parse("[hysteresis]\nmin_distance_m = -1\n").unwrap_err() {
            ConfigFileError::InvalidValue { key, .. } => assert_eq!(key, "min_distance_m"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        assert!(parse("[resolver]\nendpoint = ftp://x\n").is_err());
        assert!(parse("[resolver]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/cache/bw"), PathBuf::from("/var/cache/bw"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/cells"), home.join("cells"));
        }
    }
}

//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let endpoint = config.resolver.endpoint.as_deref().unwrap_or("");
    let api_key = config.resolver.api_key.as_deref().unwrap_or("");

    format!(
        r#"[detection]
; Fixes with an accuracy radius above this are ignored (meters)
min_accuracy_m = {}
; A single bounding-box match closer than this to its edge is re-checked
; with the precise resolver (kilometers)
near_border_km = {}

[hysteresis]
; Number of recent readings considered per decision
window_size = {}
; Readings that must agree before switching away from the current country
min_matches = {}
; Minimum time between two country changes
dwell_time_secs = {}
; Readings closer than this to the previous one are ignored (meters)
min_distance_m = {}

[cache]
; Directory for resolved geohash cells
directory = {}
; Lifetime of a cached cell
ttl_secs = {}
; How often expired cells are swept
sweep_interval_secs = {}

[resolver]
; Precise lookup service; leave empty to rely on the cache and bounding boxes
endpoint = {}
; Sent as a bearer token when set
api_key = {}
timeout_secs = {}

[location]
; Minimum time between delivered fixes
interval_secs = {}
; Minimum movement between delivered fixes (meters)
min_distance_m = {}

[logging]
directory = {}
file = {}
"#,
        config.detection.min_accuracy_m,
        config.detection.near_border_km,
        config.hysteresis.window_size,
        config.hysteresis.min_matches,
        config.hysteresis.dwell_time.as_secs(),
        config.hysteresis.min_distance_m,
        path_to_string(&config.cache.directory),
        config.cache.ttl.as_secs(),
        config.cache.sweep_interval.as_secs(),
        endpoint,
        api_key,
        config.resolver.timeout.as_secs(),
        config.location.interval.as_secs(),
        config.location.min_distance_m,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

/// Render a path, collapsing the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_every_section() {
        let text = to_config_string(&ConfigFile::default());
        for section in [
            "[detection]",
            "[hysteresis]",
            "[cache]",
            "[resolver]",
            "[location]",
            "[logging]",
        ] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("ttl_secs = 2592000"));
        assert!(text.contains("endpoint = \n"));
    }

    #[test]
    fn test_path_to_string_collapses_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("x")), "~/x");
        }
        assert_eq!(path_to_string(Path::new("/tmp/x")), "/tmp/x");
    }
}

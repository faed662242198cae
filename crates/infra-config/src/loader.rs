// INI configuration loader
// Section names are region identifiers and are kept exactly as written.
use ini::{Ini, ParseOption};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;
use uptime_core::domain::{
    Credentials, GlobalConfig, MetricsTarget, MonitorConfig, ProbeOperation, RegionConfig,
    DEFAULT_METRIC_PREFIX, DEFAULT_STATSD_HOST, DEFAULT_STATSD_PORT,
};

/// Path used when no `--config` is given
pub const DEFAULT_CONFIG_PATH: &str = "etc/uptime.cfg";

/// Name of the section whose keys apply to every region
const DEFAULTS_SECTION: &str = "DEFAULT";

/// Keys of one section, lowercased
type Table = HashMap<String, String>;

/// Read and validate the configuration file at `path`
///
/// # Errors
/// - ConfigError::Read if the file cannot be read
/// - any error from [`parse_str`]
pub fn load(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_str(&contents)?;
    info!(
        path = %path.display(),
        regions = config.regions().len(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Parse INI text into a validated configuration
///
/// Every section other than `[DEFAULT]` is a region, in file order. Region
/// keys missing from a region section fall back to `[DEFAULT]`. Key names
/// are case-insensitive; section names are not.
///
/// # Errors
/// - ConfigError::Parse for malformed INI
/// - ConfigError::MissingKey / InvalidValue for absent or bad settings
/// - ConfigError::Domain for an empty, duplicate or colliding region set
pub fn parse_str(contents: &str) -> Result<MonitorConfig, ConfigError> {
    // Passwords may contain backslashes and quotes: take values verbatim
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(contents, options)?;

    let mut defaults = Table::new();
    let mut sections: Vec<(&str, Table)> = Vec::new();

    for (name, properties) in ini.iter() {
        let table: Table = properties
            .iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
            .collect();

        match name {
            // Keys above the first section header behave like [DEFAULT]
            None => defaults.extend(table),
            Some(name) if name.eq_ignore_ascii_case(DEFAULTS_SECTION) => defaults.extend(table),
            Some(name) => sections.push((name, table)),
        }
    }

    let global = parse_global(&defaults)?;
    let regions = sections
        .iter()
        .map(|(name, table)| parse_region(name, table, &defaults))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        regions = ?regions.iter().map(|r| r.name()).collect::<Vec<_>>(),
        interval_secs = global.interval().as_secs(),
        "Configuration parsed"
    );

    Ok(MonitorConfig::new(global, regions)?)
}

fn parse_global(defaults: &Table) -> Result<GlobalConfig, ConfigError> {
    let auth_url = required(DEFAULTS_SECTION, defaults, None, "auth_url")?;
    let interval = parse_secs(
        "interval",
        &required(DEFAULTS_SECTION, defaults, None, "interval")?,
    )?;

    let host = optional(defaults, None, "statsd_server")
        .unwrap_or_else(|| DEFAULT_STATSD_HOST.to_string());
    let port = match optional(defaults, None, "statsd_port") {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|e| invalid(DEFAULTS_SECTION, "statsd_port", e))?,
        None => DEFAULT_STATSD_PORT,
    };
    let prefix = optional(defaults, None, "metric_prefix")
        .unwrap_or_else(|| DEFAULT_METRIC_PREFIX.to_string());
    let probe = match optional(defaults, None, "probe") {
        Some(raw) => raw
            .parse::<ProbeOperation>()
            .map_err(|e| invalid(DEFAULTS_SECTION, "probe", e))?,
        None => ProbeOperation::default(),
    };

    let mut global = GlobalConfig::new(auth_url, interval)
        .map_err(|e| invalid(DEFAULTS_SECTION, "interval", e))?
        .with_metrics(MetricsTarget::new(host, port))
        .with_metric_prefix(prefix)
        .with_probe(probe);

    if let Some(raw) = optional(defaults, None, "timeout") {
        global = global
            .with_request_timeout(parse_secs("timeout", &raw)?)
            .map_err(|e| invalid(DEFAULTS_SECTION, "timeout", e))?;
    }

    Ok(global)
}

fn parse_region(name: &str, table: &Table, defaults: &Table) -> Result<RegionConfig, ConfigError> {
    let credentials = Credentials::new(
        required(name, table, Some(defaults), "username")?,
        required(name, table, Some(defaults), "password")?,
        required(name, table, Some(defaults), "tenant")?,
    );
    let heat_url = required(name, table, Some(defaults), "heat_url")?;

    Ok(RegionConfig::new(name, credentials, heat_url)?)
}

/// A key from `table`, else from `fallback`; blank values count as absent
fn optional(table: &Table, fallback: Option<&Table>, key: &str) -> Option<String> {
    table
        .get(key)
        .or_else(|| fallback.and_then(|defaults| defaults.get(key)))
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
}

fn required(
    section: &str,
    table: &Table,
    fallback: Option<&Table>,
    key: &str,
) -> Result<String, ConfigError> {
    optional(table, fallback, key).ok_or_else(|| ConfigError::MissingKey {
        section: section.to_string(),
        key: key.to_string(),
    })
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| invalid(DEFAULTS_SECTION, key, e))
}

fn invalid(section: &str, key: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use uptime_core::domain::DomainError;

    const SAMPLE: &str = "\
[DEFAULT]
auth_url = http://id.example/v2
interval = 30

[west]
username = u
password = p
tenant = t
heat_url = http://orc.example
";

    #[test]
    fn test_single_region_scenario() {
        let cfg = parse_str(SAMPLE).unwrap();
        let global = cfg.global();
        assert_eq!(global.auth_url(), "http://id.example/v2");
        assert_eq!(global.interval(), Duration::from_secs(30));
        assert_eq!(global.metrics(), &MetricsTarget::new("localhost", 8125));
        assert_eq!(global.probe(), ProbeOperation::StackList);

        assert_eq!(cfg.regions().len(), 1);
        let west = &cfg.regions()[0];
        assert_eq!(west.name(), "west");
        assert_eq!(west.credentials(), &Credentials::new("u", "p", "t"));
        assert_eq!(west.heat_url(), "http://orc.example");
    }

    #[test]
    fn test_regions_keep_file_order() {
        let text = format!(
            "{SAMPLE}\n[east]\nusername = e\npassword = p\ntenant = t\nheat_url = http://e\n\
             \n[north]\nusername = n\npassword = p\ntenant = t\nheat_url = http://n\n"
        );
        let cfg = parse_str(&text).unwrap();
        let names: Vec<_> = cfg.regions().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["west", "east", "north"]);
    }

    #[test]
    fn test_optional_settings() {
        let text = "\
[DEFAULT]
auth_url = http://id.example/v3
interval = 60
statsd_server = metrics.internal
statsd_port = 9125
metric_prefix = heat.latency
probe = build_info
timeout = 10

[west]
username = u
password = p
tenant = t
heat_url = http://orc.example
";
        let cfg = parse_str(text).unwrap();
        let global = cfg.global();
        assert_eq!(global.metrics().address(), "metrics.internal:9125");
        assert_eq!(global.metric_prefix(), "heat.latency");
        assert_eq!(global.probe(), ProbeOperation::BuildInfo);
        assert_eq!(global.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_region_keys_fall_back_to_defaults() {
        let text = "\
[DEFAULT]
auth_url = http://id.example/v2
interval = 30
tenant = shared

[west]
username = u
password = p
heat_url = http://orc.example
";
        let cfg = parse_str(text).unwrap();
        assert_eq!(cfg.regions()[0].credentials().tenant, "shared");
    }

    #[test]
    fn test_missing_region_key_names_section_and_key() {
        let text = SAMPLE.replace("heat_url = http://orc.example\n", "");
        match parse_str(&text).unwrap_err() {
            ConfigError::MissingKey { section, key } => {
                assert_eq!(section, "west");
                assert_eq!(key, "heat_url");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_auth_url() {
        let text = SAMPLE.replace("auth_url = http://id.example/v2\n", "");
        let err = parse_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { ref key, .. } if key == "auth_url"));
    }

    #[test]
    fn test_interval_must_be_positive_integer() {
        for bad in ["0", "-5", "thirty", "1.5"] {
            let text = SAMPLE.replace("interval = 30", &format!("interval = {bad}"));
            let err = parse_str(&text).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "interval"),
                "interval = {bad} gave {err}"
            );
        }
    }

    #[test]
    fn test_unknown_probe_rejected() {
        let text = SAMPLE.replace("interval = 30", "interval = 30\nprobe = delete_stacks");
        let err = parse_str(&text).unwrap_err();
        assert!(err.to_string().contains("probe"));
    }

    #[test]
    fn test_no_regions_rejected() {
        let text = "[DEFAULT]\nauth_url = http://id.example\ninterval = 30\n";
        let err = parse_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::Domain(DomainError::NoRegions)));
    }

    fn region_names(text: &str) -> Vec<String> {
        parse_str(text)
            .unwrap()
            .regions()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }

    #[test]
    fn test_section_names_keep_their_case() {
        let text = SAMPLE.replace("[west]", "[RegionOne]");
        assert_eq!(region_names(&text), vec!["RegionOne"]);
    }

    #[test]
    fn test_case_variant_sections_are_distinct_regions() {
        let text = format!(
            "{SAMPLE}\n[West]\nusername = w\npassword = p\ntenant = t\nheat_url = http://orc-2.example\n"
        );
        assert_eq!(region_names(&text), vec!["west", "West"]);
    }

    #[test]
    fn test_dotted_section_is_one_region() {
        let text = SAMPLE.replace("[west]", "[us.east]");
        let cfg = parse_str(&text).unwrap();
        assert_eq!(cfg.regions().len(), 1);
        assert_eq!(cfg.regions()[0].name(), "us.east");
        assert_eq!(cfg.regions()[0].heat_url(), "http://orc.example");
    }

    #[test]
    fn test_lowercase_default_section_and_key_case() {
        let text = SAMPLE
            .replace("[DEFAULT]", "[default]")
            .replace("auth_url", "AUTH_URL");
        let cfg = parse_str(&text).unwrap();
        assert_eq!(cfg.global().auth_url(), "http://id.example/v2");
        assert_eq!(region_names(&text), vec!["west"]);
    }

    #[test]
    fn test_password_taken_verbatim() {
        let text = SAMPLE.replace("password = p", r#"password = p\w"d"#);
        let cfg = parse_str(&text).unwrap();
        assert_eq!(cfg.regions()[0].credentials().password, r#"p\w"d"#);
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let cfg = load(file.path()).unwrap();
        assert_eq!(cfg.regions()[0].name(), "west");
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.cfg"));
    }
}

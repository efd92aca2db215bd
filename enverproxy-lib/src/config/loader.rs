use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::ini;
use super::root::{Config, LogType};
use crate::error::{ProxyError, Result};

const SECTION: &str = "enverproxy";

const REQUIRED_KEYS: &[&str] = &[
    "buffer_size",
    "delay",
    "listen_port",
    "verbosity",
    "log_type",
    "log_address",
    "log_port",
    "forward_IP",
    "forward_port",
    "mqttuser",
    "mqttpassword",
    "mqtthost",
    "mqttport",
    "id2device",
];

/// Environment variable name for a config key: the key itself, upper-cased,
/// with no prefix. Matches the original `enverproxy.py`'s
/// `os.getenv('FORWARD_IP', config.get(...))` style exactly — spec.md §6
/// only says "environment variable overrides", it doesn't name a scheme.
fn env_name(key: &str) -> String {
    key.to_ascii_uppercase()
}

/// Resolve a single key's value: environment variable overrides the INI
/// file's `[enverproxy]` section, per spec.md §6's stated precedence.
fn resolve(section: &ini::Section, key: &str) -> Result<String> {
    if let Ok(v) = std::env::var(env_name(key)) {
        return Ok(v);
    }
    section
        .get(key)
        .map(str::to_string)
        .ok_or_else(|| ProxyError::MissingKey(key.to_string()))
}

fn parse_int<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|_| ProxyError::InvalidValue {
        key: key.to_string(),
        reason: format!("expected an integer, got {raw:?}"),
    })
}

fn parse_log_type(raw: &str) -> Result<LogType> {
    match raw {
        "sys.stdout" => Ok(LogType::Stdout),
        "syslog" => Ok(LogType::Syslog),
        "remote" => Ok(LogType::Remote),
        other => Err(ProxyError::InvalidValue {
            key: "log_type".to_string(),
            reason: format!("expected one of sys.stdout|syslog|remote, got {other:?}"),
        }),
    }
}

/// Parse the `id2device` literal mapping.
///
/// The source format is a JSON object (`{"wrid": "device name", ...}`) —
/// see SPEC_FULL.md §6 for why JSON was chosen over inventing a bespoke
/// mini-syntax.
fn parse_id2device(raw: &str) -> Result<HashMap<String, String>> {
    serde_json::from_str(raw).map_err(|e| ProxyError::InvalidValue {
        key: "id2device".to_string(),
        reason: format!("invalid JSON mapping: {e}"),
    })
}

/// Load and validate configuration from the INI file at `path`, honoring
/// environment-variable overrides for every key.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let text = fs::read_to_string(&path).map_err(|e| {
        ProxyError::Config(format!(
            "failed to read config file {}: {e}",
            path.as_ref().display()
        ))
    })?;
    load_from_str(&text)
}

fn load_from_str(text: &str) -> Result<Config> {
    let section = ini::section(text, SECTION)
        .ok_or_else(|| ProxyError::Config(format!("missing [{SECTION}] section")))?;

    // Fail fast with a precise key name if any required key is entirely
    // absent from both the environment and the file.
    for key in REQUIRED_KEYS {
        resolve(&section, key)?;
    }

    let buffer_size: usize = parse_int("buffer_size", &resolve(&section, "buffer_size")?)?;
    let delay_secs: f64 = resolve(&section, "delay")?
        .parse()
        .map_err(|_| ProxyError::InvalidValue {
            key: "delay".to_string(),
            reason: "expected a floating point number of seconds".to_string(),
        })?;
    let listen_port: u16 = parse_int("listen_port", &resolve(&section, "listen_port")?)?;
    let verbosity: u8 = parse_int("verbosity", &resolve(&section, "verbosity")?)?;
    if verbosity > 5 {
        return Err(ProxyError::InvalidValue {
            key: "verbosity".to_string(),
            reason: "must be in 0..=5".to_string(),
        });
    }
    let log_type = parse_log_type(&resolve(&section, "log_type")?)?;
    let log_address = resolve(&section, "log_address")?;
    let log_port: u16 = parse_int("log_port", &resolve(&section, "log_port")?)?;
    let forward_ip = resolve(&section, "forward_IP")?;
    let forward_port: u16 = parse_int("forward_port", &resolve(&section, "forward_port")?)?;
    let mqtt_user = resolve(&section, "mqttuser")?;
    let mqtt_password = resolve(&section, "mqttpassword")?;
    let mqtt_host = resolve(&section, "mqtthost")?;
    let mqtt_port: u16 = parse_int("mqttport", &resolve(&section, "mqttport")?)?;
    let id2device = parse_id2device(&resolve(&section, "id2device")?)?;

    Ok(Config {
        buffer_size,
        delay: Duration::from_secs_f64(delay_secs),
        listen_port,
        verbosity,
        log_type,
        log_address,
        log_port,
        forward_ip,
        forward_port,
        mqtt_user,
        mqtt_password,
        mqtt_host,
        mqtt_port,
        id2device,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> &'static str {
        "[enverproxy]\n\
         buffer_size = 4096\n\
         delay = 0.0001\n\
         listen_port = 5005\n\
         verbosity = 2\n\
         log_type = sys.stdout\n\
         log_address = 127.0.0.1\n\
         log_port = 514\n\
         forward_IP = cloud.envertecportal.com\n\
         forward_port = 10000\n\
         mqttuser = user\n\
         mqttpassword = pass\n\
         mqtthost = localhost\n\
         mqttport = 1883\n\
         id2device = {\"11121314\": \"Roof array\"}\n"
    }

    #[test]
    fn loads_complete_section() {
        let cfg = load_from_str(sample()).expect("should parse");
        assert_eq!(cfg.buffer_size, 4096);
        assert_eq!(cfg.listen_port, 5005);
        assert_eq!(cfg.log_type, LogType::Stdout);
        assert!(cfg.knows("11121314"));
        assert!(!cfg.knows("00000000"));
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let text = sample().replace("mqttport = 1883\n", "");
        let err = load_from_str(&text).unwrap_err();
        assert!(matches!(err, ProxyError::MissingKey(k) if k == "mqttport"));
    }

    #[test]
    fn env_override_wins_over_file() {
        std::env::set_var("LISTEN_PORT", "7777");
        let cfg = load_from_str(sample()).expect("should parse");
        std::env::remove_var("LISTEN_PORT");
        assert_eq!(cfg.listen_port, 7777);
    }

    #[test]
    fn verbosity_out_of_range_rejected() {
        let text = sample().replace("verbosity = 2", "verbosity = 9");
        let err = load_from_str(&text).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidValue { key, .. } if key == "verbosity"));
    }

    #[test]
    fn load_from_path_reads_a_real_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp config file");
        use std::io::Write;
        file.write_all(sample().as_bytes()).expect("write sample config");

        let cfg = load_from_path(file.path()).expect("should parse");
        assert_eq!(cfg.buffer_size, 4096);
        assert_eq!(cfg.mqtt_host, "localhost");
    }

    #[test]
    fn load_from_path_missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let missing = dir.path().join("does-not-exist.conf");

        let err = load_from_path(&missing).unwrap_err();
        assert!(matches!(err, ProxyError::Config(_)));
    }
}

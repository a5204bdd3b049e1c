use rd_domain::config::{Config, DEFAULT_RECONNECT_DELAY_MS, DEFAULT_WS_PORT};
use rd_domain::ConnectionStatus;

#[test]
fn default_target_is_localhost() {
    let config = Config::default();
    assert_eq!(config.target_ip, "127.0.0.1");
    assert_eq!(config.target_port, 9000);
    assert_eq!(config.ws_port, DEFAULT_WS_PORT);
}

#[test]
fn reconnect_is_on_with_fixed_delay() {
    let config = Config::default();
    assert!(config.reconnect);
    assert_eq!(config.reconnect_delay_ms, DEFAULT_RECONNECT_DELAY_MS);
    assert_eq!(config.reconnect_delay().as_millis(), 5000);
}

#[test]
fn resolved_config_survives_a_toml_dump() {
    let config = Config {
        target_ip: "10.0.0.2".into(),
        api_token: "tok".into(),
        reconnect: false,
        ..Config::default()
    };
    let dumped = toml::to_string_pretty(&config).unwrap();
    assert_eq!(Config::from_toml_str(&dumped).unwrap(), config);
}

#[test]
fn surrounding_whitespace_in_ip_is_ignored() {
    let config: Config = toml::from_str(r#"target_ip = " 192.168.0.7 ""#).unwrap();
    assert!(config.target_addr().is_ok());
    assert_eq!(config.ws_url(), "ws://192.168.0.7:5899");
}

#[test]
fn status_serializes_with_tag() {
    let json = serde_json::to_value(ConnectionStatus::disconnected("gone")).unwrap();
    assert_eq!(json["status"], "disconnected");
    assert_eq!(json["reason"], "gone");
}

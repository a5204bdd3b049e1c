//! Config file loading and environment overrides.

use std::collections::HashMap;
use std::io::Write;

use rd_cli::cli::load_config_from;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let config = load_config_from(path.to_str().unwrap(), env_from(&[])).unwrap();
    assert_eq!(config, rd_domain::Config::default());
}

#[test]
fn file_values_are_read_and_defaults_fill_the_rest() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "target_ip = \"192.168.1.20\"\nreconnect = false").unwrap();

    let config = load_config_from(file.path().to_str().unwrap(), env_from(&[])).unwrap();
    assert_eq!(config.target_ip, "192.168.1.20");
    assert!(!config.reconnect);
    assert_eq!(config.ws_port, 5899);
    assert_eq!(config.reconnect_delay_ms, 5000);
}

#[test]
fn env_overrides_win_over_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "target_ip = \"192.168.1.20\"\ntarget_port = 8000").unwrap();

    let env = env_from(&[
        ("RD_TARGET_IP", "10.1.1.1"),
        ("RD_TARGET_PORT", "9100"),
        ("RD_API_TOKEN", "secret"),
    ]);
    let config = load_config_from(file.path().to_str().unwrap(), env).unwrap();
    assert_eq!(config.target_ip, "10.1.1.1");
    assert_eq!(config.target_port, 9100);
    assert_eq!(config.api_token, "secret");
}

#[test]
fn bad_inputs_are_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "target_port = \"not a port\"").unwrap();
    let err = load_config_from(file.path().to_str().unwrap(), env_from(&[])).unwrap_err();
    assert!(err.to_string().contains("parsing"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = load_config_from(
        path.to_str().unwrap(),
        env_from(&[("RD_TARGET_PORT", "99999")]),
    )
    .unwrap_err();
    assert!(err.to_string().contains("RD_TARGET_PORT"));
}

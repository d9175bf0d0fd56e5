//! Loading configuration files.

use std::io::Write;

use ecoledirecte_core::{Config, Error};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
username = "  jdupont "
password = "secret"
qcm_file = "/var/lib/ecoledirecte/qcm.json"
refresh_interval = 60
lunch_break_time = "12:30"
decode_html = true
grades_to_display = 5

[api]
version = "4.60.1"

[notify]
log = false
webhook_url = "http://localhost:8123/api/webhook/ed"
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.username, "jdupont");
    assert_eq!(config.refresh_period().as_secs(), 3600);
    assert_eq!(config.lunch_break().unwrap().to_string(), "12:30:00");
    assert!(config.decode_html);
    assert_eq!(config.grades_to_display, 5);
    assert_eq!(config.qcm_attempts, 5);
    assert_eq!(config.api.url, "https://api.ecoledirecte.com/v3");
    assert_eq!(
        config.api.endpoint("login.awp"),
        "https://api.ecoledirecte.com/v3/login.awp?v=4.60.1"
    );
    assert!(!config.notify.log);
    assert!(config.notify.webhook_url.is_some());
}

#[test]
fn test_invalid_files() {
    let out_of_range = write_config("username = \"a\"\npassword = \"b\"\nrefresh_interval = 1\n");
    assert!(matches!(
        Config::load(out_of_range.path()),
        Err(Error::InvalidConfiguration(_))
    ));

    let bad_time = write_config("username = \"a\"\npassword = \"b\"\nlunch_break_time = \"midi\"\n");
    assert!(Config::load(bad_time.path()).is_err());

    let not_toml = write_config("username = ");
    assert!(Config::load(not_toml.path()).is_err());

    assert!(Config::load("/nonexistent/ecoledirecte.toml".as_ref()).is_err());
}

#[test]
fn test_password_never_serialized() {
    let config = Config::new("jdupont", "secret");
    let json = serde_json::to_value(&config).unwrap();
    assert!(json.get("password").is_none());
    assert_eq!(json["username"], "jdupont");
}

//! Environment overrides. Mutates the process environment, so nothing else
//! lives in this test binary.

use std::io::Write;

use ecoledirecte_core::config::env_vars;
use ecoledirecte_core::Config;
use tempfile::NamedTempFile;

#[test]
fn test_environment_supplies_credentials() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"refresh_interval = 15\n").unwrap();

    std::env::set_var(env_vars::USERNAME, "famille.dupont");
    std::env::set_var(env_vars::PASSWORD, "from-env");
    let loaded = Config::load(file.path());
    std::env::remove_var(env_vars::USERNAME);
    std::env::remove_var(env_vars::PASSWORD);

    let config = loaded.unwrap();
    assert_eq!(config.username, "famille.dupont");
    assert_eq!(config.password, "from-env");
    assert_eq!(config.refresh_interval, 15);
}

use std::env;

use tempfile::TempDir;

use pagebounds::config::Settings;

// Separate test binary: environment variables are process-global.
#[test]
fn given_env_overrides_when_loading_then_env_wins_over_local_config() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(".pagebounds.toml"),
        "max_navigation_level = 2\n",
    )
    .unwrap();
    env::set_var("PAGEBOUNDS_MAX_NAVIGATION_LEVEL", "5");
    env::set_var("PAGEBOUNDS_SITE_FILE", "custom.toml");

    let settings = Settings::load(Some(temp.path()));

    env::remove_var("PAGEBOUNDS_MAX_NAVIGATION_LEVEL");
    env::remove_var("PAGEBOUNDS_SITE_FILE");
    let settings = settings.unwrap();
    assert_eq!(settings.max_navigation_level, Some(5));
    assert_eq!(settings.site_file, temp.path().join("custom.toml"));
}

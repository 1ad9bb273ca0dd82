// tests/config_load.rs
use pakinfo_bot::config::{AppConfig, ENV_APP_CONFIG_PATH};
use std::{env, fs};

#[test]
fn explicit_path_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("app.toml");
    fs::write(
        &p,
        r#"
[fetch]
timeout_secs = 3
concurrency = 4

[collection]
max_updates = 10

[llm]
provider = "openai"
model = "gpt-4o"
api_key = "sk-literal"
"#,
    )
    .unwrap();

    let cfg = AppConfig::load_from(&p).unwrap();
    assert_eq!(cfg.fetch.timeout_secs, 3);
    assert_eq!(cfg.fetch.concurrency, 4);
    assert_eq!(cfg.fetch.user_agent, "Mozilla/5.0");
    assert_eq!(cfg.collection.max_updates, 10);
    assert_eq!(cfg.extract.min_chars, 40);
    assert_eq!(cfg.llm.provider, "openai");
    assert_eq!(cfg.llm.model.as_deref(), Some("gpt-4o"));
    assert_eq!(cfg.llm.api_key, "sk-literal");
}

#[test]
fn malformed_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("app.toml");
    fs::write(&p, "[fetch\ntimeout_secs = ").unwrap();
    assert!(AppConfig::load_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_APP_CONFIG_PATH);
    env::set_var("GEMINI_API_KEY", "from-env");

    // 1) nothing on disk -> defaults, key resolved from env
    let cfg = AppConfig::load_default().unwrap();
    assert_eq!(cfg.collection.max_updates, 50);
    assert_eq!(cfg.llm.api_key, "from-env");

    // 2) config/app.toml fallback
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/app.toml"),
        "[collection]\nmax_updates = 20\n",
    )
    .unwrap();
    assert_eq!(AppConfig::load_default().unwrap().collection.max_updates, 20);

    // 3) env path wins
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "[collection]\nmax_updates = 7\n").unwrap();
    env::set_var(ENV_APP_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(AppConfig::load_default().unwrap().collection.max_updates, 7);

    // 4) env path to a missing file is an error
    env::set_var(ENV_APP_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(AppConfig::load_default().is_err());

    env::remove_var(ENV_APP_CONFIG_PATH);
    env::remove_var("GEMINI_API_KEY");
    env::set_current_dir(&old).unwrap();
}

// tests/config_load.rs
use std::{env, fs};
use wiki_trust_report::config::{
    TrustConfig, DEFAULT_FANOUT_LIMIT, ENV_CONFIG_PATH, ENV_FANOUT_LIMIT, ENV_TASK_TIMEOUT_SECS,
    MAX_FANOUT_LIMIT,
};

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_FANOUT_LIMIT);
    env::remove_var(ENV_TASK_TIMEOUT_SECS);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing on disk: built-in defaults
    let cfg = TrustConfig::load().unwrap();
    assert_eq!(cfg.fanout_limit, DEFAULT_FANOUT_LIMIT);
    assert_eq!(cfg.phrases.len(), 9);

    // 2) fallback file in ./config/
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/trust_report.toml"),
        "fanout_limit = 3\ntask_timeout_secs = 12\n",
    )
    .unwrap();
    let cfg = TrustConfig::load().unwrap();
    assert_eq!(cfg.fanout_limit, 3);
    assert_eq!(cfg.task_timeout_secs, 12);

    // 3) explicit path wins over the fallback
    let explicit = tmp.path().join("other.toml");
    fs::write(
        &explicit,
        r#"
fanout_limit = 1

[[phrases]]
pattern = "sponsor(ed|ship)?"
label = "sponsor"
"#,
    )
    .unwrap();
    env::set_var(ENV_CONFIG_PATH, &explicit);
    let cfg = TrustConfig::load().unwrap();
    assert_eq!(cfg.fanout_limit, 1);
    assert_eq!(cfg.phrases.len(), 1);
    assert_eq!(cfg.phrases[0].label, "sponsor");

    // 4) numeric overrides apply on top of the file; junk is ignored
    env::set_var(ENV_FANOUT_LIMIT, "4");
    env::set_var(ENV_TASK_TIMEOUT_SECS, "not-a-number");
    let cfg = TrustConfig::load().unwrap();
    assert_eq!(cfg.fanout_limit, 4);
    assert_eq!(cfg.task_timeout_secs, 30);

    // 5) fan-out above the maximum is clamped
    env::set_var(ENV_FANOUT_LIMIT, "50");
    let cfg = TrustConfig::load().unwrap();
    assert_eq!(cfg.fanout_limit, MAX_FANOUT_LIMIT);

    clear_env();
    env::set_current_dir(old).unwrap();
}

#[serial_test::serial]
#[test]
fn missing_explicit_path_is_an_error() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/trust_report.toml");
    let err = TrustConfig::load().unwrap_err();
    assert!(err.to_string().contains(ENV_CONFIG_PATH));
    clear_env();
}

#[serial_test::serial]
#[test]
fn malformed_toml_reports_the_path() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("broken.toml");
    fs::write(&p, "fanout_limit = [").unwrap();
    env::set_var(ENV_CONFIG_PATH, &p);

    let err = TrustConfig::load().unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
    clear_env();
}

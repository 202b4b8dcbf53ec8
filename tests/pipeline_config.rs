// tests/pipeline_config.rs
use course_sentiment::config::{load_config_default, load_config_from, ENV_CONFIG_PATH};
use course_sentiment::{FailurePolicy, Pipeline, PipelineConfig};
use std::{env, fs};

#[test]
fn parse_toml_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("pipeline.toml");
    fs::write(
        &p,
        r#"
[sheet]
column = "COMENTARIOS"
offset = 0
stride = 1

[translate]
provider = "identity"
on_failure = "skip"
deadline_secs = 120

[report]
author = "Coordinación académica"
"#,
    )
    .unwrap();
    let cfg = load_config_from(&p).unwrap();
    assert_eq!(cfg.sheet.column, "COMENTARIOS");
    assert_eq!(cfg.sheet.sheet, "Opiniones");
    assert_eq!(cfg.sheet.count, Some(788));
    assert_eq!(cfg.translate.on_failure, FailurePolicy::Skip);
    assert_eq!(cfg.translate.deadline_secs, Some(120));
    assert_eq!(cfg.translate.concurrency, 8);
    assert_eq!(cfg.report.author, "Coordinación académica");
}

#[test]
fn bad_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("pipeline.toml");
    fs::write(&p, "[translate]\non_failure = \"retry-forever\"\n").unwrap();
    assert!(load_config_from(&p).is_err());

    let y = dir.path().join("pipeline.yaml");
    fs::write(&y, "translate: {}\n").unwrap();
    assert!(load_config_from(&y).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // 1) nothing → defaults
    let cfg = load_config_default(None).unwrap();
    assert_eq!(cfg, PipelineConfig::default());

    // 2) ./config/pipeline.json
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("pipeline.json"),
        r#"{"translate": {"max_attempts": 7}}"#,
    )
    .unwrap();
    assert_eq!(load_config_default(None).unwrap().translate.max_attempts, 7);

    // 3) ./config/pipeline.toml wins over JSON
    fs::write(cfg_dir.join("pipeline.toml"), "[translate]\nmax_attempts = 5\n").unwrap();
    assert_eq!(load_config_default(None).unwrap().translate.max_attempts, 5);

    // 4) env wins over the fallbacks
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, "[translate]\nmax_attempts = 2\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(load_config_default(None).unwrap().translate.max_attempts, 2);

    // 5) explicit path wins over env
    let p_cli = tmp.path().join("cli.json");
    fs::write(&p_cli, r#"{"translate": {"max_attempts": 9}}"#).unwrap();
    assert_eq!(
        load_config_default(Some(&p_cli))
            .unwrap()
            .translate
            .max_attempts,
        9
    );

    // env pointing nowhere is an error, not a silent fallback
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml"));
    assert!(load_config_default(None).is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}

#[test]
fn missing_resource_override_fails_pipeline_build() {
    let mut cfg = PipelineConfig::default();
    cfg.translate.provider = "identity".into();
    cfg.resources.lexicon_path = Some("/definitely/not/here/vader.txt".into());
    assert!(Pipeline::from_config(&cfg).is_err());
}

#[test]
fn resource_overrides_are_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let sw = dir.path().join("stop.txt");
    fs::write(&sw, "# custom\nthe\ncourse\n").unwrap();
    let lex = dir.path().join("lex.txt");
    fs::write(&lex, "meh\t-0.5\t0.5\nsuperb\t3.0\t0.4\n").unwrap();

    let mut cfg = PipelineConfig::default();
    cfg.translate.provider = "identity".into();
    cfg.resources.stopwords_path = Some(sw);
    cfg.resources.lexicon_path = Some(lex);

    let p = Pipeline::from_config(&cfg).unwrap();
    let res = p.resources();
    assert_eq!(res.stopwords.len(), 2);
    assert_eq!(res.stopwords.filter("the course was superb"), "was superb");
    assert_eq!(res.lexicon.len(), 2);
    assert!(res.scorer().score("superb") > 0.5);
}

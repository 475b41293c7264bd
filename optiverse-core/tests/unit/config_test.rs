use super::*;
use crate::helpers::models::test_problem;
use crate::helpers::oracle::ScriptedOracle;

fn create_oracle() -> OracleConfig {
    OracleConfig::new("default-model", Arc::new(ScriptedOracle::with_sources(&[])))
}

fn read(json: &str) -> GenericResult<Settings> {
    read_settings(BufReader::new(json.as_bytes()))
}

#[test]
fn can_build_config_with_defaults() {
    let config = ConfigBuilder::new(test_problem(), create_oracle()).with_max_iterations(Some(10)).build().unwrap();

    assert_eq!(config.max_iterations, Some(10));
    assert_eq!(config.max_time, None);
    assert_eq!(config.parallelism, 1);
    assert_eq!(config.retry, RetryPolicy::default());
    assert!(matches!(config.telemetry, TelemetryMode::None));
    assert!(config.quota.is_none());
}

parameterized_test! {can_reject_invalid_config, (builder, expected), {
    can_reject_invalid_config_impl(builder, expected);
}}

can_reject_invalid_config! {
    case01_no_termination: (ConfigBuilder::new(test_problem(), create_oracle()), "either max iterations"),
    case02_zero_parallelism: (ConfigBuilder::new(test_problem(), create_oracle()).with_max_iterations(Some(1)).with_parallelism(0), "parallelism"),
    case03_empty_model: (ConfigBuilder::new(test_problem(), OracleConfig::new(" ", Arc::new(ScriptedOracle::with_sources(&[])))).with_max_iterations(Some(1)), "oracle model"),
}

fn can_reject_invalid_config_impl(builder: ConfigBuilder, expected: &str) {
    let err = builder.build().err().unwrap();

    assert!(err.to_string().contains(expected));
}

#[test]
fn can_read_full_settings() {
    let settings = read(
        r#"{
          "problem": { "direction": "maximize" },
          "oracle": {
            "model": "large-model",
            "retry": { "maxRetries": 5, "initialBackoff": 200, "multiplier": 3, "maxBackoff": 5000 }
          },
          "termination": { "maxIterations": 100, "maxTime": 600 },
          "evaluation": { "timeout": 40, "parallelism": 4 },
          "search": {
            "type": "iterated-local-search",
            "maxIterationsWithoutImprovement": 10,
            "perturbations": { "restart": 0.2, "exploit": 0.2, "explore": 0.6 }
          },
          "telemetry": { "logging": { "enabled": true, "logBest": 5 }, "metrics": { "enabled": true } }
        }"#,
    )
    .unwrap();

    let config = ConfigBuilder::new(test_problem(), create_oracle()).with_settings(&settings).unwrap().build().unwrap();

    assert_eq!(config.problem.direction(), Direction::Maximize);
    assert_eq!(config.oracle.model, "large-model");
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.retry.max_backoff, Duration::from_secs(5));
    assert_eq!(config.max_iterations, Some(100));
    assert_eq!(config.max_time, Some(Duration::from_secs(600)));
    assert_eq!(config.evaluation_timeout, Some(Duration::from_secs(40)));
    assert_eq!(config.parallelism, 4);
    assert!(matches!(config.telemetry, TelemetryMode::All { log_best: 5, .. }));
}

#[test]
fn can_keep_builder_values_for_missing_settings() {
    let settings = read(r#"{ "search": { "type": "elitism" } }"#).unwrap();

    let config = create_builder_from_settings(test_problem(), create_oracle(), &settings)
        .unwrap()
        .with_max_time(Some(Duration::from_secs(1)))
        .build()
        .unwrap();

    assert_eq!(config.oracle.model, "default-model");
    assert_eq!(config.problem.direction(), Direction::Minimize);
    assert_eq!(config.max_iterations, None);
}

parameterized_test! {can_create_telemetry_mode, (json, expected), {
    can_create_telemetry_mode_impl(json, expected);
}}

can_create_telemetry_mode! {
    case01_none: (r#"{}"#, "none"),
    case02_logging: (r#"{ "logging": { "enabled": true } }"#, "logging"),
    case03_metrics: (r#"{ "metrics": { "enabled": true } }"#, "metrics"),
    case04_disabled: (r#"{ "logging": { "enabled": false }, "metrics": { "enabled": false } }"#, "none"),
}

fn can_create_telemetry_mode_impl(json: &str, expected: &str) {
    let settings = serde_json::from_str::<TelemetrySettings>(json).unwrap();

    let actual = match create_telemetry_mode(&settings) {
        TelemetryMode::None => "none",
        TelemetryMode::OnlyLogging { .. } => "logging",
        TelemetryMode::OnlyMetrics => "metrics",
        TelemetryMode::All { .. } => "all",
    };

    assert_eq!(actual, expected);
}

#[test]
fn can_reject_invalid_perturbation_weights() {
    let settings = read(
        r#"{ "search": { "type": "iterated-local-search", "perturbations": { "restart": 0, "exploit": 0, "explore": 0 } } }"#,
    )
    .unwrap();

    assert!(ConfigBuilder::new(test_problem(), create_oracle()).with_settings(&settings).is_err());
}

#[test]
fn can_report_malformed_settings() {
    let err = read(r#"{ "termination": { "maxIterations": "many" } }"#).err().unwrap();

    assert!(err.to_string().starts_with("cannot deserialize settings"));
}

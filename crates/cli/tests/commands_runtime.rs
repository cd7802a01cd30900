use std::env;
use std::io::Cursor;
use std::sync::{Mutex, OnceLock};

use rebate_cli::commands::calculate::{self, CalculateArgs};
use rebate_cli::commands::{config, history, migrate, seed};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("REBATE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_invalid_env() {
    with_env(&[("REBATE_DATABASE_TIMEOUT_SECS", "not-a-number")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_returns_catalog_summary() {
    with_env(&[("REBATE_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected deterministic seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("prod-standard"));
        assert!(message.contains("rebate-legacy-points"));
    });
}

#[test]
fn calculate_records_result_and_history_lists_it() {
    let database = TempDir::new().expect("create temp dir");
    let url = database_url(&database);

    with_env(&[("REBATE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let result = calculate::run_with_input(
            args("rebate-rate-50", "prod-standard", "10"),
            &mut Cursor::new(""),
            &mut Vec::new(),
        );
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["success"], true);
        assert_eq!(payload["amount"], "50000");
        assert_eq!(payload["stage"], "stored");
        assert_eq!(payload["failure"], Value::Null);

        let listed = history::run("rebate-rate-50");
        assert_eq!(listed.exit_code, 0);

        let payload = parse_payload(&listed.output);
        let calculations = payload["calculations"].as_array().expect("calculations array");
        assert_eq!(calculations.len(), 1);
        assert_eq!(calculations[0]["amount"], "50000");
        assert_eq!(calculations[0]["rebate_id"], "rebate-rate-50");
    });
}

#[test]
fn calculate_prompts_for_missing_values() {
    let database = TempDir::new().expect("create temp dir");
    let url = database_url(&database);

    with_env(&[("REBATE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let mut prompts = Vec::new();
        let result = calculate::run_with_input(
            CalculateArgs::default(),
            &mut Cursor::new("rebate-uom-10\nprod-standard\n3\n"),
            &mut prompts,
        );

        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
        assert_eq!(parse_payload(&result.output)["amount"], "30");
        assert_eq!(
            String::from_utf8(prompts).expect("utf8 prompts"),
            "Enter rebate identifier: Enter product identifier: Enter volume: "
        );
    });
}

#[test]
fn calculate_reports_rejection_without_recording() {
    let database = TempDir::new().expect("create temp dir");
    let url = database_url(&database);

    with_env(&[("REBATE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0);

        let result = calculate::run_with_input(
            args("rebate-uom-10", "prod-cash-only", "5"),
            &mut Cursor::new(""),
            &mut Vec::new(),
        );
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error_class"], "calculation_rejected");
        assert_eq!(payload["failure"]["code"], "incentive_not_supported_by_product");

        let listed = parse_payload(&history::run("rebate-uom-10").output);
        assert_eq!(listed["calculations"].as_array().map(Vec::len), Some(0));
    });
}

#[test]
fn calculate_honours_negative_input_setting() {
    let database = TempDir::new().expect("create temp dir");
    let url = database_url(&database);

    with_env(
        &[
            ("REBATE_DATABASE_URL", url.as_str()),
            ("REBATE_CALCULATION_REJECT_NEGATIVE_INPUTS", "true"),
        ],
        || {
            assert_eq!(seed::run().exit_code, 0);

            let result = calculate::run_with_input(
                args("rebate-uom-10", "prod-standard", "-2"),
                &mut Cursor::new(""),
                &mut Vec::new(),
            );

            let payload = parse_payload(&result.output);
            assert_eq!(result.exit_code, 1);
            assert_eq!(payload["failure"]["code"], "negative_input");
        },
    );
}

#[test]
fn calculate_rejects_unparseable_volume_before_touching_the_database() {
    with_env(&[("REBATE_DATABASE_URL", "sqlite:///nonexistent/dir/rebates.db")], || {
        let result = calculate::run_with_input(
            args("rebate-cash-10", "prod-standard", "lots"),
            &mut Cursor::new(""),
            &mut Vec::new(),
        );

        assert_eq!(result.exit_code, 7);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(
        &[("REBATE_DATABASE_URL", "sqlite::memory:"), ("REBATE_LOG_LEVEL", "debug")],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "config");
            assert_eq!(payload["status"], "ok");

            let message = payload["message"].as_str().unwrap_or("");
            assert!(message.contains(
                "- database.url = sqlite::memory: (source: env (REBATE_DATABASE_URL))"
            ));
            assert!(message.contains("- logging.level = debug (source: env (REBATE_LOG_LEVEL))"));
            assert!(message.contains(
                "- calculation.reject_negative_inputs = false (source: default)"
            ));
        },
    );
}

#[test]
fn config_reports_invalid_settings_as_structured_failure() {
    with_env(&[("REBATE_DATABASE_URL", "postgres://x")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().unwrap_or("").contains("database.url"));
    });
}

#[test]
fn config_ignores_blank_env_values_when_attributing_sources() {
    with_env(&[("REBATE_LOG_LEVEL", ""), ("REBATE_LOGGING_LEVEL", "  ")], || {
        let payload = parse_payload(&config::run().output);

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("- logging.level = info (source: default)"), "{message}");
    });
}

fn args(rebate: &str, product: &str, volume: &str) -> CalculateArgs {
    CalculateArgs {
        rebate: Some(rebate.to_string()),
        product: Some(product.to_string()),
        volume: Some(volume.to_string()),
    }
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("rebates.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "REBATE_DATABASE_URL",
        "REBATE_DATABASE_MAX_CONNECTIONS",
        "REBATE_DATABASE_TIMEOUT_SECS",
        "REBATE_CALCULATION_REJECT_NEGATIVE_INPUTS",
        "REBATE_LOGGING_LEVEL",
        "REBATE_LOGGING_FORMAT",
        "REBATE_LOG_LEVEL",
        "REBATE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

pub mod models;
pub use models::*;

/// Placeholder value replaced by an environment variable named after its path.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Loads the layered application configuration.
///
/// Sources, later ones winning: `config/default.*`, `config/{RUN_ENV}.*`,
/// then `FITGAP__SECTION__KEY` environment variables. The directory is taken
/// from `CONFIG_DIR` and defaults to `config` relative to the working dir.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "FITGAP".to_string());
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        default = %default_path.display(),
        env = %env_path.display(),
        "Loading configuration"
    );

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    build_config(builder)
}

/// Builds and deserializes a prepared builder, then resolves secret markers.
pub fn build_config(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                match std::env::var(&env_key) {
                    Ok(env_val) => *obj = Value::String(env_val),
                    Err(_) => warn!("env var {} not found for {}", env_key, SECRET_MARKER),
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config).map_err(|e| ConfigError::Message(e.to_string()))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json).map_err(|e| ConfigError::Message(e.to_string()))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, once.
///
/// The path comes from `DOTENV_OVERRIDE`, else from a first command line
/// argument starting with `.env`, else `.env`. Returns the path used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = std::env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const SAMPLE: &str = r#"
        use_gcal = true

        [server]
        host = "0.0.0.0"
        port = 9000

        [gcal]
        calendar_id = "primary"
        key_path = "secret_from_env"

        [scheduler]
        earliest_time = "07:30"
        horizon = "week"

        [scheduler.plan.stretch]
        enabled = false
    "#;

    fn sample_builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(SAMPLE, FileFormat::Toml))
    }

    #[test]
    fn test_scheduler_defaults_fill_gaps() {
        let config = build_config(sample_builder()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.use_gcal);
        assert_eq!(config.scheduler.earliest_time, "07:30");
        assert_eq!(config.scheduler.latest_time, "22:00");
        assert_eq!(config.scheduler.time_zone, "UTC");
        assert_eq!(config.scheduler.horizon, HorizonSetting::Week);
        assert_eq!(config.scheduler.reminder_minutes, 5);
        assert!(config.scheduler.deadline_seconds.is_none());
    }

    #[test]
    fn test_time_zone_lives_in_scheduler_section() {
        let builder = Config::builder().add_source(File::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [gcal]
            calendar_id = "primary"

            [scheduler]
            time_zone = "Europe/Zurich"
            "#,
            FileFormat::Toml,
        ));

        let config = build_config(builder).unwrap();

        assert_eq!(config.scheduler.time_zone, "Europe/Zurich");
        let gcal = config.gcal.unwrap();
        assert_eq!(gcal.calendar_id.as_deref(), Some("primary"));
        assert!(gcal.key_path.is_none());
    }

    #[test]
    fn test_plan_entries_default_to_enabled() {
        let config = build_config(sample_builder()).unwrap();
        let plan = &config.scheduler.plan;

        assert!(plan.workout.enabled);
        assert!(!plan.stretch.enabled);
        assert!(plan.meditation.enabled);
        assert_eq!(plan.workout.occurrences_per_day, None);
    }

    #[test]
    fn test_secret_marker_is_replaced_from_env() {
        std::env::set_var("GCAL_KEY_PATH", "/run/secrets/sa.json");
        let config = build_config(sample_builder()).unwrap();

        assert_eq!(
            config.gcal.and_then(|g| g.key_path).as_deref(),
            Some("/run/secrets/sa.json")
        );
    }

    #[test]
    fn test_missing_server_section_is_an_error() {
        let builder =
            Config::builder().add_source(File::from_str("use_gcal = false", FileFormat::Toml));
        assert!(build_config(builder).is_err());
    }
}

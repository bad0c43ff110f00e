//! Integration tests for Configuration System

use super::test_utils::with_isolated_env;
use std::path::Path;
use storyteller::config::{global_config_path, ConfigLoader, TextProviderKind, ValidationError};
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_defaults_without_any_source() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("project");
    std::fs::create_dir_all(&root).unwrap();

    let config = with_isolated_env(&temp, &[], || ConfigLoader::load(&root).unwrap());
    assert_eq!(config.text.provider, TextProviderKind::Groq);
    assert_eq!(config.text.resolved_model(), "llama-3.3-70b-versatile");
    assert!(config.text.api_key.is_none());

    let errors = config.validate().unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Text(_))));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Image(_))));
}

#[test]
fn test_conventional_env_vars_complete_config() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("project");
    std::fs::create_dir_all(&root).unwrap();

    let config = with_isolated_env(
        &temp,
        &[
            ("GROQ_API_KEY", "gsk-env"),
            ("GROQ_MODEL", "llama-3.1-8b-instant"),
            ("OPENAI_API_KEY", "sk-env"),
        ],
        || ConfigLoader::load(&root).unwrap(),
    );
    assert_eq!(config.text.api_key.as_deref(), Some("gsk-env"));
    assert_eq!(config.text.resolved_model(), "llama-3.1-8b-instant");
    assert_eq!(config.image.api_key.as_deref(), Some("sk-env"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_layer_precedence() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("project");

    with_isolated_env(&temp, &[], || {
        let global = global_config_path().unwrap();
        write(
            &global,
            r#"
[server]
bind = "127.0.0.1:7000"

[text]
model = "from-global"
temperature = 0.5
"#,
        );
        write(
            &root.join("config/config.toml"),
            r#"
[text]
model = "from-workspace"
"#,
        );
        write(
            &root.join("config/development.toml"),
            r#"
[text]
max_retries = 4
"#,
        );

        let config = ConfigLoader::load(&root).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7000");
        assert_eq!(config.text.temperature, 0.5);
        assert_eq!(config.text.resolved_model(), "from-workspace");
        assert_eq!(config.text.max_retries, 4);
    });
}

#[test]
fn test_environment_file_selected_by_storyteller_env() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("project");
    write(
        &root.join("config/development.toml"),
        "[server]\nbind = \"127.0.0.1:8001\"\n",
    );
    write(
        &root.join("config/production.toml"),
        "[server]\nbind = \"0.0.0.0:80\"\n",
    );

    let config = with_isolated_env(&temp, &[("STORYTELLER_ENV", "production")], || {
        ConfigLoader::load(&root).unwrap()
    });
    assert_eq!(config.server.bind, "0.0.0.0:80");
}

#[test]
fn test_prefixed_env_overrides_files() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("project");
    write(
        &root.join("config/config.toml"),
        "[text]\nmodel = \"from-file\"\napi_key = \"gsk-file\"\n",
    );

    let config = with_isolated_env(
        &temp,
        &[
            ("STORYTELLER__TEXT__MODEL", "from-env"),
            ("STORYTELLER__SERVER__BIND", "127.0.0.1:9100"),
            ("GROQ_API_KEY", "gsk-env"),
        ],
        || ConfigLoader::load(&root).unwrap(),
    );
    assert_eq!(config.text.resolved_model(), "from-env");
    assert_eq!(config.server.bind, "127.0.0.1:9100");
    assert_eq!(config.text.api_key.as_deref(), Some("gsk-file"));
}

#[test]
fn test_load_from_explicit_file_ignores_workspace() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("project");
    write(
        &root.join("config/config.toml"),
        "[text]\nmodel = \"from-workspace\"\n",
    );
    let explicit = temp.path().join("custom.toml");
    write(
        &explicit,
        r#"
[text]
provider = "openai"

[speech]
enabled = false

[image]
enabled = false

[logging]
level = "debug"
format = "json"
"#,
    );

    let config = with_isolated_env(&temp, &[("OPENAI_API_KEY", "sk-env")], || {
        ConfigLoader::load_from_file(&explicit).unwrap()
    });
    assert_eq!(config.text.provider, TextProviderKind::OpenAI);
    assert_eq!(config.text.resolved_model(), "gpt-4o-mini");
    assert_eq!(config.text.api_key.as_deref(), Some("sk-env"));
    assert_eq!(config.logging.level, "debug");
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp = TempDir::new().unwrap();
    let explicit = temp.path().join("broken.toml");
    write(&explicit, "[text\nmodel = ");

    let result = with_isolated_env(&temp, &[], || ConfigLoader::load_from_file(&explicit));
    assert!(matches!(
        result,
        Err(storyteller::error::ApiError::ConfigError(_))
    ));
}

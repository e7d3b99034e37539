use config::{Config as ConfigLoader, ConfigError, Environment, File, Map, Source};
use mailpilot::{GmailAuthConfig, GraphConfig, LLMConfig, ToolErrorPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_THREAD_ID: &str = "default-thread";
pub const DEFAULT_USER_ID: &str = "default-user";

/// Env prefixes and the config section each one overrides
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("LLM", "llm"),
    ("LOG", "logging"),
    ("GMAIL", "gmail"),
    ("GRAPH", "graph"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub graph: GraphSettings,

    // Secrets and per-run values (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_thread_id")]
    pub thread_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub run_message: Option<String>,
}

fn default_thread_id() -> String {
    DEFAULT_THREAD_ID.to_string()
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: Option<f32>,
    /// Base URL of an OpenAI-compatible endpoint
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: None,
            base_url: None,
        }
    }
}

impl From<&LlmConfig> for LLMConfig {
    fn from(config: &LlmConfig) -> Self {
        let llm = LLMConfig::new(config.model.clone());
        match config.temperature {
            Some(temperature) => llm.with_temperature(temperature),
            None => llm,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GmailConfig {
    pub token_path: PathBuf,
    pub credentials_path: PathBuf,
    /// Relative paths resolve against this directory
    pub base_dir: PathBuf,
}

impl Default for GmailConfig {
    fn default() -> Self {
        let defaults = GmailAuthConfig::default();
        Self {
            token_path: defaults.token_path,
            credentials_path: defaults.credentials_path,
            base_dir: defaults.base_dir,
        }
    }
}

impl From<&GmailConfig> for GmailAuthConfig {
    fn from(config: &GmailConfig) -> Self {
        GmailAuthConfig::new()
            .with_token_path(&config.token_path)
            .with_credentials_path(&config.credentials_path)
            .with_base_dir(&config.base_dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub max_iterations: usize,
    pub tool_error_policy: ToolErrorPolicy,
}

impl Default for GraphSettings {
    fn default() -> Self {
        let defaults = GraphConfig::default();
        Self {
            max_iterations: defaults.max_iterations,
            tool_error_policy: defaults.tool_error_policy,
        }
    }
}

impl From<&GraphSettings> for GraphConfig {
    fn from(settings: &GraphSettings) -> Self {
        GraphConfig::new()
            .with_max_iterations(settings.max_iterations)
            .with_tool_error_policy(settings.tool_error_policy)
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (ENV defaults to `dev`)
    /// 3. Environment variables with LLM_, LOG_, GMAIL_ and GRAPH_ prefixes
    pub fn load() -> Result<Self, ConfigError> {
        let vars: Map<String, String> = std::env::vars().collect();
        Self::load_from(Path::new("config"), &vars)
    }

    /// Load from a config directory and an explicit set of environment variables
    pub fn load_from(config_dir: &Path, vars: &Map<String, String>) -> Result<Self, ConfigError> {
        let env = vars.get("ENV").cloned().unwrap_or_else(|| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::from(config_dir.join("default")).required(false))
            .add_source(File::from(config_dir.join(&env)).required(false));

        // Each prefix overrides keys inside its own section: LLM_MODEL -> llm.model
        for (prefix, section) in ENV_SECTIONS {
            let overrides = Environment::with_prefix(prefix)
                .prefix_separator("_")
                .try_parsing(true)
                .source(Some(vars.clone()))
                .collect()?;
            for (key, value) in overrides {
                builder = builder.set_override(format!("{}.{}", section, key), value)?;
            }
        }

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.apply_env(vars)?;
        Ok(cfg)
    }

    /// Load config from a specific file, without environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    fn apply_env(&mut self, vars: &Map<String, String>) -> Result<(), ConfigError> {
        let var = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string);

        self.openai_api_key = var("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string()))?;
        self.database_url = var("DATABASE_URL");
        self.run_message = var("RUN_MESSAGE");
        if let Some(thread_id) = var("THREAD_ID") {
            self.thread_id = thread_id;
        }
        if let Some(user_id) = var("USER_ID") {
            self.user_id = user_id;
        }
        if let Some(path) = var("GOOGLE_TOKEN_PATH") {
            self.gmail.token_path = PathBuf::from(path);
        }
        if let Some(path) = var("GOOGLE_CREDENTIALS_PATH") {
            self.gmail.credentials_path = PathBuf::from(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(dir.path(), &vars(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(cfg.llm.model, "gpt-4o");
        assert_eq!(cfg.logging.format, "pretty");
        assert_eq!(cfg.graph.max_iterations, 25);
        assert_eq!(cfg.graph.tool_error_policy, ToolErrorPolicy::Propagate);
        assert_eq!(cfg.thread_id, DEFAULT_THREAD_ID);
        assert_eq!(cfg.user_id, DEFAULT_USER_ID);
        assert_eq!(cfg.gmail.token_path, PathBuf::from(".secrets/token.json"));
        assert!(cfg.database_url.is_none());
        assert!(cfg.run_message.is_none());
    }

    #[test]
    fn test_missing_api_key_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path(), &vars(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_files_and_env_layering() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
            [llm]
            model = "gpt-4o-mini"
            temperature = 0.2

            [logging]
            level = "debug"
            format = "json"

            [graph]
            max_iterations = 10
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("prod.toml"),
            r#"
            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        let cfg = Config::load_from(
            dir.path(),
            &vars(&[
                ("ENV", "prod"),
                ("OPENAI_API_KEY", "sk-test"),
                ("LLM_MODEL", "gpt-4.1"),
                ("GRAPH_TOOL_ERROR_POLICY", "report_to_model"),
                ("GMAIL_BASE_DIR", "/srv/mailpilot"),
                ("DATABASE_URL", "postgres://localhost/mailpilot"),
                ("THREAD_ID", "thread-9"),
                ("GOOGLE_TOKEN_PATH", "/tmp/token.json"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.llm.model, "gpt-4.1");
        assert_eq!(cfg.llm.temperature, Some(0.2));
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.graph.max_iterations, 10);
        assert_eq!(cfg.graph.tool_error_policy, ToolErrorPolicy::ReportToModel);
        assert_eq!(cfg.gmail.base_dir, PathBuf::from("/srv/mailpilot"));
        assert_eq!(cfg.gmail.token_path, PathBuf::from("/tmp/token.json"));
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/mailpilot"));
        assert_eq!(cfg.thread_id, "thread-9");
        assert_eq!(cfg.user_id, DEFAULT_USER_ID);
    }

    #[test]
    fn test_blank_database_url_means_memory_mode() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(
            dir.path(),
            &vars(&[("OPENAI_API_KEY", "sk-test"), ("DATABASE_URL", "  ")]),
        )
        .unwrap();
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn test_conversions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mailpilot.toml");
        fs::write(
            &path,
            r#"
            [llm]
            model = "gpt-4o"
            temperature = 0.5

            [gmail]
            base_dir = "/data"

            [graph]
            max_iterations = 3
            "#,
        )
        .unwrap();
        let cfg = Config::from_file(&path).unwrap();

        let llm: LLMConfig = (&cfg.llm).into();
        assert_eq!(llm.model, "gpt-4o");
        assert_eq!(llm.temperature, Some(0.5));

        let graph: GraphConfig = (&cfg.graph).into();
        assert_eq!(graph.max_iterations, 3);

        let gmail: GmailAuthConfig = (&cfg.gmail).into();
        assert_eq!(gmail.resolved_token_path(), PathBuf::from("/data/.secrets/token.json"));
    }
}

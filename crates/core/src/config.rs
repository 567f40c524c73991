use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::company::VacationPolicy;
use crate::output::{FormatOptions, DEFAULT_EMAIL_DELIMITER, DEFAULT_NON_EMAIL_APPROVERS};

pub const CONFIG_FILE_NAME: &str = "rolematrix.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub vacations: VacationConfig,
    pub tables: TablesConfig,
    pub companies: Vec<CompanyConfig>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct OutputConfig {
    pub email_delimiter: String,
    pub dedupe_emails: bool,
    pub non_email_approvers: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct VacationConfig {
    pub policy: VacationPolicy,
}

#[derive(Clone, Debug, Default)]
pub struct TablesConfig {
    /// Base directory for relative company `tables_dir` entries.
    pub data_root: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyConfig {
    pub name: String,
    pub tables_dir: PathBuf,
    pub role_pattern: String,
    #[serde(default)]
    pub clients: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub data_root: Option<PathBuf>,
    pub vacation_policy: Option<VacationPolicy>,
    pub dedupe_emails: Option<bool>,
    pub email_delimiter: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            output: OutputConfig {
                email_delimiter: DEFAULT_EMAIL_DELIMITER.to_string(),
                dedupe_emails: true,
                non_email_approvers: DEFAULT_NON_EMAIL_APPROVERS
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
            },
            vacations: VacationConfig { policy: VacationPolicy::PerRequest },
            tables: TablesConfig::default(),
            companies: Vec::new(),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl OutputConfig {
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            dedupe_emails: self.dedupe_emails,
            non_email_approvers: self.non_email_approvers.clone(),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn company(&self, name: &str) -> Option<&CompanyConfig> {
        self.companies.iter().find(|company| company.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Directory holding a company's matrix tables, anchored at `tables.data_root` when relative.
    pub fn tables_dir(&self, company: &CompanyConfig) -> PathBuf {
        match &self.tables.data_root {
            Some(root) if company.tables_dir.is_relative() => root.join(&company.tables_dir),
            _ => company.tables_dir.clone(),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(output) = patch.output {
            if let Some(email_delimiter) = output.email_delimiter {
                self.output.email_delimiter = email_delimiter;
            }
            if let Some(dedupe_emails) = output.dedupe_emails {
                self.output.dedupe_emails = dedupe_emails;
            }
            if let Some(non_email_approvers) = output.non_email_approvers {
                self.output.non_email_approvers = non_email_approvers;
            }
        }

        if let Some(vacations) = patch.vacations {
            if let Some(policy) = vacations.policy {
                self.vacations.policy = policy;
            }
        }

        if let Some(tables) = patch.tables {
            if let Some(data_root) = tables.data_root {
                self.tables.data_root = Some(data_root);
            }
        }

        if let Some(companies) = patch.companies {
            self.companies = companies;
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let log_level =
            read_env("ROLEMATRIX_LOGGING_LEVEL").or_else(|| read_env("ROLEMATRIX_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ROLEMATRIX_LOGGING_FORMAT").or_else(|| read_env("ROLEMATRIX_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Ok(value) = env::var("ROLEMATRIX_OUTPUT_EMAIL_DELIMITER") {
            self.output.email_delimiter = value;
        }
        if let Some(value) = read_env("ROLEMATRIX_OUTPUT_DEDUPE_EMAILS") {
            self.output.dedupe_emails = parse_bool("ROLEMATRIX_OUTPUT_DEDUPE_EMAILS", &value)?;
        }

        if let Some(value) = read_env("ROLEMATRIX_VACATIONS_POLICY") {
            self.vacations.policy =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "ROLEMATRIX_VACATIONS_POLICY".to_string(),
                    value: value.clone(),
                })?;
        }

        if let Some(value) = read_env("ROLEMATRIX_DATA_ROOT") {
            self.tables.data_root = Some(PathBuf::from(value));
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(data_root) = overrides.data_root {
            self.tables.data_root = Some(data_root);
        }
        if let Some(vacation_policy) = overrides.vacation_policy {
            self.vacations.policy = vacation_policy;
        }
        if let Some(dedupe_emails) = overrides.dedupe_emails {
            self.output.dedupe_emails = dedupe_emails;
        }
        if let Some(email_delimiter) = overrides.email_delimiter {
            self.output.email_delimiter = email_delimiter;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_logging(&self.logging)?;
        validate_output(&self.output)?;
        validate_companies(&self.companies)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_output(output: &OutputConfig) -> Result<(), ConfigError> {
    if output.email_delimiter.is_empty() {
        return Err(ConfigError::Validation(
            "output.email_delimiter must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_companies(companies: &[CompanyConfig]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for company in companies {
        let name = company.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation("companies[].name must not be empty".to_string()));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "company `{name}` is configured more than once"
            )));
        }
        if company.tables_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!(
                "companies[{name}].tables_dir must not be empty"
            )));
        }
        if let Err(error) = Regex::new(&company.role_pattern) {
            return Err(ConfigError::Validation(format!(
                "companies[{name}].role_pattern does not compile: {error}"
            )));
        }
        if company.clients.iter().all(|client| client.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "companies[{name}].clients must list at least one client"
            )));
        }
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    output: Option<OutputPatch>,
    vacations: Option<VacationPatch>,
    tables: Option<TablesPatch>,
    companies: Option<Vec<CompanyConfig>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputPatch {
    email_delimiter: Option<String>,
    dedupe_emails: Option<bool>,
    non_email_approvers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct VacationPatch {
    policy: Option<VacationPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct TablesPatch {
    data_root: Option<PathBuf>,
}

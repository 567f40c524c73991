use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rolematrix_core::config::{AppConfig, LoadOptions, CONFIG_FILE_NAME};
use toml::Value;

pub fn run(options: LoadOptions) -> String {
    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["ROLEMATRIX_LOGGING_LEVEL", "ROLEMATRIX_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["ROLEMATRIX_LOGGING_FORMAT", "ROLEMATRIX_LOG_FORMAT"]),
    ));

    lines.push(render_line(
        "output.email_delimiter",
        &format!("{:?}", config.output.email_delimiter),
        source("output.email_delimiter", &["ROLEMATRIX_OUTPUT_EMAIL_DELIMITER"]),
    ));
    lines.push(render_line(
        "output.dedupe_emails",
        &config.output.dedupe_emails.to_string(),
        source("output.dedupe_emails", &["ROLEMATRIX_OUTPUT_DEDUPE_EMAILS"]),
    ));
    lines.push(render_line(
        "output.non_email_approvers",
        &config.output.non_email_approvers.join(", "),
        source("output.non_email_approvers", &[]),
    ));

    lines.push(render_line(
        "vacations.policy",
        &format!("{:?}", config.vacations.policy),
        source("vacations.policy", &["ROLEMATRIX_VACATIONS_POLICY"]),
    ));
    lines.push(render_line(
        "tables.data_root",
        &config
            .tables
            .data_root
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unset>".to_string()),
        source("tables.data_root", &["ROLEMATRIX_DATA_ROOT"]),
    ));

    let companies_source = source("companies", &[]);
    if config.companies.is_empty() {
        lines.push(render_line("companies", "<none>", companies_source.clone()));
    }
    for company in &config.companies {
        lines.push(render_line(
            &format!("companies.{}", company.name),
            &format!(
                "tables_dir={} clients=[{}] role_pattern={}",
                config.tables_dir(company).display(),
                company.clients.join(", "),
                company.role_pattern
            ),
            companies_source.clone(),
        ));
    }

    lines.join("\n")
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from(CONFIG_FILE_NAME);
    if root.exists() {
        return Some(root);
    }

    let nested = Path::new("config").join(CONFIG_FILE_NAME);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

pub mod companies;
pub mod config;
pub mod doctor;
pub mod resolve;

use chrono::NaiveDate;
use rolematrix_core::company::CompanyProfile;
use rolematrix_core::config::AppConfig;
use rolematrix_core::errors::{ApplicationError, RequestError};
use rolematrix_tables::CsvTableSource;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), error.exit_code())
    }
}

/// Loads the named company's tables from its configured directory.
pub(crate) fn load_profile(
    config: &AppConfig,
    company: &str,
    today: NaiveDate,
) -> Result<CompanyProfile, ApplicationError> {
    let company_config = config
        .company(company)
        .ok_or_else(|| RequestError::UnknownCompany(company.trim().to_string()))?;
    let source = CsvTableSource::new(config.tables_dir(company_config));

    Ok(CompanyProfile::load(company_config, source, config.vacations.policy, today)?)
}

pub(crate) fn to_json<T: Serialize>(command: &str, payload: &T) -> CommandResult {
    match serde_json::to_string_pretty(payload) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

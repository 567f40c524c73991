use chrono::NaiveDate;
use rolematrix_core::company::CompanyProfile;
use rolematrix_core::config::{AppConfig, LoadOptions};
use rolematrix_core::domain::single::SingleApproverEntry;
use rolematrix_core::errors::{ApplicationError, RequestError};
use rolematrix_core::routing::ResolutionNotice;
use serde::Serialize;
use tracing::info;

use crate::commands::{load_profile, to_json, CommandResult};

const COMMAND: &str = "resolve";

#[derive(Clone, Debug)]
pub struct ResolveRequest {
    pub company: String,
    /// Region name or 1-based position in the Roles header.
    pub region: String,
    pub client: String,
    pub singles: Vec<String>,
    pub as_of: NaiveDate,
    pub lines: Vec<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ResolvePayload<'a> {
    command: &'static str,
    status: &'static str,
    company: &'a str,
    region: &'a str,
    client: &'a str,
    as_of: NaiveDate,
    text: String,
    approver_emails: Vec<String>,
    joined_emails: String,
    notices: Vec<NoticePayload>,
}

#[derive(Debug, Serialize)]
struct NoticePayload {
    #[serde(flatten)]
    notice: ResolutionNotice,
    message: String,
}

/// `today` is the profile load date; vacation coverage follows `request.as_of` unless the
/// configured policy bakes substitutions in at load.
pub fn run(options: LoadOptions, request: ResolveRequest, today: NaiveDate) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, &error.into()),
    };

    match execute(&config, &request, today) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn execute(
    config: &AppConfig,
    request: &ResolveRequest,
    today: NaiveDate,
) -> Result<CommandResult, ApplicationError> {
    let profile = load_profile(config, &request.company, today)?;

    let region_index = profile.region_index(&request.region).ok_or_else(|| {
        RequestError::UnknownRegion {
            company: profile.name().to_string(),
            region: request.region.clone(),
        }
    })?;
    let client = profile.client(&request.client).ok_or_else(|| RequestError::UnknownClient {
        company: profile.name().to_string(),
        client: request.client.clone(),
    })?;
    let singles = select_singles(&profile, &request.singles)?;

    let resolution = profile.resolve(&request.lines, region_index, request.as_of)?;
    let options = config.output.format_options();
    let output = profile.formatter(&options).format(&resolution.assignments, client, &singles);
    let joined_emails = output.joined_emails(&config.output.email_delimiter);

    info!(
        event_name = "matrix.request.resolved",
        company = profile.name(),
        region = %profile.regions()[region_index],
        client,
        assignments = resolution.assignments.len(),
        singles = singles.len(),
        notices = resolution.notices.len(),
        "role request resolved"
    );

    if request.json {
        let payload = ResolvePayload {
            command: COMMAND,
            status: "ok",
            company: profile.name(),
            region: &profile.regions()[region_index],
            client,
            as_of: request.as_of,
            text: output.text,
            approver_emails: output.approver_emails,
            joined_emails,
            notices: resolution
                .notices
                .into_iter()
                .map(|notice| NoticePayload { message: notice.message(), notice })
                .collect(),
        };
        return Ok(to_json(COMMAND, &payload));
    }

    let mut lines: Vec<String> =
        resolution.notices.iter().map(|notice| format!("note: {}", notice.message())).collect();
    if !output.text.is_empty() {
        lines.push(output.text.trim_start_matches('\n').to_string());
    }
    lines.push(String::new());
    lines.push(joined_emails);

    Ok(CommandResult { exit_code: 0, output: lines.join("\n") })
}

fn select_singles<'a>(
    profile: &'a CompanyProfile,
    labels: &[String],
) -> Result<Vec<&'a SingleApproverEntry>, RequestError> {
    labels
        .iter()
        .map(|label| {
            profile.singles().find(label.trim()).ok_or_else(|| RequestError::UnknownSingle {
                company: profile.name().to_string(),
                label: label.clone(),
            })
        })
        .collect()
}

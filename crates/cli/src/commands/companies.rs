use chrono::NaiveDate;
use rolematrix_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::{load_profile, to_json, CommandResult};

const COMMAND: &str = "companies";

#[derive(Debug, Serialize)]
struct CompanySummary {
    name: String,
    tables_dir: String,
    clients: Vec<String>,
    status: &'static str,
    regions: Vec<String>,
    roles: usize,
    single_approvers: Vec<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompaniesReport {
    command: &'static str,
    companies: Vec<CompanySummary>,
}

pub fn run(options: LoadOptions, today: NaiveDate, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, &error.into()),
    };

    let companies: Vec<CompanySummary> =
        config.companies.iter().map(|company| summarize(&config, &company.name, today)).collect();
    let exit_code = if companies.iter().all(|company| company.error.is_none()) { 0 } else { 3 };

    let mut result = if json_output {
        to_json(COMMAND, &CompaniesReport { command: COMMAND, companies })
    } else {
        CommandResult { exit_code: 0, output: render_human(&companies) }
    };
    if result.exit_code == 0 {
        result.exit_code = exit_code;
    }
    result
}

fn summarize(config: &AppConfig, name: &str, today: NaiveDate) -> CompanySummary {
    let (tables_dir, clients) = match config.company(name) {
        Some(company) => {
            (config.tables_dir(company).display().to_string(), company.clients.clone())
        }
        None => (String::new(), Vec::new()),
    };

    match load_profile(config, name, today) {
        Ok(profile) => CompanySummary {
            name: name.to_string(),
            tables_dir,
            clients,
            status: "ok",
            regions: profile.regions().to_vec(),
            roles: profile.roles().len(),
            single_approvers: profile.singles().menu_labels().map(str::to_string).collect(),
            error: None,
        },
        Err(error) => CompanySummary {
            name: name.to_string(),
            tables_dir,
            clients,
            status: "error",
            regions: Vec::new(),
            roles: 0,
            single_approvers: Vec::new(),
            error: Some(error.to_string()),
        },
    }
}

fn render_human(companies: &[CompanySummary]) -> String {
    if companies.is_empty() {
        return "no companies configured".to_string();
    }

    let mut lines = Vec::new();
    for company in companies {
        lines.push(format!("{} ({})", company.name, company.tables_dir));
        if let Some(error) = &company.error {
            lines.push(format!("  error: {error}"));
            continue;
        }
        lines.push(format!("  regions: {}", company.regions.join(", ")));
        lines.push(format!("  clients: {}", company.clients.join(", ")));
        lines.push(format!("  roles: {}", company.roles));
        if !company.single_approvers.is_empty() {
            lines.push(format!("  single approvers: {}", company.single_approvers.join(", ")));
        }
    }

    lines.join("\n")
}

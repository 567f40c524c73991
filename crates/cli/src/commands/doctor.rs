use chrono::NaiveDate;
use rolematrix_core::config::{AppConfig, LoadOptions};
use rolematrix_core::tables::Table;
use rolematrix_tables::CsvTableSource;
use serde::Serialize;

use crate::commands::load_profile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, today: NaiveDate, json_output: bool) -> String {
    let report = build_report(options, today);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions, today: NaiveDate) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(check(
                "config_validation",
                CheckStatus::Pass,
                "configuration loaded and validated",
            ));
            if config.companies.is_empty() {
                checks.push(check(
                    "companies_configured",
                    CheckStatus::Fail,
                    "no [[companies]] entries are configured",
                ));
            }
            for company in &config.companies {
                checks.push(check_tables_present(&config, &company.name));
                checks.push(check_profile_load(&config, &company.name, today));
            }
        }
        Err(error) => {
            checks.push(check("config_validation", CheckStatus::Fail, error.to_string()));
            checks.push(check(
                "company_tables",
                CheckStatus::Skipped,
                "skipped because configuration did not load",
            ));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_tables_present(config: &AppConfig, company: &str) -> DoctorCheck {
    let name = format!("tables_present:{company}");
    let Some(company_config) = config.company(company) else {
        return check(name, CheckStatus::Fail, "company is not configured");
    };

    let source = CsvTableSource::new(config.tables_dir(company_config));
    let missing: Vec<String> = Table::ALL
        .into_iter()
        .filter(|table| !source.path_for(*table).is_file())
        .map(|table| source.path_for(table).display().to_string())
        .collect();

    if missing.is_empty() {
        check(name, CheckStatus::Pass, format!("all tables found in `{}`", source.dir().display()))
    } else {
        check(name, CheckStatus::Fail, format!("missing: {}", missing.join(", ")))
    }
}

fn check_profile_load(config: &AppConfig, company: &str, today: NaiveDate) -> DoctorCheck {
    let name = format!("profile_load:{company}");

    match load_profile(config, company, today) {
        Ok(profile) => check(
            name,
            CheckStatus::Pass,
            format!(
                "{} regions, {} roles, {} emails, {} vacation rules, {} single approvers",
                profile.regions().len(),
                profile.roles().len(),
                profile.emails().len(),
                profile.vacations().rules().len(),
                profile.singles().entries().len()
            ),
        ),
        Err(error) => check(name, CheckStatus::Fail, error.to_string()),
    }
}

fn check(name: impl Into<String>, status: CheckStatus, details: impl Into<String>) -> DoctorCheck {
    DoctorCheck { name: name.into(), status, details: details.into() }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

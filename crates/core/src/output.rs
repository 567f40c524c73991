use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::EmailDirectory;
use crate::domain::assignment::ResolvedAssignment;
use crate::domain::single::SingleApproverEntry;

pub const DEFAULT_EMAIL_DELIMITER: &str = ", ";

/// Approver names that stand for a decision rather than a person.
pub const DEFAULT_NON_EMAIL_APPROVERS: [&str; 6] = [
    "Do Not Assign",
    "Do Not Request",
    "No Approval Needed",
    "No Approval Required",
    "No Approver",
    "N/A",
];

/// Placeholder listed in place of an approver's email when the directory has none.
pub fn missing_email_placeholder(approver: &str) -> String {
    format!("{approver}'s email is missing")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    pub dedupe_emails: bool,
    pub non_email_approvers: Vec<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            dedupe_emails: false,
            non_email_approvers: DEFAULT_NON_EMAIL_APPROVERS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl FormatOptions {
    fn wants_email(&self, approver: &str) -> bool {
        let key = normalize_key(approver);
        !self.non_email_approvers.iter().any(|name| normalize_key(name) == key)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedOutput {
    pub approver_emails: Vec<String>,
    pub text: String,
}

impl FormattedOutput {
    pub fn joined_emails(&self, delimiter: &str) -> String {
        self.approver_emails.join(delimiter)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OutputFormatter<'a> {
    emails: &'a EmailDirectory,
    options: &'a FormatOptions,
}

impl<'a> OutputFormatter<'a> {
    pub fn new(emails: &'a EmailDirectory, options: &'a FormatOptions) -> Self {
        Self { emails, options }
    }

    /// Groups approver-sorted assignments into ticket sections for `client`, then appends the
    /// selected single-approver grants.
    pub fn format(
        &self,
        assignments: &[ResolvedAssignment],
        client: &str,
        singles: &[&SingleApproverEntry],
    ) -> FormattedOutput {
        let mut lines: Vec<String> = Vec::new();
        let mut approver_emails = Vec::new();
        let mut current_approver: Option<&str> = None;

        for assignment in assignments {
            if current_approver != Some(assignment.approver_name.as_str()) {
                current_approver = Some(assignment.approver_name.as_str());
                self.open_section(&mut lines, &mut approver_emails, client, &assignment.approver_name);
            }
            lines.push(format!("{}\t{}", assignment.role_name, assignment.role_description));
        }

        for entry in singles {
            self.open_section(&mut lines, &mut approver_emails, &entry.client, &entry.approver);
            lines.push(format!("{}\t{}", entry.client_name, entry.role_text));
        }

        if self.options.dedupe_emails {
            dedupe_in_order(&mut approver_emails);
        }

        debug!(
            event_name = "matrix.output.formatted",
            sections = lines.iter().filter(|line| line.is_empty()).count(),
            emails = approver_emails.len(),
            "ticket text formatted"
        );
        FormattedOutput { approver_emails, text: lines.join("\n") }
    }

    fn open_section(
        &self,
        lines: &mut Vec<String>,
        approver_emails: &mut Vec<String>,
        client: &str,
        approver: &str,
    ) {
        lines.push(String::new());
        lines.push(format!("{client} -- awaiting approval from {approver}"));

        if self.options.wants_email(approver) {
            let email = self
                .emails
                .lookup(approver)
                .map(str::to_string)
                .unwrap_or_else(|| missing_email_placeholder(approver));
            approver_emails.push(email);
        }
    }
}

fn dedupe_in_order(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|value| seen.insert(value.clone()));
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::catalog::{regions_from_header, RoleCatalog};
use crate::config::CompanyConfig;
use crate::directory::{EmailDirectory, SingleApproverDirectory};
use crate::output::{FormatOptions, OutputFormatter};
use crate::routing::{AsListed, Resolution, ResolveError, RoleResolver, VacationCoverage};
use crate::tables::{Table, TableError, TableSource};
use crate::vacations::VacationIndex;

/// When vacation substitutions are applied to the role catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationPolicy {
    /// Substitute on every request using the request date.
    #[default]
    PerRequest,
    /// Substitute once while the profile is loaded.
    AtLoad,
}

impl std::str::FromStr for VacationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "per_request" => Ok(Self::PerRequest),
            "at_load" => Ok(Self::AtLoad),
            other => Err(format!("unsupported vacation policy `{other}` (expected per_request|at_load)")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("company `{company}`: {source}")]
    Table {
        company: String,
        #[source]
        source: TableError,
    },
    #[error("company `{company}` has an invalid role pattern: {source}")]
    InvalidPattern {
        company: String,
        #[source]
        source: regex::Error,
    },
    #[error("company `{company}` roles table has no region columns")]
    NoRegions { company: String },
}

/// Every lookup needed to route role requests for one organization.
///
/// Built once and read-only afterwards.
#[derive(Clone, Debug)]
pub struct CompanyProfile {
    name: String,
    role_pattern: Regex,
    clients: Vec<String>,
    regions: Vec<String>,
    roles: RoleCatalog,
    emails: EmailDirectory,
    singles: SingleApproverDirectory,
    vacations: VacationIndex,
    vacation_policy: VacationPolicy,
    loaded_on: NaiveDate,
}

impl CompanyProfile {
    pub fn load<S>(
        config: &CompanyConfig,
        source: S,
        vacation_policy: VacationPolicy,
        today: NaiveDate,
    ) -> Result<Self, ProfileError>
    where
        S: TableSource,
    {
        let company = config.name.clone();
        let table_error = |source: TableError| ProfileError::Table { company: company.clone(), source };

        let role_pattern = Regex::new(&config.role_pattern).map_err(|source| {
            ProfileError::InvalidPattern { company: company.clone(), source }
        })?;

        let vacations =
            VacationIndex::from_rows(&source.read_table(Table::Vacations).map_err(table_error)?)
                .map_err(table_error)?;

        let role_rows = source.read_table(Table::Roles).map_err(table_error)?;
        let regions = role_rows.first().map(|header| regions_from_header(header)).unwrap_or_default();
        if regions.is_empty() {
            return Err(ProfileError::NoRegions { company: company.clone() });
        }
        let body = &role_rows[1..];
        let roles = match vacation_policy {
            VacationPolicy::AtLoad => RoleCatalog::build(body, &regions, &vacations, today),
            VacationPolicy::PerRequest => RoleCatalog::build_unresolved(body, &regions),
        };

        let emails = EmailDirectory::from_rows(&source.read_table(Table::Emails).map_err(table_error)?);
        let singles =
            SingleApproverDirectory::from_rows(&source.read_table(Table::Singles).map_err(table_error)?)
                .map_err(table_error)?;

        info!(
            event_name = "matrix.profile.loaded",
            company = %company,
            regions = regions.len(),
            roles = roles.len(),
            emails = emails.len(),
            vacations = vacations.rules().len(),
            singles = singles.entries().len(),
            vacation_policy = ?vacation_policy,
            "company profile loaded"
        );

        Ok(Self {
            name: company,
            role_pattern,
            clients: config.clients.clone(),
            regions,
            roles,
            emails,
            singles,
            vacations,
            vacation_policy,
            loaded_on: today,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role_pattern(&self) -> &Regex {
        &self.role_pattern
    }

    pub fn clients(&self) -> &[String] {
        &self.clients
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn roles(&self) -> &RoleCatalog {
        &self.roles
    }

    pub fn emails(&self) -> &EmailDirectory {
        &self.emails
    }

    pub fn singles(&self) -> &SingleApproverDirectory {
        &self.singles
    }

    pub fn vacations(&self) -> &VacationIndex {
        &self.vacations
    }

    pub fn vacation_policy(&self) -> VacationPolicy {
        self.vacation_policy
    }

    pub fn loaded_on(&self) -> NaiveDate {
        self.loaded_on
    }

    /// Finds a region by name (case-insensitive) or by 1-based menu number.
    pub fn region_index(&self, selector: &str) -> Option<usize> {
        let selector = selector.trim();
        if let Ok(number) = selector.parse::<usize>() {
            return (1..=self.regions.len()).contains(&number).then(|| number - 1);
        }
        self.regions.iter().position(|region| region.eq_ignore_ascii_case(selector))
    }

    pub fn client(&self, name: &str) -> Option<&str> {
        self.clients
            .iter()
            .find(|client| client.eq_ignore_ascii_case(name.trim()))
            .map(String::as_str)
    }

    /// Resolves pasted role lines for a region as of `as_of`.
    ///
    /// Under [`VacationPolicy::AtLoad`] the catalog already carries substitutions from
    /// [`Self::loaded_on`] and `as_of` is ignored.
    pub fn resolve<I, S>(
        &self,
        lines: I,
        region_index: usize,
        as_of: NaiveDate,
    ) -> Result<Resolution, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self.vacation_policy {
            VacationPolicy::AtLoad => {
                RoleResolver::new(&self.role_pattern, &self.roles, &self.regions, AsListed)
                    .resolve(lines, region_index)
            }
            VacationPolicy::PerRequest => RoleResolver::new(
                &self.role_pattern,
                &self.roles,
                &self.regions,
                VacationCoverage { vacations: &self.vacations, as_of },
            )
            .resolve(lines, region_index),
        }
    }

    pub fn formatter<'a>(&'a self, options: &'a FormatOptions) -> OutputFormatter<'a> {
        OutputFormatter::new(&self.emails, options)
    }
}

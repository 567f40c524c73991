use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::RoleCatalog;
use crate::domain::assignment::ResolvedAssignment;
use crate::vacations::VacationIndex;

/// Decides who actually covers for an approver named in the matrix.
pub trait ApproverCoverage {
    fn covering(&self, approver: &str) -> String;
}

/// Names are used as stored; the catalog was already vacation-resolved when it was built.
#[derive(Clone, Copy, Debug, Default)]
pub struct AsListed;

impl ApproverCoverage for AsListed {
    fn covering(&self, approver: &str) -> String {
        approver.to_string()
    }
}

/// Consults the vacation index for the date of the request.
#[derive(Clone, Copy, Debug)]
pub struct VacationCoverage<'a> {
    pub vacations: &'a VacationIndex,
    pub as_of: NaiveDate,
}

impl ApproverCoverage for VacationCoverage<'_> {
    fn covering(&self, approver: &str) -> String {
        self.vacations.resolve(approver, self.as_of).to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionNotice {
    RoleNotFound { role: String },
    NoApprover { role: String, region: String },
}

impl ResolutionNotice {
    pub fn message(&self) -> String {
        match self {
            Self::RoleNotFound { role } => format!("{role} role not found"),
            Self::NoApprover { role, region } => {
                format!("{role} has no approver listed for {region}")
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Sorted by approver name; ties keep input order.
    pub assignments: Vec<ResolvedAssignment>,
    pub notices: Vec<ResolutionNotice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("region index {index} is out of range for {region_count} configured regions")]
    RegionOutOfRange { index: usize, region_count: usize },
}

#[derive(Clone, Debug)]
pub struct RoleResolver<'a, C> {
    pattern: &'a Regex,
    catalog: &'a RoleCatalog,
    regions: &'a [String],
    coverage: C,
}

impl<'a, C> RoleResolver<'a, C>
where
    C: ApproverCoverage,
{
    pub fn new(
        pattern: &'a Regex,
        catalog: &'a RoleCatalog,
        regions: &'a [String],
        coverage: C,
    ) -> Self {
        Self { pattern, catalog, regions, coverage }
    }

    /// Matches each input line against the catalog for the region at `region_index`.
    pub fn resolve<I, S>(&self, lines: I, region_index: usize) -> Result<Resolution, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(region) = self.regions.get(region_index) else {
            return Err(ResolveError::RegionOutOfRange {
                index: region_index,
                region_count: self.regions.len(),
            });
        };

        let mut resolution = Resolution::default();

        for line in lines {
            let Some(candidate) = self.candidate(line.as_ref()) else {
                continue;
            };

            let mut matched = false;
            for role in self.catalog.matching(&candidate) {
                matched = true;
                let slot = role.approver_for(region_index).ok_or(
                    ResolveError::RegionOutOfRange {
                        index: region_index,
                        region_count: role.approvers.len(),
                    },
                )?;

                match slot {
                    Some(approver) => resolution.assignments.push(ResolvedAssignment {
                        role_name: role.name.clone(),
                        role_description: role.description.clone(),
                        approver_name: self.coverage.covering(approver),
                    }),
                    None => resolution.notices.push(ResolutionNotice::NoApprover {
                        role: role.name.clone(),
                        region: region.clone(),
                    }),
                }
            }

            if !matched {
                info!(
                    event_name = "matrix.routing.role_not_found",
                    role = %candidate,
                    "requested role is not in the matrix"
                );
                resolution.notices.push(ResolutionNotice::RoleNotFound { role: candidate });
            }
        }

        resolution.assignments.sort_by(|left, right| left.approver_name.cmp(&right.approver_name));

        debug!(
            event_name = "matrix.routing.resolved",
            region = %region,
            assignments = resolution.assignments.len(),
            notices = resolution.notices.len(),
            "role request resolved"
        );
        Ok(resolution)
    }

    fn candidate(&self, line: &str) -> Option<String> {
        let upper = line.to_uppercase();
        self.pattern.find(&upper).map(|found| found.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use regex::Regex;

    use super::{AsListed, ResolutionNotice, ResolveError, RoleResolver, VacationCoverage};
    use crate::catalog::RoleCatalog;
    use crate::domain::vacation::VacationRule;
    use crate::vacations::VacationIndex;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    fn regions() -> Vec<String> {
        vec!["East".to_string(), "West".to_string()]
    }

    fn pattern() -> Regex {
        Regex::new(r"[A-Z]+_[A-Z]+|ADMIN").expect("valid test pattern")
    }

    fn catalog() -> RoleCatalog {
        RoleCatalog::build_unresolved(
            &[
                row(&["VPN_ACCESS", "VPN access", "Regional", "-", "Alice", "Bob"]),
                row(&["DB_READ", "Database read", "Single", "-", "N/A", "Dana"]),
                row(&["ADMIN", "Admin east", "Single", "-", "Zed", "N/A"]),
                row(&["ADMIN", "Admin west", "Single", "-", "Bob", "N/A"]),
                row(&["WIKI_EDIT", "Wiki edit", "Regional", "-", "Alice", ""]),
            ],
            &regions(),
        )
    }

    fn approvers(resolution: &super::Resolution) -> Vec<&str> {
        resolution.assignments.iter().map(|row| row.approver_name.as_str()).collect()
    }

    #[test]
    fn regional_role_uses_approver_for_requested_region() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let resolver = RoleResolver::new(&pattern, &catalog, &regions, AsListed);

        let east = resolver.resolve(["requesting VPN_ACCESS please"], 0).expect("east resolves");
        let west = resolver.resolve(["requesting VPN_ACCESS please"], 1).expect("west resolves");

        assert_eq!(approvers(&east), vec!["Alice"]);
        assert_eq!(approvers(&west), vec!["Bob"]);
    }

    #[test]
    fn single_role_ignores_region() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let resolver = RoleResolver::new(&pattern, &catalog, &regions, AsListed);

        for region in 0..regions.len() {
            let resolution = resolver.resolve(["db_read"], region).expect("resolves");
            assert_eq!(approvers(&resolution), vec!["Dana"]);
        }
    }

    #[test]
    fn duplicate_catalog_rows_each_produce_an_assignment() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let resolver = RoleResolver::new(&pattern, &catalog, &regions, AsListed);

        let resolution = resolver.resolve(["ADMIN"], 0).expect("resolves");

        assert_eq!(resolution.assignments.len(), 2);
        assert_eq!(approvers(&resolution), vec!["Bob", "Zed"]);
    }

    #[test]
    fn output_is_sorted_by_approver_and_stable_on_ties() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let resolver = RoleResolver::new(&pattern, &catalog, &regions, AsListed);

        let resolution =
            resolver.resolve(["db_read", "wiki_edit", "admin", "vpn_access"], 0).expect("resolves");

        let rows: Vec<(&str, &str)> = resolution
            .assignments
            .iter()
            .map(|row| (row.approver_name.as_str(), row.role_description.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Alice", "Wiki edit"),
                ("Alice", "VPN access"),
                ("Bob", "Admin west"),
                ("Dana", "Database read"),
                ("Zed", "Admin east"),
            ]
        );
    }

    #[test]
    fn lines_without_a_pattern_match_are_skipped_silently() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let resolver = RoleResolver::new(&pattern, &catalog, &regions, AsListed);

        let resolution = resolver.resolve(["hello there", ""], 0).expect("resolves");

        assert!(resolution.assignments.is_empty());
        assert!(resolution.notices.is_empty());
    }

    #[test]
    fn unknown_roles_are_reported_not_failed() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let resolver = RoleResolver::new(&pattern, &catalog, &regions, AsListed);

        let resolution = resolver.resolve(["GHOST_ROLE", "vpn_access"], 0).expect("resolves");

        assert_eq!(approvers(&resolution), vec!["Alice"]);
        assert_eq!(
            resolution.notices,
            vec![ResolutionNotice::RoleNotFound { role: "GHOST_ROLE".to_string() }]
        );
        assert_eq!(resolution.notices[0].message(), "GHOST_ROLE role not found");
    }

    #[test]
    fn blank_regional_slot_is_reported_as_missing_approver() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let resolver = RoleResolver::new(&pattern, &catalog, &regions, AsListed);

        let resolution = resolver.resolve(["WIKI_EDIT"], 1).expect("resolves");

        assert!(resolution.assignments.is_empty());
        assert_eq!(
            resolution.notices,
            vec![ResolutionNotice::NoApprover {
                role: "WIKI_EDIT".to_string(),
                region: "West".to_string(),
            }]
        );
    }

    #[test]
    fn out_of_range_region_is_a_contract_violation() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let resolver = RoleResolver::new(&pattern, &catalog, &regions, AsListed);

        let error = resolver.resolve(["VPN_ACCESS"], 2).expect_err("region 2 does not exist");
        assert_eq!(error, ResolveError::RegionOutOfRange { index: 2, region_count: 2 });
    }

    #[test]
    fn vacation_coverage_applies_on_the_request_date() {
        let (pattern, catalog, regions) = (pattern(), catalog(), regions());
        let vacations = VacationIndex::new(vec![VacationRule {
            standard_name: "Bob".to_string(),
            replacement_name: "Carol".to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid test date"),
            finish: NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid test date"),
        }]);

        let during = RoleResolver::new(
            &pattern,
            &catalog,
            &regions,
            VacationCoverage {
                vacations: &vacations,
                as_of: NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid test date"),
            },
        );
        let after = RoleResolver::new(
            &pattern,
            &catalog,
            &regions,
            VacationCoverage {
                vacations: &vacations,
                as_of: NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid test date"),
            },
        );

        assert_eq!(approvers(&during.resolve(["VPN_ACCESS"], 1).expect("resolves")), vec!["Carol"]);
        assert_eq!(approvers(&after.resolve(["VPN_ACCESS"], 1).expect("resolves")), vec!["Bob"]);
    }
}

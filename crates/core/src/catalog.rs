use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::role::{Role, RoutingType};
use crate::tables::{cell, TableRow};
use crate::vacations::VacationIndex;

/// Marks an approver slot that does not apply to the role.
pub const NOT_APPLICABLE: &str = "N/A";

const NAME_COLUMN: usize = 0;
const DESCRIPTION_COLUMN: usize = 1;
const ROUTING_COLUMN: usize = 2;
const FIRST_APPROVER_COLUMN: usize = 4;

/// Ordered role definitions for one company, duplicates included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: Vec<Role>,
}

impl RoleCatalog {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }

    /// Builds the catalog with every approver passed through the vacation index as of `as_of`.
    pub fn build(
        rows: &[TableRow],
        regions: &[String],
        vacations: &VacationIndex,
        as_of: NaiveDate,
    ) -> Self {
        Self::collect(rows, regions, |slot| vacations.resolve_slot(slot, as_of))
    }

    /// Builds the catalog with approvers exactly as written in the matrix.
    pub fn build_unresolved(rows: &[TableRow], regions: &[String]) -> Self {
        Self::collect(rows, regions, |slot| slot.map(str::to_string))
    }

    fn collect<F>(rows: &[TableRow], regions: &[String], resolve: F) -> Self
    where
        F: Fn(Option<&str>) -> Option<String>,
    {
        let mut roles = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            let name = cell(row, NAME_COLUMN).unwrap_or_default();
            if name.trim().is_empty() {
                warn!(
                    event_name = "matrix.catalog.truncated",
                    row = index + 1,
                    loaded = roles.len(),
                    "role row has no name, treating it as the end of the table"
                );
                break;
            }

            let approvers =
                extract_approvers(row, regions.len()).into_iter().map(&resolve).collect();

            roles.push(Role {
                name: name.to_string(),
                description: cell(row, DESCRIPTION_COLUMN).unwrap_or_default().to_string(),
                approvers,
            });
        }

        debug!(event_name = "matrix.catalog.built", roles = roles.len(), "role catalog built");
        Self { roles }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Every role whose name is exactly `name`, in table order.
    pub fn matching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Role> + 'a {
        self.roles.iter().filter(move |role| role.name == name)
    }
}

/// Reads the region headings from the Roles header row.
///
/// Regions start at the first approver column and stop at the first blank heading.
pub fn regions_from_header(header: &[String]) -> Vec<String> {
    header
        .iter()
        .skip(FIRST_APPROVER_COLUMN)
        .map(|heading| heading.trim())
        .take_while(|heading| !heading.is_empty())
        .map(str::to_string)
        .collect()
}

fn extract_approvers(row: &[String], region_count: usize) -> Vec<Option<&str>> {
    let routing = RoutingType::from_cell(cell(row, ROUTING_COLUMN).unwrap_or_default());
    let slots = (FIRST_APPROVER_COLUMN..FIRST_APPROVER_COLUMN + region_count)
        .map(|column| cell(row, column).map(str::trim).filter(|value| !value.is_empty()));

    match routing {
        RoutingType::Regional => slots.collect(),
        RoutingType::Single => {
            let first = slots.flatten().find(|value| *value != NOT_APPLICABLE);
            vec![first]
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{regions_from_header, RoleCatalog};
    use crate::domain::vacation::VacationRule;
    use crate::vacations::VacationIndex;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    fn regions() -> Vec<String> {
        vec!["East".to_string(), "West".to_string()]
    }

    fn slots(names: &[&str]) -> Vec<Option<String>> {
        names.iter().map(|name| Some(name.to_string())).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid test date")
    }

    #[test]
    fn regional_rows_keep_one_approver_per_region() {
        let catalog = RoleCatalog::build(
            &[row(&["VPN_ACCESS", "VPN access", "Regional", "-", "Alice", "Bob"])],
            &regions(),
            &VacationIndex::default(),
            today(),
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.roles()[0].name, "VPN_ACCESS");
        assert_eq!(catalog.roles()[0].approvers, slots(&["Alice", "Bob"]));
    }

    #[test]
    fn single_rows_take_the_first_applicable_approver() {
        let catalog = RoleCatalog::build(
            &[row(&["DB_READ", "Database read", "Single", "-", "N/A", "Dana", "Eve"])],
            &[regions(), vec!["North".to_string()]].concat(),
            &VacationIndex::default(),
            today(),
        );

        assert_eq!(catalog.roles()[0].approvers, slots(&["Dana"]));
    }

    #[test]
    fn single_rows_without_an_approver_keep_one_absent_slot() {
        let catalog = RoleCatalog::build(
            &[row(&["DB_READ", "Database read", "Single", "-", "N/A", "N/A"])],
            &regions(),
            &VacationIndex::default(),
            today(),
        );

        assert_eq!(catalog.roles()[0].approvers, vec![None]);
    }

    #[test]
    fn regional_rows_preserve_blank_cells_as_absent() {
        let catalog = RoleCatalog::build(
            &[row(&["VPN_ACCESS", "VPN access", "Regional", "-", "Alice"])],
            &regions(),
            &VacationIndex::default(),
            today(),
        );

        assert_eq!(catalog.roles()[0].approvers, vec![Some("Alice".to_string()), None]);
    }

    #[test]
    fn stops_at_first_row_without_a_name() {
        let catalog = RoleCatalog::build(
            &[
                row(&["A", "first", "Single", "-", "Alice", "N/A"]),
                row(&["", "broken", "Single", "-", "Bob", "N/A"]),
                row(&["C", "never loaded", "Single", "-", "Carol", "N/A"]),
            ],
            &regions(),
            &VacationIndex::default(),
            today(),
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.roles()[0].name, "A");
    }

    #[test]
    fn approvers_on_vacation_are_replaced_at_build_time() {
        let vacations = VacationIndex::new(vec![VacationRule {
            standard_name: "Bob".to_string(),
            replacement_name: "Carol".to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid test date"),
            finish: NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid test date"),
        }]);

        let rows = [
            row(&["VPN_ACCESS", "VPN access", "Regional", "-", "Alice", "Bob"]),
            row(&["WIKI", "Wiki edit", "Single", "-", "Bob", "N/A"]),
        ];
        let resolved = RoleCatalog::build(&rows, &regions(), &vacations, today());
        let raw = RoleCatalog::build_unresolved(&rows, &regions());

        assert_eq!(resolved.roles()[0].approvers, slots(&["Alice", "Carol"]));
        assert_eq!(resolved.roles()[1].approvers, slots(&["Carol"]));
        assert_eq!(raw.roles()[0].approvers, slots(&["Alice", "Bob"]));
    }

    #[test]
    fn duplicate_role_names_are_all_kept() {
        let catalog = RoleCatalog::build_unresolved(
            &[
                row(&["ADMIN", "Admin east", "Single", "-", "Alice", "N/A"]),
                row(&["ADMIN", "Admin west", "Single", "-", "Bob", "N/A"]),
            ],
            &regions(),
        );

        assert_eq!(catalog.matching("ADMIN").count(), 2);
        assert_eq!(catalog.matching("admin").count(), 0);
    }

    #[test]
    fn regions_come_from_header_until_first_blank() {
        let header = row(&["Role", "Description", "Type", "Notes", "East", "West", "", "Ignored"]);
        assert_eq!(regions_from_header(&header), regions());
    }
}

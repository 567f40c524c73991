pub mod catalog;
pub mod company;
pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;
pub mod output;
pub mod routing;
pub mod tables;
pub mod vacations;

pub use catalog::RoleCatalog;
pub use company::{CompanyProfile, ProfileError, VacationPolicy};
pub use config::{AppConfig, CompanyConfig, ConfigError, LoadOptions};
pub use directory::{EmailDirectory, SingleApproverDirectory};
pub use domain::assignment::ResolvedAssignment;
pub use domain::role::{Role, RoutingType};
pub use domain::single::SingleApproverEntry;
pub use domain::vacation::VacationRule;
pub use errors::{ApplicationError, RequestError};
pub use output::{FormatOptions, FormattedOutput, OutputFormatter};
pub use routing::{Resolution, ResolutionNotice, ResolveError, RoleResolver};
pub use tables::{InMemoryTableSource, Table, TableError, TableRow, TableSource};
pub use vacations::VacationIndex;

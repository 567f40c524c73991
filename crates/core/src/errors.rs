use thiserror::Error;

use crate::company::ProfileError;
use crate::config::ConfigError;
use crate::routing::ResolveError;
use crate::tables::TableError;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("company `{0}` is not configured")]
    UnknownCompany(String),
    #[error("company `{company}` has no region `{region}`")]
    UnknownRegion { company: String, region: String },
    #[error("company `{company}` has no client `{client}`")]
    UnknownClient { company: String, client: String },
    #[error("company `{company}` has no single-approver entry `{label}`")]
    UnknownSingle { company: String, label: String },
    #[error("invalid request input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl ApplicationError {
    /// Stable identifier used in machine-readable command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::Profile(ProfileError::Table { .. }) | Self::Table(_) => "table_load",
            Self::Profile(_) => "profile_invalid",
            Self::Resolve(_) => "resolve_contract",
            Self::Request(_) => "bad_request",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Profile(_) | Self::Table(_) => 3,
            Self::Request(_) => 4,
            Self::Resolve(_) => 5,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration is invalid. Run `rolematrix doctor` for details.",
            Self::Profile(_) | Self::Table(_) => {
                "The company's matrix tables could not be loaded. Check the tables directory."
            }
            Self::Request(_) => "The request could not be processed. Check inputs and try again.",
            Self::Resolve(_) => "An unexpected internal error occurred.",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::company::ProfileError;
    use crate::config::ConfigError;
    use crate::errors::{ApplicationError, RequestError};
    use crate::routing::ResolveError;
    use crate::tables::{Table, TableError};

    #[test]
    fn config_error_maps_to_config_validation_class() {
        let error = ApplicationError::from(ConfigError::Validation("bad level".to_owned()));

        assert_eq!(error.error_class(), "config_validation");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn missing_table_is_reported_as_table_load() {
        let error = ApplicationError::from(ProfileError::Table {
            company: "Acme".to_owned(),
            source: TableError::Missing {
                table: Table::Roles,
                path: PathBuf::from("acme/Roles.csv"),
            },
        });

        assert_eq!(error.error_class(), "table_load");
        assert!(error.to_string().contains("Roles.csv"));
    }

    #[test]
    fn unknown_company_is_a_bad_request_with_user_safe_message() {
        let error = ApplicationError::from(RequestError::UnknownCompany("Initech".to_owned()));

        assert_eq!(error.error_class(), "bad_request");
        assert_eq!(error.exit_code(), 4);
        assert_eq!(
            error.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
        assert_eq!(error.to_string(), "company `Initech` is not configured");
    }

    #[test]
    fn resolve_contract_violation_maps_to_internal() {
        let error =
            ApplicationError::from(ResolveError::RegionOutOfRange { index: 4, region_count: 2 });

        assert_eq!(error.error_class(), "resolve_contract");
        assert_eq!(error.user_message(), "An unexpected internal error occurred.");
    }
}

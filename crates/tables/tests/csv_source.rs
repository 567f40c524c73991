use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rolematrix_core::company::{CompanyProfile, ProfileError, VacationPolicy};
use rolematrix_core::config::CompanyConfig;
use rolematrix_core::tables::{Table, TableError, TableSource};
use rolematrix_tables::CsvTableSource;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, body: &[u8]) {
    fs::write(dir.join(name), body).expect("fixture file should be written");
}

fn fixture_dir() -> TempDir {
    let dir = TempDir::new().expect("temp dir should be created");
    write(
        dir.path(),
        "Roles.csv",
        b"\xef\xbb\xbfRole,Description,Type,Notes,East,West\n\
          VPN_ACCESS,VPN access,Regional,-,Alice,Bob\n\
          DB_READ,\"Database read, reporting only\",Single,-,N/A,Dana\n",
    );
    write(dir.path(), "Email.csv", b"Alice,alice@example.com\nBob,bob@example.com\nDana\n");
    write(
        dir.path(),
        "Vacations.csv",
        b"Standard,Replacement,Start,Finish\nBob,Carol,1/1/2024,1/31/2024\n",
    );
    write(
        dir.path(),
        "Singles.csv",
        b"Menu,Client,Client Name,Approver,Role\nBadge,Facilities,Building services,Alice,Badge access\n",
    );
    dir
}

fn company_config() -> CompanyConfig {
    CompanyConfig {
        name: "Acme".to_string(),
        tables_dir: "acme".into(),
        role_pattern: r"[A-Z]+_[A-Z]+".to_string(),
        clients: vec!["ProdC1".to_string()],
    }
}

#[test]
fn reads_rows_verbatim_without_headers() {
    let dir = fixture_dir();
    let source = CsvTableSource::new(dir.path());

    let rows = source.read_table(Table::Roles).expect("roles table should read");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Role", "byte order mark should be stripped");
    assert_eq!(rows[2][1], "Database read, reporting only");
}

#[test]
fn ragged_rows_are_kept() {
    let dir = fixture_dir();
    let source = CsvTableSource::new(dir.path());

    let rows = source.read_table(Table::Emails).expect("email table should read");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2], vec!["Dana".to_string()]);
}

#[test]
fn non_utf8_bytes_are_decoded_lossily() {
    let dir = fixture_dir();
    write(dir.path(), "Email.csv", b"Ren\xe9,rene@example.com\n");
    let source = CsvTableSource::new(dir.path());

    let rows = source.read_table(Table::Emails).expect("legacy export should still read");

    assert_eq!(rows[0][0], "Ren\u{fffd}");
    assert_eq!(rows[0][1], "rene@example.com");
}

#[test]
fn missing_file_reports_its_path() {
    let dir = fixture_dir();
    fs::remove_file(dir.path().join("Singles.csv")).expect("fixture should be removed");
    let source = CsvTableSource::new(dir.path());

    let error = source.read_table(Table::Singles).expect_err("singles table is gone");

    match error {
        TableError::Missing { table, path } => {
            assert_eq!(table, Table::Singles);
            assert!(path.ends_with("Singles.csv"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn profile_loads_from_csv_directory_and_resolves() {
    let dir = fixture_dir();
    let today = NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid test date");

    let profile = CompanyProfile::load(
        &company_config(),
        CsvTableSource::new(dir.path()),
        VacationPolicy::PerRequest,
        today,
    )
    .expect("profile should load from csv");

    assert_eq!(profile.regions(), &["East".to_string(), "West".to_string()]);
    assert_eq!(profile.emails().lookup("Bob"), Some("bob@example.com"));

    let resolution =
        profile.resolve(["vpn_access", "db_read"], 1, today).expect("request should resolve");
    let approvers: Vec<&str> =
        resolution.assignments.iter().map(|row| row.approver_name.as_str()).collect();
    assert_eq!(approvers, vec!["Carol", "Dana"]);
}

#[test]
fn profile_load_surfaces_missing_tables() {
    let dir = fixture_dir();
    fs::remove_file(dir.path().join("Roles.csv")).expect("fixture should be removed");
    let today = NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid test date");

    let error = CompanyProfile::load(
        &company_config(),
        CsvTableSource::new(dir.path()),
        VacationPolicy::PerRequest,
        today,
    )
    .expect_err("roles table is missing");

    assert!(matches!(
        error,
        ProfileError::Table { source: TableError::Missing { table: Table::Roles, .. }, .. }
    ));
}

//! Tests for CostTreeService

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use costtree::application::services::{CostTreeService, ReportOptions, SliceFilter};
use costtree::application::ApplicationError;
use costtree::config::Settings;
use costtree::domain::{GroupKey, ZeroTotals};
use costtree::infrastructure::di::ServiceContainer;
use costtree::infrastructure::traits::{MemoryFileSystem, RealFileSystem};
use costtree::util::testing;

const RECORDS: &str = r#"[
  {"CIA": "C1", "PRJID": "P1", "ROW": "Cost", "COLUMN": "Budget", "LEVEL": 1, "NODE": 1, "NODEP": 0, "ITMID": "ROOT", "VALUE": 0},
  {"CIA": "C1", "PRJID": "P1", "ROW": "Cost", "COLUMN": "Budget", "LEVEL": 2, "NODE": 1, "NODEP": 1, "ITMID": "MAT01(M)", "VALUE": 100},
  {"CIA": "C1", "PRJID": "P1", "ROW": "Cost", "COLUMN": "Actual", "LEVEL": 2, "NODE": 2, "NODEP": 1, "ITMID": "LAB01(L)", "VALUE": 50},
  {"CIA": "C1", "PRJID": "P1", "ROW": "Cost", "COLUMN": "Forecast", "LEVEL": 2, "NODE": 3, "NODEP": 1, "ITMID": "SVC01", "VALUE": 0},
  {"CIA": "C2", "PRJID": "P7", "ROW": "Cost", "COLUMN": "Budget", "LEVEL": 1, "NODE": 1, "NODEP": 0, "ITMID": "ROOT", "VALUE": 0},
  {"CIA": "C2", "PRJID": "P7", "ROW": "Cost", "COLUMN": "Budget", "LEVEL": 2, "NODE": 1, "NODEP": 1, "ITMID": "MAT01(M)", "VALUE": 8}
]"#;

const DETAILS: &str = r#"[
  {"CIA": "C1", "PRJID": "P1", "itm_id": "MAT01", "description": "Steel", "unit": "t"},
  {"CIA": "C1", "PRJID": "P1", "itm_id": "LAB01", "description": "Welding"},
  {"CIA": "C2", "PRJID": "P7", "itm_id": "MAT01", "description": "Concrete"}
]"#;

/// Helper to create temp input files for testing
fn create_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write input file");
    path
}

fn service(options: ReportOptions) -> CostTreeService {
    CostTreeService::new(Arc::new(RealFileSystem), options)
}

// ============================================================
// Loading
// ============================================================

#[test]
fn given_aliased_json_when_loading_records_then_fields_mapped() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_input(&temp, "records.json", RECORDS);

    // Act
    let records = service(ReportOptions::default()).load_records(&path).unwrap();

    // Assert
    assert_eq!(records.len(), 6);
    assert_eq!(records[1].item_id, "MAT01(M)");
    assert_eq!(records[1].parent, 1);
    assert_eq!(records[1].value, 100.0);
}

#[test]
fn given_plain_field_names_when_loading_records_then_accepted() {
    let fs = MemoryFileSystem::new().with_file(
        "/in/records.json",
        r#"[{"company": "C", "project": "P", "row": "R", "column": "X",
             "level": 1, "node": 1, "parent": 0, "item_id": "I", "value": 2.5}]"#,
    );
    let service = CostTreeService::new(Arc::new(fs), ReportOptions::default());

    let records = service.load_records(Path::new("/in/records.json")).unwrap();

    assert_eq!(records[0].group_key(), GroupKey::new("C", "P", "R"));
}

#[test]
fn given_missing_file_when_loading_then_input_not_found() {
    let temp = TempDir::new().unwrap();

    let err = service(ReportOptions::default())
        .load_records(&temp.path().join("absent.json"))
        .unwrap_err();

    assert!(matches!(err, ApplicationError::InputNotFound(_)));
}

#[test]
fn given_malformed_json_when_loading_then_parse_error_names_file() {
    let temp = TempDir::new().unwrap();
    let path = create_input(&temp, "broken.json", "[{\"CIA\": ");

    let err = service(ReportOptions::default()).load_records(&path).unwrap_err();

    match err {
        ApplicationError::Parse { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn given_detail_rows_when_loading_then_extra_columns_carried() {
    let temp = TempDir::new().unwrap();
    let path = create_input(&temp, "details.json", DETAILS);

    let details = service(ReportOptions::default()).load_details(&path).unwrap();

    assert_eq!(details.len(), 3);
    assert_eq!(details[0].item_id, "MAT01");
    assert_eq!(details[0].fields["unit"], serde_json::json!("t"));
}

#[test]
fn given_numeric_keys_when_loading_details_then_every_row_kept_as_text() {
    // Arrange: spreadsheet export with PRJID and itm_id as numbers on one row
    let fs = MemoryFileSystem::new().with_file(
        "/d.json",
        r#"[{"CIA": "SP", "PRJID": 31199, "itm_id": 4711, "description": "Bolt"},
            {"CIA": "SP", "PRJID": "31199", "itm_id": "A1", "description": "Nut"}]"#,
    );
    let container = ServiceContainer::with_deps(Settings::default(), Arc::new(fs));

    // Act
    let details = container.reports.load_details(Path::new("/d.json")).unwrap();

    // Assert
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].project, "31199");
    assert_eq!(details[0].item_id, "4711");
    assert_eq!(details[1].item_id, "A1");
}

#[test]
fn given_numeric_item_ids_when_selecting_details_then_matched_against_leaves() {
    // Arrange
    let fs = MemoryFileSystem::new()
        .with_file(
            "/r.json",
            r#"[{"CIA": "SP", "PRJID": 31199, "ROW": "Cost", "COLUMN": "Budget",
                 "LEVEL": 1, "NODE": 1, "NODEP": 0, "ITMID": "ROOT", "VALUE": 0},
                {"CIA": "SP", "PRJID": 31199, "ROW": "Cost", "COLUMN": "Budget",
                 "LEVEL": 2, "NODE": 1, "NODEP": 1, "ITMID": 4711, "VALUE": 12}]"#,
        )
        .with_file(
            "/d.json",
            r#"[{"CIA": "SP", "PRJID": 31199, "itm_id": 4711, "description": "Bolt"},
                {"CIA": "SP", "PRJID": "31199", "itm_id": "A1", "description": "Nut"}]"#,
        );
    let container = ServiceContainer::with_deps(Settings::default(), Arc::new(fs));
    let records = container.reports.load_records(Path::new("/r.json")).unwrap();
    let details = container.reports.load_details(Path::new("/d.json")).unwrap();

    // Act
    let report = container.reports.build_report(&records);
    let rows = report.slices[0].details(&details);

    // Assert
    assert_eq!(report.slices[0].key, GroupKey::new("SP", "31199", "Cost"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fields["description"], serde_json::json!("Bolt"));
}

// ============================================================
// Report
// ============================================================

#[test]
fn given_records_when_listing_columns_then_leaf_columns_per_group() {
    let temp = TempDir::new().unwrap();
    let svc = service(ReportOptions::default());
    let records = svc.load_records(&create_input(&temp, "r.json", RECORDS)).unwrap();

    let columns = svc.columns(&records);

    let c1: Vec<&str> = columns[&GroupKey::new("C1", "P1", "Cost")]
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(c1, vec!["Actual", "Budget", "Forecast"]);
}

#[test]
fn given_records_when_building_report_then_empty_slices_omitted() {
    testing::init_test_setup();
    // Arrange
    let temp = TempDir::new().unwrap();
    let svc = service(ReportOptions::default());
    let records = svc.load_records(&create_input(&temp, "r.json", RECORDS)).unwrap();

    // Act
    let report = svc.build_report(&records);

    // Assert: Forecast only has a zero leaf
    let slices: Vec<(String, &str, f64)> = report
        .slices
        .iter()
        .map(|s| (s.key.company.clone(), s.column.as_str(), s.total))
        .collect();
    assert_eq!(
        slices,
        vec![
            ("C1".to_string(), "Actual", 50.0),
            ("C1".to_string(), "Budget", 100.0),
            ("C2".to_string(), "Budget", 8.0),
        ]
    );
}

#[test]
fn given_parallel_and_sequential_options_when_building_report_then_identical() {
    let temp = TempDir::new().unwrap();
    let path = create_input(&temp, "r.json", RECORDS);
    let sequential = service(ReportOptions {
        zero_totals: ZeroTotals::Prune,
        parallel: false,
    });
    let parallel = service(ReportOptions::default());
    let records = sequential.load_records(&path).unwrap();

    assert_eq!(
        sequential.build_report(&records),
        parallel.build_report(&records)
    );
}

#[test]
fn given_filter_when_selecting_slices_then_only_matching_returned() {
    let temp = TempDir::new().unwrap();
    let svc = service(ReportOptions::default());
    let records = svc.load_records(&create_input(&temp, "r.json", RECORDS)).unwrap();
    let report = svc.build_report(&records);
    let filter = SliceFilter {
        company: Some("C1".into()),
        column: Some("Budget".into()),
        ..SliceFilter::default()
    };

    let selected: Vec<_> = report.select(&filter).collect();

    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].treemap[0].id, "1-1-ROOT");
    assert!(selected[0].leaves.contains("MAT01"));
}

#[test]
fn given_slice_when_selecting_details_then_scoped_to_its_group() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let svc = service(ReportOptions::default());
    let records = svc.load_records(&create_input(&temp, "r.json", RECORDS)).unwrap();
    let details = svc.load_details(&create_input(&temp, "d.json", DETAILS)).unwrap();
    let report = svc.build_report(&records);
    let filter = SliceFilter {
        company: Some("C2".into()),
        ..SliceFilter::default()
    };
    let slice = report.select(&filter).next().unwrap();

    // Act
    let rows = slice.details(&details);

    // Assert
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fields["description"], serde_json::json!("Concrete"));
}

#[test]
fn given_slice_when_listing_routes_then_totals_follow_column() {
    let temp = TempDir::new().unwrap();
    let svc = service(ReportOptions::default());
    let records = svc.load_records(&create_input(&temp, "r.json", RECORDS)).unwrap();
    let report = svc.build_report(&records);
    let filter = SliceFilter {
        company: Some("C1".into()),
        column: Some("Actual".into()),
        ..SliceFilter::default()
    };

    let routes = report.select(&filter).next().unwrap().routes();

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].to_string(), "[1,1,ROOT:50][2,2,LAB01(L):50] leaf(50,Actual)");
}

//! Result processing and export integration tests.

use super::common::Fixture;
use gendb::db::SqlxConnector;
use gendb::error::GenDbError;
use gendb::results::ResultSet;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;

const ORDERED: &str = "SELECT * FROM testTable WHERE 1=1 ORDER BY testInt";

async fn ordered_rows(fixture: &Fixture) -> ResultSet {
    let mut qb = fixture.builder(ORDERED);
    qb.execute(&SqlxConnector::new()).await.unwrap();
    qb.into_result()
}

#[tokio::test]
async fn test_csv_export_of_selected_fields() {
    let fixture = Fixture::new().await;
    let rows = ordered_rows(&fixture).await;

    let written = rows
        .export_csv(fixture.dir.path().join("out.txt"), &["testVarChar", "testIntNull"])
        .unwrap();
    assert_eq!(written.extension().unwrap(), "csv");

    let content = std::fs::read_to_string(&written).unwrap();
    assert_eq!(
        content,
        "testVarChar,testIntNull\r\n\
         vc10,1\r\n\
         vc20,2\r\n\
         vc30,3\r\n\
         992,4\r\n\
         992.1,5\r\n\
         992,\r\n"
    );
}

#[tokio::test]
async fn test_csv_export_of_all_fields_after_rename() {
    let fixture = Fixture::new().await;
    let mut rows = ordered_rows(&fixture).await;

    let mapping = HashMap::from([("testInt".to_string(), "id".to_string())]);
    rows.rename_fields(&mapping);

    let written = rows
        .export_csv(fixture.dir.path().join("all"), &[] as &[&str])
        .unwrap();
    let content = std::fs::read_to_string(written).unwrap();
    let mut lines = content.lines();

    assert_eq!(
        lines.next(),
        Some("testVarCharNull,testVarChar,testIntNull,id,testFloatNull,testFloat")
    );
    assert_eq!(lines.next(), Some("vc1,vc10,1,10,100.1,100.1"));
    assert_eq!(lines.last(), Some(",992,,60,,600.1"));
}

#[tokio::test]
async fn test_csv_export_of_empty_result_fails() {
    let fixture = Fixture::new().await;
    let mut qb = fixture.builder("SELECT * FROM testTable WHERE 1=1");
    qb.add_conditional("testInt", ">", 1000).unwrap();
    qb.execute(&SqlxConnector::new()).await.unwrap();

    let err = qb
        .result()
        .export_csv(fixture.dir.path().join("empty.csv"), &[] as &[&str])
        .unwrap_err();
    assert!(matches!(err, GenDbError::Export(_)));
}

#[tokio::test]
async fn test_json_export() {
    let fixture = Fixture::new().await;
    let mut qb = fixture.builder("SELECT * FROM testTable WHERE 1=1");
    qb.add_conditional("testInt", ">=", 50).unwrap();
    qb.execute(&SqlxConnector::new()).await.unwrap();

    let mut rows = qb.into_result();
    let mapping = HashMap::from([("testVarChar".to_string(), "code".to_string())]);
    rows.rename_fields(&mapping);

    let written = rows
        .export_json(fixture.dir.path().join("out.csv"), &["code", "testIntNull"])
        .unwrap();
    assert_eq!(written.extension().unwrap(), "json");

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
    assert_eq!(
        parsed,
        json!([
            {"code": "992.1", "testIntNull": 5},
            {"code": "992", "testIntNull": null}
        ])
    );
}

#[tokio::test]
async fn test_json_export_of_empty_result() {
    let fixture = Fixture::new().await;
    let written = ResultSet::new()
        .export_json(fixture.dir.path().join("none"), &[] as &[&str])
        .unwrap();
    assert_eq!(std::fs::read_to_string(written).unwrap(), "[]");
}

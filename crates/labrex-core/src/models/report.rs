//! Structured lab-report record produced by the parser.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Laboratory contact details probed from the report header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub name: Option<String>,
}

/// Patient and registration details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
    pub registered_on: Option<String>,
    pub referred_by: Option<String>,
    pub collected_on: Option<String>,
    pub reg_no: Option<String>,
    pub received_on: Option<String>,
}

/// One measured value under a report section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name, e.g. "Hemoglobin".
    pub parameter: String,

    /// Measured value; numeric when it parses as a number.
    pub result: ResultValue,

    /// Unit of measurement, e.g. "g/dL".
    pub unit: Option<String>,

    /// Reference range, e.g. "12-16" or "<200".
    pub reference: Option<String>,
}

/// A result value keeps its numeric shape when the text parses as a
/// number, otherwise stays a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultValue {
    Number(f64),
    Text(String),
}

impl ResultValue {
    /// Parse raw result text, preferring the numeric form.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(n) => ResultValue::Number(n),
            Err(_) => ResultValue::Text(raw.to_string()),
        }
    }
}

/// The full structured report.
///
/// `tests` preserves document order of the section headings; empty
/// sections are omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub lab_info: LabInfo,
    pub patient: PatientInfo,
    pub tests: IndexMap<String, Vec<TestResult>>,
    pub clinical_notes: Option<String>,
    pub signatories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_result_value_numeric() {
        assert_eq!(ResultValue::parse("13.5"), ResultValue::Number(13.5));
        assert_eq!(
            ResultValue::parse("Positive"),
            ResultValue::Text("Positive".to_string())
        );
    }

    #[test]
    fn test_empty_report_serializes_nulls() {
        let report = StructuredReport::default();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["lab_info"]["phone"], serde_json::Value::Null);
        assert_eq!(json["clinical_notes"], serde_json::Value::Null);
        assert_eq!(json["tests"], serde_json::json!({}));
        assert_eq!(json["signatories"], serde_json::json!([]));
    }

    #[test]
    fn test_result_value_untagged_json() {
        let result = TestResult {
            parameter: "Hemoglobin".to_string(),
            result: ResultValue::Number(13.5),
            unit: Some("g/dL".to_string()),
            reference: Some("12-16".to_string()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["result"], serde_json::json!(13.5));
    }

    #[test]
    fn test_sections_keep_insertion_order() {
        let mut report = StructuredReport::default();
        report.tests.insert("HAEMATOLOGY".to_string(), vec![]);
        report.tests.insert("BIOCHEMISTRY".to_string(), vec![]);
        report.tests.insert("SEROLOGY".to_string(), vec![]);
        let keys: Vec<&String> = report.tests.keys().collect();
        assert_eq!(keys, ["HAEMATOLOGY", "BIOCHEMISTRY", "SEROLOGY"]);
    }
}

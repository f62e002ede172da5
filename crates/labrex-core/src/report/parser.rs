//! The structured-report parser.

use tracing::debug;

use crate::models::config::ParserConfig;
use crate::models::report::{LabInfo, PatientInfo, StructuredReport, TestResult};

use super::classify::{LineClass, classify};
use super::patterns;

/// Pure text-to-record parser.
///
/// `parse` never fails: every probe that does not match degrades to a
/// null/empty field, and unmatched lines are silently dropped.
pub struct ReportParser {
    config: ParserConfig,
}

impl ReportParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse raw extracted text into a structured report.
    pub fn parse(&self, text: &str) -> StructuredReport {
        let normalized = normalize(text);

        let lab_info = LabInfo {
            phone: find(&patterns::PHONE, &normalized),
            email: find(&patterns::EMAIL, &normalized),
            website: find(&patterns::WEBSITE, &normalized),
            name: normalized
                .contains(&self.config.lab_name)
                .then(|| self.config.lab_name.clone()),
        };

        let patient = PatientInfo {
            name: find(&patterns::PATIENT_NAME, &normalized),
            age: capture(&patterns::AGE, &normalized),
            sex: capture(&patterns::SEX, &normalized),
            registered_on: capture(&patterns::REGISTERED_ON, &normalized),
            referred_by: capture(&patterns::REFERRED_BY, &normalized)
                .map(|s| s.trim().to_string()),
            collected_on: capture(&patterns::COLLECTED_ON, &normalized),
            reg_no: capture(&patterns::REG_NO, &normalized),
            received_on: capture(&patterns::RECEIVED_ON, &normalized),
        };

        let tests = self.collect_sections(text);

        // Notes and signatories probe the raw text; the line breaks
        // they key off are gone from the normalized view.
        let clinical_notes = patterns::CLINICAL_NOTES
            .captures(text)
            .map(|caps| caps[1].trim().to_string());

        let signatories = patterns::SIGNATORY
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string())
            .collect();

        StructuredReport {
            lab_info,
            patient,
            tests,
            clinical_notes,
            signatories,
        }
    }

    /// Two-state machine over trimmed, non-empty lines: a heading opens
    /// a section, matching entries accumulate under it, and a section
    /// is committed (in first-seen order) only if it gathered at least
    /// one entry. Entries seen before any heading are dropped.
    fn collect_sections(
        &self,
        text: &str,
    ) -> indexmap::IndexMap<String, Vec<TestResult>> {
        let mut sections = indexmap::IndexMap::new();
        let mut current: Option<String> = None;
        let mut entries: Vec<TestResult> = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match classify(line) {
                LineClass::SectionHeader => {
                    if let Some(name) = current.take() {
                        if !entries.is_empty() {
                            debug!("section {:?}: {} entries", name, entries.len());
                            sections.insert(name, std::mem::take(&mut entries));
                        }
                    }
                    entries.clear();
                    current = Some(line.to_string());
                }
                LineClass::TestEntry(entry) => entries.push(entry),
                LineClass::Ignored => {}
            }
        }

        if let Some(name) = current {
            if !entries.is_empty() {
                sections.insert(name, entries);
            }
        }

        sections
    }
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

/// Collapse whitespace runs (except line breaks) to single spaces.
/// Literal `\n` escape sequences in the text become real line breaks
/// first, then break runs collapse to one.
fn normalize(text: &str) -> String {
    let text = text.replace("\\n", "\n");
    let text = patterns::NEWLINE_RUNS.replace_all(&text, "\n");
    let text = patterns::SPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}

fn find(pattern: &regex::Regex, text: &str) -> Option<String> {
    pattern.find(text).map(|m| m.as_str().to_string())
}

fn capture(pattern: &regex::Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::ResultValue;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Labsmart Software
+91 98765 43210  lab@example.com  https://lab.example.com
Mr. Ramesh Kumar  45 YRS/M
Reg.no. 10423
Registered on: 12/03/2023 10:15 AM
Collected on : 12/03/2023
Received on 13/03/2023
Referred by : Dr. Mehta Clinic

HAEMATOLOGY
Hemoglobin 13.5 g/dL 12-16
Total Leucocyte Count 8000 /cumm 4000-11000

BIOCHEMISTRY
Glucose (Fasting) 95 mg/dL <100

Clinical Notes: Mild anemia suspected, advise iron studies.
END OF REPORT

Dr. Anita Rao, MD Pathology
Mr. K. Iyer, DMLT";

    #[test]
    fn test_empty_text_yields_empty_report() {
        let report = ReportParser::default().parse("");
        assert_eq!(report.lab_info, LabInfo::default());
        assert_eq!(report.patient, PatientInfo::default());
        assert!(report.tests.is_empty());
        assert_eq!(report.clinical_notes, None);
        assert!(report.signatories.is_empty());
    }

    #[test]
    fn test_lab_info_probes() {
        let report = ReportParser::default().parse(SAMPLE);
        assert_eq!(report.lab_info.phone.as_deref(), Some("+91 98765 43210"));
        assert_eq!(report.lab_info.email.as_deref(), Some("lab@example.com"));
        assert_eq!(
            report.lab_info.website.as_deref(),
            Some("https://lab.example.com")
        );
        assert_eq!(report.lab_info.name.as_deref(), Some("Labsmart Software"));
    }

    #[test]
    fn test_patient_probes() {
        let report = ReportParser::default().parse(SAMPLE);
        // Name is matched greedily up to the first digit of the age, so
        // it keeps one trailing space.
        assert_eq!(report.patient.name.as_deref(), Some("Mr. Ramesh Kumar "));
        assert_eq!(report.patient.age.as_deref(), Some("45"));
        assert_eq!(report.patient.sex.as_deref(), Some("M"));
        assert_eq!(report.patient.reg_no.as_deref(), Some("10423"));
        assert_eq!(
            report.patient.registered_on.as_deref(),
            Some("12/03/2023 10:15 AM")
        );
        assert_eq!(report.patient.collected_on.as_deref(), Some("12/03/2023"));
        assert_eq!(report.patient.received_on.as_deref(), Some("13/03/2023"));
        // The referring-physician probe stops at the next capital C.
        assert_eq!(report.patient.referred_by.as_deref(), Some("Dr. Mehta"));
    }

    #[test]
    fn test_sections_and_entries() {
        let report = ReportParser::default().parse(SAMPLE);
        let keys: Vec<&String> = report.tests.keys().collect();
        assert_eq!(keys, ["HAEMATOLOGY", "BIOCHEMISTRY"]);

        let haem = &report.tests["HAEMATOLOGY"];
        assert_eq!(haem.len(), 2);
        assert_eq!(
            haem[0],
            TestResult {
                parameter: "Hemoglobin".to_string(),
                result: ResultValue::Number(13.5),
                unit: Some("g/dL".to_string()),
                reference: Some("12-16".to_string()),
            }
        );

        let bio = &report.tests["BIOCHEMISTRY"];
        assert_eq!(bio[0].parameter, "Glucose (Fasting)");
        assert_eq!(bio[0].reference.as_deref(), Some("<100"));
    }

    #[test]
    fn test_clinical_notes_and_signatories() {
        let report = ReportParser::default().parse(SAMPLE);
        assert_eq!(
            report.clinical_notes.as_deref(),
            Some("Mild anemia suspected, advise iron studies.")
        );
        assert_eq!(
            report.signatories,
            ["Dr. Anita Rao, MD Pathology", "Mr. K. Iyer, DMLT"]
        );
    }

    #[test]
    fn test_entries_before_any_heading_are_dropped() {
        let report = ReportParser::default().parse(
            "Hemoglobin 13.5 g/dL 12-16\nHAEMATOLOGY\nGlucose 95 mg/dL <100",
        );
        assert_eq!(report.tests.len(), 1);
        assert_eq!(report.tests["HAEMATOLOGY"].len(), 1);
        assert_eq!(report.tests["HAEMATOLOGY"][0].parameter, "Glucose");
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let report = ReportParser::default()
            .parse("SEROLOGY\nno entries here\nHAEMATOLOGY\nHemoglobin 13.5 g/dL 12-16");
        let keys: Vec<&String> = report.tests.keys().collect();
        assert_eq!(keys, ["HAEMATOLOGY"]);
    }

    #[test]
    fn test_uppercase_measurement_line_reads_as_heading() {
        let report =
            ReportParser::default().parse("HAEMATOLOGY\nWBC 10.2\nHemoglobin 13.5 g/dL 12-16");
        // "WBC 10.2" opens a new (eventually committed) section rather
        // than contributing an entry to HAEMATOLOGY.
        let keys: Vec<&String> = report.tests.keys().collect();
        assert_eq!(keys, ["WBC 10.2"]);
        assert_eq!(report.tests["WBC 10.2"][0].parameter, "Hemoglobin");
    }

    #[test]
    fn test_non_numeric_result_kept_verbatim() {
        let report = ReportParser::default().parse("SEROLOGY\nWidal Test . titre");
        assert_eq!(
            report.tests["SEROLOGY"][0].result,
            ResultValue::Text(".".to_string())
        );
    }

    #[test]
    fn test_custom_lab_name() {
        let parser = ReportParser::new(ParserConfig {
            lab_name: "Acme Diagnostics".to_string(),
        });
        let report = parser.parse("Report issued by Acme Diagnostics");
        assert_eq!(report.lab_info.name.as_deref(), Some("Acme Diagnostics"));
    }
}

//! Regex probes for lab-report fields.
//!
//! Each probe is independent and best-effort: a probe that does not
//! match leaves its field empty, never fails the parse.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Country-code-prefixed Indian mobile number.
    pub static ref PHONE: Regex = Regex::new(r"\+91\s?\d{5}\s?\d{5}").unwrap();

    pub static ref EMAIL: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-z]{2,}").unwrap();

    pub static ref WEBSITE: Regex = Regex::new(r"https?://[^\s)]+").unwrap();

    /// Honorific plus name; also matches the patient line of most reports.
    pub static ref PATIENT_NAME: Regex =
        Regex::new(r"Mr\.?\s+[A-Za-z ]+|Ms\.?\s+[A-Za-z ]+|Mrs\.?\s+[A-Za-z ]+").unwrap();

    pub static ref AGE: Regex = Regex::new(r"(?i)(\d{1,3})\s?YRS").unwrap();

    pub static ref SEX: Regex = Regex::new(r"(?i)YRS/([MF])").unwrap();

    pub static ref REGISTERED_ON: Regex =
        Regex::new(r"(?i)Registered on:\s*([\d/]+\s+\d{1,2}:\d{2}\s?[APM]{2})").unwrap();

    /// Captures up to the next capital-C boundary, which in practice
    /// stops before the "Collected on" label that follows.
    pub static ref REFERRED_BY: Regex = Regex::new(r"(?i)Referred by\s*:\s*([^C\n]+)").unwrap();

    pub static ref COLLECTED_ON: Regex =
        Regex::new(r"(?i)Collected on\s*:\s*([\d/]+)").unwrap();

    pub static ref REG_NO: Regex = Regex::new(r"(?i)Reg\.?no\.?\s*(\d+)").unwrap();

    pub static ref RECEIVED_ON: Regex = Regex::new(r"(?i)Received on\s*([\d/]+)").unwrap();

    /// One test-result line: parameter, numeric result, optional unit,
    /// optional reference range (`a-b`, `<a`, `>a`, or a bare number).
    pub static ref TEST_LINE: Regex = Regex::new(
        r"^([A-Za-z ()%,.-]+)\s+([\d.]+)\s*([^\d\s]+)?\s*(\d+[-–]\d+|<\d+|>\d+|[0-9.]+)?$"
    )
    .unwrap();

    /// Notes body runs from the marker to the next upper-case heading
    /// line or end of text.
    pub static ref CLINICAL_NOTES: Regex =
        Regex::new(r"(?is)Clinical Notes:\s*(.*?)(?:\n[A-Z ]{3,}|\z)").unwrap();

    /// Honorific, name, and trailing credential tokens up to line end.
    pub static ref SIGNATORY: Regex =
        Regex::new(r"(?m)(Mr\.|Ms\.|Dr\.)\s+[A-Za-z. ]+,\s*[A-Z]+.*$").unwrap();

    /// Collapsed line-break runs, for normalization.
    pub static ref NEWLINE_RUNS: Regex = Regex::new(r"\r?\n+").unwrap();

    /// Whitespace runs that are not line breaks, for normalization.
    pub static ref SPACE_RUNS: Regex = Regex::new(r"[^\S\n]+").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_probe() {
        assert_eq!(
            PHONE.find("Call +91 98765 43210 today").unwrap().as_str(),
            "+91 98765 43210"
        );
        assert!(PHONE.find("+1 555 0100").is_none());
    }

    #[test]
    fn test_test_line_full_form() {
        let caps = TEST_LINE.captures("Hemoglobin 13.5 g/dL 12-16").unwrap();
        assert_eq!(&caps[1], "Hemoglobin");
        assert_eq!(&caps[2], "13.5");
        assert_eq!(&caps[3], "g/dL");
        assert_eq!(&caps[4], "12-16");
    }

    #[test]
    fn test_test_line_optional_fields() {
        let caps = TEST_LINE.captures("Platelet Count 250000").unwrap();
        assert_eq!(&caps[1], "Platelet Count");
        assert_eq!(&caps[2], "250000");
        assert!(caps.get(3).is_none());
        assert!(caps.get(4).is_none());

        let caps = TEST_LINE.captures("Glucose 95 mg/dL <100").unwrap();
        assert_eq!(&caps[4], "<100");
    }

    #[test]
    fn test_signatory_probe() {
        let text = "Dr. Anita Rao, MD Pathology\nresults verified\nMr. K. Iyer, DMLT";
        let found: Vec<&str> = SIGNATORY.find_iter(text).map(|m| m.as_str()).collect();
        assert_eq!(found, ["Dr. Anita Rao, MD Pathology", "Mr. K. Iyer, DMLT"]);
    }

    #[test]
    fn test_clinical_notes_stops_at_heading() {
        let text = "Clinical Notes: mild anemia suspected\nHAEMATOLOGY\nHb 10 g/dL";
        let caps = CLINICAL_NOTES.captures(text).unwrap();
        assert_eq!(caps[1].trim(), "mild anemia suspected");
    }
}

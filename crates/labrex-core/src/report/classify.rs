//! Line classification for the section/test state machine.

use crate::models::report::{ResultValue, TestResult};

use super::patterns::TEST_LINE;

/// What one trimmed, non-empty line contributes to the report.
#[derive(Debug, Clone, PartialEq)]
pub enum LineClass {
    /// An all-upper-case heading naming a test section.
    SectionHeader,
    /// A parameter/result/unit/reference entry.
    TestEntry(TestResult),
    /// Anything else; leaves parser state unchanged.
    Ignored,
}

/// Classify one line.
///
/// The header check runs before the test-line pattern, so a line like
/// `"WBC 10.2"` (all upper-case, longer than 3 characters) counts as a
/// heading even though the test pattern would also match it.
pub fn classify(line: &str) -> LineClass {
    if line == line.to_uppercase()
        && line.len() > 3
        && !line.starts_with(|c: char| c.is_ascii_digit())
    {
        return LineClass::SectionHeader;
    }

    match TEST_LINE.captures(line) {
        Some(caps) => LineClass::TestEntry(TestResult {
            parameter: caps[1].trim().to_string(),
            result: ResultValue::parse(&caps[2]),
            unit: caps.get(3).map(|m| m.as_str().to_string()),
            reference: caps.get(4).map(|m| m.as_str().to_string()),
        }),
        None => LineClass::Ignored,
    }
}

//! Parse command - turn already-extracted text into a structured report.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use labrex_core::models::config::LabrexConfig;
use labrex_core::report::ReportParser;
use labrex_core::{ResultValue, StructuredReport};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input text file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Lab name to probe the header for
    #[arg(long)]
    lab_name: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV of test results
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = if let Some(path) = config_path {
        LabrexConfig::from_file(std::path::Path::new(path))?
    } else {
        LabrexConfig::default()
    };
    if let Some(lab_name) = &args.lab_name {
        config.parser.lab_name = lab_name.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let text = fs::read_to_string(&args.input)?;
    let report = ReportParser::new(config.parser).parse(&text);

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Csv => format_report_csv(&report)?,
        OutputFormat::Text => format_report_text(&report),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// One CSV row per test result, with its section name.
pub fn format_report_csv(report: &StructuredReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["section", "parameter", "result", "unit", "reference"])?;

    for (section, entries) in &report.tests {
        for entry in entries {
            wtr.write_record([
                section.as_str(),
                entry.parameter.as_str(),
                &format_result(&entry.result),
                entry.unit.as_deref().unwrap_or(""),
                entry.reference.as_deref().unwrap_or(""),
            ])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_report_text(report: &StructuredReport) -> String {
    let mut output = String::new();

    if let Some(name) = &report.lab_info.name {
        output.push_str(&format!("Lab: {}\n", name));
    }
    if let Some(phone) = &report.lab_info.phone {
        output.push_str(&format!("Phone: {}\n", phone));
    }

    output.push_str("\nPatient:\n");
    if let Some(name) = &report.patient.name {
        output.push_str(&format!("  {}\n", name.trim()));
    }
    match (&report.patient.age, &report.patient.sex) {
        (Some(age), Some(sex)) => output.push_str(&format!("  {} YRS / {}\n", age, sex)),
        (Some(age), None) => output.push_str(&format!("  {} YRS\n", age)),
        _ => {}
    }
    if let Some(reg_no) = &report.patient.reg_no {
        output.push_str(&format!("  Reg. no: {}\n", reg_no));
    }
    if let Some(referred_by) = &report.patient.referred_by {
        output.push_str(&format!("  Referred by: {}\n", referred_by));
    }

    for (section, entries) in &report.tests {
        output.push_str(&format!("\n{}\n", section));
        for entry in entries {
            output.push_str(&format!(
                "  {:<30} {:>10} {:<8} {}\n",
                entry.parameter,
                format_result(&entry.result),
                entry.unit.as_deref().unwrap_or(""),
                entry.reference.as_deref().unwrap_or(""),
            ));
        }
    }

    if let Some(notes) = &report.clinical_notes {
        output.push_str(&format!("\nClinical notes: {}\n", notes));
    }

    if !report.signatories.is_empty() {
        output.push_str("\nSignatories:\n");
        for signatory in &report.signatories {
            output.push_str(&format!("  {}\n", signatory));
        }
    }

    output
}

fn format_result(result: &ResultValue) -> String {
    match result {
        ResultValue::Number(n) => n.to_string(),
        ResultValue::Text(s) => s.clone(),
    }
}

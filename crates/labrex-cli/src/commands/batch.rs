//! Batch processing command for multiple report files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use labrex_core::models::config::LabrexConfig;
use labrex_core::report::ReportParser;
use labrex_core::{ExtractOptions, ExtractionResult, SourceDocument, StructuredReport, TextExtractor};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: super::parse::OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Skip OCR fallback and use only the PDF text layer
    #[arg(long)]
    text_only: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    report: Option<StructuredReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let mut config = if let Some(path) = config_path {
        LabrexConfig::from_file(std::path::Path::new(path))?
    } else {
        LabrexConfig::default()
    };
    if let Some(model_dir) = &args.model_dir {
        config.models.model_dir = model_dir.clone();
    }

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "png" | "jpg" | "jpeg")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let options = ExtractOptions {
        ocr_language: config.ocr.language.clone(),
        image_quality: config.pdf.render_dpi,
        fallback_to_ocr: config.pdf.fallback_to_ocr && !args.text_only,
    };
    let parser = ReportParser::new(config.parser.clone());

    // One extractor for the whole run: the OCR handle is loaded once
    // and recognition stays strictly sequential across files.
    let mut extractor = TextExtractor::new(config);

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_single_file(&path, &mut extractor, &parser, &options);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok((extraction, report)) => {
                results.push(FileResult {
                    path: path.clone(),
                    extraction: Some(extraction),
                    report: Some(report),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path: path.clone(),
                        extraction: None,
                        report: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");
    extractor.shutdown();

    // Write per-file outputs
    let successful: Vec<_> = results.iter().filter(|r| r.report.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    for result in &successful {
        if let (Some(report), Some(output_dir)) = (&result.report, &args.output_dir) {
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("report");

            let extension = match args.format {
                super::parse::OutputFormat::Json => "json",
                super::parse::OutputFormat::Csv => "csv",
                super::parse::OutputFormat::Text => "txt",
            };

            let output_path = output_dir.join(format!("{}.{}", output_name, extension));

            let content = match args.format {
                super::parse::OutputFormat::Json => serde_json::to_string_pretty(report)?,
                super::parse::OutputFormat::Csv => super::parse::format_report_csv(report)?,
                super::parse::OutputFormat::Text => super::parse::format_report_text(report),
            };

            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &PathBuf,
    extractor: &mut TextExtractor,
    parser: &ReportParser,
    options: &ExtractOptions,
) -> anyhow::Result<(ExtractionResult, StructuredReport)> {
    let extraction = extractor.extract(&SourceDocument::Path(path.clone()), options)?;

    if extraction.text.trim().is_empty() {
        anyhow::bail!("No text extracted from {}", path.display());
    }

    let report = parser.parse(&extraction.text);
    Ok((extraction, report))
}

fn write_summary(path: &PathBuf, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "method",
        "pages",
        "patient_name",
        "reg_no",
        "sections",
        "signatories",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match (&result.extraction, &result.report) {
            (Some(extraction), Some(report)) => {
                let method = match extraction.method {
                    labrex_core::ExtractionMethod::Direct => "direct",
                    labrex_core::ExtractionMethod::Ocr => "ocr",
                };
                wtr.write_record([
                    filename,
                    "success",
                    method,
                    &extraction.pages.to_string(),
                    report.patient.name.as_deref().unwrap_or("").trim(),
                    report.patient.reg_no.as_deref().unwrap_or(""),
                    &report.tests.len().to_string(),
                    &report.signatories.len().to_string(),
                    &result.processing_time_ms.to_string(),
                    "",
                ])?;
            }
            _ => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &result.processing_time_ms.to_string(),
                    result.error.as_deref().unwrap_or(""),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

//! Extract command - run the full pipeline on a single report file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use labrex_core::models::config::LabrexConfig;
use labrex_core::report::ReportParser;
use labrex_core::{
    ExtractOptions, ExtractionMethod, ExtractionResult, SourceDocument, StructuredReport,
    TextExtractor,
};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (json includes extraction metadata; csv/text render the report)
    #[arg(short, long, value_enum, default_value = "json")]
    format: super::parse::OutputFormat,

    /// Skip OCR fallback and use only the PDF text layer
    #[arg(long)]
    text_only: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// The document handed to the consuming boundary: extraction metadata
/// plus the parsed record.
#[derive(Serialize)]
struct ExtractOutput<'a> {
    extraction: &'a ExtractionResult,
    report: &'a StructuredReport,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
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

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message("Extracting text...");

    let options = ExtractOptions {
        ocr_language: config.ocr.language.clone(),
        image_quality: config.pdf.render_dpi,
        fallback_to_ocr: config.pdf.fallback_to_ocr && !args.text_only,
    };

    let parser_config = config.parser.clone();
    let mut extractor = TextExtractor::new(config);
    let result = extractor.extract(&SourceDocument::Path(args.input.clone()), &options)?;
    extractor.shutdown();

    pb.set_message("Parsing report...");
    let report = ReportParser::new(parser_config).parse(&result.text);

    pb.finish_with_message("Done");

    let output = match args.format {
        super::parse::OutputFormat::Json => serde_json::to_string_pretty(&ExtractOutput {
            extraction: &result,
            report: &report,
        })?,
        super::parse::OutputFormat::Csv => super::parse::format_report_csv(&report)?,
        super::parse::OutputFormat::Text => super::parse::format_report_text(&report),
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

    print_summary(&result);
    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn print_summary(result: &ExtractionResult) {
    let method = match result.method {
        ExtractionMethod::Direct => "embedded text layer",
        ExtractionMethod::Ocr => "optical recognition",
    };
    eprintln!(
        "{} Extracted {} chars from {} pages via {}",
        style("ℹ").blue(),
        result.text.len(),
        result.pages,
        method
    );
    if let Some(confidence) = result.confidence {
        eprintln!(
            "{} Recognition confidence: {:.1}%",
            style("ℹ").blue(),
            confidence * 100.0
        );
    }
    if let Some(pages) = &result.results {
        let failed = pages.iter().filter(|p| p.error.is_some()).count();
        if failed > 0 {
            eprintln!(
                "{} {} of {} pages failed recognition",
                style("⚠").yellow(),
                failed,
                pages.len()
            );
        }
    }
}

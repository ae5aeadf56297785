//! Extract command implementation.

use crate::cli::{CliFormat, ExtractArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use docket_pipeline::{AppConfig, EventTable, ExtraColumn, Pipeline};
use tracing::info;

/// Execute the extract command.
pub fn execute_extract(
    args: ExtractArgs,
    mut config: AppConfig,
    formatter: &Formatter,
) -> Result<()> {
    check_output(&args)?;

    if let Some(provider) = &args.provider {
        config.event_extractor = provider.clone();
    }
    if args.timing {
        config.pipeline.timing_enabled = true;
    }

    let pipeline = Pipeline::from_config(&config)?;
    info!(
        "Processing {} document(s) with {}",
        args.files.len(),
        pipeline.provider_key()
    );

    let report = pipeline.process_documents(&args.files);
    let records: Vec<_> = report.records().cloned().collect();
    let table = EventTable::build(&records, &extra_columns(&args))?;

    match (args.format.export_format(), &args.output) {
        (None, _) => println!("{}", formatter.format_events(&table)),
        (Some(format), Some(path)) => {
            table.export(format, path)?;
            eprintln!("{}", formatter.info(&format!("Wrote {}", path.display())));
        }
        (Some(_), None) if args.format == CliFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&table.to_json())?);
        }
        (Some(_), None) => print!("{}", table.to_csv_string()?),
    }

    eprintln!("{}", formatter.run_summary(&report, table.summary()));
    Ok(())
}

/// Reject format and destination combinations before any document is read.
fn check_output(args: &ExtractArgs) -> Result<()> {
    if args.format == CliFormat::Xlsx && args.output.is_none() {
        return Err(CliError::InvalidInput(
            "xlsx output needs a destination; pass --output <file>.xlsx".to_string(),
        ));
    }
    if args.format == CliFormat::Table && args.output.is_some() {
        return Err(CliError::InvalidInput(
            "--output needs --format csv, json or xlsx".to_string(),
        ));
    }
    Ok(())
}

fn extra_columns(args: &ExtractArgs) -> Vec<ExtraColumn> {
    let mut extras = Vec::new();
    if args.timing {
        extras.extend([
            ExtraColumn::DocumentExtraction,
            ExtraColumn::EventExtraction,
            ExtraColumn::Total,
        ]);
    }
    if args.cost {
        extras.push(ExtraColumn::Cost);
    }
    extras
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_llm::MapEnv;
    use docket_pipeline::PipelineError;
    use std::path::PathBuf;

    fn args(format: CliFormat, output: Option<&str>) -> ExtractArgs {
        ExtractArgs {
            files: vec![PathBuf::from("complaint.txt")],
            provider: None,
            format,
            output: output.map(PathBuf::from),
            timing: false,
            cost: false,
        }
    }

    #[test]
    fn test_xlsx_requires_output() {
        let err = check_output(&args(CliFormat::Xlsx, None)).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
        assert!(check_output(&args(CliFormat::Xlsx, Some("events.xlsx"))).is_ok());
    }

    #[test]
    fn test_table_cannot_be_written_to_file() {
        assert!(check_output(&args(CliFormat::Table, Some("events.txt"))).is_err());
        assert!(check_output(&args(CliFormat::Csv, None)).is_ok());
    }

    #[test]
    fn test_extra_columns_follow_flags() {
        let mut a = args(CliFormat::Table, None);
        assert!(extra_columns(&a).is_empty());

        a.timing = true;
        a.cost = true;
        assert_eq!(
            extra_columns(&a),
            vec![
                ExtraColumn::DocumentExtraction,
                ExtraColumn::EventExtraction,
                ExtraColumn::Total,
                ExtraColumn::Cost,
            ]
        );
    }

    #[test]
    fn test_unknown_provider_fails_before_processing() {
        let mut a = args(CliFormat::Csv, None);
        a.provider = Some("nope".to_string());
        let config = AppConfig::from_env(&MapEnv::new());

        let err = execute_extract(a, config, &Formatter::new(false)).unwrap_err();
        assert!(matches!(
            err,
            CliError::Pipeline(PipelineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_missing_credential_is_reported() {
        let mut a = args(CliFormat::Csv, None);
        a.provider = Some("anthropic".to_string());
        let config = AppConfig::from_env(&MapEnv::new());

        let err = execute_extract(a, config, &Formatter::new(false)).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }
}

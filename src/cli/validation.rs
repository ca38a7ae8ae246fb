use crate::cli::args::CliArgs;
use crate::model::{CaseType, LeadStatus, Selector, Severity};
use crate::output::OutputFormat;
use crate::query::MAX_PAGE;
use crate::refine::{SortDirection, SortKey};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(score) = args.min_score {
        if !score.is_finite() || score < 0.0 {
            return Err("invalid min-score, expected a non-negative number".to_string());
        }
    }
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid page, pages start at 1".to_string());
        }
        if page > MAX_PAGE {
            return Err(format!("invalid page, the last addressable page is {MAX_PAGE}"));
        }
    }
    if let Some(raw) = args.severity.as_deref() {
        Selector::<Severity>::parse(raw).ok_or_else(|| format!("invalid --severity '{raw}'"))?;
    }
    if let Some(raw) = args.case_type.as_deref() {
        Selector::<CaseType>::parse(raw).ok_or_else(|| format!("invalid --case-type '{raw}'"))?;
    }
    if let Some(raw) = args.status.as_deref() {
        Selector::<LeadStatus>::parse(raw).ok_or_else(|| format!("invalid --status '{raw}'"))?;
        if args.no_status_filter {
            return Err("--status cannot be combined with --no-status-filter".to_string());
        }
    }
    if let Some(raw) = args.sort.as_deref() {
        SortKey::parse(raw).ok_or_else(|| format!("invalid --sort '{raw}', expected score or time"))?;
    }
    if let Some(raw) = args.sort_dir.as_deref() {
        SortDirection::parse(raw)
            .ok_or_else(|| format!("invalid --sort-dir '{raw}', expected asc or desc"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text or json"))?;
    }
    if args.expand.is_some() && args.no_row_expansion {
        return Err("--expand cannot be combined with --no-row-expansion".to_string());
    }
    if let Some(interval) = args.refresh_interval {
        if interval == 0 {
            return Err("invalid refresh-interval, expected positive seconds".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive seconds".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["pi-lead-monitor"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_valid_filters() {
        let a = args(&[
            "--min-score",
            "70",
            "--severity",
            "fatal",
            "--case-type",
            "all",
            "--status",
            "new",
            "--sort",
            "score",
            "--sort-dir",
            "asc",
        ]);
        assert_eq!(validate(&a), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(validate(&args(&["--severity", "minor"])).is_err());
        assert!(validate(&args(&["--page", "0"])).is_err());
        assert!(validate(&args(&["--page", "18446744073709551615"])).is_err());
        assert!(validate(&args(&["--page", &MAX_PAGE.to_string()])).is_ok());
        assert!(validate(&args(&["--sort", "title"])).is_err());
        assert!(validate(&args(&["--refresh-interval", "0"])).is_err());
        assert!(validate(&args(&["--output-format", "xml"])).is_err());
    }

    #[test]
    fn rejects_options_for_disabled_features() {
        assert!(validate(&args(&["--status", "new", "--no-status-filter"])).is_err());
        assert!(validate(&args(&["--expand", "7", "--no-row-expansion"])).is_err());
    }
}

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

/// Report identity derived from a file name like `clicks-2024-03-01.json.gz`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub report_name: String,
    pub report_date: NaiveDate,
}

impl ReportContext {
    /// Split `<name>-<YYYY>-<MM>-<DD>.<ext>` into its name and date
    ///
    /// Everything from the first `.` on is ignored. The name is the text before
    /// the first `-`, so report names cannot contain dashes themselves.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let stem = file_name.split('.').next().unwrap_or_default();
        let (report_name, date_text) = stem.split_once('-').ok_or_else(|| {
            anyhow!(
                "Report file name '{}' has no date.\n\
                 Expected format: <report-name>-<YYYY>-<MM>-<DD>.<ext>",
                file_name
            )
        })?;

        if report_name.is_empty() {
            return Err(anyhow!("Report file name '{}' has no report name", file_name));
        }

        let report_date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").with_context(|| {
            format!(
                "Invalid report date '{}' in file name '{}'",
                date_text, file_name
            )
        })?;

        Ok(Self {
            report_name: report_name.to_string(),
            report_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_name() {
        let ctx = ReportContext::from_file_name("clicks-2024-03-01.json.gz").unwrap();
        assert_eq!(ctx.report_name, "clicks");
        assert_eq!(ctx.report_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_file_name_single_extension() {
        let ctx = ReportContext::from_file_name("events-1999-12-31.gz").unwrap();
        assert_eq!(ctx.report_name, "events");
        assert_eq!(
            ctx.report_date,
            NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_parse_file_name_without_extension() {
        let ctx = ReportContext::from_file_name("events-2024-02-29").unwrap();
        assert_eq!(ctx.report_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_missing_date() {
        assert!(ReportContext::from_file_name("clicks.json.gz").is_err());
    }

    #[test]
    fn test_invalid_date() {
        assert!(ReportContext::from_file_name("clicks-2024-13-01.json.gz").is_err());
        assert!(ReportContext::from_file_name("clicks-2023-02-29.json.gz").is_err());
        assert!(ReportContext::from_file_name("clicks-yesterday.json.gz").is_err());
    }

    #[test]
    fn test_dash_in_report_name_is_not_supported() {
        // "daily" becomes the name and "clicks-2024-03-01" is not a date
        assert!(ReportContext::from_file_name("daily-clicks-2024-03-01.json.gz").is_err());
    }

    #[test]
    fn test_missing_report_name() {
        assert!(ReportContext::from_file_name("-2024-03-01.json.gz").is_err());
    }
}

//! CSV and XLSX downloads of the termination list.

use thiserror::Error;

use crate::auth::AuthenticatedUser;
use crate::domain::dates::CalendarDate;
use crate::dto::terminations::TerminationDto;
use crate::forms::terminations::ExportTerminationsForm;
use crate::repository::TerminationReader;

use super::terminations::show_terminations;
use super::{ServiceError, ServiceResult};

const EXPORT_HEADERS: [&str; 9] = [
    "Termination ID",
    "Employee Name",
    "Department",
    "Reason",
    "Termination Type",
    "Notice Date",
    "Termination Date",
    "Created By",
    "Created At",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFormat {
    Csv,
    Xlsx,
}

impl TryFrom<&str> for DownloadFormat {
    type Error = DownloadError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(DownloadError::InvalidFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid download format: {0}")]
    InvalidFormat(String),
    #[error("failed to render csv")]
    CsvRender,
    #[error("failed to render xlsx")]
    XlsxRender,
}

fn export_row(termination: TerminationDto) -> Vec<String> {
    vec![
        termination.termination_id,
        termination.employee_name,
        termination.department,
        termination.reason,
        termination.termination_type,
        termination.notice_date,
        termination.termination_date,
        termination.created_by.unwrap_or_default(),
        termination.created_at,
    ]
}

/// Renders the hub's terminations matching the export filter.
pub fn export_terminations<R>(
    form: ExportTerminationsForm,
    user: &AuthenticatedUser,
    repo: &R,
    today: CalendarDate,
) -> ServiceResult<DownloadFile>
where
    R: TerminationReader,
{
    let (format, filter) = form.into_parts();
    let format = DownloadFormat::try_from(format.as_str())?;

    let rows: Vec<Vec<String>> = show_terminations(filter, user, repo, today)?
        .into_iter()
        .map(export_row)
        .collect();

    log::info!("Exporting {} terminations as {format:?}", rows.len());
    render_download_file(&format!("terminations-{today}"), format, &EXPORT_HEADERS, &rows)
        .map_err(ServiceError::from)
}

pub fn render_download_file(
    base_name: &str,
    format: DownloadFormat,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<DownloadFile, DownloadError> {
    match format {
        DownloadFormat::Csv => Ok(DownloadFile {
            file_name: format!("{base_name}.csv"),
            content_type: "text/csv; charset=utf-8",
            bytes: render_csv(headers, rows)?,
        }),
        DownloadFormat::Xlsx => Ok(DownloadFile {
            file_name: format!("{base_name}.xlsx"),
            content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            bytes: render_xlsx(headers, rows)?,
        }),
    }
}

fn render_csv(headers: &[&str], rows: &[Vec<String>]) -> Result<Vec<u8>, DownloadError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(headers)
        .map_err(|_| DownloadError::CsvRender)?;
    for row in rows {
        writer
            .write_record(row.iter().map(|value| escape_csv_cell(value)))
            .map_err(|_| DownloadError::CsvRender)?;
    }
    writer.into_inner().map_err(|_| DownloadError::CsvRender)
}

fn render_xlsx(headers: &[&str], rows: &[Vec<String>]) -> Result<Vec<u8>, DownloadError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Terminations")
        .map_err(|_| DownloadError::XlsxRender)?;

    for (col_idx, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *header)
            .map_err(|_| DownloadError::XlsxRender)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(sheet_row, col_idx as u16, value)
                .map_err(|_| DownloadError::XlsxRender)?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|_| DownloadError::XlsxRender)
}

/// Neutralizes cells a spreadsheet would evaluate as formulas.
fn escape_csv_cell(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{value}"),
        _ => value.to_string(),
    }
}

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::dates::{CalendarDate, DateInterval, resolve_filter};
use crate::domain::termination::{NewTermination, TerminationPatch};
use crate::domain::types::{
    DepartmentName, EmployeeName, HubId, TerminationId, TerminationReason, TerminationType,
    TypeConstraintError,
};

/// Returns the trimmed value or `None` when it is absent or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<E>(value: Option<String>, field: &'static str) -> Result<String, E>
where
    E: From<MissingField>,
{
    present(value).ok_or_else(|| E::from(MissingField(field)))
}

/// Marker for a required field that was absent or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTerminationForm {
    pub employee_name: Option<String>,
    pub department: Option<String>,
    pub reason: Option<String>,
    pub termination_type: Option<String>,
    pub notice_date: Option<String>,
    pub termination_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddTerminationFormPayload {
    pub employee_name: EmployeeName,
    pub department: DepartmentName,
    pub reason: TerminationReason,
    pub termination_type: TerminationType,
    pub notice_date: CalendarDate,
    pub termination_date: CalendarDate,
}

impl AddTerminationFormPayload {
    pub fn into_new_termination(
        self,
        hub_id: HubId,
        created_by: Option<String>,
        created_at: NaiveDateTime,
    ) -> NewTermination {
        NewTermination {
            id: TerminationId::generate(),
            hub_id,
            employee_name: self.employee_name,
            department: self.department,
            reason: self.reason,
            termination_type: self.termination_type,
            notice_date: self.notice_date,
            termination_date: self.termination_date,
            created_by,
            created_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum AddTerminationFormError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("Add termination form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<MissingField> for AddTerminationFormError {
    fn from(value: MissingField) -> Self {
        Self::MissingField(value.0)
    }
}

impl From<TypeConstraintError> for AddTerminationFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<AddTerminationForm> for AddTerminationFormPayload {
    type Error = AddTerminationFormError;

    fn try_from(value: AddTerminationForm) -> Result<Self, Self::Error> {
        // Checked in this order so the first absent field is the one reported.
        let employee_name = required::<Self::Error>(value.employee_name, "employeeName")?;
        let reason = required::<Self::Error>(value.reason, "reason")?;
        let department = required::<Self::Error>(value.department, "department")?;
        let termination_type = required::<Self::Error>(value.termination_type, "terminationType")?;
        let notice_date = required::<Self::Error>(value.notice_date, "noticeDate")?;
        let termination_date = required::<Self::Error>(value.termination_date, "terminationDate")?;

        Ok(Self {
            employee_name: EmployeeName::new(employee_name)?,
            department: DepartmentName::new(department)?,
            reason: TerminationReason::new(reason)?,
            termination_type: TerminationType::new(termination_type)?,
            notice_date: CalendarDate::parse(&notice_date, "noticeDate")?,
            termination_date: CalendarDate::parse(&termination_date, "terminationDate")?,
        })
    }
}

/// Partial update. Absent or blank fields keep their stored values; unknown
/// keys such as `createdBy` are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTerminationForm {
    #[serde(default)]
    pub termination_id: Option<String>,
    pub employee_name: Option<String>,
    pub department: Option<String>,
    pub reason: Option<String>,
    pub termination_type: Option<String>,
    pub notice_date: Option<String>,
    pub termination_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateTerminationFormPayload {
    pub termination_id: TerminationId,
    pub patch: TerminationPatch,
}

#[derive(Debug, Error)]
pub enum UpdateTerminationFormError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("termination not found")]
    UnknownTermination,
    #[error("Update termination form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<MissingField> for UpdateTerminationFormError {
    fn from(value: MissingField) -> Self {
        Self::MissingField(value.0)
    }
}

impl From<TypeConstraintError> for UpdateTerminationFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl TryFrom<UpdateTerminationForm> for UpdateTerminationFormPayload {
    type Error = UpdateTerminationFormError;

    fn try_from(value: UpdateTerminationForm) -> Result<Self, Self::Error> {
        let termination_id = required::<Self::Error>(value.termination_id, "terminationId")?;

        let patch = TerminationPatch {
            employee_name: present(value.employee_name)
                .map(EmployeeName::new)
                .transpose()?,
            department: present(value.department)
                .map(DepartmentName::new)
                .transpose()?,
            reason: present(value.reason)
                .map(TerminationReason::new)
                .transpose()?,
            termination_type: present(value.termination_type)
                .map(TerminationType::new)
                .transpose()?,
            notice_date: present(value.notice_date)
                .map(|v| CalendarDate::parse(&v, "noticeDate"))
                .transpose()?,
            termination_date: present(value.termination_date)
                .map(|v| CalendarDate::parse(&v, "terminationDate"))
                .transpose()?,
        };

        // An id that could never have been issued cannot match a record.
        let termination_id = TerminationId::new(termination_id)
            .map_err(|_| UpdateTerminationFormError::UnknownTermination)?;

        Ok(Self {
            termination_id,
            patch,
        })
    }
}

/// Bulk delete request: a bare JSON array of termination ids.
#[derive(Debug, Deserialize, Validate)]
#[serde(transparent)]
pub struct DeleteTerminationsForm {
    #[validate(length(min = 1))]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTerminationsFormPayload {
    pub ids: Vec<TerminationId>,
}

#[derive(Debug, Error)]
pub enum DeleteTerminationsFormError {
    #[error("Delete terminations form validation failed: {0}")]
    Validation(String),
}

impl From<ValidationErrors> for DeleteTerminationsFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl TryFrom<DeleteTerminationsForm> for DeleteTerminationsFormPayload {
    type Error = DeleteTerminationsFormError;

    fn try_from(value: DeleteTerminationsForm) -> Result<Self, Self::Error> {
        value.validate()?;
        // Malformed ids match no record, so they are dropped instead of
        // failing the batch.
        let mut ids = value
            .ids
            .into_iter()
            .filter_map(|id| TerminationId::new(id).ok())
            .collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        Ok(Self { ids })
    }
}

/// List filter taken from the query string.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListTerminationsForm {
    #[validate(length(max = 32))]
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Error)]
pub enum ListTerminationsFormError {
    #[error("List filter validation failed: {0}")]
    Validation(String),
    #[error("List filter contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for ListTerminationsFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for ListTerminationsFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

impl ListTerminationsForm {
    /// Resolves the filter to a half-open interval relative to `today`.
    pub fn into_interval(
        self,
        today: CalendarDate,
    ) -> Result<Option<DateInterval>, ListTerminationsFormError> {
        self.validate()?;
        Ok(resolve_filter(
            self.range.as_deref(),
            self.start.as_deref(),
            self.end.as_deref(),
            today,
        )?)
    }
}

/// Export request: a download format plus the list filter.
#[derive(Debug, Default, Deserialize)]
pub struct ExportTerminationsForm {
    pub format: Option<String>,
    pub range: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ExportTerminationsForm {
    /// Splits off the requested format, defaulting to `csv`.
    pub fn into_parts(self) -> (String, ListTerminationsForm) {
        let format = present(self.format).unwrap_or_else(|| "csv".to_string());
        let filter = ListTerminationsForm {
            range: self.range,
            start: self.start,
            end: self.end,
        };
        (format, filter)
    }
}

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::dates::CalendarDate;
use crate::domain::termination::{
    NewTermination as DomainNewTermination, Termination as DomainTermination, TerminationPatch,
};
use crate::domain::types::{
    DepartmentName, EmployeeName, TerminationId, TerminationReason, TerminationType,
    TypeConstraintError,
};

/// Diesel model representing the `terminations` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::terminations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Termination {
    pub id: i32,
    pub termination_id: String,
    pub hub_id: i32,
    pub employee_name: String,
    pub department: String,
    pub reason: String,
    pub termination_type: String,
    pub notice_date: String,
    pub termination_date: String,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Insertable form of [`Termination`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::terminations)]
pub struct NewTermination {
    pub termination_id: String,
    pub hub_id: i32,
    pub employee_name: String,
    pub department: String,
    pub reason: String,
    pub termination_type: String,
    pub notice_date: String,
    pub termination_date: String,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Column set written by a partial update. `None` columns are skipped.
///
/// Identity and audit columns are never written.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = crate::schema::terminations)]
pub struct TerminationChangeset {
    pub employee_name: Option<String>,
    pub department: Option<String>,
    pub reason: Option<String>,
    pub termination_type: Option<String>,
    pub notice_date: Option<String>,
    pub termination_date: Option<String>,
}

impl TryFrom<Termination> for DomainTermination {
    type Error = TypeConstraintError;

    fn try_from(row: Termination) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TerminationId::new(row.termination_id)?,
            hub_id: row.hub_id.try_into()?,
            employee_name: EmployeeName::new(row.employee_name)?,
            department: DepartmentName::new(row.department)?,
            reason: TerminationReason::new(row.reason)?,
            termination_type: TerminationType::new(row.termination_type)?,
            notice_date: CalendarDate::parse(&row.notice_date, "notice date")?,
            termination_date: CalendarDate::parse(&row.termination_date, "termination date")?,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

impl From<DomainNewTermination> for NewTermination {
    fn from(termination: DomainNewTermination) -> Self {
        Self {
            termination_id: termination.id.into_inner(),
            hub_id: termination.hub_id.get(),
            employee_name: termination.employee_name.into_inner(),
            department: termination.department.into_inner(),
            reason: termination.reason.into_inner(),
            termination_type: termination.termination_type.as_str().to_string(),
            notice_date: termination.notice_date.to_string(),
            termination_date: termination.termination_date.to_string(),
            created_by: termination.created_by,
            created_at: termination.created_at,
        }
    }
}

impl From<&TerminationPatch> for TerminationChangeset {
    fn from(patch: &TerminationPatch) -> Self {
        Self {
            employee_name: patch.employee_name.as_ref().map(|v| v.as_str().to_string()),
            department: patch.department.as_ref().map(|v| v.as_str().to_string()),
            reason: patch.reason.as_ref().map(|v| v.as_str().to_string()),
            termination_type: patch
                .termination_type
                .as_ref()
                .map(|v| v.as_str().to_string()),
            notice_date: patch.notice_date.map(|v| v.to_string()),
            termination_date: patch.termination_date.map(|v| v.to_string()),
        }
    }
}

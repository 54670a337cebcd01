use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::dates::CalendarDate;
use crate::domain::types::{
    DepartmentName, EmployeeName, HubId, TerminationId, TerminationReason, TerminationType,
};

/// Termination record scoped to a hub.
///
/// `id`, `created_by` and `created_at` are fixed at creation; updates go
/// through [`TerminationPatch`], which has no way to express them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Termination {
    pub id: TerminationId,
    pub hub_id: HubId,
    pub employee_name: EmployeeName,
    pub department: DepartmentName,
    pub reason: TerminationReason,
    pub termination_type: TerminationType,
    /// Day the notice was given.
    pub notice_date: CalendarDate,
    /// Effective day; lists are filtered and sorted by it.
    pub termination_date: CalendarDate,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Data required to insert a new [`Termination`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTermination {
    pub id: TerminationId,
    pub hub_id: HubId,
    pub employee_name: EmployeeName,
    pub department: DepartmentName,
    pub reason: TerminationReason,
    pub termination_type: TerminationType,
    pub notice_date: CalendarDate,
    pub termination_date: CalendarDate,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<NewTermination> for Termination {
    fn from(value: NewTermination) -> Self {
        Self {
            id: value.id,
            hub_id: value.hub_id,
            employee_name: value.employee_name,
            department: value.department,
            reason: value.reason,
            termination_type: value.termination_type,
            notice_date: value.notice_date,
            termination_date: value.termination_date,
            created_by: value.created_by,
            created_at: value.created_at,
        }
    }
}

/// Partial update of the mutable fields of a [`Termination`].
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerminationPatch {
    pub employee_name: Option<EmployeeName>,
    pub department: Option<DepartmentName>,
    pub reason: Option<TerminationReason>,
    pub termination_type: Option<TerminationType>,
    pub notice_date: Option<CalendarDate>,
    pub termination_date: Option<CalendarDate>,
}

impl TerminationPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Result of merging a [`TerminationPatch`] into a stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTermination {
    pub merged: Termination,
    /// Only the fields whose value actually differs from the stored one.
    pub changes: TerminationPatch,
}

fn changed<T: Clone + PartialEq>(incoming: &Option<T>, current: &T) -> Option<T> {
    incoming.as_ref().filter(|value| *value != current).cloned()
}

impl Termination {
    /// Applies `patch` field by field over `self`.
    pub fn merge(&self, patch: &TerminationPatch) -> MergedTermination {
        let changes = TerminationPatch {
            employee_name: changed(&patch.employee_name, &self.employee_name),
            department: changed(&patch.department, &self.department),
            reason: changed(&patch.reason, &self.reason),
            termination_type: changed(&patch.termination_type, &self.termination_type),
            notice_date: changed(&patch.notice_date, &self.notice_date),
            termination_date: changed(&patch.termination_date, &self.termination_date),
        };

        let current = self.clone();
        let merged = Termination {
            employee_name: changes
                .employee_name
                .clone()
                .unwrap_or(current.employee_name),
            department: changes.department.clone().unwrap_or(current.department),
            reason: changes.reason.clone().unwrap_or(current.reason),
            termination_type: changes
                .termination_type
                .clone()
                .unwrap_or(current.termination_type),
            notice_date: changes.notice_date.unwrap_or(current.notice_date),
            termination_date: changes.termination_date.unwrap_or(current.termination_date),
            ..current
        };

        MergedTermination { merged, changes }
    }
}

/// Counts reported by the stats query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TerminationStats {
    pub total_count: i64,
    /// Records whose termination date falls in the trailing window.
    pub recent_count: i64,
}

use serde::Serialize;

use crate::domain::termination::{Termination, TerminationStats};

/// Client-facing projection of a termination. The storage key and hub are
/// never part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationDto {
    pub termination_id: String,
    pub employee_name: String,
    pub department: String,
    pub reason: String,
    pub termination_type: String,
    pub notice_date: String,
    pub termination_date: String,
    pub created_by: Option<String>,
    pub created_at: String,
}

impl From<Termination> for TerminationDto {
    fn from(value: Termination) -> Self {
        Self {
            termination_id: value.id.into_inner(),
            employee_name: value.employee_name.into_inner(),
            department: value.department.into_inner(),
            reason: value.reason.into_inner(),
            termination_type: value.termination_type.to_string(),
            notice_date: value.notice_date.to_string(),
            termination_date: value.termination_date.to_string(),
            created_by: value.created_by,
            created_at: value.created_at.and_utc().to_rfc3339(),
        }
    }
}

/// Stats counters rendered as strings, as the dashboard widgets expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationStatsDto {
    pub total_count: String,
    pub recent_count: String,
}

impl From<TerminationStats> for TerminationStatsDto {
    fn from(value: TerminationStats) -> Self {
        Self {
            total_count: value.total_count.to_string(),
            recent_count: value.recent_count.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDto {
    pub deleted_count: usize,
}

/// Payload pushed to every subscriber of a hub after a successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshEvent {
    pub terminations: Vec<TerminationDto>,
    pub stats: TerminationStatsDto,
}

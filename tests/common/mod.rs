//! Helpers for integration tests.

#![allow(dead_code)]

use chrono::DateTime;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use pushkind_hr::db::{DbPool, establish_connection_pool};
use pushkind_hr::domain::dates::CalendarDate;
use pushkind_hr::domain::termination::NewTermination;
use pushkind_hr::domain::types::{
    DepartmentName, EmployeeName, HubId, TerminationId, TerminationReason, TerminationType,
};
use tempfile::NamedTempFile;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Temporary database used in integration tests.
pub struct TestDb {
    _tempfile: NamedTempFile,
    pool: DbPool,
}

impl TestDb {
    pub fn new() -> Self {
        let tempfile = NamedTempFile::new().expect("Failed to create temp file");
        let pool = establish_connection_pool(tempfile.path().to_str().unwrap())
            .expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");
        TestDb {
            _tempfile: tempfile,
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

pub fn date(value: &str) -> CalendarDate {
    CalendarDate::parse(value, "date").expect("valid date")
}

/// A termination of `hub_id` effective on `termination_date`.
pub fn new_termination(id: &str, hub_id: i32, termination_date: &str) -> NewTermination {
    NewTermination {
        id: TerminationId::new(id).expect("valid id"),
        hub_id: HubId::new(hub_id).expect("valid hub id"),
        employee_name: EmployeeName::new("Jane Doe").expect("valid name"),
        department: DepartmentName::new("Finance").expect("valid department"),
        reason: TerminationReason::new("Relocation").expect("valid reason"),
        termination_type: TerminationType::new("Resignation").expect("valid type"),
        notice_date: date("2025-08-01"),
        termination_date: date(termination_date),
        created_by: Some("creator".to_string()),
        created_at: DateTime::from_timestamp(1_756_684_800, 0)
            .expect("valid timestamp")
            .naive_utc(),
    }
}

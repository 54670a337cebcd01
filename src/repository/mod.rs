use crate::db::{DbConnection, DbPool};
use crate::domain::dates::DateInterval;
use crate::domain::termination::{NewTermination, Termination, TerminationPatch, TerminationStats};
use crate::domain::types::{HubId, TerminationId};

pub mod errors;
pub mod termination;

pub use errors::{RepositoryError, RepositoryResult};

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be passed around freely between handlers.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Query parameters for listing terminations belonging to a hub.
#[derive(Debug, Clone)]
pub struct TerminationListQuery {
    /// Hub identifier.
    pub hub_id: HubId,
    /// Half-open range applied to the termination date.
    pub interval: Option<DateInterval>,
}

impl TerminationListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            interval: None,
        }
    }

    pub fn interval(mut self, interval: Option<DateInterval>) -> Self {
        self.interval = interval;
        self
    }
}

/// Read-only operations for termination entities.
pub trait TerminationReader {
    /// List terminations, newest termination date first, ties by id descending.
    fn list_terminations(&self, query: TerminationListQuery) -> RepositoryResult<Vec<Termination>>;
    /// Retrieve a termination by its opaque identifier and hub.
    fn get_termination_by_id(
        &self,
        id: &TerminationId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<Termination>>;
    /// Count all terminations of a hub and those dated inside `recent`.
    fn termination_stats(
        &self,
        hub_id: HubId,
        recent: DateInterval,
    ) -> RepositoryResult<TerminationStats>;
}

/// Write operations for termination entities.
pub trait TerminationWriter {
    /// Persist a new termination.
    fn create_termination(&self, termination: &NewTermination) -> RepositoryResult<usize>;
    /// Write the fields present in `changes`; returns the number of matched rows.
    fn update_termination(
        &self,
        id: &TerminationId,
        hub_id: HubId,
        changes: &TerminationPatch,
    ) -> RepositoryResult<usize>;
    /// Delete every listed termination of the hub; returns the number removed.
    fn delete_terminations(&self, ids: &[TerminationId], hub_id: HubId)
    -> RepositoryResult<usize>;
}

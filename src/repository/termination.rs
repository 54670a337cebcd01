use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};

use crate::domain::dates::DateInterval;
use crate::domain::termination::{NewTermination, Termination, TerminationPatch, TerminationStats};
use crate::domain::types::{HubId, TerminationId};
use crate::models::termination::{
    NewTermination as DbNewTermination, Termination as DbTermination, TerminationChangeset,
};
use crate::repository::{
    DieselRepository, RepositoryResult, TerminationListQuery, TerminationReader,
    TerminationWriter,
};

/// Both counters come out of a single scan of the hub's rows.
const STATS_SQL: &str = "SELECT COUNT(*) AS total_count, \
     COALESCE(SUM(CASE WHEN termination_date >= ? AND termination_date < ? THEN 1 ELSE 0 END), 0) \
     AS recent_count \
     FROM terminations WHERE hub_id = ?";

/// Ids bound per `DELETE`, well under SQLite's bind parameter limit.
const DELETE_CHUNK_SIZE: usize = 500;

#[derive(QueryableByName)]
struct StatsRow {
    #[diesel(sql_type = BigInt)]
    total_count: i64,
    #[diesel(sql_type = BigInt)]
    recent_count: i64,
}

impl TerminationReader for DieselRepository {
    fn list_terminations(&self, query: TerminationListQuery) -> RepositoryResult<Vec<Termination>> {
        use crate::schema::terminations;

        let mut conn = self.conn()?;

        let mut items = terminations::table
            .filter(terminations::hub_id.eq(query.hub_id.get()))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(interval) = &query.interval {
            items = items
                .filter(terminations::termination_date.ge(interval.start.to_string()))
                .filter(terminations::termination_date.lt(interval.end.to_string()));
        }

        let items = items
            .order((
                terminations::termination_date.desc(),
                terminations::termination_id.desc(),
            ))
            .select(DbTermination::as_select())
            .load::<DbTermination>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Termination>, _>>()?;

        Ok(items)
    }

    fn get_termination_by_id(
        &self,
        id: &TerminationId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<Termination>> {
        use crate::schema::terminations;

        let mut conn = self.conn()?;

        let termination = terminations::table
            .filter(terminations::termination_id.eq(id.as_str()))
            .filter(terminations::hub_id.eq(hub_id.get()))
            .select(DbTermination::as_select())
            .first::<DbTermination>(&mut conn)
            .optional()?;

        let termination = termination.map(TryInto::try_into).transpose()?;
        Ok(termination)
    }

    fn termination_stats(
        &self,
        hub_id: HubId,
        recent: DateInterval,
    ) -> RepositoryResult<TerminationStats> {
        let mut conn = self.conn()?;

        let row = diesel::sql_query(STATS_SQL)
            .bind::<Text, _>(recent.start.to_string())
            .bind::<Text, _>(recent.end.to_string())
            .bind::<Integer, _>(hub_id.get())
            .get_result::<StatsRow>(&mut conn)?;

        Ok(TerminationStats {
            total_count: row.total_count,
            recent_count: row.recent_count,
        })
    }
}

impl TerminationWriter for DieselRepository {
    fn create_termination(&self, termination: &NewTermination) -> RepositoryResult<usize> {
        use crate::schema::terminations;

        let mut conn = self.conn()?;
        let db_termination: DbNewTermination = termination.clone().into();

        let affected = diesel::insert_into(terminations::table)
            .values(db_termination)
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn update_termination(
        &self,
        id: &TerminationId,
        hub_id: HubId,
        changes: &TerminationPatch,
    ) -> RepositoryResult<usize> {
        use crate::schema::terminations;

        let mut conn = self.conn()?;

        let target = terminations::table
            .filter(terminations::termination_id.eq(id.as_str()))
            .filter(terminations::hub_id.eq(hub_id.get()));

        // Diesel refuses an UPDATE without columns; report the match count instead.
        if changes.is_empty() {
            let matched = target.count().get_result::<i64>(&mut conn)?;
            return Ok(matched as usize);
        }

        let affected = diesel::update(target)
            .set(TerminationChangeset::from(changes))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn delete_terminations(
        &self,
        ids: &[TerminationId],
        hub_id: HubId,
    ) -> RepositoryResult<usize> {
        use crate::schema::terminations;

        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;

        let affected = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let mut affected = 0;
            for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
                let chunk = chunk.iter().map(|id| id.as_str()).collect::<Vec<&str>>();
                affected += diesel::delete(
                    terminations::table
                        .filter(terminations::hub_id.eq(hub_id.get()))
                        .filter(terminations::termination_id.eq_any(chunk)),
                )
                .execute(conn)?;
            }
            Ok(affected)
        })?;

        Ok(affected)
    }
}

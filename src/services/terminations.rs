use chrono::Utc;
use tokio::sync::broadcast;

use crate::SERVICE_ACCESS_ROLE;
use crate::auth::{AuthenticatedUser, check_role};
use crate::broadcast::{RefreshPublisher, TerminationBroadcaster};
use crate::domain::dates::{CalendarDate, DateInterval, RECENT_WINDOW_DAYS};
use crate::domain::termination::{MergedTermination, Termination};
use crate::domain::types::{HubId, TerminationId};
use crate::dto::terminations::{DeletedDto, RefreshEvent, TerminationDto, TerminationStatsDto};
use crate::forms::terminations::{
    AddTerminationForm, AddTerminationFormPayload, DeleteTerminationsForm,
    DeleteTerminationsFormPayload, ListTerminationsForm, UpdateTerminationForm,
    UpdateTerminationFormPayload,
};
use crate::repository::{TerminationListQuery, TerminationReader, TerminationWriter};

use super::{ServiceError, ServiceResult};

/// Outcome of a successful update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// At least one field changed and was written.
    Updated(TerminationDto),
    /// The record matched but every supplied value equals the stored one.
    Unchanged(TerminationDto),
}

/// Checks the access role and resolves the hub scoping the request.
pub fn authorize(user: &AuthenticatedUser) -> ServiceResult<HubId> {
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    HubId::new(user.hub_id).map_err(|e| {
        log::error!("Invalid hub id in user context: {e}");
        ServiceError::Internal
    })
}

/// Lists terminations of the user's hub matching the date filter.
pub fn show_terminations<R>(
    form: ListTerminationsForm,
    user: &AuthenticatedUser,
    repo: &R,
    today: CalendarDate,
) -> ServiceResult<Vec<TerminationDto>>
where
    R: TerminationReader,
{
    let hub_id = authorize(user)?;
    let interval = form.into_interval(today)?;

    match repo.list_terminations(TerminationListQuery::new(hub_id).interval(interval)) {
        Ok(terminations) => Ok(terminations.into_iter().map(TerminationDto::from).collect()),
        Err(e) => {
            log::error!("Failed to list terminations: {e}");
            Err(ServiceError::Internal)
        }
    }
}

pub fn show_termination<R>(
    termination_id: &str,
    user: &AuthenticatedUser,
    repo: &R,
) -> ServiceResult<TerminationDto>
where
    R: TerminationReader,
{
    let hub_id = authorize(user)?;
    let Ok(termination_id) = TerminationId::new(termination_id) else {
        return Err(ServiceError::NotFound);
    };

    match repo.get_termination_by_id(&termination_id, hub_id) {
        Ok(Some(termination)) => Ok(termination.into()),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get termination: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Total terminations and those effective within the trailing 30 days
/// (today included).
pub fn show_termination_stats<R>(
    user: &AuthenticatedUser,
    repo: &R,
    today: CalendarDate,
) -> ServiceResult<TerminationStatsDto>
where
    R: TerminationReader,
{
    let hub_id = authorize(user)?;

    match repo.termination_stats(hub_id, DateInterval::trailing(today, RECENT_WINDOW_DAYS)) {
        Ok(stats) => Ok(stats.into()),
        Err(e) => {
            log::error!("Failed to compute termination stats: {e}");
            Err(ServiceError::Internal)
        }
    }
}

pub fn add_termination<R, P>(
    form: AddTerminationForm,
    user: &AuthenticatedUser,
    repo: &R,
    publisher: &P,
) -> ServiceResult<TerminationDto>
where
    R: TerminationReader + TerminationWriter,
    P: RefreshPublisher + ?Sized,
{
    let hub_id = authorize(user)?;
    let payload: AddTerminationFormPayload = form.try_into()?;

    let termination =
        payload.into_new_termination(hub_id, Some(user.sub.clone()), Utc::now().naive_utc());

    match repo.create_termination(&termination) {
        Ok(_) => {
            log::info!("Created termination {} in hub {hub_id}", termination.id);
            publish_refresh(hub_id, repo, publisher);
            Ok(Termination::from(termination).into())
        }
        Err(e) => {
            log::error!("Failed to create termination: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Merges the supplied fields over the stored record and writes the ones
/// that changed.
pub fn update_termination<R, P>(
    form: UpdateTerminationForm,
    user: &AuthenticatedUser,
    repo: &R,
    publisher: &P,
) -> ServiceResult<UpdateOutcome>
where
    R: TerminationReader + TerminationWriter,
    P: RefreshPublisher + ?Sized,
{
    let hub_id = authorize(user)?;
    let payload: UpdateTerminationFormPayload = form.try_into()?;

    let existing = match repo.get_termination_by_id(&payload.termination_id, hub_id) {
        Ok(Some(termination)) => termination,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get termination: {e}");
            return Err(ServiceError::Internal);
        }
    };

    let MergedTermination { merged, changes } = existing.merge(&payload.patch);
    if changes.is_empty() {
        return Ok(UpdateOutcome::Unchanged(merged.into()));
    }

    match repo.update_termination(&merged.id, hub_id, &changes) {
        // Deleted between the read and the write.
        Ok(0) => Err(ServiceError::NotFound),
        Ok(_) => {
            publish_refresh(hub_id, repo, publisher);
            Ok(UpdateOutcome::Updated(merged.into()))
        }
        Err(e) => {
            log::error!("Failed to update termination: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Removes every listed termination of the hub. Unknown ids are skipped.
pub fn delete_terminations<R, P>(
    form: DeleteTerminationsForm,
    user: &AuthenticatedUser,
    repo: &R,
    publisher: &P,
) -> ServiceResult<DeletedDto>
where
    R: TerminationReader + TerminationWriter,
    P: RefreshPublisher + ?Sized,
{
    let hub_id = authorize(user)?;
    let payload: DeleteTerminationsFormPayload = form.try_into()?;

    match repo.delete_terminations(&payload.ids, hub_id) {
        Ok(deleted_count) => {
            if deleted_count > 0 {
                log::info!("Deleted {deleted_count} terminations in hub {hub_id}");
                publish_refresh(hub_id, repo, publisher);
            }
            Ok(DeletedDto { deleted_count })
        }
        Err(e) => {
            log::error!("Failed to delete terminations: {e}");
            Err(ServiceError::Internal)
        }
    }
}

/// Opens a refresh feed for the user's hub.
pub fn subscribe_refreshes(
    user: &AuthenticatedUser,
    broadcaster: &TerminationBroadcaster,
) -> ServiceResult<broadcast::Receiver<RefreshEvent>> {
    let hub_id = authorize(user)?;
    log::debug!("New refresh subscriber for hub {hub_id}");
    Ok(broadcaster.subscribe(hub_id))
}

/// Pushes the unfiltered list and fresh stats to every viewer of the hub.
///
/// The mutation has already been committed, so a failure here is only logged.
fn publish_refresh<R, P>(hub_id: HubId, repo: &R, publisher: &P)
where
    R: TerminationReader,
    P: RefreshPublisher + ?Sized,
{
    let today = CalendarDate::today();
    let terminations = repo.list_terminations(TerminationListQuery::new(hub_id));
    let stats = repo.termination_stats(hub_id, DateInterval::trailing(today, RECENT_WINDOW_DAYS));

    match (terminations, stats) {
        (Ok(terminations), Ok(stats)) => publisher.publish(
            hub_id,
            RefreshEvent {
                terminations: terminations.into_iter().map(TerminationDto::from).collect(),
                stats: stats.into(),
            },
        ),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Skipping refresh broadcast for hub {hub_id}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::test::RecordingPublisher;
    use crate::domain::types::{
        DepartmentName, EmployeeName, TerminationReason, TerminationType,
    };
    use crate::repository::test::TestRepository;
    use chrono::DateTime;

    fn sample_user() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "user-1".into(),
            email: "hr@example.com".into(),
            hub_id: 1,
            name: "HR".into(),
            roles: vec![SERVICE_ACCESS_ROLE.into()],
            exp: 0,
        }
    }

    fn date(value: &str) -> CalendarDate {
        CalendarDate::parse(value, "date").unwrap()
    }

    fn sample_termination(id: &str, hub_id: i32, termination_date: &str) -> Termination {
        Termination {
            id: TerminationId::new(id).unwrap(),
            hub_id: HubId::new(hub_id).unwrap(),
            employee_name: EmployeeName::new("Jane Doe").unwrap(),
            department: DepartmentName::new("Finance").unwrap(),
            reason: TerminationReason::new("Relocation").unwrap(),
            termination_type: TerminationType::new("Resignation").unwrap(),
            notice_date: date("2025-08-01"),
            termination_date: date(termination_date),
            created_by: Some("creator".into()),
            created_at: DateTime::from_timestamp(0, 0).unwrap().naive_utc(),
        }
    }

    fn add_form() -> AddTerminationForm {
        AddTerminationForm {
            employee_name: Some("John Roe".into()),
            department: Some("Sales".into()),
            reason: Some("Contract ended".into()),
            termination_type: Some("Layoff".into()),
            notice_date: Some("2025-09-01".into()),
            termination_date: Some("2025-09-30".into()),
        }
    }

    fn list_all(repo: &TestRepository) -> Vec<TerminationDto> {
        show_terminations(
            ListTerminationsForm::default(),
            &sample_user(),
            repo,
            date("2025-09-15"),
        )
        .unwrap()
    }

    #[test]
    fn rejects_users_without_role() {
        let repo = TestRepository::default();
        let mut user = sample_user();
        user.roles.clear();

        let err = show_termination_stats(&user, &repo, date("2025-09-15")).unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
    }

    #[test]
    fn stats_on_empty_hub_are_zero() {
        let repo = TestRepository::default();

        let stats = show_termination_stats(&sample_user(), &repo, date("2025-09-15")).unwrap();
        assert_eq!(stats.total_count, "0");
        assert_eq!(stats.recent_count, "0");
    }

    #[test]
    fn stats_count_trailing_window_including_today() {
        let repo = TestRepository::new(vec![
            sample_termination("a", 1, "2025-09-15"),
            sample_termination("b", 1, "2025-08-16"),
            sample_termination("c", 1, "2025-08-15"),
            sample_termination("d", 1, "2025-09-16"),
            sample_termination("e", 2, "2025-09-15"),
        ]);

        let stats = show_termination_stats(&sample_user(), &repo, date("2025-09-15")).unwrap();
        assert_eq!(stats.total_count, "4");
        assert_eq!(stats.recent_count, "2");
    }

    #[test]
    fn storage_failures_become_internal_errors() {
        let repo = TestRepository::unavailable();
        let today = date("2025-09-15");

        assert_eq!(
            show_termination_stats(&sample_user(), &repo, today).unwrap_err(),
            ServiceError::Internal
        );
        assert_eq!(
            show_terminations(ListTerminationsForm::default(), &sample_user(), &repo, today)
                .unwrap_err(),
            ServiceError::Internal
        );
    }

    #[test]
    fn list_is_ordered_by_date_then_id_descending() {
        let repo = TestRepository::new(vec![
            sample_termination("a", 1, "2025-09-01"),
            sample_termination("c", 1, "2025-09-01"),
            sample_termination("b", 1, "2025-09-10"),
            sample_termination("z", 2, "2025-09-20"),
        ]);

        let ids: Vec<String> = list_all(&repo)
            .into_iter()
            .map(|t| t.termination_id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(list_all(&repo), list_all(&repo));
    }

    #[test]
    fn list_applies_keyword_filter() {
        let repo = TestRepository::new(vec![
            sample_termination("a", 1, "2025-09-14"),
            sample_termination("b", 1, "2025-09-15"),
            sample_termination("c", 1, "2025-09-07"),
        ]);
        let form = ListTerminationsForm {
            range: Some("last7days".into()),
            ..ListTerminationsForm::default()
        };

        let result = show_terminations(form, &sample_user(), &repo, date("2025-09-15")).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].termination_id, "a");
    }

    #[test]
    fn list_applies_custom_bounds() {
        let repo = TestRepository::new(vec![
            sample_termination("a", 1, "2025-01-01"),
            sample_termination("b", 1, "2025-02-01"),
        ]);
        let form = ListTerminationsForm {
            range: Some("custom".into()),
            start: Some("2025-01-01".into()),
            end: Some("2025-02-01".into()),
        };

        let result = show_terminations(form, &sample_user(), &repo, date("2025-09-15")).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].termination_id, "a");
    }

    #[test]
    fn create_then_get_round_trips_caller_fields() {
        let repo = TestRepository::default();
        let publisher = RecordingPublisher::default();

        let created = add_termination(add_form(), &sample_user(), &repo, &publisher).unwrap();
        let fetched = show_termination(&created.termination_id, &sample_user(), &repo).unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.employee_name, "John Roe");
        assert_eq!(fetched.department, "Sales");
        assert_eq!(fetched.reason, "Contract ended");
        assert_eq!(fetched.termination_type, "Layoff");
        assert_eq!(fetched.notice_date, "2025-09-01");
        assert_eq!(fetched.termination_date, "2025-09-30");
        assert_eq!(fetched.created_by.as_deref(), Some("user-1"));
        assert!(!fetched.termination_id.is_empty());
    }

    #[test]
    fn create_publishes_refresh_to_the_hub() {
        let repo = TestRepository::default();
        let publisher = RecordingPublisher::default();

        add_termination(add_form(), &sample_user(), &repo, &publisher).unwrap();

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, HubId::new(1).unwrap());
        assert_eq!(events[0].1.terminations.len(), 1);
        assert_eq!(events[0].1.stats.total_count, "1");
    }

    #[test]
    fn create_without_reason_names_the_field() {
        let repo = TestRepository::default();
        let publisher = RecordingPublisher::default();
        let form = AddTerminationForm {
            reason: None,
            ..add_form()
        };

        let err = add_termination(form, &sample_user(), &repo, &publisher).unwrap_err();
        assert_eq!(err, ServiceError::MissingField("reason"));
        assert!(repo.snapshot().is_empty());
        assert!(publisher.events().is_empty());
    }

    #[test]
    fn update_changes_only_supplied_field() {
        let repo = TestRepository::new(vec![sample_termination("a", 1, "2025-09-01")]);
        let publisher = RecordingPublisher::default();
        let before = show_termination("a", &sample_user(), &repo).unwrap();
        let form = UpdateTerminationForm {
            termination_id: Some("a".into()),
            reason: Some("X".into()),
            ..UpdateTerminationForm::default()
        };

        let outcome = update_termination(form, &sample_user(), &repo, &publisher).unwrap();

        let after = show_termination("a", &sample_user(), &repo).unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated(after.clone()));
        assert_eq!(after.reason, "X");
        assert_eq!(
            TerminationDto {
                reason: before.reason.clone(),
                ..after
            },
            before
        );
        assert_eq!(publisher.events().len(), 1);
    }

    #[test]
    fn update_never_touches_audit_fields() {
        let repo = TestRepository::new(vec![sample_termination("a", 1, "2025-09-01")]);
        let publisher = RecordingPublisher::default();
        let mut other_user = sample_user();
        other_user.sub = "someone-else".into();

        for name in ["First", "Second"] {
            let form = UpdateTerminationForm {
                termination_id: Some("a".into()),
                employee_name: Some(name.into()),
                ..UpdateTerminationForm::default()
            };
            update_termination(form, &other_user, &repo, &publisher).unwrap();
        }

        let stored = &repo.snapshot()[0];
        assert_eq!(stored.created_by.as_deref(), Some("creator"));
        assert_eq!(
            stored.created_at,
            DateTime::from_timestamp(0, 0).unwrap().naive_utc()
        );
        assert_eq!(stored.employee_name.as_str(), "Second");
    }

    #[test]
    fn update_with_identical_values_reports_no_changes() {
        let repo = TestRepository::new(vec![sample_termination("a", 1, "2025-09-01")]);
        let publisher = RecordingPublisher::default();
        let form = UpdateTerminationForm {
            termination_id: Some("a".into()),
            department: Some("Finance".into()),
            ..UpdateTerminationForm::default()
        };

        let outcome = update_termination(form, &sample_user(), &repo, &publisher).unwrap();

        assert!(matches!(outcome, UpdateOutcome::Unchanged(dto) if dto.department == "Finance"));
        assert!(publisher.events().is_empty());
    }

    #[test]
    fn update_of_missing_record_is_not_found_and_inserts_nothing() {
        let repo = TestRepository::new(vec![sample_termination("a", 1, "2025-09-01")]);
        let publisher = RecordingPublisher::default();
        let form = UpdateTerminationForm {
            termination_id: Some("missing".into()),
            reason: Some("X".into()),
            ..UpdateTerminationForm::default()
        };

        let err = update_termination(form, &sample_user(), &repo, &publisher).unwrap_err();

        assert_eq!(err, ServiceError::NotFound);
        assert_eq!(repo.snapshot().len(), 1);
    }

    #[test]
    fn update_with_overlong_id_is_not_found() {
        let repo = TestRepository::new(vec![sample_termination("a", 1, "2025-09-01")]);
        let publisher = RecordingPublisher::default();
        let form = UpdateTerminationForm {
            termination_id: Some("x".repeat(65)),
            reason: Some("X".into()),
            ..UpdateTerminationForm::default()
        };

        let err = update_termination(form, &sample_user(), &repo, &publisher).unwrap_err();

        assert_eq!(err, ServiceError::NotFound);
        assert!(publisher.events().is_empty());
    }

    #[test]
    fn update_cannot_reach_another_hub() {
        let repo = TestRepository::new(vec![sample_termination("a", 2, "2025-09-01")]);
        let publisher = RecordingPublisher::default();
        let form = UpdateTerminationForm {
            termination_id: Some("a".into()),
            reason: Some("X".into()),
            ..UpdateTerminationForm::default()
        };

        let err = update_termination(form, &sample_user(), &repo, &publisher).unwrap_err();
        assert_eq!(err, ServiceError::NotFound);
    }

    #[test]
    fn delete_counts_only_existing_records() {
        let repo = TestRepository::new(vec![
            sample_termination("a", 1, "2025-09-01"),
            sample_termination("b", 1, "2025-09-02"),
            sample_termination("c", 2, "2025-09-03"),
        ]);
        let publisher = RecordingPublisher::default();
        let form = DeleteTerminationsForm {
            ids: vec!["a".into(), "b".into(), "missing".into(), "c".into()],
        };

        let result = delete_terminations(form, &sample_user(), &repo, &publisher).unwrap();

        assert_eq!(result.deleted_count, 2);
        assert_eq!(repo.snapshot().len(), 1);
        assert_eq!(publisher.events().len(), 1);
        assert!(publisher.events()[0].1.terminations.is_empty());
    }

    #[test]
    fn delete_skips_overlong_ids_without_failing_the_batch() {
        let repo = TestRepository::new(vec![
            sample_termination("a", 1, "2025-09-01"),
            sample_termination("b", 1, "2025-09-02"),
        ]);
        let publisher = RecordingPublisher::default();
        let form = DeleteTerminationsForm {
            ids: vec!["a".into(), "b".into(), "x".repeat(65)],
        };

        let result = delete_terminations(form, &sample_user(), &repo, &publisher).unwrap();

        assert_eq!(result.deleted_count, 2);
        assert!(repo.snapshot().is_empty());
    }

    #[test]
    fn delete_accepts_thousands_of_ids() {
        let repo = TestRepository::new(vec![sample_termination("a", 1, "2025-09-01")]);
        let publisher = RecordingPublisher::default();
        let mut ids = (0..2000).map(|i| format!("missing-{i}")).collect::<Vec<_>>();
        ids.push("a".into());

        let result =
            delete_terminations(DeleteTerminationsForm { ids }, &sample_user(), &repo, &publisher)
                .unwrap();

        assert_eq!(result.deleted_count, 1);
        assert_eq!(publisher.events().len(), 1);
    }

    #[test]
    fn delete_of_unknown_ids_does_not_publish() {
        let repo = TestRepository::default();
        let publisher = RecordingPublisher::default();
        let form = DeleteTerminationsForm {
            ids: vec!["missing".into()],
        };

        let result = delete_terminations(form, &sample_user(), &repo, &publisher).unwrap();

        assert_eq!(result.deleted_count, 0);
        assert!(publisher.events().is_empty());
    }

    #[test]
    fn subscribers_receive_refreshes_of_their_hub() {
        let repo = TestRepository::default();
        let broadcaster = TerminationBroadcaster::new(4);
        let mut receiver = subscribe_refreshes(&sample_user(), &broadcaster).unwrap();

        add_termination(add_form(), &sample_user(), &repo, &broadcaster).unwrap();

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.terminations.len(), 1);
        assert_eq!(event.stats.total_count, "1");
    }

    #[test]
    fn subscribing_requires_role() {
        let broadcaster = TerminationBroadcaster::new(4);
        let mut user = sample_user();
        user.roles = vec!["crawler".into()];

        let err = subscribe_refreshes(&user, &broadcaster).unwrap_err();
        assert_eq!(err, ServiceError::Unauthorized);
        assert_eq!(broadcaster.subscriber_count(HubId::new(1).unwrap()), 0);
    }
}

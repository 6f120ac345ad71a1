use tracing::{info, warn};

use super::{settle, Notice, QueryState};
use crate::query::JobQuery;
use crate::remote::{ApiError, Job, JobStatus};
use crate::state::AppState;

/// Detail panel for the job selected on a list
#[derive(Debug, Clone)]
pub struct DetailView {
    pub id: i64,
    pub job: QueryState<Job>,
    pub notice: Option<Notice>,
}

/// Load the selected job. A job still marked NEW is moved to READ, once per
/// job for the life of the process. A job the backend no longer has is empty.
///
/// While a refetch is still running, a previously cached copy is shown.
pub async fn load_detail(app: &AppState, id: i64) -> DetailView {
    let key = JobQuery::Detail(id).key();
    let job = match settle(app.render_timeout, app.queries.job(id)).await {
        QueryState::Loading => match app.queries.cache().get_query_data::<Job>(&key) {
            Some(cached) => QueryState::Ready(cached),
            None => QueryState::Loading,
        },
        other => other,
    };

    match job {
        QueryState::Ready(job) if job.status == JobStatus::New => mark_read(app, job).await,
        QueryState::Error(err) if err.api_error().is_some_and(ApiError::is_not_found) => {
            DetailView {
                id,
                job: QueryState::Empty,
                notice: None,
            }
        }
        job => DetailView {
            id,
            job,
            notice: None,
        },
    }
}

async fn mark_read(app: &AppState, job: Job) -> DetailView {
    let id = job.id;
    if !app.read_ledger.claim(id) {
        return DetailView {
            id,
            job: QueryState::Ready(job),
            notice: None,
        };
    }

    match app.queries.update_status(id, JobStatus::Read).await {
        Ok(updated) => {
            info!("Marked job {} as read", id);
            app.queries
                .cache()
                .set_query_data(&JobQuery::Detail(id).key(), updated.clone());
            DetailView {
                id,
                job: QueryState::Ready(updated),
                notice: None,
            }
        }
        Err(e) => {
            warn!("Failed to mark job {} as read: {}", id, e);
            app.read_ledger.release(id);
            DetailView {
                id,
                job: QueryState::Ready(job),
                notice: Some(Notice::MarkReadFailed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryKey;
    use crate::testing::{test_state, MockBackend};
    use std::time::Duration;

    #[actix_web::test]
    async fn test_opening_new_job_marks_it_read_once() {
        let backend = MockBackend::start_with_jobs(3).await;
        let app = test_state(&backend);

        let first = load_detail(&app, 2).await;
        assert_eq!(first.job.ready().unwrap().status, JobStatus::Read);
        assert_eq!(backend.store.calls("PATCH /jobs/2/status"), 1);

        let again = load_detail(&app, 2).await;
        assert_eq!(again.job.ready().unwrap().status, JobStatus::Read);
        assert_eq!(backend.store.calls("PATCH /jobs/2/status"), 1);

        backend.stop().await;
    }

    #[actix_web::test]
    async fn test_marked_job_is_served_from_cache() {
        let backend = MockBackend::start_with_jobs(3).await;
        let app = test_state(&backend);

        load_detail(&app, 2).await;
        load_detail(&app, 2).await;
        assert_eq!(backend.store.calls("GET /jobs/2"), 1);

        backend.stop().await;
    }

    #[actix_web::test]
    async fn test_slow_refetch_shows_cached_copy() {
        let backend = MockBackend::start_with_jobs(3).await;
        let mut app = test_state(&backend);
        app.render_timeout = Duration::from_millis(50);

        load_detail(&app, 2).await;
        app.queries.cache().invalidate_queries(&[QueryKey::new("job")]);
        backend.store.set_delay(Duration::from_millis(500));

        let view = load_detail(&app, 2).await;
        assert_eq!(view.job.ready().unwrap().status, JobStatus::Read);

        let view = load_detail(&app, 1).await;
        assert!(view.job.is_loading());

        backend.stop().await;
    }

    #[actix_web::test]
    async fn test_stale_new_detail_is_not_marked_twice() {
        let backend = MockBackend::start_with_jobs(3).await;
        let app = test_state(&backend);

        // Another render already claimed the job while the cache still says NEW.
        assert!(app.read_ledger.claim(1));
        let view = load_detail(&app, 1).await;

        assert_eq!(view.job.ready().unwrap().status, JobStatus::New);
        assert_eq!(backend.store.calls("PATCH /jobs/1/status"), 0);

        backend.stop().await;
    }

    #[actix_web::test]
    async fn test_failed_mark_read_can_be_retried() {
        let backend = MockBackend::start_with_jobs(3).await;
        let app = test_state(&backend);

        backend.store.fail_next("PATCH /jobs/3/status", 1);
        let failed = load_detail(&app, 3).await;
        assert_eq!(failed.notice, Some(Notice::MarkReadFailed));
        assert_eq!(failed.job.ready().unwrap().status, JobStatus::New);
        assert!(!app.read_ledger.contains(3));

        let retried = load_detail(&app, 3).await;
        assert!(retried.notice.is_none());
        assert_eq!(retried.job.ready().unwrap().status, JobStatus::Read);
        assert_eq!(backend.store.calls("PATCH /jobs/3/status"), 2);

        backend.stop().await;
    }

    #[actix_web::test]
    async fn test_missing_job_is_empty() {
        let backend = MockBackend::start_with_jobs(1).await;
        let app = test_state(&backend);

        let view = load_detail(&app, 99).await;
        assert!(matches!(view.job, QueryState::Empty));
        assert_eq!(backend.store.calls("PATCH /jobs/99/status"), 0);

        backend.stop().await;
    }
}

use super::{settle, QueryState};
use crate::query::JobQuery;
use crate::remote::StatsOverview;
use crate::state::AppState;

pub const STATS_PAGE: &str = "stats";

/// One row of the jobs-by-source chart
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBar {
    pub source: String,
    pub count: u64,
    /// Width relative to the largest source, 0 to 100
    pub percent: f64,
}

/// Sources ordered by count, largest first; ties by name
pub fn source_bars(stats: &StatsOverview) -> Vec<SourceBar> {
    let max = stats.jobs_by_source.values().copied().max().unwrap_or(0);
    let mut bars: Vec<SourceBar> = stats
        .jobs_by_source
        .iter()
        .map(|(source, count)| SourceBar {
            source: source.clone(),
            count: *count,
            percent: if max == 0 {
                0.0
            } else {
                *count as f64 * 100.0 / max as f64
            },
        })
        .collect();
    bars.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));
    bars
}

pub struct StatsView {
    pub stats: QueryState<StatsOverview>,
}

pub async fn load(app: &AppState) -> StatsView {
    app.views.show(STATS_PAGE, &app.queries, &JobQuery::Stats);
    StatsView {
        stats: settle(app.render_timeout, app.queries.stats()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, MockBackend};
    use std::collections::BTreeMap;

    fn overview(sources: &[(&str, u64)]) -> StatsOverview {
        StatsOverview {
            total_jobs: sources.iter().map(|(_, c)| c).sum(),
            new_jobs: 0,
            favorite_jobs: 0,
            average_price: None,
            jobs_by_source: sources
                .iter()
                .map(|(s, c)| (s.to_string(), *c))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_bars_sorted_and_scaled_to_largest() {
        let bars = source_bars(&overview(&[("A", 10), ("B", 40), ("C", 20), ("D", 20)]));

        let order: Vec<&str> = bars.iter().map(|b| b.source.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "D", "A"]);
        assert_eq!(bars[0].percent, 100.0);
        assert_eq!(bars[1].percent, 50.0);
        assert_eq!(bars[3].percent, 25.0);
    }

    #[test]
    fn test_no_sources_no_bars() {
        assert!(source_bars(&overview(&[])).is_empty());
        let zero = source_bars(&overview(&[("A", 0)]));
        assert_eq!(zero[0].percent, 0.0);
    }

    #[actix_web::test]
    async fn test_status_change_refreshes_viewed_stats() {
        let backend = MockBackend::start_with_jobs(4).await;
        let app = test_state(&backend);

        let before = load(&app).await;
        assert_eq!(before.stats.ready().unwrap().new_jobs, 4);

        app.queries
            .update_status(1, crate::remote::JobStatus::Applied)
            .await
            .unwrap();

        let after = load(&app).await;
        assert_eq!(after.stats.ready().unwrap().new_jobs, 3);
        assert_eq!(backend.store.calls("GET /jobs/stats"), 2);

        backend.stop().await;
    }

    #[actix_web::test]
    async fn test_malformed_stats_is_error_state() {
        let backend = MockBackend::start_with_jobs(4).await;
        backend.store.corrupt_stats(true);
        let app = test_state(&backend);

        let view = load(&app).await;
        assert!(matches!(view.stats, QueryState::Error(_)));

        backend.stop().await;
    }
}

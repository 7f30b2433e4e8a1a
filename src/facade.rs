use tracing::warn;

use crate::cache::{cache_key, MetricCache, MetricKind, MetricValue};
use crate::models::{
    DashboardSummary, DistributionItem, FrequencyItem, RankedUser, ToolImpactStats, TrendPoint,
    TrendStats,
};
use crate::source::RecordSource;
use crate::{distribution, frequency, impact, ranking, trend, validate};

/// Aspect labels below this share are dropped from the aspect metrics.
pub const MIN_ASPECT_PERCENTAGE: f64 = 10.0;

/// Cache-aside front door for every dashboard metric.
///
/// Each call checks the cache first and recomputes from raw records only on
/// a miss; a cached value is returned unchanged, with no staleness check. A
/// fetch failure is logged and degraded to the metric's empty shape without
/// touching the cache. Two overlapping calls for the same cold key may both
/// fetch and recompute; the duplicate work is tolerated (last write wins,
/// both results are value-equal) rather than serializing requests per key.
pub struct DashboardMetrics<S> {
    source: S,
    cache: MetricCache,
}

impl<S: RecordSource> DashboardMetrics<S> {
    pub fn new(source: S, cache: MetricCache) -> Self {
        Self { source, cache }
    }

    /// Drop every cached metric; the manual-refresh hook.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// CV aspects flagged for improvement, as a share of completed
    /// evaluations, pre-filtered to the ≥10% labels.
    pub async fn cv_aspects_to_improve(&self) -> Vec<FrequencyItem> {
        let key = cache_key(MetricKind::CvAspects, &[]);
        if let Some(MetricValue::Frequencies(items)) = self.cache.get(&key) {
            return items;
        }

        let records = match self.source.cv_evaluations().await {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, "cv evaluation fetch failed, serving empty aspect list");
                return Vec::new();
            }
        };

        let mut items = frequency::label_frequencies(&frequency::cv_label_sets(&records));
        items.retain(|item| item.percentage >= MIN_ASPECT_PERCENTAGE);
        self.cache.set(&key, MetricValue::Frequencies(items.clone()));
        items
    }

    /// Interview aspects flagged across session questions, same shape and
    /// cutoff as the CV variant.
    pub async fn interview_aspects_to_improve(&self) -> Vec<FrequencyItem> {
        let key = cache_key(MetricKind::InterviewAspects, &[]);
        if let Some(MetricValue::Frequencies(items)) = self.cache.get(&key) {
            return items;
        }

        let sessions = match self.source.interview_sessions().await {
            Ok(sessions) => sessions,
            Err(error) => {
                warn!(%error, "interview session fetch failed, serving empty aspect list");
                return Vec::new();
            }
        };

        let mut items = frequency::label_frequencies(&frequency::interview_label_sets(&sessions));
        items.retain(|item| item.percentage >= MIN_ASPECT_PERCENTAGE);
        self.cache.set(&key, MetricValue::Frequencies(items.clone()));
        items
    }

    /// Up to five users with the highest average CV score, best first.
    pub async fn top_performers(&self) -> Vec<RankedUser> {
        let key = cache_key(MetricKind::TopPerformers, &[]);
        if let Some(MetricValue::Ranking(users)) = self.cache.get(&key) {
            return users;
        }

        let Some(ranked) = self.ranked_users("top_performers").await else {
            return Vec::new();
        };
        let top = ranking::top_performers(&ranked);
        self.cache.set(&key, MetricValue::Ranking(top.clone()));
        top
    }

    /// Up to five users with the lowest average CV score, worst first.
    pub async fn bottom_performers(&self) -> Vec<RankedUser> {
        let key = cache_key(MetricKind::BottomPerformers, &[]);
        if let Some(MetricValue::Ranking(users)) = self.cache.get(&key) {
            return users;
        }

        let Some(ranked) = self.ranked_users("bottom_performers").await else {
            return Vec::new();
        };
        let bottom = ranking::bottom_performers(&ranked);
        self.cache.set(&key, MetricValue::Ranking(bottom.clone()));
        bottom
    }

    async fn ranked_users(&self, metric: &'static str) -> Option<Vec<RankedUser>> {
        let records = match self.source.cv_evaluations().await {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, metric, "cv evaluation fetch failed, serving empty ranking");
                return None;
            }
        };

        let screened = validate::screen_scored_evaluations(&records);
        screened.log_issues(metric);
        Some(ranking::rank_by_average(&screened.valid))
    }

    /// Score trend pooled by trial index across users.
    pub async fn trend_series(&self) -> Vec<TrendPoint> {
        let key = cache_key(MetricKind::TrendSeries, &[]);
        if let Some(MetricValue::TrendSeries(points)) = self.cache.get(&key) {
            return points;
        }

        let sessions = match self.source.interview_sessions().await {
            Ok(sessions) => sessions,
            Err(error) => {
                warn!(%error, "interview session fetch failed, serving empty trend");
                return Vec::new();
            }
        };

        let screened = validate::screen_scored_sessions(&sessions);
        screened.log_issues("trend_series");
        let points = trend::trend_points(&screened.valid);
        self.cache.set(&key, MetricValue::TrendSeries(points.clone()));
        points
    }

    /// Headline numbers for the trend chart.
    pub async fn trend_stats(&self) -> TrendStats {
        let key = cache_key(MetricKind::TrendStats, &[]);
        if let Some(MetricValue::TrendStats(stats)) = self.cache.get(&key) {
            return stats;
        }

        let sessions = match self.source.interview_sessions().await {
            Ok(sessions) => sessions,
            Err(error) => {
                warn!(%error, "interview session fetch failed, serving default trend stats");
                return TrendStats::default();
            }
        };

        let screened = validate::screen_scored_sessions(&sessions);
        screened.log_issues("trend_stats");
        let stats = trend::trend_stats(&screened.valid);
        self.cache.set(&key, MetricValue::TrendStats(stats.clone()));
        stats
    }

    /// Tool usage split among applications that reached an interview.
    pub async fn tool_impact_stats(&self) -> ToolImpactStats {
        let key = cache_key(MetricKind::ToolImpactStats, &[]);
        if let Some(MetricValue::ToolImpact(stats)) = self.cache.get(&key) {
            return stats;
        }

        let records = match self.source.application_events().await {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, "application fetch failed, serving zero tool impact");
                return ToolImpactStats::default();
            }
        };

        let stats = impact::tool_impact(&records);
        self.cache.set(&key, MetricValue::ToolImpact(stats));
        stats
    }

    /// The same split as a chart-ready two-item pair.
    pub async fn tool_impact_chart(&self) -> Vec<DistributionItem> {
        let key = cache_key(MetricKind::ToolImpactChart, &[]);
        if let Some(MetricValue::Distribution(items)) = self.cache.get(&key) {
            return items;
        }

        let stats = self.tool_impact_stats().await;
        let chart = impact::impact_chart(&stats);
        self.cache.set(&key, MetricValue::Distribution(chart.clone()));
        chart
    }

    /// Career spread among users with a known career.
    pub async fn career_distribution(&self, min_percentage: f64) -> Vec<DistributionItem> {
        let key = cache_key(
            MetricKind::CareerDistribution,
            &[("min_pct", min_percentage.to_string())],
        );
        if let Some(MetricValue::Distribution(items)) = self.cache.get(&key) {
            return items;
        }

        let users = match self.source.user_profiles().await {
            Ok(users) => users,
            Err(error) => {
                warn!(%error, "user profile fetch failed, serving empty career distribution");
                return Vec::new();
            }
        };

        let screened = validate::screen_careers(&users);
        screened.log_issues("career_distribution");
        let items = distribution::categorical_distribution(&screened.valid, min_percentage);
        self.cache.set(&key, MetricValue::Distribution(items.clone()));
        items
    }

    /// Cycle spread among users with a valid cycle value.
    pub async fn cycle_distribution(&self, min_percentage: f64) -> Vec<DistributionItem> {
        let key = cache_key(
            MetricKind::CycleDistribution,
            &[("min_pct", min_percentage.to_string())],
        );
        if let Some(MetricValue::Distribution(items)) = self.cache.get(&key) {
            return items;
        }

        let users = match self.source.user_profiles().await {
            Ok(users) => users,
            Err(error) => {
                warn!(%error, "user profile fetch failed, serving empty cycle distribution");
                return Vec::new();
            }
        };

        let screened = validate::screen_cycles(&users);
        screened.log_issues("cycle_distribution");
        let items = distribution::categorical_distribution(&screened.valid, min_percentage);
        self.cache.set(&key, MetricValue::Distribution(items.clone()));
        items
    }

    /// Raw record counts across all categories, fetched concurrently.
    pub async fn summary(&self) -> DashboardSummary {
        let key = cache_key(MetricKind::Summary, &[]);
        if let Some(MetricValue::Summary(summary)) = self.cache.get(&key) {
            return summary;
        }

        let fetched = tokio::try_join!(
            self.source.user_profiles(),
            self.source.cv_evaluations(),
            self.source.interview_sessions(),
            self.source.application_events(),
        );
        let (users, evaluations, sessions, applications) = match fetched {
            Ok(batches) => batches,
            Err(error) => {
                warn!(%error, "summary fetch failed, serving zero counts");
                return DashboardSummary::default();
            }
        };

        let summary = DashboardSummary {
            total_users: users.len(),
            total_cv_evaluations: evaluations.len(),
            total_interview_sessions: sessions.len(),
            total_applications: applications.len(),
        };
        self.cache.set(&key, MetricValue::Summary(summary));
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::models::{
        ApplicationStatus, ApplicationTrackingRecord, CvEvaluationRecord, CvResult,
        EvaluationStatus, InterviewSessionRecord, UserProfileRecord, UserRef,
    };
    use crate::source::stub::StubSource;

    fn evaluation(name: &str, score: f64, aspects: &[&str]) -> CvEvaluationRecord {
        CvEvaluationRecord {
            status: EvaluationStatus::Completed,
            user: Some(UserRef {
                display_name: name.to_string(),
                career: Some("Software Engineering".to_string()),
                cycle: Some("3".to_string()),
            }),
            result: Some(CvResult {
                score,
                aspects_to_improve: aspects.iter().map(|aspect| aspect.to_string()).collect(),
            }),
        }
    }

    fn session(user: Uuid, days: i64, score: f64) -> InterviewSessionRecord {
        InterviewSessionRecord {
            id: Uuid::new_v4(),
            user_id: user,
            status: EvaluationStatus::Completed,
            score: Some(score),
            created_at: Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
                + Duration::days(days),
            questions: vec![],
        }
    }

    fn metrics(source: StubSource) -> DashboardMetrics<StubSource> {
        DashboardMetrics::new(source, MetricCache::new())
    }

    #[tokio::test]
    async fn second_call_serves_the_cache_without_refetching() {
        let metrics = metrics(StubSource {
            cv: vec![
                evaluation("Avery", 85.0, &["clarity"]),
                evaluation("Avery", 90.0, &[]),
                evaluation("Avery", 78.0, &[]),
            ],
            ..StubSource::default()
        });

        let first = metrics.top_performers().await;
        let second = metrics.top_performers().await;

        assert_eq!(first, second);
        assert_eq!(first[0].average_score, 84.3);
        assert_eq!(metrics.source.cv_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_serves_default_and_caches_nothing() {
        let metrics = metrics(StubSource {
            fail: true,
            ..StubSource::default()
        });

        assert!(metrics.cv_aspects_to_improve().await.is_empty());
        assert_eq!(metrics.trend_stats().await, TrendStats::default());
        assert_eq!(metrics.tool_impact_stats().await, ToolImpactStats::default());
        assert_eq!(metrics.summary().await, DashboardSummary::default());
        assert!(metrics.cache.is_empty());

        // A later call goes back to the source instead of trusting a default.
        let before = metrics.source.cv_fetches.load(Ordering::SeqCst);
        metrics.cv_aspects_to_improve().await;
        assert_eq!(metrics.source.cv_fetches.load(Ordering::SeqCst), before + 1);
    }

    #[tokio::test]
    async fn aspect_lists_drop_labels_below_the_cutoff() {
        // "clarity" in 10 of 20 completed records, "niche" in 1 of 20.
        let mut cv = vec![evaluation("Avery", 80.0, &["clarity", "niche"])];
        for i in 0..9 {
            cv.push(evaluation(&format!("user-{i}"), 75.0, &["clarity"]));
        }
        for i in 9..19 {
            cv.push(evaluation(&format!("user-{i}"), 75.0, &[]));
        }

        let metrics = metrics(StubSource {
            cv,
            ..StubSource::default()
        });

        let items = metrics.cv_aspects_to_improve().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "clarity");
        assert_eq!(items[0].percentage, 50.0);
    }

    #[tokio::test]
    async fn malformed_records_do_not_disturb_valid_peers() {
        let mut broken = evaluation("", 95.0, &[]);
        broken.user.as_mut().unwrap().display_name = "  ".to_string();
        let metrics = metrics(StubSource {
            cv: vec![
                evaluation("Avery", 80.0, &[]),
                evaluation("Avery", 90.0, &[]),
                broken,
            ],
            ..StubSource::default()
        });

        let top = metrics.top_performers().await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].average_score, 85.0);
        assert_eq!(top[0].analysis_count, 2);
    }

    #[tokio::test]
    async fn trend_metrics_report_improvement() {
        let user = Uuid::new_v4();
        let metrics = metrics(StubSource {
            sessions: vec![session(user, 0, 60.0), session(user, 7, 75.0)],
            ..StubSource::default()
        });

        let points = metrics.trend_series().await;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].trial_index, 1);

        let stats = metrics.trend_stats().await;
        assert_eq!(stats.improvement, 15.0);
        assert_eq!(stats.total_users, 1);
    }

    #[tokio::test]
    async fn distribution_thresholds_are_parameters_of_the_key() {
        let users: Vec<UserProfileRecord> = (0..99)
            .map(|_| UserProfileRecord {
                career: Some("Software Engineering".to_string()),
                cycle: Some("3".to_string()),
            })
            .chain(std::iter::once(UserProfileRecord {
                career: Some("Astronomy".to_string()),
                cycle: Some("11".to_string()),
            }))
            .collect();

        let metrics = metrics(StubSource {
            users,
            ..StubSource::default()
        });

        let careers = metrics
            .career_distribution(distribution::CAREER_MIN_PERCENTAGE)
            .await;
        assert!(careers.iter().any(|item| item.label == "Astronomy"));

        let cycles = metrics
            .cycle_distribution(distribution::CYCLE_MIN_PERCENTAGE)
            .await;
        assert!(cycles.iter().all(|item| item.label != "11"));

        // Different thresholds are distinct cache entries, both re-fetched.
        metrics.career_distribution(5.0).await;
        assert_eq!(metrics.source.user_fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn summary_counts_every_category_in_one_pass() {
        let user = Uuid::new_v4();
        let metrics = metrics(StubSource {
            cv: vec![evaluation("Avery", 80.0, &[])],
            sessions: vec![session(user, 0, 70.0)],
            applications: vec![ApplicationTrackingRecord {
                status: ApplicationStatus::Applied,
                tools_used: Default::default(),
            }],
            users: vec![UserProfileRecord {
                career: None,
                cycle: None,
            }],
            ..StubSource::default()
        });

        let summary = metrics.summary().await;
        assert_eq!(summary.total_users, 1);
        assert_eq!(summary.total_cv_evaluations, 1);
        assert_eq!(summary.total_interview_sessions, 1);
        assert_eq!(summary.total_applications, 1);

        metrics.summary().await;
        assert_eq!(metrics.source.user_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_cache_forces_recomputation() {
        let metrics = metrics(StubSource {
            cv: vec![evaluation("Avery", 80.0, &[])],
            ..StubSource::default()
        });

        metrics.top_performers().await;
        metrics.clear_cache();
        metrics.top_performers().await;
        assert_eq!(metrics.source.cv_fetches.load(Ordering::SeqCst), 2);
    }
}

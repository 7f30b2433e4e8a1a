use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Mutex;

use crate::models::{
    DashboardSummary, DistributionItem, FrequencyItem, RankedUser, ToolImpactStats, TrendPoint,
    TrendStats,
};

/// A computed metric as stored in the cache. One variant per output shape;
/// entries are replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Frequencies(Vec<FrequencyItem>),
    Ranking(Vec<RankedUser>),
    TrendSeries(Vec<TrendPoint>),
    TrendStats(TrendStats),
    ToolImpact(ToolImpactStats),
    Distribution(Vec<DistributionItem>),
    Summary(DashboardSummary),
}

/// Process-lifetime store for computed metrics.
///
/// No TTL and no eviction: an entry stays authoritative until an external
/// refresh clears it. The lock is never held across an await; a poisoned
/// lock is recovered rather than propagated.
#[derive(Debug, Default)]
pub struct MetricCache {
    entries: Mutex<HashMap<String, MetricValue>>,
}

impl MetricCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: &str, value: MetricValue) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identity of each public metric. Cache keys derive from this plus the
/// metric's parameters, nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    CvAspects,
    InterviewAspects,
    TopPerformers,
    BottomPerformers,
    TrendSeries,
    TrendStats,
    ToolImpactStats,
    ToolImpactChart,
    CareerDistribution,
    CycleDistribution,
    Summary,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CvAspects => "cv_aspects",
            Self::InterviewAspects => "interview_aspects",
            Self::TopPerformers => "top_performers",
            Self::BottomPerformers => "bottom_performers",
            Self::TrendSeries => "trend_series",
            Self::TrendStats => "trend_stats",
            Self::ToolImpactStats => "tool_impact_stats",
            Self::ToolImpactChart => "tool_impact_chart",
            Self::CareerDistribution => "career_distribution",
            Self::CycleDistribution => "cycle_distribution",
            Self::Summary => "summary",
        }
    }
}

/// Build the cache key for a metric and its parameters. Parameter order is
/// part of the key; each caller passes a fixed order for its metric.
pub fn cache_key(kind: MetricKind, params: &[(&str, String)]) -> String {
    let mut key = String::from(kind.as_str());
    for (name, value) in params {
        let _ = write!(key, ":{name}={value}");
    }
    key
}

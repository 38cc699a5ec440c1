use std::collections::BTreeMap;

use recommender_common::error::ClientError;
use recommender_common::model::AnalyticsSnapshot;
use tracing::{debug, info, warn};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load analytics.";

/// Identifies one activation of the analytics page. A remount gets a new id,
/// so a fetch started by an earlier mount cannot land in the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountId(pub u64);

/// One bar of a frequency chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub label: String,
    pub count: u64,
}

/// A loaded snapshot plus the chart datasets derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    pub count: u64,
    pub price_mean: Option<f64>,
    pub categories: Vec<ChartPoint>,
    pub brands: Vec<ChartPoint>,
}

impl From<AnalyticsSnapshot> for AnalyticsReport {
    fn from(snapshot: AnalyticsSnapshot) -> Self {
        Self {
            count: snapshot.count,
            price_mean: snapshot.price_mean,
            categories: chart_points(&snapshot.top_categories),
            brands: chart_points(&snapshot.top_brands),
        }
    }
}

/// Frequency mapping to chart pairs, most frequent first, ties by label.
pub fn chart_points(frequencies: &BTreeMap<String, u64>) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = frequencies
        .iter()
        .map(|(label, count)| ChartPoint {
            label: label.clone(),
            count: *count,
        })
        .collect();
    points.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    points
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsState {
    Loading,
    Failed(String),
    Loaded(AnalyticsReport),
}

/// Marker command: issue the one analytics fetch for this mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchAnalytics {
    pub mount: MountId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsView {
    mount: MountId,
    requested: bool,
    state: AnalyticsState,
}

impl AnalyticsView {
    pub fn new(mount: MountId) -> Self {
        Self {
            mount,
            requested: false,
            state: AnalyticsState::Loading,
        }
    }

    pub fn mount(&self) -> MountId {
        self.mount
    }

    pub fn state(&self) -> &AnalyticsState {
        &self.state
    }

    /// Yields the fetch exactly once per view.
    pub fn activate(&mut self) -> Option<FetchAnalytics> {
        if self.requested {
            return None;
        }
        self.requested = true;
        Some(FetchAnalytics { mount: self.mount })
    }

    /// Move to a terminal state. Later completions, and completions for
    /// another mount, are ignored.
    pub fn complete(&mut self, mount: MountId, outcome: Result<AnalyticsSnapshot, ClientError>) {
        if mount != self.mount {
            debug!(mount = mount.0, current = self.mount.0, "discarding analytics for old mount");
            return;
        }
        if !matches!(self.state, AnalyticsState::Loading) {
            debug!(mount = mount.0, "analytics already settled");
            return;
        }

        self.state = match outcome {
            Ok(snapshot) => {
                info!(
                    count = snapshot.count,
                    categories = snapshot.top_categories.len(),
                    brands = snapshot.top_brands.len(),
                    "analytics loaded"
                );
                AnalyticsState::Loaded(AnalyticsReport::from(snapshot))
            }
            Err(e) => {
                warn!(error = %e, "analytics fetch failed");
                AnalyticsState::Failed(LOAD_FAILED_MESSAGE.to_string())
            }
        };
    }
}

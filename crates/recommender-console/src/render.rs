//! Text rendering of the console pages. Pure functions of state.

use std::fmt::Write as _;

use crate::analytics::{AnalyticsReport, AnalyticsState, AnalyticsView, ChartPoint};
use crate::app::Route;
use crate::model::ResultItem;
use crate::session::SearchSession;

/// Characters of the original description shown before generation.
pub const PREVIEW_CHARS: usize = 100;
const ELLIPSIS: &str = "...";
const BAR_WIDTH: usize = 40;

/// Generated text if present, otherwise a truncated original description.
pub fn description_preview(item: &ResultItem) -> String {
    if let Some(generated) = &item.generated {
        return generated.clone();
    }
    let head: String = item.description.chars().take(PREVIEW_CHARS).collect();
    format!("{head}{ELLIPSIS}")
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${p:.2}"),
        None => "N/A".to_string(),
    }
}

/// `"['Home & Kitchen', 'Lamps']"` becomes `"Home & Kitchen, Lamps"`.
/// Plain labels pass through trimmed.
pub fn format_categories(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|c| c.trim().trim_matches(|ch| ch == '\'' || ch == '"').trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn nav_bar(route: &Route) -> String {
    let link = |label: &str, active: bool| {
        if active {
            format!("[{label}]")
        } else {
            format!(" {label} ")
        }
    };
    format!(
        "{} | {}",
        link("Recommend", matches!(route, Route::Recommend)),
        link("Analytics", matches!(route, Route::Analytics)),
    )
}

pub fn recommend_page(session: &SearchSession) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Product Recommender");
    let query = session.query().map(|q| q.as_str()).unwrap_or("");
    let button = if session.is_loading() {
        "[Searching...]"
    } else {
        "[Get Recommendations]"
    };
    let _ = writeln!(out, "> {query}  {button}");

    if let Some(error) = session.error() {
        let _ = writeln!(out, "! {error}");
    }

    let results = session.results();
    for (i, item) in results.items().iter().enumerate() {
        let button = if results.is_in_flight(i) {
            "[Generating...]".to_string()
        } else {
            format!("[Generate Description] (:gen {})", i + 1)
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "{:>2}. {}", i + 1, item.title);
        let _ = writeln!(out, "    Category: {}", format_categories(&item.categories));
        let _ = writeln!(out, "    Price: {}", format_price(item.price));
        let _ = writeln!(out, "    {}", description_preview(item));
        let _ = writeln!(out, "    {button}");
    }
    out
}

pub fn analytics_page(view: &AnalyticsView) -> String {
    match view.state() {
        AnalyticsState::Loading => "Loading analytics...\n".to_string(),
        AnalyticsState::Failed(message) => format!("{message}\n"),
        AnalyticsState::Loaded(report) => analytics_report(report),
    }
}

fn analytics_report(report: &AnalyticsReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dataset Analytics");
    let _ = writeln!(out, "Total Products: {}", report.count);
    let _ = writeln!(out, "Average Price: {}", format_price(report.price_mean));
    let _ = writeln!(out);
    let _ = writeln!(out, "Top Categories");
    out.push_str(&bar_chart(&report.categories, "No category data available."));
    let _ = writeln!(out);
    let _ = writeln!(out, "Top Brands");
    out.push_str(&bar_chart(&report.brands, "No brand data available."));
    out
}

/// Horizontal bars scaled to the largest count. Every non-zero count gets
/// at least one cell.
pub fn bar_chart(points: &[ChartPoint], empty_message: &str) -> String {
    if points.is_empty() {
        return format!("  {empty_message}\n");
    }
    let label_width = points.iter().map(|p| p.label.chars().count()).max().unwrap_or(0);
    let max = points.iter().map(|p| p.count).max().unwrap_or(0).max(1);

    let mut out = String::new();
    for point in points {
        let scaled = (point.count as u128 * BAR_WIDTH as u128 / max as u128) as usize;
        let cells = if point.count > 0 { scaled.max(1) } else { 0 };
        let _ = writeln!(
            out,
            "  {:<label_width$} | {} {}",
            point.label,
            "#".repeat(cells),
            point.count,
        );
    }
    out
}

pub fn not_found_page(path: &str) -> String {
    format!("Page Not Found: {path}\n")
}

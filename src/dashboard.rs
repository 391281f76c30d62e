//! Dashboard aggregation: summary stats, best routine/products, daily trends and
//! the humidity/frizz insight.
//!
//! Everything here is pure. The store hands over the caller's rows (already
//! scoped to one user) and these functions only fold them.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::{Id, Product, Routine, WeatherRecord};
use crate::scoring::RatingTriple;

/// Minimum rated logs before a routine can be called "best".
pub const MIN_ROUTINE_OUTCOMES: usize = 3;
/// Minimum usage before a product is ranked.
pub const MIN_PRODUCT_USAGE: u32 = 3;
pub const TOP_PRODUCTS: usize = 5;
pub const DEFAULT_TREND_DAYS: i64 = 30;

pub const HIGH_HUMIDITY_THRESHOLD: f64 = 60.0;
pub const LOW_HUMIDITY_THRESHOLD: f64 = 40.0;

/// A routine log joined with its outcome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatedLog {
    pub log_id: Id,
    pub routine_id: Option<Id>,
    pub date: NaiveDate,
    pub ratings: RatingTriple,
    pub overall_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AverageScores {
    pub frizz: Option<f64>,
    pub definition: Option<f64>,
    pub softness: Option<f64>,
    pub overall: Option<f64>,
    pub hold_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestRoutine {
    pub id: Id,
    pub name: String,
    pub average_score: f64,
    pub log_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductHighlight {
    pub id: Id,
    pub brand: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: crate::models::ProductType,
    pub success_rate: f64,
    pub usage_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_logs: usize,
    pub total_outcomes: usize,
    pub average_scores: AverageScores,
    pub best_routine: Option<BestRoutine>,
    pub best_products: Vec<ProductHighlight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub frizz: f64,
    pub definition: f64,
    pub softness: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Weather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub message: String,
    pub confidence: Confidence,
    /// Mean frizz on high-humidity days.
    pub high_humidity_frizz: f64,
    /// Mean frizz on low-humidity days.
    pub low_humidity_frizz: f64,
    pub increase_pct: f64,
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Running sum/count pair.
#[derive(Clone, Copy, Debug, Default)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn add(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    fn get(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

pub fn average_scores(rows: &[RatedLog]) -> AverageScores {
    let mut frizz = Mean::default();
    let mut definition = Mean::default();
    let mut softness = Mean::default();
    let mut overall = Mean::default();
    let mut hold = Mean::default();

    for r in rows {
        frizz.add(f64::from(r.ratings.frizz));
        definition.add(f64::from(r.ratings.definition));
        softness.add(f64::from(r.ratings.softness));
        overall.add(r.overall_score);
        if let Some(h) = r.ratings.hold_hours {
            hold.add(h);
        }
    }

    AverageScores {
        frizz: frizz.get().map(round2),
        definition: definition.get().map(round2),
        softness: softness.get().map(round2),
        overall: overall.get().map(round2),
        hold_hours: hold.get().map(round2),
    }
}

/// Highest mean overall score among routines with enough rated logs.
///
/// Ties keep the routine that comes first in `routines`.
pub fn best_routine(routines: &[Routine], rows: &[RatedLog]) -> Option<BestRoutine> {
    let mut per_routine: BTreeMap<Id, Mean> = BTreeMap::new();
    for r in rows {
        if let Some(rid) = r.routine_id {
            per_routine.entry(rid).or_default().add(r.overall_score);
        }
    }

    let mut best: Option<(&Routine, f64, usize)> = None;
    for routine in routines {
        let Some(m) = per_routine.get(&routine.id) else {
            continue;
        };
        if m.n < MIN_ROUTINE_OUTCOMES {
            continue;
        }
        let Some(avg) = m.get() else { continue };
        if best.is_none_or(|(_, top, _)| avg > top) {
            best = Some((routine, avg, m.n));
        }
    }

    best.map(|(routine, avg, n)| BestRoutine {
        id: routine.id,
        name: routine.name.clone(),
        average_score: round2(avg),
        log_count: n,
    })
}

/// Products used at least [`MIN_PRODUCT_USAGE`] times, best success rate first.
pub fn best_products(products: &[Product]) -> Vec<ProductHighlight> {
    let mut eligible: Vec<&Product> = products
        .iter()
        .filter(|p| p.usage_count >= MIN_PRODUCT_USAGE)
        .collect();
    // stable: equal rates keep store order
    eligible.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));

    eligible
        .into_iter()
        .take(TOP_PRODUCTS)
        .map(|p| ProductHighlight {
            id: p.id,
            brand: p.brand.clone(),
            name: p.name.clone(),
            kind: p.kind,
            success_rate: round2(p.success_rate),
            usage_count: p.usage_count,
        })
        .collect()
}

pub fn dashboard_stats(
    total_logs: usize,
    rows: &[RatedLog],
    routines: &[Routine],
    products: &[Product],
) -> DashboardStats {
    DashboardStats {
        total_logs,
        total_outcomes: rows.len(),
        average_scores: average_scores(rows),
        best_routine: best_routine(routines, rows),
        best_products: best_products(products),
    }
}

/// Per-day means for logs dated on or after `today - days`, oldest first.
pub fn trends(rows: &[RatedLog], today: NaiveDate, days: i64) -> Vec<TrendPoint> {
    let start = today - Duration::days(days);

    #[derive(Default)]
    struct Day {
        frizz: Mean,
        definition: Mean,
        softness: Mean,
        overall: Mean,
    }

    let mut by_date: BTreeMap<NaiveDate, Day> = BTreeMap::new();
    for r in rows.iter().filter(|r| r.date >= start) {
        let d = by_date.entry(r.date).or_default();
        d.frizz.add(f64::from(r.ratings.frizz));
        d.definition.add(f64::from(r.ratings.definition));
        d.softness.add(f64::from(r.ratings.softness));
        d.overall.add(r.overall_score);
    }

    by_date
        .into_iter()
        .map(|(date, d)| TrendPoint {
            date,
            frizz: round2(d.frizz.get().unwrap_or_default()),
            definition: round2(d.definition.get().unwrap_or_default()),
            softness: round2(d.softness.get().unwrap_or_default()),
            overall: round2(d.overall.get().unwrap_or_default()),
        })
        .collect()
}

/// Compare frizz on humid vs dry days.
///
/// Each rated log is joined with every weather row on the same date. Days
/// strictly between the two thresholds count for neither bucket. Only a
/// worse-when-humid result produces an insight.
pub fn weather_insight(rows: &[RatedLog], weather: &[WeatherRecord]) -> Option<Insight> {
    let mut high = Mean::default();
    let mut low = Mean::default();

    for r in rows {
        for w in weather.iter().filter(|w| w.date == r.date) {
            let frizz = f64::from(r.ratings.frizz);
            if w.humidity >= HIGH_HUMIDITY_THRESHOLD {
                high.add(frizz);
            } else if w.humidity <= LOW_HUMIDITY_THRESHOLD {
                low.add(frizz);
            }
        }
    }

    let (high, low) = (high.get()?, low.get()?);
    if low <= 0.0 || high <= low {
        return None;
    }

    let increase_pct = round1((high - low) / low * 100.0);
    Some(Insight {
        kind: InsightKind::Weather,
        message: format!(
            "High humidity days (≥{HIGH_HUMIDITY_THRESHOLD:.1}%) show {increase_pct:.1}% higher frizz on average"
        ),
        confidence: Confidence::Medium,
        high_humidity_frizz: round2(high),
        low_humidity_frizz: round2(low),
        increase_pct,
    })
}

pub fn insights(rows: &[RatedLog], weather: &[WeatherRecord]) -> Vec<Insight> {
    weather_insight(rows, weather).into_iter().collect()
}

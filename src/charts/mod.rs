//! Chart renderer: turn a filtered view into four declarative chart specs.
//!
//! The specs are plain serializable data (title, axis labels, kind-specific
//! payload). Drawing them is the frontend's job. Each chart is computed
//! independently from the same view; an empty view produces charts with no
//! data points.

pub mod stats;

use serde::Serialize;

use crate::filter::FilteredView;

/// Number of bins in the age histogram.
pub const AGE_BINS: usize = 10;

const INCOME_LABEL: &str = "Annual Income (k$)";
const SCORE_LABEL: &str = "Spending Score (1-100)";

// ---------------------------------------------------------------------------
// Spec types
// ---------------------------------------------------------------------------

/// A single chart: shared presentation fields plus the kind-specific data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(flatten)]
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Scatter { series: Vec<PointSeries> },
    Box { groups: Vec<BoxGroup> },
    Histogram { bins: Vec<Bin> },
    Bar { bars: Vec<Bar> },
}

/// Points of one gender in the scatter chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSeries {
    pub name: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Five-number summary of one gender's spending scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub name: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Histogram bin `[start, end)`; the last bin also includes `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub count: usize,
}

/// The four dashboard charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub scatter: ChartSpec,
    pub box_plot: ChartSpec,
    pub histogram: ChartSpec,
    pub bar: ChartSpec,
}

impl ChartSpec {
    /// True when the chart has nothing to draw.
    pub fn is_empty(&self) -> bool {
        match &self.data {
            ChartData::Scatter { series } => series.iter().all(|s| s.points.is_empty()),
            ChartData::Box { groups } => groups.is_empty(),
            ChartData::Histogram { bins } => bins.iter().all(|b| b.count == 0),
            ChartData::Bar { bars } => bars.is_empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Compute all four charts from the same view.
pub fn render(view: &FilteredView<'_>) -> ChartSet {
    ChartSet {
        scatter: scatter(view),
        box_plot: box_plot(view),
        histogram: age_histogram(view),
        bar: gender_bar(view),
    }
}

/// Income (x) vs spending score (y), one series per gender.
pub fn scatter(view: &FilteredView<'_>) -> ChartSpec {
    let series = view
        .genders()
        .into_iter()
        .map(|gender| {
            let points = view
                .iter()
                .filter(|r| r.gender == gender)
                .map(|r| Point {
                    x: r.annual_income,
                    y: r.spending_score,
                })
                .collect();
            PointSeries { name: gender, points }
        })
        .collect();

    ChartSpec {
        title: "Income vs Spending Score".to_string(),
        x_label: INCOME_LABEL.to_string(),
        y_label: SCORE_LABEL.to_string(),
        data: ChartData::Scatter { series },
    }
}

/// Spending score distribution grouped by gender.
pub fn box_plot(view: &FilteredView<'_>) -> ChartSpec {
    let groups = view
        .genders()
        .into_iter()
        .filter_map(|gender| {
            let scores = stats::sorted(
                view.iter()
                    .filter(|r| r.gender == gender)
                    .map(|r| r.spending_score),
            );
            Some(BoxGroup {
                count: scores.len(),
                min: stats::quantile(&scores, 0.0)?,
                q1: stats::quantile(&scores, 0.25)?,
                median: stats::quantile(&scores, 0.5)?,
                q3: stats::quantile(&scores, 0.75)?,
                max: stats::quantile(&scores, 1.0)?,
                name: gender,
            })
        })
        .collect();

    ChartSpec {
        title: "Spending Score Distribution by Gender".to_string(),
        x_label: "Gender".to_string(),
        y_label: SCORE_LABEL.to_string(),
        data: ChartData::Box { groups },
    }
}

/// Age distribution in [`AGE_BINS`] equal-width bins.
pub fn age_histogram(view: &FilteredView<'_>) -> ChartSpec {
    let ages: Vec<f64> = view.iter().map(|r| f64::from(r.age)).collect();
    let bins = stats::equal_width_bins(&ages, AGE_BINS)
        .into_iter()
        .map(|(start, end, count)| Bin { start, end, count })
        .collect();

    ChartSpec {
        title: "Age Distribution".to_string(),
        x_label: "Age".to_string(),
        y_label: "Count".to_string(),
        data: ChartData::Histogram { bins },
    }
}

/// Number of customers per gender.
pub fn gender_bar(view: &FilteredView<'_>) -> ChartSpec {
    let bars = view
        .genders()
        .into_iter()
        .map(|gender| Bar {
            count: view.iter().filter(|r| r.gender == gender).count(),
            label: gender,
        })
        .collect();

    ChartSpec {
        title: "Customers by Gender".to_string(),
        x_label: "Gender".to_string(),
        y_label: "Count".to_string(),
        data: ChartData::Bar { bars },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CustomerRecord, Dataset};

    fn sample() -> Dataset {
        Dataset::new(vec![
            CustomerRecord::new("Male", 19, 15.0, 39.0),
            CustomerRecord::new("Female", 20, 16.0, 6.0),
            CustomerRecord::new("Female", 35, 40.0, 77.0),
            CustomerRecord::new("Male", 64, 19.0, 3.0),
            CustomerRecord::new("Female", 31, 17.0, 40.0),
        ])
    }

    #[test]
    fn scatter_groups_points_by_gender() {
        let ds = sample();
        let spec = scatter(&FilteredView::all(&ds));
        let ChartData::Scatter { series } = &spec.data else {
            panic!("expected scatter data");
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "Male");
        assert_eq!(series[0].points, vec![Point { x: 15.0, y: 39.0 }, Point { x: 19.0, y: 3.0 }]);
        assert_eq!(series[1].points.len(), 3);
    }

    #[test]
    fn box_plot_five_number_summary() {
        let ds = sample();
        let spec = box_plot(&FilteredView::all(&ds));
        let ChartData::Box { groups } = &spec.data else {
            panic!("expected box data");
        };
        let female = groups.iter().find(|g| g.name == "Female").unwrap();
        assert_eq!(female.count, 3);
        assert_eq!(female.min, 6.0);
        assert_eq!(female.q1, 23.0);
        assert_eq!(female.median, 40.0);
        assert_eq!(female.q3, 58.5);
        assert_eq!(female.max, 77.0);
    }

    #[test]
    fn bar_counts_per_gender() {
        let ds = sample();
        let spec = gender_bar(&FilteredView::all(&ds));
        let ChartData::Bar { bars } = &spec.data else {
            panic!("expected bar data");
        };
        assert_eq!(
            bars,
            &vec![
                Bar { label: "Male".to_string(), count: 2 },
                Bar { label: "Female".to_string(), count: 3 },
            ]
        );
    }

    #[test]
    fn histogram_has_ten_bins_over_age_range() {
        let ds = sample();
        let spec = age_histogram(&FilteredView::all(&ds));
        let ChartData::Histogram { bins } = &spec.data else {
            panic!("expected histogram data");
        };
        assert_eq!(bins.len(), AGE_BINS);
        assert_eq!(bins[0].start, 19.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
    }

    #[test]
    fn spec_serializes_with_kind_tag() {
        let ds = sample();
        let json = serde_json::to_value(gender_bar(&FilteredView::all(&ds))).unwrap();
        assert_eq!(json["kind"], "bar");
        assert_eq!(json["title"], "Customers by Gender");
        assert_eq!(json["bars"][0]["label"], "Male");
    }
}

//! Customer dataset: loaded once from CSV, read-only afterwards.
//!
//! The source is either a local file (`dataset.path`) or a remote URL
//! (`dataset.url`, fetched with `ureq`). A malformed row or an unreachable
//! source is a startup error; there is no fallback.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::schema::DatasetConfig;

/// Spacing of the age slider tick marks.
const AGE_MARK_STEP: usize = 10;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One customer row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "CustomerID", default)]
    pub customer_id: Option<u32>,
    #[serde(rename = "Gender", alias = "Genre")]
    pub gender: String,
    #[serde(rename = "Age")]
    pub age: u32,
    /// Annual income in thousands of dollars.
    #[serde(rename = "Annual Income (k$)")]
    pub annual_income: f64,
    /// Spending score, 1–100.
    #[serde(rename = "Spending Score (1-100)")]
    pub spending_score: f64,
}

impl CustomerRecord {
    pub fn new(gender: impl Into<String>, age: u32, annual_income: f64, spending_score: f64) -> Self {
        Self {
            customer_id: None,
            gender: gender.into(),
            age,
            annual_income,
            spending_score,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// The full, immutable customer table.
///
/// Constructed once at startup and shared by reference with every handler.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CustomerRecord>,
}

impl Dataset {
    pub fn new(records: Vec<CustomerRecord>) -> Self {
        Self { records }
    }

    /// Parse CSV with a header row. Fails on the first malformed row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (idx, row) in csv_reader.deserialize::<CustomerRecord>().enumerate() {
            // +2: one for the header line, one for 1-based numbering
            let record = row.with_context(|| format!("malformed customer row at line {}", idx + 2))?;
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn from_csv_str(csv_text: &str) -> Result<Self> {
        Self::from_reader(csv_text.as_bytes())
    }

    /// Load from a local CSV file.
    pub fn load_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open dataset {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("failed to parse dataset {}", path.display()))
    }

    /// Fetch and parse a remote CSV.
    pub fn load_url(url: &str, timeout: Duration) -> Result<Self> {
        let resp = ureq::get(url)
            .timeout(timeout)
            .call()
            .with_context(|| format!("failed to fetch dataset from {url}"))?;
        Self::from_reader(resp.into_reader())
            .with_context(|| format!("failed to parse dataset from {url}"))
    }

    /// Load from whichever source the config names. A local path wins.
    pub fn load(config: &DatasetConfig) -> Result<Self> {
        let dataset = if config.path.is_empty() {
            Self::load_url(&config.url, Duration::from_millis(config.fetch_timeout_ms))?
        } else {
            Self::load_path(Path::new(&config.path))?
        };

        tracing::info!(
            records = dataset.len(),
            source = if config.path.is_empty() { config.url.as_str() } else { config.path.as_str() },
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct genders in order of first appearance.
    pub fn genders(&self) -> Vec<String> {
        distinct_genders(self.records.iter())
    }

    /// `(min, max)` age, or `None` for an empty dataset.
    pub fn age_range(&self) -> Option<(u32, u32)> {
        let min = self.records.iter().map(|r| r.age).min()?;
        let max = self.records.iter().map(|r| r.age).max()?;
        Some((min, max))
    }

    /// Slider tick marks: every ten years from the minimum age up to the maximum.
    pub fn age_marks(&self) -> Vec<u32> {
        match self.age_range() {
            Some((min, max)) => (min..=max).step_by(AGE_MARK_STEP).collect(),
            None => Vec::new(),
        }
    }
}

/// Distinct genders in order of first appearance.
pub(crate) fn distinct_genders<'a>(records: impl Iterator<Item = &'a CustomerRecord>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for record in records {
        if !seen.iter().any(|g| g == &record.gender) {
            seen.push(record.gender.clone());
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
CustomerID,Gender,Age,Annual Income (k$),Spending Score (1-100)
1,Male,19,15,39
2,Male,21,15,81
3,Female,20,16,6
4,Female,23,16,77
5,Female,31,17,40
";

    #[test]
    fn parses_mall_customers_header() {
        let ds = Dataset::from_csv_str(SAMPLE).unwrap();
        assert_eq!(ds.len(), 5);
        let first = &ds.records()[0];
        assert_eq!(first.customer_id, Some(1));
        assert_eq!(first.gender, "Male");
        assert_eq!(first.age, 19);
        assert_eq!(first.annual_income, 15.0);
        assert_eq!(first.spending_score, 39.0);
    }

    #[test]
    fn accepts_genre_column_without_customer_id() {
        let csv_text = "Genre,Age,Annual Income (k$),Spending Score (1-100)\nFemale,40,60,50\n";
        let ds = Dataset::from_csv_str(csv_text).unwrap();
        assert_eq!(ds.records()[0].gender, "Female");
        assert_eq!(ds.records()[0].customer_id, None);
    }

    #[test]
    fn malformed_row_is_an_error() {
        let csv_text = "Gender,Age,Annual Income (k$),Spending Score (1-100)\nMale,old,15,39\n";
        let err = Dataset::from_csv_str(csv_text).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Dataset::load_path(Path::new("/nonexistent/mall.csv")).is_err());
    }

    #[test]
    fn genders_in_first_appearance_order() {
        let ds = Dataset::from_csv_str(SAMPLE).unwrap();
        assert_eq!(ds.genders(), vec!["Male", "Female"]);
    }

    #[test]
    fn age_range_and_marks() {
        let ds = Dataset::from_csv_str(SAMPLE).unwrap();
        assert_eq!(ds.age_range(), Some((19, 31)));
        assert_eq!(ds.age_marks(), vec![19, 29]);
    }

    #[test]
    fn empty_dataset_has_no_range() {
        let ds = Dataset::default();
        assert!(ds.is_empty());
        assert_eq!(ds.age_range(), None);
        assert!(ds.age_marks().is_empty());
        assert!(ds.genders().is_empty());
    }
}

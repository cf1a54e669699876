//! Filter controller: derive a read-only view of the dataset from the
//! current gender / minimum-age selection.

use serde::{Deserialize, Serialize};

use crate::dataset::{CustomerRecord, Dataset, distinct_genders};

/// Current filter widget state.
///
/// An empty gender list and `min_age == None` both mean "no restriction".
/// `Some(0)` is kept as an explicit threshold; since ages are unsigned it
/// admits every row, same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub genders: Vec<String>,
    #[serde(default)]
    pub min_age: Option<u32>,
}

impl FilterSelection {
    pub fn new<S: Into<String>>(genders: impl IntoIterator<Item = S>, min_age: Option<u32>) -> Self {
        Self {
            genders: genders.into_iter().map(Into::into).collect(),
            min_age,
        }
    }

    /// Parse `gender=Female&gender=Male&min_age=30`.
    ///
    /// Blank gender values are dropped. A blank or unparsable `min_age`
    /// means no age restriction. Unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut selection = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "gender" if !value.is_empty() => {
                    if !selection.genders.iter().any(|g| g == value) {
                        selection.genders.push(value.to_string());
                    }
                }
                "min_age" => selection.min_age = value.parse().ok(),
                _ => {}
            }
        }
        selection
    }

    /// True when neither constraint is active.
    pub fn is_unrestricted(&self) -> bool {
        self.genders.is_empty() && self.min_age.is_none()
    }

    /// Whether a single record passes both constraints.
    pub fn matches(&self, record: &CustomerRecord) -> bool {
        let gender_ok = self.genders.is_empty() || self.genders.iter().any(|g| *g == record.gender);
        let age_ok = self.min_age.is_none_or(|min| record.age >= min);
        gender_ok && age_ok
    }
}

/// Borrowed subset of the dataset produced by [`filter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a CustomerRecord>,
}

impl<'a> FilteredView<'a> {
    /// View over every record of the dataset.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            records: dataset.records().iter().collect(),
        }
    }

    /// Apply a further selection to this view.
    pub fn refine(&self, selection: &FilterSelection) -> FilteredView<'a> {
        FilteredView {
            records: self
                .records
                .iter()
                .copied()
                .filter(|r| selection.matches(r))
                .collect(),
        }
    }

    pub fn records(&self) -> &[&'a CustomerRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CustomerRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Genders present in the view, in order of first appearance.
    pub fn genders(&self) -> Vec<String> {
        distinct_genders(self.iter())
    }
}

/// Keep rows whose gender is selected (if any are) and whose age is at
/// least the threshold (if one is set).
pub fn filter<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> FilteredView<'a> {
    FilteredView::all(dataset).refine(selection)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            CustomerRecord::new("F", 25, 15.0, 39.0),
            CustomerRecord::new("M", 35, 80.0, 6.0),
            CustomerRecord::new("F", 45, 20.0, 76.0),
        ])
    }

    #[test]
    fn from_query_reads_repeated_genders() {
        let sel = FilterSelection::from_query("gender=Female&gender=Male&min_age=30");
        assert_eq!(sel.genders, vec!["Female", "Male"]);
        assert_eq!(sel.min_age, Some(30));
    }

    #[test]
    fn from_query_decodes_and_dedups() {
        let sel = FilterSelection::from_query("gender=Non%20binary&gender=Non+binary&gender=");
        assert_eq!(sel.genders, vec!["Non binary"]);
        assert_eq!(sel.min_age, None);
    }

    #[test]
    fn from_query_blank_or_bad_age_is_unrestricted() {
        assert_eq!(FilterSelection::from_query("min_age=").min_age, None);
        assert_eq!(FilterSelection::from_query("min_age=abc").min_age, None);
        assert_eq!(FilterSelection::from_query("min_age=-4").min_age, None);
        assert!(FilterSelection::from_query("").is_unrestricted());
        assert!(FilterSelection::from_query("foo=bar").is_unrestricted());
    }

    #[test]
    fn from_query_keeps_zero_threshold() {
        let sel = FilterSelection::from_query("min_age=0");
        assert_eq!(sel.min_age, Some(0));
        assert!(!sel.is_unrestricted());
    }

    #[test]
    fn matches_applies_both_constraints() {
        let sel = FilterSelection::new(["F"], Some(30));
        assert!(!sel.matches(&CustomerRecord::new("F", 25, 1.0, 1.0)));
        assert!(!sel.matches(&CustomerRecord::new("M", 35, 1.0, 1.0)));
        assert!(sel.matches(&CustomerRecord::new("F", 30, 1.0, 1.0)));
    }

    #[test]
    fn filter_borrows_without_copying() {
        let ds = sample();
        let view = filter(&ds, &FilterSelection::new(["M"], None));
        assert_eq!(view.len(), 1);
        assert!(std::ptr::eq(view.records()[0], &ds.records()[1]));
    }

    #[test]
    fn view_genders_follow_view_order() {
        let ds = sample();
        let view = filter(&ds, &FilterSelection::new(Vec::<String>::new(), Some(30)));
        assert_eq!(view.genders(), vec!["M", "F"]);
    }
}

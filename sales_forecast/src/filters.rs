//! Multi-select filtering of sales records
//!
//! Within one dimension the selected values are alternatives (OR); across
//! dimensions, the date range and the day type every constraint must hold
//! (AND). An empty selection leaves that dimension unconstrained.

use crate::data::{Dimension, SalesData, SalesRecord};
use crate::error::{ForecastError, Result};
use crate::utils::{parse_iso_date, DayType};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Filter selection for sales records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesFilter {
    selections: BTreeMap<Dimension, BTreeSet<String>>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    day_type: Option<DayType>,
}

impl SalesFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one accepted value for a dimension
    pub fn select(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.selections
            .entry(dimension)
            .or_default()
            .insert(value.into());
        self
    }

    /// Restrict to an inclusive date range; either bound may be open
    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ForecastError::InvalidParameter(format!(
                    "Start date {} is after end date {}",
                    s, e
                )));
            }
        }
        self.start = start;
        self.end = end;
        Ok(self)
    }

    pub fn only(mut self, day_type: DayType) -> Self {
        self.day_type = Some(day_type);
        self
    }

    /// Build from query-string style `(key, value)` pairs.
    ///
    /// Dimension keys repeat once per selected value, the way a multi-select
    /// form submits them. Empty values and unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::new();
        let mut start = None;
        let mut end = None;

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "start" => start = Some(parse_iso_date(value)?),
                "end" => end = Some(parse_iso_date(value)?),
                "day_type" => {
                    if value != "all" {
                        filter.day_type = Some(DayType::parse(value)?);
                    }
                }
                other => {
                    if let Some(dimension) = Dimension::from_query_key(other) {
                        filter = filter.select(dimension, value);
                    }
                }
            }
        }

        filter.between(start, end)
    }

    /// Accepted values for a dimension (empty = all)
    pub fn selected(&self, dimension: Dimension) -> Vec<&str> {
        self.selections
            .get(&dimension)
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_selected(&self, dimension: Dimension, value: &str) -> bool {
        self.selections
            .get(&dimension)
            .map_or(false, |values| values.contains(value))
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn day_type(&self) -> Option<DayType> {
        self.day_type
    }

    /// True when no constraint is set
    pub fn is_empty(&self) -> bool {
        self.selections.values().all(BTreeSet::is_empty)
            && self.start.is_none()
            && self.end.is_none()
            && self.day_type.is_none()
    }

    /// Whether one record passes every constraint
    pub fn matches(&self, record: &SalesRecord) -> bool {
        if self.start.map_or(false, |s| record.ds < s) {
            return false;
        }
        if self.end.map_or(false, |e| record.ds > e) {
            return false;
        }
        if self.day_type.map_or(false, |t| record.day_type() != t) {
            return false;
        }

        self.selections.iter().all(|(dimension, accepted)| {
            accepted.is_empty()
                || record
                    .dimension(*dimension)
                    .map_or(false, |value| accepted.contains(value))
        })
    }

    /// Keep only matching records
    pub fn apply(&self, data: &SalesData) -> SalesData {
        if self.is_empty() {
            return data.clone();
        }
        let filtered = data.retain(|record| self.matches(record));
        tracing::debug!(
            before = data.len(),
            after = filtered.len(),
            "applied sales filter"
        );
        filtered
    }

    /// Query string reproducing this filter
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (dimension, values) in &self.selections {
            for value in values {
                pairs.push((dimension.query_key().to_string(), value.clone()));
            }
        }
        if let Some(start) = self.start {
            pairs.push(("start".to_string(), start.to_string()));
        }
        if let Some(end) = self.end {
            pairs.push(("end".to_string(), end.to_string()));
        }
        if let Some(day_type) = self.day_type {
            pairs.push(("day_type".to_string(), day_type.as_str().to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, d).unwrap()
    }

    fn data() -> SalesData {
        SalesData::from_records(vec![
            // Mon
            SalesRecord::new(date(1, 2), 10.0)
                .with_dimension(Dimension::ProductLine, "Motorcycles")
                .with_dimension(Dimension::Country, "USA"),
            // Tue
            SalesRecord::new(date(1, 3), 20.0)
                .with_dimension(Dimension::ProductLine, "Classic Cars")
                .with_dimension(Dimension::Country, "France"),
            // Sat
            SalesRecord::new(date(1, 7), 30.0)
                .with_dimension(Dimension::ProductLine, "Motorcycles")
                .with_dimension(Dimension::Country, "France"),
            // no product line
            SalesRecord::new(date(1, 9), 40.0).with_dimension(Dimension::Country, "USA"),
        ])
    }

    fn totals(data: &SalesData) -> Vec<f64> {
        data.records().iter().map(|r| r.y).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = SalesFilter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&data()).len(), 4);
    }

    #[test]
    fn test_values_within_dimension_are_unioned() {
        let filter = SalesFilter::new()
            .select(Dimension::Country, "USA")
            .select(Dimension::Country, "France");
        assert_eq!(totals(&filter.apply(&data())), vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_dimensions_are_intersected() {
        let filter = SalesFilter::new()
            .select(Dimension::ProductLine, "Motorcycles")
            .select(Dimension::Country, "France");
        assert_eq!(totals(&filter.apply(&data())), vec![30.0]);
    }

    #[test]
    fn test_missing_dimension_does_not_match() {
        let filter = SalesFilter::new().select(Dimension::ProductLine, "Motorcycles");
        assert_eq!(totals(&filter.apply(&data())), vec![10.0, 30.0]);
    }

    #[test]
    fn test_date_range_and_day_type() {
        let filter = SalesFilter::new()
            .between(Some(date(1, 3)), Some(date(1, 7)))
            .unwrap();
        assert_eq!(totals(&filter.apply(&data())), vec![20.0, 30.0]);

        let weekend = SalesFilter::new().only(DayType::Weekend);
        assert_eq!(totals(&weekend.apply(&data())), vec![30.0]);

        assert!(SalesFilter::new()
            .between(Some(date(2, 1)), Some(date(1, 1)))
            .is_err());
    }

    #[test]
    fn test_from_pairs() {
        let pairs = vec![
            ("product_line", "Motorcycles"),
            ("product_line", "Classic Cars"),
            ("country", "USA"),
            ("country", ""),
            ("start", "2023-01-01"),
            ("day_type", "weekday"),
            ("page", "2"),
        ];
        let filter = SalesFilter::from_pairs(pairs).unwrap();

        assert_eq!(
            filter.selected(Dimension::ProductLine),
            vec!["Classic Cars", "Motorcycles"]
        );
        assert_eq!(filter.selected(Dimension::Country), vec!["USA"]);
        assert_eq!(filter.start(), Some(date(1, 1)));
        assert_eq!(filter.day_type(), Some(DayType::Weekday));
        assert_eq!(totals(&filter.apply(&data())), vec![10.0]);

        let roundtrip = SalesFilter::from_pairs(filter.to_query_pairs()).unwrap();
        assert_eq!(roundtrip, filter);
    }

    #[test]
    fn test_values_with_commas_stay_whole() {
        let filter = SalesFilter::new().select(Dimension::ProductLine, "Trucks, Buses");
        let roundtrip = SalesFilter::from_pairs(filter.to_query_pairs()).unwrap();

        assert_eq!(roundtrip.selected(Dimension::ProductLine), vec!["Trucks, Buses"]);
        assert_eq!(roundtrip, filter);

        let record = SalesRecord::new(date(1, 2), 5.0)
            .with_dimension(Dimension::ProductLine, "Trucks, Buses");
        assert_eq!(roundtrip.apply(&SalesData::from_records(vec![record])).len(), 1);
    }

    #[test]
    fn test_from_pairs_rejects_bad_dates() {
        let result = SalesFilter::from_pairs(vec![("start", "24/02/2003")]);
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }
}

//! In-memory survey data: items, deduplicated ratings and category index.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};

/// Identifier of a tasting sample.
///
/// Integer codes sort numerically and before any non-integer code; the rest
/// sort lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemCode(String);

impl ItemCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    /// Builds a code from a spreadsheet number, dropping a zero fraction.
    pub fn from_number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Self((value as i64).to_string())
        } else {
            Self(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_integer(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for ItemCode {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ItemCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tasting sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub code: ItemCode,
    pub name: String,
    /// Only used to join the translation table.
    pub letter_code: Option<String>,
    pub category: String,
}

impl Item {
    /// Display label, `"<name> (<code>)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

/// One tester's evaluation of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub tester: String,
    pub item: ItemCode,
    pub timestamp: Option<NaiveDateTime>,
    /// One entry per property, in schema order. `None` is a blank cell.
    pub properties: Vec<Option<f64>>,
    pub score: Option<f64>,
}

/// A scored column of the ratings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Property(usize),
    Score,
}

impl Rating {
    pub fn value(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Property(idx) => self.properties.get(idx).copied().flatten(),
            Variable::Score => self.score,
        }
    }

    /// Whether `self` replaces `earlier` for the same (tester, item).
    /// Ties, and pairs where either timestamp is missing, go to the rating
    /// read later.
    fn supersedes(&self, earlier: &Rating) -> bool {
        match (self.timestamp, earlier.timestamp) {
            (Some(this), Some(that)) => this >= that,
            _ => true,
        }
    }
}

/// Items and ratings of one survey, indexed for aggregation.
#[derive(Debug, Clone)]
pub struct Dataset {
    property_names: Vec<String>,
    score_name: String,
    items: BTreeMap<ItemCode, Item>,
    categories: Vec<String>,
    ratings: BTreeMap<(String, ItemCode), Rating>,
}

impl Dataset {
    /// Indexes items by code and ratings by (tester, item), keeping only the
    /// most recent rating per pair.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::DuplicateItem`] if two items share a code.
    pub fn new(
        property_names: Vec<String>,
        score_name: impl Into<String>,
        items: Vec<Item>,
        ratings: Vec<Rating>,
    ) -> Result<Self> {
        let mut item_index = BTreeMap::new();
        for item in items {
            if item_index.contains_key(&item.code) {
                return Err(AnalysisError::DuplicateItem(item.code.to_string()));
            }
            item_index.insert(item.code.clone(), item);
        }

        let mut rating_index: BTreeMap<(String, ItemCode), Rating> = BTreeMap::new();
        let mut replaced = 0usize;
        for rating in ratings {
            let key = (rating.tester.clone(), rating.item.clone());
            match rating_index.get(&key) {
                Some(existing) if !rating.supersedes(existing) => replaced += 1,
                Some(_) => {
                    replaced += 1;
                    rating_index.insert(key, rating);
                }
                None => {
                    rating_index.insert(key, rating);
                }
            }
        }
        if replaced > 0 {
            debug!(replaced, "Dropped superseded duplicate ratings");
        }

        let unknown = rating_index
            .keys()
            .filter(|(_, code)| !item_index.contains_key(code))
            .count();
        if unknown > 0 {
            warn!(unknown, "Ratings reference items missing from the item table");
        }

        let categories = categories_of(&item_index);

        Ok(Self {
            property_names,
            score_name: score_name.into(),
            items: item_index,
            categories,
            ratings: rating_index,
        })
    }

    pub fn property_names(&self) -> &[String] {
        &self.property_names
    }

    pub fn score_name(&self) -> &str {
        &self.score_name
    }

    /// Categories in order of first appearance among code-sorted items.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn item(&self, code: &ItemCode) -> Option<&Item> {
        self.items.get(code)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Items of `category`, ascending by code.
    pub fn items_in_category(&self, category: &str) -> Result<Vec<&Item>> {
        if !self.categories.iter().any(|c| c == category) {
            return Err(AnalysisError::UnknownCategory(category.to_string()));
        }
        Ok(self
            .items
            .values()
            .filter(|item| item.category == category)
            .collect())
    }

    /// Deduplicated ratings sorted by (tester, item).
    pub fn ratings(&self) -> impl Iterator<Item = &Rating> {
        self.ratings.values()
    }

    pub fn ratings_for<'a>(&'a self, code: &'a ItemCode) -> impl Iterator<Item = &'a Rating> + 'a {
        self.ratings.values().filter(move |r| &r.item == code)
    }

    pub fn rating_count(&self) -> usize {
        self.ratings.len()
    }

    /// Keeps the first `max_testers` testers and the first `max_items` rated
    /// items, both in sorted order.
    pub fn restrict(&self, max_testers: Option<usize>, max_items: Option<usize>) -> Dataset {
        let testers: BTreeSet<&String> = self.ratings.keys().map(|(t, _)| t).collect();
        let rated: BTreeSet<&ItemCode> = self.ratings.keys().map(|(_, c)| c).collect();

        let testers: BTreeSet<&String> = testers
            .into_iter()
            .take(max_testers.unwrap_or(usize::MAX))
            .collect();
        let rated: BTreeSet<&ItemCode> = rated
            .into_iter()
            .take(max_items.unwrap_or(usize::MAX))
            .collect();

        let ratings: BTreeMap<(String, ItemCode), Rating> = self
            .ratings
            .iter()
            .filter(|((tester, code), _)| testers.contains(tester) && rated.contains(code))
            .map(|(key, rating)| (key.clone(), rating.clone()))
            .collect();

        let items: BTreeMap<ItemCode, Item> = match max_items {
            Some(_) => self
                .items
                .iter()
                .filter(|(code, _)| rated.contains(code))
                .map(|(code, item)| (code.clone(), item.clone()))
                .collect(),
            None => self.items.clone(),
        };

        Dataset {
            property_names: self.property_names.clone(),
            score_name: self.score_name.clone(),
            categories: categories_of(&items),
            items,
            ratings,
        }
    }
}

fn categories_of(items: &BTreeMap<ItemCode, Item>) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for item in items.values() {
        if !categories.contains(&item.category) {
            categories.push(item.category.clone());
        }
    }
    categories
}

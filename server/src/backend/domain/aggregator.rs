//! Rule-based totals over tagged line items.
//!
//! An [`Aggregator`] holds named rules; each rule selects a subset of line
//! items and the aggregator sums the amounts of that subset. The `all` key is
//! always present.

use std::collections::BTreeMap;

pub const ALL: &str = "all";
pub const CREDIT_CARD: &str = "credit_card";
pub const EXCLUDING_VENDOR: &str = "excluding_vendor";
pub const EXCLUDING_MORTGAGE: &str = "excluding_mortgage";

/// One amount to be aggregated
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub category: String,
    pub name: String,
    pub amount: f64,
}

impl LineItem {
    pub fn new(category: impl Into<String>, name: impl Into<String>, amount: f64) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            amount,
        }
    }
}

/// Selection predicate for a rule
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Category equals the given tag
    Category(String),
    /// Category differs from the given tag
    ExcludingCategory(String),
    /// Name does not contain the fragment, ignoring case
    ExcludingName(String),
}

impl Rule {
    fn matches(&self, item: &LineItem) -> bool {
        match self {
            Rule::Category(tag) => item.category == *tag,
            Rule::ExcludingCategory(tag) => item.category != *tag,
            Rule::ExcludingName(fragment) => !item
                .name
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    rules: Vec<(String, Rule)>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, key: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((key.into(), rule));
        self
    }

    /// Rules used for the debt summary
    pub fn budget(excluded_vendor: &str) -> Self {
        Self::new()
            .with_rule(CREDIT_CARD, Rule::Category("Credit Card".to_string()))
            .with_rule(EXCLUDING_VENDOR, Rule::ExcludingName(excluded_vendor.to_string()))
            .with_rule(EXCLUDING_MORTGAGE, Rule::ExcludingCategory("Mortgage".to_string()))
    }

    /// Sum the items selected by each rule, plus `all`
    pub fn aggregate(&self, items: &[LineItem]) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        totals.insert(ALL.to_string(), items.iter().map(|item| item.amount).sum());
        for (key, rule) in &self.rules {
            let total = items
                .iter()
                .filter(|item| rule.matches(item))
                .map(|item| item.amount)
                .sum();
            totals.insert(key.clone(), total);
        }
        totals
    }
}

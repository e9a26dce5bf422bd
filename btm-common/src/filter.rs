//! Table filtering, facets and per-subsegment summary
//!
//! Every active criterion must hold for a record to be kept. Empty
//! selections mean "no constraint", matching how a multi-select with
//! nothing picked behaves in the UI.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use crate::classify::Subsegment;
use crate::record::Record;
use crate::Error;

/// Listed-flag filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListedFilter {
    #[default]
    All,
    Listed,
    NotListed,
}

impl ListedFilter {
    fn accepts(self, listed: bool) -> bool {
        match self {
            ListedFilter::All => true,
            ListedFilter::Listed => listed,
            ListedFilter::NotListed => !listed,
        }
    }
}

impl FromStr for ListedFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(ListedFilter::All),
            "listed" => Ok(ListedFilter::Listed),
            "not_listed" | "not listed" | "not-listed" => Ok(ListedFilter::NotListed),
            other => Err(Error::InvalidInput(format!("unknown listed filter: {}", other))),
        }
    }
}

/// User-selected filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Keep only records in tech scope
    pub only_tech: bool,
    pub listed: ListedFilter,
    pub subsegments: Vec<Subsegment>,
    pub ufs: Vec<String>,
    pub statuses: Vec<String>,
    /// Free-text search over legal and fantasy names
    pub search: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            only_tech: true,
            listed: ListedFilter::All,
            subsegments: Vec::new(),
            ufs: Vec::new(),
            statuses: Vec::new(),
            search: String::new(),
        }
    }
}

impl FilterCriteria {
    /// Whether `record` passes every active criterion
    pub fn matches(&self, record: &Record) -> bool {
        if self.only_tech && !record.tech_in_scope {
            return false;
        }
        if !self.listed.accepts(record.listed_br) {
            return false;
        }
        if !self.subsegments.is_empty() && !self.subsegments.contains(&record.subsegment) {
            return false;
        }
        if !self.ufs.is_empty() && !self.ufs.iter().any(|uf| *uf == record.uf) {
            return false;
        }
        if !self.statuses.is_empty()
            && !self.statuses.iter().any(|s| *s == record.situacao_cadastral)
        {
            return false;
        }
        matches_search(record, &self.search)
    }

    /// Records passing every criterion, in input order
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn matches_search(record: &Record, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record.razao_social.to_lowercase().contains(&needle)
        || record.nome_fantasia.to_lowercase().contains(&needle)
}

/// Values offered by the subsegment / UF / status selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub subsegments: Vec<Subsegment>,
    pub ufs: Vec<String>,
    pub statuses: Vec<String>,
}

/// Facet values present in `records`, sorted; blank UF/status are skipped
///
/// Computed after the tech-scope toggle only, so the selectors do not
/// shrink as the user narrows other filters.
pub fn facets(records: &[Record], only_tech: bool) -> Facets {
    let scoped = records.iter().filter(|r| !only_tech || r.tech_in_scope);

    let mut subsegments = BTreeSet::new();
    let mut ufs = BTreeSet::new();
    let mut statuses = BTreeSet::new();
    for record in scoped {
        subsegments.insert(record.subsegment.label());
        if !record.uf.trim().is_empty() {
            ufs.insert(record.uf.clone());
        }
        if !record.situacao_cadastral.trim().is_empty() {
            statuses.insert(record.situacao_cadastral.clone());
        }
    }

    Facets {
        subsegments: subsegments
            .into_iter()
            .filter_map(Subsegment::from_label)
            .collect(),
        ufs: ufs.into_iter().collect(),
        statuses: statuses.into_iter().collect(),
    }
}

/// One row of the per-subsegment summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsegmentCount {
    pub subsegment: Subsegment,
    pub count: usize,
}

/// Count per subsegment, largest first (ties by label)
pub fn summarize(records: &[&Record]) -> Vec<SubsegmentCount> {
    let mut counts: BTreeMap<&'static str, (Subsegment, usize)> = BTreeMap::new();
    for record in records {
        counts
            .entry(record.subsegment.label())
            .or_insert((record.subsegment, 0))
            .1 += 1;
    }

    let mut summary: Vec<SubsegmentCount> = counts
        .into_values()
        .map(|(subsegment, count)| SubsegmentCount { subsegment, count })
        .collect();
    // Stable sort keeps label order among equal counts
    summary.sort_by(|a, b| b.count.cmp(&a.count));
    summary
}

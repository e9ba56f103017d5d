//! Locator strategy variants.

use std::fmt;

use serde::{Deserialize, Serialize};
use surestep_driver::Selector;
use surestep_gate::MatchMode;

/// How a table row is picked: the row whose `column` cell matches `value`
/// under `mode` wins; scanning is in document order and the first match is
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMatch {
    pub column: Selector,
    pub value: String,
    pub mode: MatchMode,
}

impl RowMatch {
    pub fn equals(column: impl Into<Selector>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            mode: MatchMode::Equals,
        }
    }

    pub fn contains(column: impl Into<Selector>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            mode: MatchMode::Contains,
        }
    }
}

/// How locators combine into a target set.
///
/// One enum instead of parallel per-shape verb hierarchies: every verb takes
/// a strategy, and the resolver is the only place that knows how to walk one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorStrategy {
    /// Find elements directly
    Flat(Selector),

    /// Find `child` within the subtree of the first visible `parent`
    Nested { parent: Selector, child: Selector },

    /// Find the Nth match of `list`
    Indexed { list: Selector, index: usize },

    /// Find `child` within the Nth match of `list`
    NestedIndexed {
        list: Selector,
        index: usize,
        child: Selector,
    },

    /// Find the row whose match-column cell satisfies `row`, then resolve
    /// `target` within that same row
    TableRow {
        rows: Selector,
        row: RowMatch,
        target: Selector,
    },

    /// Scope any of the above to the Nth match of an outer list
    /// (doubly-nested tables)
    ParentList {
        list: Selector,
        index: usize,
        inner: Box<LocatorStrategy>,
    },
}

impl LocatorStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Flat(_) => "flat",
            LocatorStrategy::Nested { .. } => "nested",
            LocatorStrategy::Indexed { .. } => "indexed",
            LocatorStrategy::NestedIndexed { .. } => "nested-indexed",
            LocatorStrategy::TableRow { .. } => "table-row",
            LocatorStrategy::ParentList { .. } => "parent-list",
        }
    }

    /// Wrap this strategy in an outer parent-list scope.
    pub fn within_list(self, list: impl Into<Selector>, index: usize) -> Self {
        LocatorStrategy::ParentList {
            list: list.into(),
            index,
            inner: Box::new(self),
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorStrategy::Flat(sel) => write!(f, "flat {sel}"),
            LocatorStrategy::Nested { parent, child } => {
                write!(f, "nested {parent} > {child}")
            }
            LocatorStrategy::Indexed { list, index } => write!(f, "indexed {list}[{index}]"),
            LocatorStrategy::NestedIndexed { list, index, child } => {
                write!(f, "nested-indexed {list}[{index}] > {child}")
            }
            LocatorStrategy::TableRow { rows, row, target } => write!(
                f,
                "table-row {rows} where {} {} {:?} -> {target}",
                row.column,
                row.mode.name(),
                row.value
            ),
            LocatorStrategy::ParentList { list, index, inner } => {
                write!(f, "parent-list {list}[{index}] :: {inner}")
            }
        }
    }
}

impl From<Selector> for LocatorStrategy {
    fn from(selector: Selector) -> Self {
        LocatorStrategy::Flat(selector)
    }
}

impl From<&str> for LocatorStrategy {
    fn from(expr: &str) -> Self {
        LocatorStrategy::Flat(Selector::from(expr))
    }
}

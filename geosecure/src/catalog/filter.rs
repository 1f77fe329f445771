// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Predicates over catalog objects and listing queries
//!
//! The constructors simplify as they build: `and` with an `Exclude` operand is
//! `Exclude`, `or` with an `Include` operand is `Include`, an empty `in` list
//! is `Exclude` and double negation cancels out.

use super::model::{CatalogInfo, InfoType};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Include,
    Exclude,
    IsNull(String),
    Equals { property: String, value: String },
    In { property: String, values: BTreeSet<String> },
    Not(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn equals(property: &str, value: &str) -> Self {
        Filter::Equals {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_null(property: &str) -> Self {
        Filter::IsNull(property.to_string())
    }

    pub fn not_null(property: &str) -> Self {
        Filter::not(Filter::is_null(property))
    }

    pub fn in_list<I, S>(property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        match values.len() {
            0 => Filter::Exclude,
            1 => {
                let value = values.into_iter().next().unwrap_or_default();
                Filter::Equals {
                    property: property.to_string(),
                    value,
                }
            }
            _ => Filter::In {
                property: property.to_string(),
                values,
            },
        }
    }

    pub fn not(filter: Filter) -> Self {
        match filter {
            Filter::Include => Filter::Exclude,
            Filter::Exclude => Filter::Include,
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        let mut operands = Vec::with_capacity(filters.len());
        for filter in filters {
            match filter {
                Filter::Include => {}
                Filter::Exclude => return Filter::Exclude,
                Filter::And(nested) => operands.extend(nested),
                other => operands.push(other),
            }
        }
        match operands.len() {
            0 => Filter::Include,
            1 => operands.pop().unwrap_or(Filter::Include),
            _ => Filter::And(operands),
        }
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        let mut operands = Vec::with_capacity(filters.len());
        for filter in filters {
            match filter {
                Filter::Exclude => {}
                Filter::Include => return Filter::Include,
                Filter::Or(nested) => operands.extend(nested),
                other => operands.push(other),
            }
        }
        match operands.len() {
            0 => Filter::Exclude,
            1 => operands.pop().unwrap_or(Filter::Exclude),
            _ => Filter::Or(operands),
        }
    }

    pub fn evaluate(&self, info: &CatalogInfo) -> bool {
        match self {
            Filter::Include => true,
            Filter::Exclude => false,
            Filter::IsNull(property) => info.property(property).is_none(),
            Filter::Equals { property, value } => {
                info.property(property).as_deref() == Some(value.as_str())
            }
            Filter::In { property, values } => info
                .property(property)
                .map(|v| values.contains(&v))
                .unwrap_or(false),
            Filter::Not(inner) => !inner.evaluate(info),
            Filter::And(filters) => filters.iter().all(|f| f.evaluate(info)),
            Filter::Or(filters) => filters.iter().any(|f| f.evaluate(info)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, filters: &[Filter], op: &str| -> fmt::Result {
            write!(f, "(")?;
            for (i, filter) in filters.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", filter)?;
            }
            write!(f, ")")
        };
        match self {
            Filter::Include => write!(f, "INCLUDE"),
            Filter::Exclude => write!(f, "EXCLUDE"),
            Filter::IsNull(property) => write!(f, "{} IS NULL", property),
            Filter::Equals { property, value } => write!(f, "{} = '{}'", property, value),
            Filter::In { property, values } => {
                let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                write!(f, "{} IN ({})", property, quoted.join(", "))
            }
            Filter::Not(inner) => write!(f, "NOT {}", inner),
            Filter::And(filters) => join(f, filters, "AND"),
            Filter::Or(filters) => join(f, filters, "OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    pub property: String,
    pub ascending: bool,
}

impl SortBy {
    pub fn asc(property: &str) -> Self {
        Self {
            property: property.to_string(),
            ascending: true,
        }
    }

    pub fn desc(property: &str) -> Self {
        Self {
            property: property.to_string(),
            ascending: false,
        }
    }

    /// Nulls sort first in ascending order
    pub fn compare(&self, a: &CatalogInfo, b: &CatalogInfo) -> Ordering {
        let ordering = a.property(&self.property).cmp(&b.property(&self.property));
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// A listing request: object type, predicate, paging and sorting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub info_type: InfoType,
    pub filter: Filter,
    pub offset: Option<usize>,
    pub count: Option<usize>,
    pub sort_by: Vec<SortBy>,
}

impl Query {
    pub fn all(info_type: InfoType) -> Self {
        Self {
            info_type,
            filter: Filter::Include,
            offset: None,
            count: None,
            sort_by: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn sorted_by(mut self, sort: SortBy) -> Self {
        self.sort_by.push(sort);
        self
    }

    pub fn is_paged(&self) -> bool {
        self.offset.is_some() || self.count.is_some()
    }
}

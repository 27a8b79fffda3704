//! Row filters for the table API.
//!
//! A [`Query`] is a column list plus a conjunction of [`Filter`]s. It encodes
//! to PostgREST query parameters for the hosted backend and can also be
//! evaluated directly against JSON rows for the in-memory backend, so both
//! implementations share one definition of "matches".

use serde_json::Value;

/// A single row predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq(String, String),
    /// `column IN (values)`. An empty list matches nothing.
    In(String, Vec<String>),
    /// Case-insensitive `LIKE`: `%` matches any run, `_` one character.
    ILike(String, String),
    /// Any of the nested filters.
    Or(Vec<Filter>),
}

impl Filter {
    /// Evaluate against a JSON row. Missing columns never match.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Self::Eq(column, value) => column_text(row, column).is_some_and(|v| v == *value),
            Self::In(column, values) => column_text(row, column).is_some_and(|v| values.contains(&v)),
            Self::ILike(column, pattern) => column_text(row, column).is_some_and(|v| ilike(&v, pattern)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }

    /// Encode as the `column.op.value` form used inside `or=(...)`.
    fn nested(&self) -> String {
        match self {
            Self::Eq(column, value) => format!("{column}.eq.{}", quote(value)),
            Self::In(column, values) => format!("{column}.in.{}", in_list(values)),
            Self::ILike(column, pattern) => format!("{column}.ilike.{}", quote(pattern)),
            Self::Or(filters) => format!("or({})", or_list(filters)),
        }
    }

    /// Encode as a top-level `(key, value)` query parameter.
    fn param(&self) -> (String, String) {
        match self {
            Self::Eq(column, value) => (column.clone(), format!("eq.{value}")),
            Self::In(column, values) => (column.clone(), format!("in.{}", in_list(values))),
            Self::ILike(column, pattern) => (column.clone(), format!("ilike.{pattern}")),
            Self::Or(filters) => ("or".to_owned(), format!("({})", or_list(filters))),
        }
    }
}

/// Column selection plus filters, all of which must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    columns: String,
    filters: Vec<Filter>,
}

impl Query {
    /// Select `columns` (`"*"` for all) with no filters.
    #[must_use]
    pub fn new(columns: &str) -> Self {
        Self { columns: columns.to_owned(), filters: Vec::new() }
    }

    /// Shorthand for `Query::new("*")`.
    #[must_use]
    pub fn all() -> Self {
        Self::new("*")
    }

    #[must_use]
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push(Filter::Eq(column.to_owned(), value.to_string()));
        self
    }

    #[must_use]
    pub fn is_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.filters.push(Filter::In(column.to_owned(), values));
        self
    }

    /// Case-insensitive `LIKE`; `%` and `_` are wildcards.
    #[must_use]
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters
            .push(Filter::ILike(column.to_owned(), pattern.to_owned()));
        self
    }

    /// Add one group that holds when any filter built by `group` holds.
    ///
    /// ```ignore
    /// Query::all().or(|any| any.ilike("name", "%ann%").ilike("email", "%ann%"))
    /// ```
    #[must_use]
    pub fn or(mut self, group: impl FnOnce(Query) -> Query) -> Self {
        let branches = group(Query::new("")).filters;
        self.filters.push(Filter::Or(branches));
        self
    }

    /// True when every filter holds for `row`.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Project `row` onto the selected columns (`*` keeps everything).
    #[must_use]
    pub fn project(&self, row: &Value) -> Value {
        if self.columns.trim() == "*" {
            return row.clone();
        }
        let Some(obj) = row.as_object() else {
            return row.clone();
        };
        let projected = self
            .columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .filter_map(|c| obj.get(c).map(|v| (c.to_owned(), v.clone())))
            .collect();
        Value::Object(projected)
    }

    /// PostgREST query parameters, `select` first.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 1);
        params.push(("select".to_owned(), self.columns.clone()));
        params.extend(self.filters.iter().map(Filter::param));
        params
    }

    /// Filter parameters only; DELETE requests carry no `select`.
    #[must_use]
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Filter::param).collect()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

const RESERVED: &[char] = &[',', '.', ':', '(', ')', '"', '\\', ' '];

/// Double-quote a list element when it contains a PostgREST delimiter.
fn quote(value: &str) -> String {
    if value.is_empty() || value.contains(RESERVED) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_owned()
    }
}

fn in_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("({})", items.join(","))
}

fn or_list(filters: &[Filter]) -> String {
    let items: Vec<String> = filters.iter().map(Filter::nested).collect();
    items.join(",")
}

// =============================================================================
// EVALUATION
// =============================================================================

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Case-insensitive SQL `LIKE` over characters.
pub(crate) fn ilike(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();

    // matched[j]: pattern[..i] matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;
    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= matched[j];
                    next[j] = seen;
                }
            }
            '_' => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1];
                }
            }
            c => {
                for j in 1..=text.len() {
                    next[j] = matched[j - 1] && text[j - 1] == *c;
                }
            }
        }
        matched = next;
    }
    matched[text.len()]
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;

//! Query builder state for Clusterpoint collections
//!
//! Fragments accumulate on a collection handle and are assembled into a
//! single `SELECT ... FROM ... LIMIT ...` statement when a read is issued.

use serde_json::Value;
use std::fmt;

use crate::escape::escape;

/// Limit applied when the caller never sets one.
pub const DEFAULT_LIMIT: u64 = 20;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDir::Asc => write!(f, "ASC"),
            SortDir::Desc => write!(f, "DESC"),
        }
    }
}

/// Connective placed between accumulated predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logical {
    #[default]
    And,
    Or,
}

impl fmt::Display for Logical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logical::And => write!(f, "&&"),
            Logical::Or => write!(f, "||"),
        }
    }
}

/// What goes between `SELECT` and `FROM`.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Used verbatim.
    Raw(String),
    /// Field names joined with `, `.
    Fields(Vec<String>),
    /// `field AS alias` pairs, in insertion order.
    Aliases(Vec<(String, String)>),
}

impl Projection {
    fn render(&self) -> String {
        match self {
            Projection::Raw(raw) => raw.clone(),
            Projection::Fields(fields) => fields.join(", "),
            Projection::Aliases(pairs) => pairs
                .iter()
                .map(|(field, alias)| format!("{} AS {}", field, alias))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<&str> for Projection {
    fn from(raw: &str) -> Self {
        Projection::Raw(raw.to_string())
    }
}

impl From<String> for Projection {
    fn from(raw: String) -> Self {
        Projection::Raw(raw)
    }
}

impl From<Vec<String>> for Projection {
    fn from(fields: Vec<String>) -> Self {
        Projection::Fields(fields)
    }
}

impl From<Vec<&str>> for Projection {
    fn from(fields: Vec<&str>) -> Self {
        Projection::Fields(fields.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Projection {
    fn from(fields: [&str; N]) -> Self {
        Projection::Fields(fields.iter().map(|f| f.to_string()).collect())
    }
}

impl From<Vec<(&str, &str)>> for Projection {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        Projection::Aliases(
            pairs
                .into_iter()
                .map(|(field, alias)| (field.to_string(), alias.to_string()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Projection {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Projection::from(pairs.to_vec())
    }
}

/// One predicate added through the `where_*` family.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Boolean expression used verbatim, nothing escaped.
    Raw(String),
    /// `field == <literal>`
    Eq(String, Value),
    /// `field <op> <literal>`
    Cmp(String, String, Value),
}

impl Condition {
    fn render(&self) -> String {
        match self {
            Condition::Raw(expr) => expr.clone(),
            Condition::Eq(field, value) => format!("{} == {}", field, escape(value)),
            Condition::Cmp(field, op, value) => format!("{} {} {}", field, op, escape(value)),
        }
    }
}

/// How the collection name is wrapped in the `FROM` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Collection,
    /// `LIST_WORDS(<collection>)`, filtered by a `word` predicate.
    ListWords,
    /// `ALTERNATIVES(<collection>)`, filtered by a `word` predicate.
    Alternatives,
}

impl Target {
    fn render(&self, name: &str) -> String {
        match self {
            Target::Collection => name.to_string(),
            Target::ListWords => format!("LIST_WORDS({})", name),
            Target::Alternatives => format!("ALTERNATIVES({})", name),
        }
    }
}

/// Accumulated fragments of the query being built on a collection handle.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPieces {
    prepend: String,
    select: String,
    predicate: String,
    group_by: Vec<String>,
    order_by: Vec<String>,
    offset: u64,
    limit: u64,
    target: Target,
}

impl Default for QueryPieces {
    fn default() -> Self {
        Self {
            prepend: String::new(),
            select: " * ".to_string(),
            predicate: String::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            target: Target::Collection,
        }
    }
}

/// Accept non-negative integers and numeric strings; anything else is `None`.
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

impl QueryPieces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the projection. Last call wins.
    pub fn select(&mut self, projection: Projection) {
        self.select = projection.render();
    }

    /// Append a predicate, joined to any existing one with `logical`.
    pub fn push_condition(&mut self, condition: Condition, logical: Logical) {
        if !self.predicate.is_empty() {
            self.predicate.push_str(&format!(" {} ", logical));
        }
        self.predicate.push_str(&condition.render());
    }

    pub fn order_by(&mut self, field: &str, direction: SortDir) {
        self.order_by.push(format!("{} {}", field, direction));
    }

    pub fn group_by(&mut self, field: &str) {
        self.group_by.push(field.to_string());
    }

    /// Set the limit. Zero and non-numeric input leave the current value.
    pub fn set_limit(&mut self, value: &Value) {
        if let Some(limit) = as_count(value).filter(|n| *n > 0) {
            self.limit = limit;
        }
    }

    /// Set the offset. Non-numeric input leaves the current value.
    pub fn set_offset(&mut self, value: &Value) {
        if let Some(offset) = as_count(value) {
            self.offset = offset;
        }
    }

    pub fn prepend(&mut self, text: &str) {
        self.prepend.push_str(text);
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = target;
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// Assemble the statement against the named collection.
    pub fn compile(&self, collection: &str) -> String {
        let mut query = String::new();

        if !self.prepend.is_empty() {
            query.push_str(&self.prepend);
            query.push(' ');
        }

        query.push_str("SELECT ");
        query.push_str(self.select.trim());
        query.push_str(" FROM ");
        query.push_str(&self.target.render(collection));

        if !self.predicate.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.predicate);
        }

        if !self.group_by.is_empty() {
            query.push_str(" GROUP BY ");
            query.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            query.push_str(" ORDER BY ");
            query.push_str(&self.order_by.join(", "));
        }

        query.push_str(" LIMIT ");
        if self.offset > 0 {
            query.push_str(&format!("{}, ", self.offset));
        }
        query.push_str(&self.limit.to_string());

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_query() {
        let query = QueryPieces::new().compile("books");
        assert_eq!(query, "SELECT * FROM books LIMIT 20");
    }

    #[test]
    fn test_select_variants() {
        let mut pieces = QueryPieces::new();
        pieces.select(Projection::from(["name", "_id"]));
        assert_eq!(pieces.compile("books"), "SELECT name, _id FROM books LIMIT 20");

        pieces.select(Projection::from([("name", "authorName"), ("_id", "id")]));
        assert_eq!(
            pieces.compile("books"),
            "SELECT name AS authorName, _id AS id FROM books LIMIT 20"
        );

        pieces.select(Projection::from("  COUNT(*)  "));
        assert_eq!(pieces.compile("books"), "SELECT COUNT(*) FROM books LIMIT 20");
    }

    #[test]
    fn test_conditions_join_in_call_order() {
        let mut pieces = QueryPieces::new();
        pieces.push_condition(Condition::Cmp("price".into(), ">=".into(), json!("1")), Logical::And);
        pieces.push_condition(Condition::Eq("title".into(), json!("Book 1")), Logical::Or);
        pieces.push_condition(Condition::Raw("color == 'red'".into()), Logical::And);
        assert_eq!(
            pieces.compile("books"),
            r#"SELECT * FROM books WHERE price >= "1" || title == "Book 1" && color == 'red' LIMIT 20"#
        );
    }

    #[test]
    fn test_full_query() {
        let mut pieces = QueryPieces::new();
        pieces.prepend("PRAGMA x");
        pieces.select(Projection::from(["color", "price"]));
        pieces.push_condition(Condition::Eq("color".into(), json!("red")), Logical::And);
        pieces.group_by("category");
        pieces.order_by("price", SortDir::Asc);
        pieces.order_by("color", SortDir::Desc);
        pieces.set_offset(&json!(10));
        pieces.set_limit(&json!(5));
        assert_eq!(
            pieces.compile("books"),
            r#"PRAGMA x SELECT color, price FROM books WHERE color == "red" GROUP BY category ORDER BY price ASC, color DESC LIMIT 10, 5"#
        );
    }

    #[test]
    fn test_group_by_without_order_by() {
        let mut pieces = QueryPieces::new();
        pieces.group_by("category");
        pieces.group_by("color");
        assert_eq!(
            pieces.compile("books"),
            "SELECT * FROM books GROUP BY category, color LIMIT 20"
        );
    }

    #[test]
    fn test_non_numeric_limit_is_ignored() {
        let mut pieces = QueryPieces::new();
        pieces.set_limit(&json!(7));
        pieces.set_limit(&json!("abc"));
        pieces.set_limit(&json!(null));
        pieces.set_limit(&json!(2.5));
        pieces.set_limit(&json!(0));
        assert_eq!(pieces.limit(), 7);

        pieces.set_offset(&json!("3"));
        pieces.set_offset(&json!(-1));
        assert_eq!(pieces.offset(), 3);
    }

    #[test]
    fn test_list_words_target() {
        let mut pieces = QueryPieces::new();
        pieces.set_target(Target::ListWords);
        pieces.push_condition(Condition::Eq("word".into(), json!("lor*")), Logical::And);
        assert_eq!(
            pieces.compile("books"),
            r#"SELECT * FROM LIST_WORDS(books) WHERE word == "lor*" LIMIT 20"#
        );

        pieces.set_target(Target::Alternatives);
        assert!(pieces.compile("books").contains("FROM ALTERNATIVES(books)"));
    }
}

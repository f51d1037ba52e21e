use std::collections::HashSet;
use std::fmt;

use crate::analysis::FieldAnalyzers;

#[derive(Debug, Clone, PartialEq)]
pub struct TermClause {
    pub field: String,
    pub term: String,
    /// Non-negative multiplier on the clause's raw score.
    pub boost: f32,
}

/// Boolean query tree. Leaves are term clauses; there is no negation.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Term(TermClause),
    /// Matches when any child matches; scores the sum of matching children.
    Or(Vec<QueryNode>),
    /// Matches when every child matches; scores the sum of all children.
    And(Vec<QueryNode>),
    Boost { query: Box<QueryNode>, boost: f32 },
}

impl QueryNode {
    pub fn term(field: &str, term: &str) -> Self {
        QueryNode::Term(TermClause { field: field.to_string(), term: term.to_string(), boost: 1.0 })
    }

    pub fn boosted(self, boost: f32) -> Self {
        QueryNode::Boost { query: Box::new(self), boost }
    }

    /// True when the tree has no term leaves and therefore cannot match anything.
    pub fn is_empty(&self) -> bool {
        match self {
            QueryNode::Term(_) => false,
            QueryNode::Or(children) | QueryNode::And(children) => children.iter().all(QueryNode::is_empty),
            QueryNode::Boost { query, .. } => query.is_empty(),
        }
    }

    /// Term leaves in tree order.
    pub fn clauses(&self) -> Vec<&TermClause> {
        let mut out = Vec::new();
        self.collect_clauses(&mut out);
        out
    }

    fn collect_clauses<'a>(&'a self, out: &mut Vec<&'a TermClause>) {
        match self {
            QueryNode::Term(clause) => out.push(clause),
            QueryNode::Or(children) | QueryNode::And(children) => {
                for child in children {
                    child.collect_clauses(out);
                }
            }
            QueryNode::Boost { query, .. } => query.collect_clauses(out),
        }
    }

    /// Distinct terms of the tree, regardless of field.
    pub fn term_set(&self) -> HashSet<&str> {
        self.clauses().into_iter().map(|c| c.term.as_str()).collect()
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[QueryNode], sep: &str) -> fmt::Result {
            f.write_str("(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        }
        match self {
            QueryNode::Term(c) if c.boost == 1.0 => write!(f, "{}:{}", c.field, c.term),
            QueryNode::Term(c) => write!(f, "{}:{}^{}", c.field, c.term, c.boost),
            QueryNode::Or(children) => join(f, children, " "),
            QueryNode::And(children) => join(f, children, " +"),
            QueryNode::Boost { query, boost } => write!(f, "{query}^{boost}"),
        }
    }
}

/// Analyze `raw` with `field`'s analyzer and OR together one clause per resulting term.
///
/// Repeated terms yield repeated clauses. Text with no analyzable terms gives an empty `Or`.
pub fn parse(analyzers: &FieldAnalyzers, raw: &str, field: &str) -> QueryNode {
    let clauses = analyzers
        .tokenize(field, raw)
        .into_iter()
        .map(|(term, _)| QueryNode::term(field, &term))
        .collect();
    QueryNode::Or(clauses)
}

/// Parse `raw` once per field and OR the boosted per-field trees. Fields with no terms are left out.
pub fn parse_fields(analyzers: &FieldAnalyzers, raw: &str, fields: &[(&str, f32)]) -> QueryNode {
    let parts = fields
        .iter()
        .map(|&(field, boost)| parse(analyzers, raw, field).boosted(boost))
        .filter(|q| !q.is_empty())
        .collect();
    QueryNode::Or(parts)
}

/// A query of a batch: its id, raw text and parsed tree.
#[derive(Debug, Clone)]
pub struct Query {
    pub id: u32,
    pub raw_text: String,
    pub tree: QueryNode,
}

impl Query {
    pub fn new(id: u32, raw_text: impl Into<String>, tree: QueryNode) -> Self {
        Self { id, raw_text: raw_text.into(), tree }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;

    #[test]
    fn parse_ors_every_term() {
        let fa = FieldAnalyzers::new(Analyzer::standard());
        let q = parse(&fa, "Wing, lift; wing", "content");
        assert_eq!(
            q,
            QueryNode::Or(vec![
                QueryNode::term("content", "wing"),
                QueryNode::term("content", "lift"),
                QueryNode::term("content", "wing"),
            ])
        );
        assert_eq!(q.to_string(), "(content:wing content:lift content:wing)");
    }

    #[test]
    fn punctuation_only_query_is_empty() {
        let fa = FieldAnalyzers::default();
        assert!(parse(&fa, "???", "content").is_empty());
        assert!(parse(&fa, "", "content").is_empty());
    }

    #[test]
    fn parse_fields_drops_empty_parts() {
        let fa = FieldAnalyzers::new(Analyzer::standard()).with_field("title", Analyzer::ngram(3, 5).unwrap());
        let q = parse_fields(&fa, "ab", &[("title", 2.0), ("content", 1.0)]);
        match q {
            QueryNode::Or(parts) => {
                assert_eq!(parts.len(), 1);
                assert_eq!(parts[0], QueryNode::Or(vec![QueryNode::term("content", "ab")]).boosted(1.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn term_set_spans_nested_nodes() {
        let q = QueryNode::Or(vec![
            QueryNode::Or(vec![QueryNode::term("content", "flow")]).boosted(2.0),
            QueryNode::term("title", "plate"),
        ]);
        let set = q.term_set();
        assert!(set.contains("flow") && set.contains("plate"));
        assert_eq!(q.clauses().len(), 2);
    }
}

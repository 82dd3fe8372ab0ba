//! Building blocks for predicates assembled outside the query language,
//! typically by a scripting hook. Each constructor yields a
//! [`ScriptPredicate`] that compiles through the same lowering as parsed
//! queries.
//!
//! ```
//! use taskql_sql::predicate::{and, has_tag, not, title_matches};
//!
//! let predicate = and([title_matches("invoice"), not(has_tag("paid"))]);
//! # let _ = predicate;
//! ```

use crate::{Clause, CompileContext, CompileError};
use taskql_syntax::{BoolExpr, Expr, Priority, SimpleExpr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPredicate(pub Expr);

impl ScriptPredicate {
    pub fn into_expr(self) -> Expr {
        self.0
    }
}

impl Clause for ScriptPredicate {
    fn to_clause(
        &self,
        ctx: &CompileContext<'_>,
        negate: bool,
        depth: usize,
    ) -> Result<Option<String>, CompileError> {
        self.0.to_clause(ctx, negate, depth)
    }

    fn constrains_priority(&self) -> bool {
        self.0.constrains_priority()
    }
}

fn simple(expr: SimpleExpr) -> ScriptPredicate {
    ScriptPredicate(expr.into())
}

pub fn id_equals(id: i64) -> ScriptPredicate {
    simple(SimpleExpr::compare(":id", "=", id.to_string()))
}

/// Full-text match on the title.
pub fn title_matches(query: impl Into<String>) -> ScriptPredicate {
    simple(SimpleExpr::compare(":title_field", "match", query))
}

/// Full-text match on the body.
pub fn text_matches(query: impl Into<String>) -> ScriptPredicate {
    simple(SimpleExpr::compare(":text_field", "match", query))
}

/// Full-text match on title or body, like free text in a query.
pub fn search(query: impl Into<String>) -> ScriptPredicate {
    simple(SimpleExpr::compare(":search", "match", query))
}

/// `name <op> value` where `name` is a tag or a `:`-prefixed pseudo-field.
pub fn column(
    name: impl Into<String>,
    op: impl Into<String>,
    value: impl Into<String>,
) -> ScriptPredicate {
    simple(SimpleExpr::compare(name, op, value))
}

pub fn has_tag(name: impl Into<String>) -> ScriptPredicate {
    simple(SimpleExpr::tag(name))
}

pub fn priority_is(priority: Priority) -> ScriptPredicate {
    simple(SimpleExpr::priority(priority, priority.value().to_string()))
}

/// Task has a trigger time.
pub fn when_set() -> ScriptPredicate {
    simple(SimpleExpr {
        name: ":when".into(),
        op: "notnull".into(),
        ..SimpleExpr::default()
    })
}

pub fn and(parts: impl IntoIterator<Item = ScriptPredicate>) -> ScriptPredicate {
    ScriptPredicate(BoolExpr::and(parts.into_iter().map(ScriptPredicate::into_expr).collect()).into())
}

pub fn or(parts: impl IntoIterator<Item = ScriptPredicate>) -> ScriptPredicate {
    ScriptPredicate(BoolExpr::or(parts.into_iter().map(ScriptPredicate::into_expr).collect()).into())
}

pub fn not(inner: ScriptPredicate) -> ScriptPredicate {
    ScriptPredicate(Expr::not(inner.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Schema, SqliteQuoter};
    use jiff::Timestamp;
    use taskql_syntax::DateTimeParser;

    fn sql(predicate: ScriptPredicate) -> Result<Option<String>, CompileError> {
        let schema = Schema::default();
        let now: Timestamp = "2026-10-19T10:00:00Z".parse().unwrap();
        let ctx = CompileContext {
            quoter: &SqliteQuoter,
            schema: &schema,
            dates: DateTimeParser::with_now(0, now).unwrap(),
        };
        predicate.to_clause(&ctx, false, 0)
    }

    #[test]
    fn primitives() {
        assert_eq!(sql(id_equals(9)).unwrap().unwrap(), "id = 9");
        assert_eq!(
            sql(title_matches("tax")).unwrap().unwrap(),
            "id IN (SELECT id FROM ridx WHERE title_field MATCH 'tax')"
        );
        assert_eq!(sql(priority_is(Priority::Now)).unwrap().unwrap(), "priority = 1");
        assert_eq!(sql(when_set()).unwrap().unwrap(), "trigger_at_field IS NOT NULL");
        assert_eq!(
            sql(column("owner", "=", "ann")).unwrap().unwrap(),
            "id IN (SELECT id FROM columns WHERE name = 'owner' AND value = 'ann')"
        );
        assert_eq!(
            sql(column(":text_field", "like", "%x")).unwrap().unwrap(),
            "text_field LIKE '%x'"
        );
    }

    #[test]
    fn combinators() {
        let combined = or([id_equals(1), and([has_tag("a"), not(id_equals(2))])]);
        assert_eq!(
            sql(combined).unwrap().unwrap(),
            "id = 1 OR (id IN (SELECT id FROM columns WHERE name = 'a') AND NOT (id = 2))"
        );
        assert_eq!(sql(and(Vec::<ScriptPredicate>::new())).unwrap(), None);
    }

    #[test]
    fn priority_constraints_are_visible() {
        assert!(priority_is(Priority::Done).constrains_priority());
        assert!(and([has_tag("a"), or([priority_is(Priority::Now)])]).constrains_priority());
        assert!(!not(priority_is(Priority::Done)).constrains_priority());
        assert!(!has_tag("priority").constrains_priority());
    }

    #[test]
    fn bad_column_operator_is_reported() {
        assert_eq!(
            sql(column(":when", "like", "x")),
            Err(CompileError::UnknownOperator {
                field: ":when".into(),
                op: "like".into()
            })
        );
    }
}

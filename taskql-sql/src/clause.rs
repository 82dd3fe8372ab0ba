//! Lowering of expression nodes to SQL boolean fragments.

use crate::{CompileError, Quoter};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use taskql_syntax::{
    BoolExpr, DateTimeParser, Expr, NotExpr, Priority, SimpleExpr, format_trigger_at,
};

/// Physical table names the fragments refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub tasks_table: String,
    /// `(id, name, value)` rows, one per tag on a task.
    pub tag_table: String,
    /// Full-text index over `title_field` and `text_field`.
    pub fts_table: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            tasks_table: "tasks".into(),
            tag_table: "columns".into(),
            fts_table: "ridx".into(),
        }
    }
}

/// Services shared by every node while one query is compiled.
pub struct CompileContext<'a> {
    pub quoter: &'a dyn Quoter,
    pub schema: &'a Schema,
    /// Resolves `:when` values the parser could not, and carries the zone
    /// trigger times are rendered in.
    pub dates: DateTimeParser,
}

impl CompileContext<'_> {
    fn quote(&self, raw: &str) -> String {
        self.quoter.quote(raw)
    }
}

/// Something that renders as a SQL boolean fragment.
///
/// Implemented by the three expression nodes and by externally built
/// predicates. `negate` asks for the logical complement; `depth` is zero at
/// the top of a `WHERE` clause and grows with nesting. `Ok(None)` means the
/// node puts no constraint on the result.
pub trait Clause {
    fn to_clause(
        &self,
        ctx: &CompileContext<'_>,
        negate: bool,
        depth: usize,
    ) -> Result<Option<String>, CompileError>;

    /// Whether the fragment already filters on `priority` when not negated.
    /// Suppresses the default "hide completed tasks" filter.
    fn constrains_priority(&self) -> bool {
        false
    }
}

const COMPARISONS: &[(&str, &str)] = &[
    ("=", "="),
    ("<", "<"),
    (">", ">"),
    ("<=", "<="),
    (">=", ">="),
    ("!=", "<>"),
];

const PATTERNS: &[(&str, &str)] = &[("like", "LIKE"), ("not like", "NOT LIKE")];

fn unknown_operator(expr: &SimpleExpr) -> CompileError {
    CompileError::UnknownOperator {
        field: expr.name.clone(),
        op: expr.op.clone(),
    }
}

/// Ordering comparisons only. An empty operator reads as `=`.
fn comparison(expr: &SimpleExpr) -> Result<&'static str, CompileError> {
    if expr.op.is_empty() {
        return Ok("=");
    }
    COMPARISONS
        .iter()
        .find(|(op, _)| *op == expr.op)
        .map(|(_, sql)| *sql)
        .ok_or_else(|| unknown_operator(expr))
}

/// Comparisons plus `LIKE` / `NOT LIKE`.
fn value_operator(expr: &SimpleExpr) -> Result<&'static str, CompileError> {
    COMPARISONS
        .iter()
        .chain(PATTERNS)
        .find(|(op, _)| op.eq_ignore_ascii_case(&expr.op))
        .map(|(_, sql)| *sql)
        .ok_or_else(|| unknown_operator(expr))
}

impl Clause for Expr {
    fn to_clause(
        &self,
        ctx: &CompileContext<'_>,
        negate: bool,
        depth: usize,
    ) -> Result<Option<String>, CompileError> {
        match self {
            Expr::Simple(simple) => simple.to_clause(ctx, negate, depth),
            Expr::Bool(bool_expr) => bool_expr.to_clause(ctx, negate, depth),
            Expr::Not(not) => not.to_clause(ctx, negate, depth),
        }
    }

    fn constrains_priority(&self) -> bool {
        match self {
            Expr::Simple(simple) => simple.constrains_priority(),
            Expr::Bool(bool_expr) => Clause::constrains_priority(bool_expr),
            Expr::Not(_) => false,
        }
    }
}

impl Clause for SimpleExpr {
    fn to_clause(
        &self,
        ctx: &CompileContext<'_>,
        negate: bool,
        _depth: usize,
    ) -> Result<Option<String>, CompileError> {
        if !self.is_pseudo_field() {
            return tag_clause(self, ctx, negate).map(Some);
        }
        let clause = match self.name.as_str() {
            ":priority" => priority_clause(self)?,
            ":when" => when_clause(self, ctx)?,
            ":id" => column_clause(self, ctx, "id")?,
            ":title_field" => column_clause(self, ctx, "title_field")?,
            ":text_field" => column_clause(self, ctx, "text_field")?,
            ":search" => search_clause(self, ctx)?,
            _ => {
                return Err(CompileError::UnknownPseudoField {
                    field: self.name.clone(),
                });
            }
        };
        Ok(Some(if negate {
            format!("NOT ({clause})")
        } else {
            clause
        }))
    }

    fn constrains_priority(&self) -> bool {
        self.name == ":priority"
    }
}

impl Clause for BoolExpr {
    fn to_clause(
        &self,
        ctx: &CompileContext<'_>,
        negate: bool,
        depth: usize,
    ) -> Result<Option<String>, CompileError> {
        let op = if negate { self.op.dual() } else { self.op };
        let mut fragments = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            fragments.extend(part.to_clause(ctx, negate, depth + 1)?);
        }
        let joined = fragments.iter().join(&format!(" {} ", op.as_sql()));
        Ok(match fragments.len() {
            0 => None,
            1 => Some(joined),
            _ if depth > 0 => Some(format!("({joined})")),
            _ => Some(joined),
        })
    }

    fn constrains_priority(&self) -> bool {
        BoolExpr::constrains_priority(self)
    }
}

impl Clause for NotExpr {
    fn to_clause(
        &self,
        ctx: &CompileContext<'_>,
        negate: bool,
        depth: usize,
    ) -> Result<Option<String>, CompileError> {
        if negate {
            return self.inner.to_clause(ctx, false, depth);
        }
        Ok(self
            .inner
            .to_clause(ctx, false, 0)?
            .map(|inner| format!("NOT ({inner})")))
    }
}

fn tag_clause(
    expr: &SimpleExpr,
    ctx: &CompileContext<'_>,
    negate: bool,
) -> Result<String, CompileError> {
    let membership = if negate { "NOT IN" } else { "IN" };
    let mut clause = format!(
        "id {membership} (SELECT id FROM {} WHERE name = {}",
        ctx.schema.tag_table,
        ctx.quote(&expr.name)
    );
    if !expr.op.is_empty() {
        let op = value_operator(expr)?;
        clause.push_str(&format!(" AND value {op} {}", ctx.quote(&expr.value)));
    }
    clause.push(')');
    Ok(clause)
}

fn priority_clause(expr: &SimpleExpr) -> Result<String, CompileError> {
    let op = comparison(expr)?;
    let priority = expr
        .priority
        .or_else(|| Priority::from_shorthand(&expr.value))
        .or_else(|| expr.value.parse().ok().and_then(Priority::from_value))
        .ok_or_else(|| CompileError::InvalidPriority {
            fragment: expr.value.clone(),
        })?;
    Ok(format!("priority {op} {}", priority.value()))
}

/// A `#<date>` shorthand carries `=` and so tests for that exact instant;
/// ranges need an explicit operator (`#:when<=2026-11-01`).
fn when_clause(expr: &SimpleExpr, ctx: &CompileContext<'_>) -> Result<String, CompileError> {
    if expr.op == "notnull" {
        return Ok("trigger_at_field IS NOT NULL".to_string());
    }
    let op = comparison(expr)?;
    let time = match expr.time {
        Some(time) => time,
        None => ctx
            .dates
            .parse(&expr.value)
            .map_err(|source| CompileError::InvalidDate {
                fragment: expr.value.clone(),
                source,
            })?
            .timestamp(),
    };
    let formatted = format_trigger_at(time, ctx.dates.timezone());
    Ok(format!("trigger_at_field {op} {}", ctx.quote(&formatted)))
}

fn match_subquery(ctx: &CompileContext<'_>, column: &str, query: &str) -> String {
    format!(
        "id IN (SELECT id FROM {} WHERE {column} MATCH {})",
        ctx.schema.fts_table,
        ctx.quote(query)
    )
}

fn column_clause(
    expr: &SimpleExpr,
    ctx: &CompileContext<'_>,
    column: &str,
) -> Result<String, CompileError> {
    if expr.op == "match" {
        return Ok(match_subquery(ctx, column, &expr.value));
    }
    let op = value_operator(expr)?;
    // Ids are integers; keep them unquoted so the index is used.
    let value = match expr.value.parse::<i64>() {
        Ok(id) if column == "id" => id.to_string(),
        _ => ctx.quote(&expr.value),
    };
    Ok(format!("{column} {op} {value}"))
}

fn search_clause(expr: &SimpleExpr, ctx: &CompileContext<'_>) -> Result<String, CompileError> {
    if !matches!(expr.op.as_str(), "" | "=" | "match") {
        return Err(unknown_operator(expr));
    }
    Ok(format!(
        "({} OR {})",
        match_subquery(ctx, "title_field", &expr.value),
        match_subquery(ctx, "text_field", &expr.value)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteQuoter;
    use jiff::Timestamp;

    fn compile(expr: impl Into<Expr>, negate: bool) -> Result<Option<String>, CompileError> {
        let schema = Schema::default();
        let now: Timestamp = "2026-10-19T10:00:00Z".parse().unwrap();
        let ctx = CompileContext {
            quoter: &SqliteQuoter,
            schema: &schema,
            dates: DateTimeParser::with_now(1, now).unwrap(),
        };
        expr.into().to_clause(&ctx, negate, 0)
    }

    fn sql(expr: impl Into<Expr>) -> String {
        compile(expr, false).unwrap().unwrap()
    }

    #[test]
    fn bare_tag_and_negation() {
        assert_eq!(
            sql(SimpleExpr::tag("home")),
            "id IN (SELECT id FROM columns WHERE name = 'home')"
        );
        assert_eq!(
            compile(SimpleExpr::tag("home"), true).unwrap().unwrap(),
            "id NOT IN (SELECT id FROM columns WHERE name = 'home')"
        );
    }

    #[test]
    fn tag_value_operators_are_translated() {
        assert_eq!(
            sql(SimpleExpr::compare("owner", "!=", "me")),
            "id IN (SELECT id FROM columns WHERE name = 'owner' AND value <> 'me')"
        );
        assert_eq!(
            sql(SimpleExpr::compare("owner", "like", "a%")),
            "id IN (SELECT id FROM columns WHERE name = 'owner' AND value LIKE 'a%')"
        );
        assert_eq!(
            compile(SimpleExpr::compare("owner", "~", "x"), false),
            Err(CompileError::UnknownOperator {
                field: "owner".into(),
                op: "~".into()
            })
        );
    }

    #[test]
    fn tag_names_and_values_are_quoted() {
        assert_eq!(
            sql(SimpleExpr::compare("it's", "=", "o'k")),
            "id IN (SELECT id FROM columns WHERE name = 'it''s' AND value = 'o''k')"
        );
    }

    #[test]
    fn priority_pseudo_field() {
        assert_eq!(sql(SimpleExpr::priority(Priority::Later, "l")), "priority = 2");
        assert_eq!(sql(SimpleExpr::compare(":priority", "<", "4")), "priority < 4");
        assert_eq!(
            compile(SimpleExpr::priority(Priority::Done, "d"), true).unwrap().unwrap(),
            "NOT (priority = 5)"
        );
        assert_eq!(
            compile(SimpleExpr::compare(":priority", "=", "urgent"), false),
            Err(CompileError::InvalidPriority {
                fragment: "urgent".into()
            })
        );
        assert!(compile(SimpleExpr::compare(":priority", "like", "1"), false).is_err());
    }

    #[test]
    fn when_is_rendered_in_the_parse_zone() {
        let at: Timestamp = "2026-10-25T08:00:00Z".parse().unwrap();
        assert_eq!(
            sql(SimpleExpr::when("2026-10-25,09:00", at, None)),
            "trigger_at_field = '2026-10-25 09:00:00'"
        );
        assert_eq!(
            sql(SimpleExpr::compare(":when", ">=", "2026-11-01")),
            "trigger_at_field >= '2026-11-01 00:00:00'"
        );
        assert_eq!(
            sql(SimpleExpr::compare(":when", "notnull", "")),
            "trigger_at_field IS NOT NULL"
        );
    }

    #[test]
    fn unparsable_when_names_the_fragment() {
        let err = compile(SimpleExpr::compare(":when", "<", "someday"), false).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidDate { ref fragment, .. } if fragment == "someday"
        ));
    }

    #[test]
    fn column_pseudo_fields() {
        assert_eq!(sql(SimpleExpr::compare(":id", "=", "42")), "id = 42");
        assert_eq!(
            sql(SimpleExpr::compare(":title_field", "like", "%x%")),
            "title_field LIKE '%x%'"
        );
        assert_eq!(
            sql(SimpleExpr::compare(":text_field", "match", "milk")),
            "id IN (SELECT id FROM ridx WHERE text_field MATCH 'milk')"
        );
    }

    #[test]
    fn search_matches_title_or_text() {
        assert_eq!(
            sql(SimpleExpr::compare(":search", "match", "buy milk")),
            "(id IN (SELECT id FROM ridx WHERE title_field MATCH 'buy milk') \
             OR id IN (SELECT id FROM ridx WHERE text_field MATCH 'buy milk'))"
        );
    }

    #[test]
    fn unknown_pseudo_field_is_an_error() {
        assert_eq!(
            compile(SimpleExpr::compare(":colour", "=", "red"), false),
            Err(CompileError::UnknownPseudoField {
                field: ":colour".into()
            })
        );
    }

    #[test]
    fn nested_bool_is_parenthesized() {
        let expr = BoolExpr::and(vec![
            SimpleExpr::compare(":id", "=", "1").into(),
            BoolExpr::or(vec![
                SimpleExpr::compare(":id", "=", "2").into(),
                SimpleExpr::compare(":id", "=", "3").into(),
            ])
            .into(),
        ]);
        assert_eq!(sql(expr), "id = 1 AND (id = 2 OR id = 3)");
    }

    #[test]
    fn negated_bool_applies_de_morgan() {
        let expr = BoolExpr::or(vec![SimpleExpr::tag("a").into(), SimpleExpr::tag("b").into()]);
        assert_eq!(
            compile(expr, true).unwrap().unwrap(),
            "id NOT IN (SELECT id FROM columns WHERE name = 'a') \
             AND id NOT IN (SELECT id FROM columns WHERE name = 'b')"
        );
    }

    #[test]
    fn not_wraps_and_double_negation_cancels() {
        let not = Expr::not(SimpleExpr::compare(":id", "=", "7"));
        assert_eq!(sql(not.clone()), "NOT (id = 7)");
        assert_eq!(compile(not, true).unwrap().unwrap(), "id = 7");
    }

    #[test]
    fn empty_bool_has_no_clause() {
        assert_eq!(compile(BoolExpr::default(), false), Ok(None));
        assert_eq!(compile(Expr::not(BoolExpr::default()), false), Ok(None));
    }
}

//! Expression tree produced by the parser.
//!
//! The tree is a closed set of three node kinds. Lowering to SQL lives in
//! `taskql-sql`; this module only knows how to build and inspect nodes.

use jiff::Timestamp;
use std::{fmt, str::FromStr};

/// Task priority, ordered the way result lists are sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Sticky = 0,
    Now = 1,
    Later = 2,
    Timed = 3,
    Notes = 4,
    Done = 5,
}

/// Shorthands accepted after `#` (`#l`, `#now`, `#done` ...).
pub const PRIORITY_SHORTHANDS: &[(&str, Priority)] = &[
    ("s", Priority::Sticky),
    ("sticky", Priority::Sticky),
    ("n", Priority::Now),
    ("now", Priority::Now),
    ("l", Priority::Later),
    ("later", Priority::Later),
    ("t", Priority::Timed),
    ("timed", Priority::Timed),
    ("N", Priority::Notes),
    ("notes", Priority::Notes),
    ("d", Priority::Done),
    ("done", Priority::Done),
];

const PRIORITIES: [Priority; 6] = [
    Priority::Sticky,
    Priority::Now,
    Priority::Later,
    Priority::Timed,
    Priority::Notes,
    Priority::Done,
];

impl Priority {
    /// ```
    /// use taskql_syntax::Priority;
    /// assert_eq!(Priority::from_shorthand("l"), Some(Priority::Later));
    /// assert_eq!(Priority::from_shorthand("later"), Some(Priority::Later));
    /// assert_eq!(Priority::from_shorthand("soon"), None);
    /// ```
    pub fn from_shorthand(name: &str) -> Option<Self> {
        PRIORITY_SHORTHANDS
            .iter()
            .find(|(shorthand, _)| *shorthand == name)
            .map(|(_, priority)| *priority)
    }

    pub fn from_value(value: i64) -> Option<Self> {
        PRIORITIES.into_iter().find(|p| p.value() == value)
    }

    /// Integer stored in the `priority` column.
    pub fn value(self) -> i64 {
        self as i64
    }
}

/// Repetition attached to a `#<date>+<freq>` literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    /// Every N days.
    Days(u32),
}

impl FromStr for Frequency {
    type Err = ();

    /// ```
    /// use taskql_syntax::Frequency;
    /// assert_eq!("weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
    /// assert_eq!("3".parse::<Frequency>(), Ok(Frequency::Days(3)));
    /// assert!("0".parse::<Frequency>().is_err());
    /// assert!("fortnightly".parse::<Frequency>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => match s.parse::<u32>() {
                Ok(days) if days > 0 => Ok(Frequency::Days(days)),
                _ => Err(()),
            },
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => f.write_str("daily"),
            Frequency::Weekly => f.write_str("weekly"),
            Frequency::Biweekly => f.write_str("biweekly"),
            Frequency::Monthly => f.write_str("monthly"),
            Frequency::Yearly => f.write_str("yearly"),
            Frequency::Days(days) => write!(f, "{days}"),
        }
    }
}

/// A single test against a tag or a pseudo-field.
///
/// Names starting with `:` are pseudo-fields mapped onto task columns
/// (`:priority`, `:when`, `:id`, `:title_field`, `:text_field`, `:search`);
/// everything else is a tag. An empty `op` tests for the tag's presence and
/// always comes with an empty `value`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleExpr {
    pub name: String,
    pub op: String,
    pub value: String,
    /// Parsed form of `value` for `:when`.
    pub time: Option<Timestamp>,
    pub priority: Option<Priority>,
    /// Only meaningful for `:when`.
    pub extra: Option<Frequency>,
}

impl SimpleExpr {
    /// Bare presence test: `#name`.
    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// `name <op> value`, for tags and pseudo-fields alike.
    pub fn compare(name: impl Into<String>, op: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn priority(priority: Priority, raw: impl Into<String>) -> Self {
        Self {
            name: ":priority".into(),
            op: "=".into(),
            value: raw.into(),
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn when(raw: impl Into<String>, time: Timestamp, extra: Option<Frequency>) -> Self {
        Self {
            name: ":when".into(),
            op: "=".into(),
            value: raw.into(),
            time: Some(time),
            extra,
            ..Self::default()
        }
    }

    pub fn is_pseudo_field(&self) -> bool {
        self.name.starts_with(':')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }

    /// De Morgan dual, used when a negation is pushed through.
    pub fn dual(self) -> Self {
        match self {
            BoolOp::And => BoolOp::Or,
            BoolOp::Or => BoolOp::And,
        }
    }
}

/// Flat conjunction or disjunction. An empty list is valid and stands for
/// "no constraint".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolExpr {
    pub op: BoolOp,
    pub parts: Vec<Expr>,
}

impl BoolExpr {
    pub fn and(parts: Vec<Expr>) -> Self {
        Self {
            op: BoolOp::And,
            parts,
        }
    }

    pub fn or(parts: Vec<Expr>) -> Self {
        Self {
            op: BoolOp::Or,
            parts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn push(&mut self, expr: impl Into<Expr>) {
        self.parts.push(expr.into());
    }

    /// Whether any non-negated leaf already filters on `:priority`.
    pub fn constrains_priority(&self) -> bool {
        self.parts.iter().any(|part| match part {
            Expr::Simple(simple) => simple.name == ":priority",
            Expr::Bool(nested) => nested.constrains_priority(),
            Expr::Not(_) => false,
        })
    }
}

impl Default for BoolExpr {
    fn default() -> Self {
        Self::and(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotExpr {
    pub inner: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Simple(SimpleExpr),
    Bool(BoolExpr),
    Not(NotExpr),
}

impl Expr {
    pub fn not(inner: impl Into<Expr>) -> Self {
        Expr::Not(NotExpr {
            inner: Box::new(inner.into()),
        })
    }
}

impl From<SimpleExpr> for Expr {
    fn from(value: SimpleExpr) -> Self {
        Expr::Simple(value)
    }
}

impl From<BoolExpr> for Expr {
    fn from(value: BoolExpr) -> Self {
        Expr::Bool(value)
    }
}

impl From<NotExpr> for Expr {
    fn from(value: NotExpr) -> Self {
        Expr::Not(value)
    }
}

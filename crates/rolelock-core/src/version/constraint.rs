//! Version constraints and operator-driven selection.

use std::cmp::Ordering;
use std::fmt;

use super::value::Version;

/// Operators recognised in compact `name<op><version>` strings, in scan order.
const INLINE_OPERATORS: [&str; 6] = [">=", "<=", "==", ">", "<", "="];

/// Unconstrained spellings.
const ANY_TOKENS: [&str; 3] = ["", "latest", "*"];

/// Comparison operator of a constraint. `=` is accepted as an alias of `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Ge,
    Le,
    Eq,
    Gt,
    Lt,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Eq => "==",
            Operator::Gt => ">",
            Operator::Lt => "<",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">=" => Some(Operator::Ge),
            "<=" => Some(Operator::Le),
            "==" | "=" => Some(Operator::Eq),
            ">" => Some(Operator::Gt),
            "<" => Some(Operator::Lt),
            _ => None,
        }
    }

    /// Whether `candidate` satisfies `candidate <op> target`.
    pub fn accepts(&self, candidate: &Version, target: &Version) -> bool {
        let Some(ordering) = candidate.partial_cmp(target) else {
            return false;
        };
        match self {
            Operator::Ge => ordering != Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Eq => ordering == Ordering::Equal,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Lt => ordering == Ordering::Less,
        }
    }
}

/// How constraint versions are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionScheme {
    /// Registry-published versions; must be numeric.
    Semantic,
    /// Git tags; `v` markers are stripped and opaque pins are allowed.
    Tag,
}

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Empty, `latest` or `*`.
    Any,
    /// Operator plus version. `literal` is the version text as declared.
    Bound {
        op: Operator,
        version: Version,
        literal: String,
    },
}

impl Constraint {
    /// Build a bound constraint from an operator and a semantic version.
    pub fn bound(op: Operator, version: Version) -> Self {
        let literal = version.to_string();
        Constraint::Bound {
            op,
            version,
            literal,
        }
    }

    /// Parse a constraint string such as `>=1.2.0`, `==2.0`, `1.4.1` or `latest`.
    ///
    /// A bare version is an exact pin. Under [`VersionScheme::Semantic`] the
    /// version must be numeric; under [`VersionScheme::Tag`] an opaque token is
    /// accepted only as an exact pin.
    pub fn parse(input: &str, scheme: VersionScheme) -> Result<Self, String> {
        let input = input.trim();
        if ANY_TOKENS.contains(&input) {
            return Ok(Constraint::Any);
        }

        let (op, literal) = match leading_operator(input) {
            Some((symbol, rest)) => (
                Operator::from_symbol(symbol)
                    .ok_or_else(|| format!("unknown operator '{}'", symbol))?,
                rest.trim(),
            ),
            None => (Operator::Eq, input),
        };

        if literal.is_empty() {
            return Err(format!("constraint '{}' is missing a version", input));
        }
        if literal.contains(',') || literal.contains(char::is_whitespace) {
            return Err(format!(
                "constraint '{}' must be a single operator and version",
                input
            ));
        }

        let version = match scheme {
            VersionScheme::Semantic => Version::parse(literal),
            VersionScheme::Tag => Version::from_tag(literal),
        };
        if !version.is_semantic() && (scheme == VersionScheme::Semantic || op != Operator::Eq) {
            return Err(format!(
                "constraint '{}' does not name a numeric version",
                input
            ));
        }

        Ok(Constraint::Bound {
            op,
            version,
            literal: literal.to_string(),
        })
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Constraint::Any)
    }

    /// Lower bound implied by this constraint, if any.
    pub fn minimum(&self) -> Option<&Version> {
        match self {
            Constraint::Bound {
                op: Operator::Ge | Operator::Gt | Operator::Eq,
                version,
                ..
            } => Some(version),
            _ => None,
        }
    }

    /// Opaque exact pin (branch or commit), if this is one.
    pub fn opaque_pin(&self) -> Option<&str> {
        match self {
            Constraint::Bound {
                op: Operator::Eq,
                version: Version::Opaque(_),
                literal,
            } => Some(literal),
            _ => None,
        }
    }

    /// The declared version text, or `latest` for unconstrained.
    pub fn literal(&self) -> &str {
        match self {
            Constraint::Any => "latest",
            Constraint::Bound { literal, .. } => literal,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => f.write_str("latest"),
            Constraint::Bound { op, literal, .. } => write!(f, "{}{}", op.symbol(), literal),
        }
    }
}

/// Split a compact `name<op><version>` string.
///
/// Operators are tried in the order `>=, <=, ==, >, <, =`; the first one found
/// anywhere in the string splits it. Without an operator the whole string is
/// the name and the returned constraint text is empty.
pub fn split_inline(input: &str) -> (String, String) {
    let input = input.trim();
    for symbol in INLINE_OPERATORS {
        if let Some(idx) = input.find(symbol) {
            let name = input[..idx].trim().to_string();
            let version = input[idx + symbol.len()..].trim();
            return (name, format!("{}{}", symbol, version));
        }
    }
    (input.to_string(), String::new())
}

fn leading_operator(input: &str) -> Option<(&str, &str)> {
    INLINE_OPERATORS
        .iter()
        .find_map(|symbol| input.strip_prefix(symbol).map(|rest| (*symbol, rest)))
}

/// A published version together with the label it was published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub version: Version,
    pub label: String,
}

impl Candidate {
    /// Candidate from a registry version string; opaque entries are skipped.
    pub fn from_release(raw: &str) -> Option<Self> {
        let version = Version::parse(raw);
        version.is_semantic().then(|| Candidate {
            version,
            label: raw.trim().to_string(),
        })
    }

    /// Candidate from a git tag; branch-like and opaque tags are skipped.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let version = Version::from_tag(tag);
        version.is_semantic().then(|| Candidate {
            version,
            label: tag.trim().to_string(),
        })
    }
}

/// Sort candidates highest first. Equal versions keep label order so the
/// result never depends on registry ordering.
pub fn sort_descending(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.version
            .partial_cmp(&a.version)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
}

/// Outcome of matching a constraint against published versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A published version satisfied the constraint.
    Matched(String),
    /// Nothing satisfied a `>=` bound; the literal bound is used instead.
    Fallback(String),
}

impl Selection {
    pub fn version(&self) -> &str {
        match self {
            Selection::Matched(v) | Selection::Fallback(v) => v,
        }
    }
}

/// No published version satisfied an explicit constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoMatch;

/// Select the version a constraint resolves to.
///
/// Candidates are scanned highest first and the first satisfying entry wins.
/// `>=` with no satisfying entry falls back to its literal bound; every other
/// operator reports [`NoMatch`]. An unconstrained request with no semantic
/// candidates is also [`NoMatch`]; callers decide how to degrade it.
pub fn select(candidates: &[Candidate], constraint: &Constraint) -> Result<Selection, NoMatch> {
    let mut sorted = candidates.to_vec();
    sort_descending(&mut sorted);

    match constraint {
        Constraint::Any => sorted
            .first()
            .map(|c| Selection::Matched(c.label.clone()))
            .ok_or(NoMatch),
        Constraint::Bound {
            op,
            version,
            literal,
        } => {
            if *op == Operator::Eq
                && let Some(exact) = sorted.iter().find(|c| &c.label == literal)
            {
                return Ok(Selection::Matched(exact.label.clone()));
            }
            match sorted.iter().find(|c| op.accepts(&c.version, version)) {
                Some(found) => Ok(Selection::Matched(found.label.clone())),
                None if *op == Operator::Ge => Ok(Selection::Fallback(literal.clone())),
                None => Err(NoMatch),
            }
        }
    }
}

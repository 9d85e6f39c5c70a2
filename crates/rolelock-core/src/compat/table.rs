//! Static interpreter/tool compatibility table and constraint adjustment.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::version::{Constraint, Operator, Version};

/// Recommended bounds for one tool on one Python minor.
///
/// `floor` is the minimum recommended release. `ceiling`, when present, is the
/// first release line the interpreter can no longer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolBounds {
    pub tool: &'static str,
    pub floor: &'static str,
    pub ceiling: Option<&'static str>,
}

const fn bounds(tool: &'static str, floor: &'static str, ceiling: Option<&'static str>) -> ToolBounds {
    ToolBounds {
        tool,
        floor,
        ceiling,
    }
}

/// Compatibility rows keyed by Python minor, oldest first.
pub const COMPATIBILITY_TABLE: [(&str, [ToolBounds; 3]); 4] = [
    (
        "3.10",
        [
            bounds("ansible", "9.0.0", Some("10.0.0")),
            bounds("ansible-lint", "6.22.2", Some("25.0.0")),
            bounds("molecule", "6.0.3", Some("25.0.0")),
        ],
    ),
    (
        "3.11",
        [
            bounds("ansible", "10.0.0", Some("12.0.0")),
            bounds("ansible-lint", "24.2.0", None),
            bounds("molecule", "24.2.0", None),
        ],
    ),
    (
        "3.12",
        [
            bounds("ansible", "10.0.0", None),
            bounds("ansible-lint", "24.7.0", None),
            bounds("molecule", "24.7.0", None),
        ],
    ),
    (
        "3.13",
        [
            bounds("ansible", "11.0.0", None),
            bounds("ansible-lint", "25.1.0", None),
            bounds("molecule", "25.1.0", None),
        ],
    ),
];

/// Table row for a Python minor.
pub fn bounds_for_minor(minor: &str) -> Option<&'static [ToolBounds; 3]> {
    COMPATIBILITY_TABLE
        .iter()
        .find(|(key, _)| *key == minor)
        .map(|(_, row)| row)
}

/// Tool constraints after compatibility adjustment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjustment {
    /// Effective constraint per tool name.
    pub constraints: BTreeMap<String, Constraint>,
    /// One human-readable line per rewritten tool.
    pub warnings: Vec<String>,
}

/// Cross-check tool constraints against the row for `python_minor`.
///
/// - A lower bound below the row's floor is raised to `>=floor`.
/// - A lower bound at or above the row's ceiling cannot run on this
///   interpreter and is pinned to `==floor`.
/// - When the row has a ceiling, unconstrained requests and upper bounds
///   beyond it are capped to `<ceiling`.
/// - Stricter upper bounds and tools outside the table are untouched.
///
/// Adjustment never fails.
pub fn adjust_tools(python_minor: &str, tools: &BTreeMap<String, Constraint>) -> Adjustment {
    let mut adjustment = Adjustment {
        constraints: tools.clone(),
        warnings: Vec::new(),
    };
    let Some(row) = bounds_for_minor(python_minor) else {
        debug!(python = python_minor, "No compatibility row; constraints unchanged");
        return adjustment;
    };

    for entry in row {
        let Some(requested) = tools.get(entry.tool) else {
            continue;
        };
        let floor = Version::parse(entry.floor);
        let ceiling = entry.ceiling.map(|c| (c, Version::parse(c)));

        let rewrite = match (requested, &ceiling) {
            (_, Some((_, limit))) if requested.minimum().is_some_and(|min| min >= limit) => {
                Some((
                    Constraint::bound(Operator::Eq, floor.clone()),
                    format!(
                        "{} {} cannot run on Python {}; pinned to {}",
                        entry.tool, requested, python_minor, entry.floor
                    ),
                ))
            }
            _ if requested.minimum().is_some_and(|min| *min < floor) => Some((
                Constraint::bound(Operator::Ge, floor.clone()),
                format!(
                    "{} {} is below the minimum recommended for Python {}; raised to >={}",
                    entry.tool, requested, python_minor, entry.floor
                ),
            )),
            (Constraint::Any, Some((text, limit))) => {
                Some(capped(entry, requested, python_minor, text, limit))
            }
            (Constraint::Bound { op: Operator::Lt, version, .. }, Some((text, limit)))
                if version > limit =>
            {
                Some(capped(entry, requested, python_minor, text, limit))
            }
            (Constraint::Bound { op: Operator::Le, version, .. }, Some((text, limit)))
                if version >= limit =>
            {
                Some(capped(entry, requested, python_minor, text, limit))
            }
            _ => None,
        };

        if let Some((effective, message)) = rewrite {
            warn!(
                tool = entry.tool,
                requested = %requested,
                effective = %effective,
                "Adjusted tool constraint for interpreter compatibility"
            );
            adjustment
                .constraints
                .insert(entry.tool.to_string(), effective);
            adjustment.warnings.push(message);
        }
    }

    adjustment
}

fn capped(
    entry: &ToolBounds,
    requested: &Constraint,
    python_minor: &str,
    ceiling: &str,
    limit: &Version,
) -> (Constraint, String) {
    (
        Constraint::bound(Operator::Lt, limit.clone()),
        format!(
            "{} {} may select releases that cannot run on Python {}; capped to <{}",
            entry.tool, requested, python_minor, ceiling
        ),
    )
}

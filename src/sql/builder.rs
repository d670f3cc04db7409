//! Statement text helpers: quoted identifiers, uniform `?` placeholders, translation to `$n`.

use serde_json::Value;

/// Uniform value marker used in compiled templates.
pub const PLACEHOLDER: char = '?';

/// Quote identifier for PostgreSQL (safe: only from model definitions).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// `?, ?, ?` with `n` markers.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Replace every `?` marker outside quoted literals/identifiers with `$1`, `$2`, ... in order.
pub fn to_native_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0u32;
    let mut in_literal = false;
    let mut in_ident = false;
    for c in sql.chars() {
        match c {
            '\'' if !in_ident => {
                in_literal = !in_literal;
                out.push(c);
            }
            '"' if !in_literal => {
                in_ident = !in_ident;
                out.push(c);
            }
            PLACEHOLDER if !in_literal && !in_ident => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}

/// Row window for reads: at most `count` rows, or `count` rows after skipping `offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Count(u64),
    Range { offset: u64, count: u64 },
}

impl Limit {
    /// `LIMIT ?` / `LIMIT ? OFFSET ?` and the values bound to it, count first.
    pub fn clause(&self) -> (&'static str, Vec<Value>) {
        match *self {
            Limit::Count(n) => ("LIMIT ?", vec![Value::from(n)]),
            Limit::Range { offset, count } => {
                ("LIMIT ? OFFSET ?", vec![Value::from(count), Value::from(offset)])
            }
        }
    }

    /// (skip, take) for trimming an already-running row stream.
    pub fn window(&self) -> (usize, usize) {
        let to_usize = |n: u64| usize::try_from(n).unwrap_or(usize::MAX);
        match *self {
            Limit::Count(n) => (0, to_usize(n)),
            Limit::Range { offset, count } => (to_usize(offset), to_usize(count)),
        }
    }
}

impl From<u64> for Limit {
    fn from(n: u64) -> Self {
        Limit::Count(n)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit::Range { offset, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_become_numbered_in_order() {
        assert_eq!(
            to_native_placeholders("UPDATE \"t\" SET \"a\"=?, \"b\"=? WHERE \"id\"=?"),
            "UPDATE \"t\" SET \"a\"=$1, \"b\"=$2 WHERE \"id\"=$3"
        );
    }

    #[test]
    fn markers_inside_quotes_are_left_alone() {
        assert_eq!(
            to_native_placeholders("SELECT '?' AS \"what?\" WHERE x = ?"),
            "SELECT '?' AS \"what?\" WHERE x = $1"
        );
    }

    #[test]
    fn identifiers_escape_embedded_quotes() {
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(0), "");
    }

    #[test]
    fn range_binds_count_then_offset() {
        let (sql, args) = Limit::from((10, 5)).clause();
        assert_eq!(sql, "LIMIT ? OFFSET ?");
        assert_eq!(args, vec![Value::from(5u64), Value::from(10u64)]);
        assert_eq!(Limit::from((10, 5)).window(), (10, 5));
    }
}

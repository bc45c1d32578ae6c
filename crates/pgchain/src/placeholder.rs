//! `?` marker handling.
//!
//! Commands are written with positional `?` markers. Before execution they are numbered into
//! Postgres `$1, $2, ...` parameters; for debugging they can be rendered with the bound values
//! inlined. Neither function looks inside string literals or validates marker counts.

use crate::value::Value;
use std::fmt::Write;

/// The positional marker accepted in command text.
pub const MARKER: char = '?';

/// Replace the i-th `?` with `$i` (1-based), left to right.
pub fn translate_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut idx: usize = 0;
    for ch in sql.chars() {
        if ch == MARKER {
            idx += 1;
            let _ = write!(&mut out, "${}", idx);
        } else {
            out.push(ch);
        }
    }
    out
}

/// Count `?` markers in `sql`.
pub fn count_placeholders(sql: &str) -> usize {
    sql.matches(MARKER).count()
}

/// Inline `args` into `sql`, one per `?`, using each value's `Display` form.
///
/// Markers without an argument are left as `?`; surplus arguments are ignored.
/// The output is for logs and tests only: nothing is quoted or escaped.
pub fn render_debug(sql: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut args = args.iter();
    for ch in sql.chars() {
        if ch != MARKER {
            out.push(ch);
            continue;
        }
        match args.next() {
            Some(arg) => {
                let _ = write!(&mut out, "{}", arg);
            }
            None => out.push(MARKER),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_markers_in_order() {
        assert_eq!(
            translate_placeholders("SELECT * FROM t WHERE a = ? AND b = ? OR c = ?"),
            "SELECT * FROM t WHERE a = $1 AND b = $2 OR c = $3"
        );
    }

    #[test]
    fn translates_past_nine() {
        let sql = vec!["?"; 12].join(", ");
        let translated = translate_placeholders(&sql);
        let expected: Vec<String> = (1..=12).map(|i| format!("${i}")).collect();
        assert_eq!(translated, expected.join(", "));
        assert_eq!(count_placeholders(&sql), 12);
        assert_eq!(count_placeholders(&translated), 0);
    }

    #[test]
    fn text_without_markers_is_unchanged() {
        assert_eq!(
            translate_placeholders("SELECT * FROM actor LIMIT 5"),
            "SELECT * FROM actor LIMIT 5"
        );
    }

    #[test]
    fn adjacent_markers() {
        assert_eq!(translate_placeholders("(??)"), "($1$2)");
    }

    #[test]
    fn render_inlines_args_left_to_right() {
        let args = [Value::from(133), Value::from("film")];
        assert_eq!(
            render_debug("film_id = ? AND kind = ?", &args),
            "film_id = 133 AND kind = film"
        );
    }

    #[test]
    fn render_keeps_unbound_markers() {
        assert_eq!(
            render_debug("VALUES (?, ?, ?)", &[]),
            "VALUES (?, ?, ?)"
        );
        assert_eq!(render_debug("a = ? AND b = ?", &[Value::from(1)]), "a = 1 AND b = ?");
    }

    #[test]
    fn render_does_not_rescan_inlined_text() {
        let args = [Value::from("what?"), Value::from(2)];
        assert_eq!(render_debug("a = ? AND b = ?", &args), "a = what? AND b = 2");
    }
}

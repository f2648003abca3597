//! [`LikePattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// SQL `LIKE` pattern matching any text containing a literal substring.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct LikePattern(String);

impl LikePattern {
    /// Creates a new [`LikePattern`] matching any text containing the given
    /// `input` literally.
    ///
    /// `%`, `_` and `\` are escaped with the default `\` escape character.
    #[must_use]
    pub fn containing(input: &str) -> Self {
        Self(format!(
            "%{}%",
            input.chars().format_with("", |c, f| match c {
                '%' | '_' | '\\' => f(&format_args!("\\{c}")),
                c => f(&c),
            }),
        ))
    }
}

#[cfg(test)]
mod spec {
    use super::LikePattern;

    #[test]
    fn wraps_input() {
        assert_eq!(LikePattern::containing("Ленина").0, "%Ленина%");
    }

    #[test]
    fn escapes_wildcards() {
        assert_eq!(
            LikePattern::containing(r"100%_\"),
            LikePattern(r"%100\%\_\\%".to_owned()),
        );
    }
}

//! Sort specifications.

use crate::error::{StoreError, StoreResult};
use std::fmt;

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    /// Lowercase keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One component of an [`OrderBy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    /// Field to sort on.
    pub field: String,
    /// Direction.
    pub direction: Direction,
}

/// A multi-key, SQL-style ordering.
///
/// # Example
///
/// ```
/// use tabula_core::sort::{Direction, OrderBy};
///
/// let order = OrderBy::parse("age, id DESC").unwrap();
/// assert_eq!(order.keys()[1].direction, Direction::Desc);
/// assert_eq!(order.signature(), "age asc,id desc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    keys: Vec<SortKey>,
}

impl OrderBy {
    /// Parses a comma-separated list of `field [asc|desc]` items.
    ///
    /// # Errors
    ///
    /// `InvalidArguments` for an empty specification, an empty item, an
    /// unknown direction or an item with more than two tokens.
    pub fn parse(spec: &str) -> StoreResult<Self> {
        if spec.trim().is_empty() {
            return Err(StoreError::invalid_arguments("empty sort specification"));
        }

        let mut keys = Vec::new();
        for item in spec.split(',') {
            let tokens: Vec<&str> = item.split_whitespace().collect();
            let key = match tokens.as_slice() {
                [field] => SortKey {
                    field: (*field).to_string(),
                    direction: Direction::Asc,
                },
                [field, direction] => SortKey {
                    field: (*field).to_string(),
                    direction: Direction::parse(direction).ok_or_else(|| {
                        StoreError::invalid_arguments(format!(
                            "unknown sort direction {direction:?}"
                        ))
                    })?,
                },
                [] => {
                    return Err(StoreError::invalid_arguments(format!(
                        "empty item in sort specification {spec:?}"
                    )))
                }
                _ => {
                    return Err(StoreError::invalid_arguments(format!(
                        "malformed sort item {:?}",
                        item.trim()
                    )))
                }
            };
            keys.push(key);
        }
        Ok(Self { keys })
    }

    /// Starts an ordering with an ascending key.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            keys: vec![SortKey {
                field: field.into(),
                direction: Direction::Asc,
            }],
        }
    }

    /// Starts an ordering with a descending key.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            keys: vec![SortKey {
                field: field.into(),
                direction: Direction::Desc,
            }],
        }
    }

    /// Appends a key.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    /// Sort keys, most significant first.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Normalised form, e.g. `age asc,id desc`.
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{} {}", key.field, key.direction.as_str())?;
        }
        Ok(())
    }
}

impl std::str::FromStr for OrderBy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_to_ascending() {
        let order = OrderBy::parse("age").unwrap();
        assert_eq!(order.keys().len(), 1);
        assert_eq!(order.keys()[0].direction, Direction::Asc);
    }

    #[test]
    fn parse_mixed_case_directions() {
        let order = OrderBy::parse("  last DESC ,first Asc").unwrap();
        assert_eq!(order.signature(), "last desc,first asc");
    }

    #[test]
    fn parse_errors() {
        for bad in ["", "   ", "age,", ",age", "age sideways", "age asc extra"] {
            assert!(
                matches!(OrderBy::parse(bad), Err(StoreError::InvalidArguments { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn builder_matches_parse() {
        let built = OrderBy::asc("age").then("id", Direction::Desc);
        assert_eq!(built, "age, id desc".parse().unwrap());
        assert_eq!(OrderBy::desc("age").signature(), "age desc");
    }
}

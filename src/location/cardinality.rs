use std::fmt;

use super::errors::LocationError;
use super::range::LocationRange;

/// How many of the matches of a location are selected.
///
/// Offsets are 1-based: `first` is `first +1`, `last` is `last -1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationCardinality {
    /// Exactly one match.
    #[default]
    Single,
    First { offset: usize, out_of: Option<usize> },
    Last { offset: usize, out_of: Option<usize> },
    /// Every match, as one range with holes.
    All { expected: Option<usize> },
    /// Every match, as independent application sites.
    Each { expected: Option<usize> },
}

/// Ranges selected by a cardinality.
#[derive(Debug, Clone)]
pub struct Selection {
    pub ranges: Vec<LocationRange>,
    /// The ranges are independent sites (`each`) rather than one range.
    pub each: bool,
}

impl LocationCardinality {
    pub fn first() -> Self {
        Self::First {
            offset: 1,
            out_of: None,
        }
    }

    pub fn last() -> Self {
        Self::Last {
            offset: 1,
            out_of: None,
        }
    }

    /// Structural checks that do not depend on the matches.
    pub fn validate(&self) -> Result<(), LocationError> {
        match *self {
            Self::First { offset, out_of } | Self::Last { offset, out_of } => {
                if offset == 0 {
                    return Err(LocationError::InvalidOffset { offset });
                }
                match out_of {
                    Some(count) if count < offset => {
                        Err(LocationError::InvalidOutOf { offset, count })
                    }
                    _ => Ok(()),
                }
            }
            Self::All {
                expected: Some(0),
            }
            | Self::Each {
                expected: Some(0),
            } => Err(LocationError::InvalidOutOf {
                offset: 1,
                count: 0,
            }),
            _ => Ok(()),
        }
    }

    /// Apply the cardinality to normalized matches.
    pub fn select(&self, matches: Vec<LocationRange>) -> Result<Selection, LocationError> {
        self.validate()?;
        let count = matches.len();
        if count == 0 {
            return Err(LocationError::NoMatch);
        }
        let expect = |expected: Option<usize>| match expected {
            Some(expected) if expected != count => {
                Err(LocationError::CountMismatch { expected, count })
            }
            _ => Ok(()),
        };
        let one = |index: usize, matches: Vec<LocationRange>| Selection {
            ranges: matches.into_iter().skip(index).take(1).collect(),
            each: false,
        };
        match *self {
            Self::Single if count == 1 => Ok(one(0, matches)),
            Self::Single => Err(LocationError::Ambiguous { count }),
            Self::First { offset, out_of } => {
                expect(out_of)?;
                if count < offset {
                    return Err(LocationError::NotEnough { offset, count });
                }
                Ok(one(offset - 1, matches))
            }
            Self::Last { offset, out_of } => {
                expect(out_of)?;
                if count < offset {
                    return Err(LocationError::NotEnough { offset, count });
                }
                Ok(one(count - offset, matches))
            }
            Self::All { expected } => {
                expect(expected)?;
                Ok(Selection {
                    ranges: matches,
                    each: false,
                })
            }
            Self::Each { expected } => {
                expect(expected)?;
                Ok(Selection {
                    ranges: matches,
                    each: true,
                })
            }
        }
    }
}

impl fmt::Display for LocationCardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let out_of = |f: &mut fmt::Formatter<'_>, out_of: Option<usize>| match out_of {
            Some(n) => write!(f, " out of {n}"),
            None => Ok(()),
        };
        match *self {
            Self::Single => f.write_str("single"),
            Self::First { offset, out_of: o } => {
                f.write_str("first")?;
                if offset != 1 {
                    write!(f, " +{offset}")?;
                }
                out_of(f, o)
            }
            Self::Last { offset, out_of: o } => {
                f.write_str("last")?;
                if offset != 1 {
                    write!(f, " -{offset}")?;
                }
                out_of(f, o)
            }
            Self::All { expected } => match expected {
                Some(n) => write!(f, "all {n}"),
                None => f.write_str("all"),
            },
            Self::Each { expected } => match expected {
                Some(n) => write!(f, "each {n}"),
                None => f.write_str("each"),
            },
        }
    }
}

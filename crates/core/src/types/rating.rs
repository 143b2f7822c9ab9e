//! Product rating type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The value is above the five-star maximum.
    #[error("rating must be between 0 and {max} (got {got})")]
    OutOfRange {
        /// Maximum allowed rating.
        max: u8,
        /// The rejected value.
        got: u8,
    },
}

/// Aggregate product rating, an integer number of stars out of five.
///
/// ## Examples
///
/// ```
/// use qkart_core::Rating;
///
/// assert!(Rating::new(4).is_ok());
/// assert!(Rating::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Highest possible rating.
    pub const MAX: u8 = 5;

    /// Create a rating, rejecting values above [`Rating::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] if `stars` exceeds five.
    pub const fn new(stars: u8) -> Result<Self, RatingError> {
        if stars > Self::MAX {
            return Err(RatingError::OutOfRange {
                max: Self::MAX,
                got: stars,
            });
        }
        Ok(Self(stars))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

use thiserror::Error;

/// The two broad kinds of failure a [`SkipList`](crate::SkipList) can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad construction parameters.
    InvalidArgument,
    /// A lane outside of the currently populated levels.
    OutOfRange,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipListError {
    #[error("invalid promotion probability {0}: must be between 0 and 1 inclusive")]
    InvalidProbability(f64),
    #[error("invalid max level {0}: must be greater than or equal to 0")]
    InvalidMaxLevel(i64),
    #[error("lane {lane} is out of range (min 0, max {current_level})")]
    OutOfRange { lane: i64, current_level: i64 },
}

impl SkipListError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SkipListError::InvalidProbability(_) | SkipListError::InvalidMaxLevel(_) => {
                ErrorKind::InvalidArgument
            }
            SkipListError::OutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }
}

pub type Result<T> = std::result::Result<T, SkipListError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            SkipListError::InvalidProbability(2.0).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            SkipListError::InvalidMaxLevel(-1).kind(),
            ErrorKind::InvalidArgument
        );
        let err = SkipListError::OutOfRange {
            lane: 3,
            current_level: -1,
        };
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(err.to_string(), "lane 3 is out of range (min 0, max -1)");
    }
}

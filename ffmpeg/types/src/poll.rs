/*!
    Backpressure signal shared by every pipeline stage.
*/

use crate::error::{Error, ErrorKind, Result};

/**
    Outcome of asking a stage for output.

    Failures travel in the surrounding [`Result`], so a `Poll` only ever
    describes normal operation:

    - `Produced` - the stage handed out one item.
    - `NeedMoreInput` - nothing is ready; feed the stage and ask again.
    - `Exhausted` - the stage was told about end of stream and has nothing left.

    Items are usually borrowed from a buffer owned by the stage, so they
    cannot outlive the next call on that stage.
*/
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub enum Poll<T> {
    Produced(T),
    NeedMoreInput,
    Exhausted,
}

impl<T> Poll<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Poll<U> {
        match self {
            Self::Produced(item) => Poll::Produced(f(item)),
            Self::NeedMoreInput => Poll::NeedMoreInput,
            Self::Exhausted => Poll::Exhausted,
        }
    }

    /**
        Absorb sentinel errors into the matching variant.

        End-of-stream becomes `Exhausted` and need-more-input becomes
        `NeedMoreInput`. Every other error is returned unchanged.
    */
    pub fn from_error(error: Error) -> Result<Self> {
        match error.kind() {
            ErrorKind::EndOfStream => Ok(Self::Exhausted),
            ErrorKind::NeedMoreInput => Ok(Self::NeedMoreInput),
            _ => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_error_absorbs_sentinels() {
        let eof = Error::new(ErrorKind::EndOfStream, -541478725, "read");
        assert_eq!(Poll::<()>::from_error(eof), Ok(Poll::Exhausted));

        let again = Error::new(ErrorKind::NeedMoreInput, -11, "receive");
        assert_eq!(Poll::<()>::from_error(again), Ok(Poll::NeedMoreInput));
    }

    #[test]
    fn from_error_propagates_failures() {
        let failure = Error::new(ErrorKind::EngineFailure, -1094995529, "decode");
        let result = Poll::<()>::from_error(failure.clone());
        assert_eq!(result, Err(failure));
    }

    #[test]
    fn map_keeps_variant() {
        assert_eq!(Poll::Produced(2).map(|n| n * 10), Poll::Produced(20));
        assert_eq!(Poll::<i32>::Exhausted.map(|n| n + 1), Poll::Exhausted);
        assert_eq!(Poll::<i32>::NeedMoreInput.map(|n| n + 1), Poll::NeedMoreInput);
    }
}

/*!
    Error types for the transform decoder crates.
*/

use std::fmt;

/**
    Error type for the transform decoder crates.

    The variants split into three groups:

    - permanent failures (`Unsupported`, `NegotiationFailed`, `External`),
      after which the decoding session must be torn down;
    - `OutOfMemory`, permanent for the failing call but leaving the
      session usable;
    - control-flow signals (`Again`, `EndOfStream`) that are part of the
      push/pull protocol rather than real errors.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// No transform mapping exists for the requested codec or subtype.
    Unsupported { message: String },
    /// Type negotiation with the transform did not converge.
    NegotiationFailed,
    /// Buffer allocation failed.
    OutOfMemory,
    /// An underlying transform or platform call failed.
    External { message: String },
    /// The transform cannot accept input or has no output ready; retry
    /// after the next successful pump cycle.
    Again,
    /// Draining completed and no more frames will be produced.
    EndOfStream,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { message } => write!(f, "unsupported: {message}"),
            Self::NegotiationFailed => write!(f, "format negotiation failed"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::External { message } => write!(f, "transform failure: {message}"),
            Self::Again => write!(f, "resource temporarily unavailable"),
            Self::EndOfStream => write!(f, "end of stream"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl DecodeError {
    /**
        Create an unsupported-codec error with the given message.
    */
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /**
        Create an external (transform/platform) error with the given
        diagnostic message.
    */
    pub fn external(message: impl Into<String>) -> Self {
        Self::External {
            message: message.into(),
        }
    }

    /**
        Returns true if this is the transient retry signal.
    */
    pub fn is_again(&self) -> bool {
        matches!(self, Self::Again)
    }

    /**
        Returns true if this is the end-of-stream signal.
    */
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /**
        Returns true if this error kind is fatal to the decoding
        session.
    */
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unsupported { .. } | Self::NegotiationFailed | Self::External { .. }
        )
    }
}

/**
    Result type alias for the transform decoder crates.
*/
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = DecodeError::unsupported("no subtype for codec");
        assert_eq!(format!("{e}"), "unsupported: no subtype for codec");

        let e = DecodeError::external("event source died");
        assert_eq!(format!("{e}"), "transform failure: event source died");

        assert_eq!(
            format!("{}", DecodeError::NegotiationFailed),
            "format negotiation failed"
        );
        assert_eq!(format!("{}", DecodeError::EndOfStream), "end of stream");
    }

    #[test]
    fn classification() {
        assert!(DecodeError::Again.is_again());
        assert!(DecodeError::EndOfStream.is_eof());
        assert!(!DecodeError::Again.is_fatal());
        assert!(!DecodeError::EndOfStream.is_fatal());
        assert!(!DecodeError::OutOfMemory.is_fatal());

        assert!(DecodeError::NegotiationFailed.is_fatal());
        assert!(DecodeError::external("x").is_fatal());
        assert!(DecodeError::unsupported("x").is_fatal());
    }

    #[test]
    fn errors_are_comparable() {
        assert_eq!(DecodeError::Again, DecodeError::Again);
        assert_ne!(DecodeError::Again, DecodeError::EndOfStream);
        assert_eq!(DecodeError::external("a"), DecodeError::external("a"));
    }
}

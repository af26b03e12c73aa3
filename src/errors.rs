use std::error::Error as StdError;

/// Possible errors when building and iterating structure manager stacks
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Got an invalid parameter value when constructing an adaptor
    InvalidParameter(String),
    /// A strict adaptor requested a cutoff larger than the cutoff already
    /// enforced by the manager below it
    CutoffTooLoose(String),
    /// A geometry query was made before any structure was loaded
    StructureNotLoaded(String),
    /// Requested clusters of an order the stack can not produce
    UnsupportedOrder(String),
    /// A property with the same name is already attached to this manager
    DuplicateProperty(String),
    /// A property was retrieved with a type, order or layer it was not
    /// created with
    PropertyTypeMismatch(String),
    /// Error while serializing/deserializing adaptor parameters
    Json(serde_json::Error),
    /// Exceptional cases inside the crate
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e)
            | Error::CutoffTooLoose(e)
            | Error::StructureNotLoaded(e)
            | Error::UnsupportedOrder(e)
            | Error::DuplicateProperty(e)
            | Error::PropertyTypeMismatch(e)
            | Error::Internal(e) => write!(f, "{}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::InvalidParameter(_)
            | Error::CutoffTooLoose(_)
            | Error::StructureNotLoaded(_)
            | Error::UnsupportedOrder(_)
            | Error::DuplicateProperty(_)
            | Error::PropertyTypeMismatch(_)
            | Error::Internal(_) => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}

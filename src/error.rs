use bincode::Error as BincodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmberError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] BincodeError),

    #[error("failed to decode data file for collection [{collection}]: {source}")]
    Deserialization {
        collection: String,
        #[source]
        source: BincodeError,
    },

    #[error("no collection found for collection id [{0}] in hot or cold storage")]
    CollectionNotFound(String),

    #[error("no value found for key [{key}] in collection [{collection}]")]
    KeyNotFound { collection: String, key: String },

    #[error("collection already exists with id [{0}] in hot storage")]
    CollectionAlreadyExists(String),

    #[error("invalid collection id [{0}]")]
    InvalidCollectionId(String),
}

impl EmberError {
    /// True for absence-class errors, so the transport can answer 404 instead
    /// of a blanket 500.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EmberError::CollectionNotFound(_) | EmberError::KeyNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EmberError>;

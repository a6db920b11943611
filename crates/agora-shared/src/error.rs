use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Malformed {kind} id: {value:?}")]
    Malformed { kind: &'static str, value: String },
}

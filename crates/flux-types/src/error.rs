use thiserror::Error;

#[derive(Error, Debug)]
pub enum FluxError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown quantity: {0}")]
    UnknownQuantity(String),

    #[error("Quantity '{0}' is not present in the data map")]
    MissingQuantity(String),

    #[error("Quantity '{0}' was already computed and cannot be overwritten")]
    DuplicateQuantity(String),

    #[error("Quantity '{name}' has shape {found}, expected {expected}")]
    ShapeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Transform was not built for derivative (dr={dr}, dt={dt}, dz={dz})")]
    UnsupportedDerivative { dr: u8, dt: u8, dz: u8 },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Quantity registry is inconsistent: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FluxResult<T> = Result<T, FluxError>;

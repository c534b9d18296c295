use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A snake tried to grow past its fixed body buffer.
    #[error("snake body capacity of {capacity} segments exceeded")]
    CapacityExceeded { capacity: usize },

    /// The bounds provider reported an unusable playable area. Callers skip the tick.
    #[error("invalid playable bounds {width}x{height}")]
    InvalidBounds { width: i32, height: i32 },

    #[error("invalid round configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::InvalidBounds { .. })
    }
}

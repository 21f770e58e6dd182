use thiserror::Error;

use crate::types::Shape;

pub type Result<T> = std::result::Result<T, PlacementError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("invalid surface: {reason}")]
    InvalidSurface { reason: String },

    #[error("invalid panel shape {shape}: height and width must be non-zero")]
    InvalidPanelShape { shape: Shape },

    #[error("search exceeded step budget of {budget} (after {steps} steps)")]
    ResourceExhausted { budget: u64, steps: u64 },
}

impl PlacementError {
    pub(crate) fn surface(reason: impl Into<String>) -> Self {
        Self::InvalidSurface {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = PlacementError::InvalidPanelShape {
            shape: Shape::new(0, 2),
        };
        assert_eq!(
            e.to_string(),
            "invalid panel shape 0x2: height and width must be non-zero"
        );
        let e = PlacementError::surface("negative offset");
        assert_eq!(e.to_string(), "invalid surface: negative offset");
        let e = PlacementError::ResourceExhausted {
            budget: 10,
            steps: 11,
        };
        assert!(e.to_string().contains("budget of 10"));
    }
}

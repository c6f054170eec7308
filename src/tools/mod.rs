//! Deterministic tools invoked by the agent outside the language model.

pub mod calculations;

pub use calculations::{
    CalculationError, CalculationResult, calculate_contribution_room,
};

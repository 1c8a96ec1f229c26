use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("fixed-point overflow")]
    Overflow,

    #[error("threshold constant {0} must be in (1000, 16000] thousandths")]
    InvalidThresholdConst(u128),
}

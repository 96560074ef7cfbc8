pub mod error;
pub mod identity;
pub mod rewrite;
pub mod round;

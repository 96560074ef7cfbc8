pub mod backend;
pub mod parse;
pub mod prompt;

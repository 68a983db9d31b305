pub mod generate;
pub mod mask;
pub mod prompt;

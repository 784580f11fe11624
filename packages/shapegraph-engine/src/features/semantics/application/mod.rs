pub mod applier;
pub mod interpreter;

pub use applier::Applier;
pub use interpreter::{AbstractInterpreter, ProgramPoint};

mod canonical;
mod coerce;
pub mod evaluator;
mod focus;
mod three_valued;

pub use evaluator::{eval_closed, evaluate};
pub use three_valued::ThreeValuedStructure;

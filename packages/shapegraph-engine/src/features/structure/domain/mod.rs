pub mod assignment;
pub mod constraint;
pub mod formula;

pub use assignment::Assignment;
pub use constraint::Constraint;
pub use formula::{Formula, Var};

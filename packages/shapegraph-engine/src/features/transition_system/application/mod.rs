mod interproc_ts;
mod method_ts;
mod program_ts;

pub use interproc_ts::InterProcTs;
pub use method_ts::MethodTs;
pub use program_ts::ProgramTs;

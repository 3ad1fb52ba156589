mod evaluate;

pub use evaluate::{EvaluationJob, EvaluationReport, RunReport};

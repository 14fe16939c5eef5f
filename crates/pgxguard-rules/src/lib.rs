//! pgxguard-rules — Drug→gene→phenotype rule table: document model, loading, and the
//! cached store shared by every assessment.

pub mod model;
pub mod store;

pub use model::{DrugRule, PhenotypeRule, RuleTable};
pub use store::RuleStore;

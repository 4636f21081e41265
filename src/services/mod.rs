pub mod catalog;
pub mod chatbot;
pub mod enrichment;
pub mod model;
pub mod providers;
pub mod ranking;
pub mod recommendations;

pub use catalog::Catalog;
pub use chatbot::ChatAgent;
pub use enrichment::Describer;
pub use model::{FactorModel, RatingModel};
pub use recommendations::Recommender;

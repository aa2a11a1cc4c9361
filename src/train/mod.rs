pub mod dispatcher;
pub mod reconcile;

pub use dispatcher::{TrainOptions, TrainingDispatcher};
pub use reconcile::{BatchSet, PaddingPolicy};

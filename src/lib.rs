pub mod config;
pub mod error;
pub mod housing;
pub mod logging;
pub mod model;
pub mod parsing;
pub mod split;

pub use config::ElmConfig;
pub use error::{ElmError, Result};
pub use model::elm::{Activation, Elm, ModelParameters};
pub use model::{Model, Predictions};
pub use parsing::{load_table, ClassSet, LabeledTable};
pub use split::{split_stratified, Split};

pub mod flows;
pub mod runs;

pub use crate::AppState;

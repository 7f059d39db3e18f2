//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod extract;
mod index;
mod list;
mod search;
mod transcribe;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use extract::run_extract;
pub use index::run_index;
pub use list::run_list;
pub use search::run_search;
pub use transcribe::run_transcribe;

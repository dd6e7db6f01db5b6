mod error;
mod readers;
mod util;

pub use error::AnnError;
pub use readers::{is_gzipped, open_store_reader};
pub use util::{handle_error_and_exit, Result};

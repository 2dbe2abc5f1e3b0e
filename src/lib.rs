pub mod cli;
pub mod collate;
pub mod config;
pub mod error;
pub mod history;
pub mod pager;
pub mod publish;
pub mod specfile;
pub mod ui;
pub mod visitors;

pub use error::{AutorelError, Result};

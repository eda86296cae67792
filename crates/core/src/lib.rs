pub mod config;
pub mod todo;

pub use config::Config;
pub use todo::Todo;

mod settings;

pub use settings::{Config, ServeConfig};

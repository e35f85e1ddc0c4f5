pub mod data;
pub mod defaults;
pub mod io;


pub use data::{Config, FontSize, RealtimeConfig, RecorderConfig, Theme};
pub use defaults::Endpoints;
pub use io::{ConfigError, ConfigFile};

pub mod config_io;

pub use config_io::{CONFIG_FILE, ConfigError, discover_config, load_config, read_config, set_value, write_config};

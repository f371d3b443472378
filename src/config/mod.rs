//! Configuration system
//!
//! Structures are declared in [`schemas`] with the `config_struct!` macro and
//! loaded from TOML by the helpers in [`utils`].

mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{
    get_config_clone, is_config_initialized, load_config, load_config_from_path,
    read_config_file, save_config, with_config, CONFIG_FILE_PATH,
};

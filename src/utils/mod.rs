pub mod environment;
pub mod files;
pub mod paths;

pub use environment::ProviderRoots;
pub use files::{created_time, file_stem, list_files, modified_time, read_json};
pub use paths::{
    decode_cwd, decode_path, encode_cwd, encode_path, encode_path_legacy, format_path_with_tilde,
    project_name, validate_id,
};

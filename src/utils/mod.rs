pub mod constants;
pub mod url_utils;

pub use constants::*;
pub use url_utils::{
    dedup_preserving_order, is_valid_url, load_url_file, normalize_url, registrable_suffix,
    resolve_link,
};

//! The configuration of conversions, given from environment variables and lazy
//! initialized when needed.

use std::ffi::OsStr;
use std::env;

use once_cell::sync::OnceCell;
use tracing::warn;


/// Environment variable bounding the depth of converted trees.
pub const MAX_DEPTH_VAR: &str = "NBT_BRIDGE_MAX_DEPTH";


/// Return the maximum depth of trees converted by the default converter, none if
/// unbounded.
///
/// To bound the depth, set `NBT_BRIDGE_MAX_DEPTH=<n>` with `n` a positive integer.
pub fn max_depth() -> Option<usize> {
    static ENV: OnceCell<Option<usize>> = OnceCell::new();
    *ENV.get_or_init(|| {
        let value = env::var_os(MAX_DEPTH_VAR)?;
        let depth = parse_max_depth(&value);
        if depth.is_none() {
            warn!("ignoring invalid {MAX_DEPTH_VAR} value: {value:?}");
        }
        depth
    })
}

fn parse_max_depth(value: &OsStr) -> Option<usize> {
    value.to_str()?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&depth| depth > 0)
}

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
/// Log directives used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,powchain_core=debug,tower_http=debug";

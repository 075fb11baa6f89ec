// ABOUTME: Versioned storage key derivation for per-domain store slots.
// ABOUTME: Keys are prefix + version + "//" + formatted context; bumping the version abandons old snapshots.

/// Schema version of persisted records. Bump when the record shape changes
/// incompatibly; snapshots under the old key are then never read again.
pub const STORE_STORAGE_VERSION: &str = "0.3";

pub const DEFAULT_STORAGE_PREFIX: &str = "wc@2:client:";

pub const STORAGE_KEY_SEPARATOR: &str = "//";

fn context_segments(context: &str) -> impl Iterator<Item = &str> {
    context
        .split(['/', ':'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

/// Normalize a store context into the name used inside its storage key.
/// `"client/Session"` becomes `"client:session"`.
pub fn format_storage_key_name(context: &str) -> String {
    context_segments(context)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(":")
}

/// Render a store context for diagnostics, e.g. `"client/session"` becomes
/// `"client session"`.
pub fn format_message_context(context: &str) -> String {
    context_segments(context).collect::<Vec<_>>().join(" ")
}

/// Derive the backend slot for a store instance.
pub fn storage_key(prefix: &str, version: &str, context: &str) -> String {
    format!(
        "{}{}{}{}",
        prefix,
        version,
        STORAGE_KEY_SEPARATOR,
        format_storage_key_name(context)
    )
}

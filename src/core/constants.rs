//! Shared constants used across the application

/// Backend address used when neither the config file nor the environment names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Environment variable overriding the configured backend address.
pub const BASE_URL_ENV: &str = "RESILIA_BASE_URL";

/// Environment variable consulted for passwords before prompting.
pub const PASSWORD_ENV: &str = "RESILIA_PASSWORD";

/// Environment variable holding the `tracing` filter directives.
pub const LOG_FILTER_ENV: &str = "RESILIA_LOG";

/// Storage key of the persisted session record.
pub const SESSION_KEY: &str = "resiliaUser";

/// Storage key of the cached conversation, removed together with the session.
pub const HISTORY_KEY: &str = "chatHistory";

/// Upper bound for profile photos uploaded as data URLs.
pub const MAX_PROFILE_PHOTO_BYTES: u64 = 2 * 1024 * 1024;

/// History titles longer than this are cut and suffixed with `...`.
pub const HISTORY_TITLE_MAX_CHARS: usize = 30;

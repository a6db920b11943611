/// Application name
pub const APP_NAME: &str = "Agora";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default header through which the upstream authenticator forwards the user id
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

/// Maximum request body size in bytes (1 MiB)
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

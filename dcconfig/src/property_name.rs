pub const SERVER_HOST_PROPERTY: &str = "server.host";
pub const SERVER_PORT_PROPERTY: &str = "server.port";
pub const LOG_CONFIG_FILE_PROPERTY: &str = "log4rs.config";

pub const DB_HOSTNAME_PROPERTY: &str = "db.hostname";
pub const DB_PORT_PROPERTY: &str = "db.port";
pub const DB_NAME_PROPERTY: &str = "db.name";
pub const DB_USER_PROPERTY: &str = "db.user";
pub const DB_PASSWORD_PROPERTY: &str = "db.password";
pub const DB_POOLSIZE_PROPERTY: &str = "db.pool_size";
pub const DB_SCHEMA_PROPERTY: &str = "db.schema";

pub const MAX_UPLOAD_SIZE_PROPERTY: &str = "app.max_upload_size";
pub const STATIC_DIR_PROPERTY: &str = "app.static_dir";

/// Environment variables overriding a property of the file
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", SERVER_HOST_PROPERTY),
    ("SERVER_PORT", SERVER_PORT_PROPERTY),
];

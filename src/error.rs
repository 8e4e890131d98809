// Error types shared by the library modules, plus the mapping from an
// error to the message shown to the user for a given theme action.

use thiserror::Error;

/// Errors returned by the theme API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("too many requests, gave up after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("failed to send request")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// Errors raised while resolving or persisting credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error(
        "Auth information not provided.\n\
         Run the command again using -d <domain> -k <key> -p <password>\n\n\
         or run `shopify-cli config -d <domain> -k <key> -p <password>` to save the \
         authentication information. This way you won't have to use the auth params every time.\n\n\
         To get more details on how to get the auth information, run:\n\
         \t$ shopify-cli config"
    )]
    Missing,

    #[error("could not access credentials file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("home directory could not be determined")]
    NoHome,
}

/// Errors raised by the asset synchronization routine.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Process aborted")]
    Aborted,

    #[error("Asset {key} does not exist in theme {theme}")]
    MissingAsset { key: String, theme: String },

    #[error("invalid asset key {0:?}")]
    InvalidKey(String),

    #[error("asset {0} has neither a value nor an attachment")]
    EmptyAsset(String),

    #[error("attachment of asset {key} is not valid base64")]
    Attachment {
        key: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("working directory {path} could not be prepared")]
    Workspace {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("theme kit `{command}` failed: {detail}")]
    Kit { command: String, detail: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Theme verbs, used to tailor error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Activate,
    Rename,
    Remove,
    Duplicate,
    Sync,
    Bootstrap,
    KitConfig,
}

/// Render the message shown for an error raised while running `action`.
pub fn describe(err: &anyhow::Error, action: Action) -> String {
    if let Some(CredentialsError::Missing) = err.downcast_ref::<CredentialsError>() {
        return CredentialsError::Missing.to_string();
    }

    let status = err
        .chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<ApiError>()
                .and_then(ApiError::status)
                .or_else(|| match cause.downcast_ref::<SyncError>() {
                    Some(SyncError::Api(api)) => api.status(),
                    _ => None,
                })
        });

    match (status, action) {
        (Some(404), _) => {
            "Theme not found. Try running `theme list` to see a list of themes available.".into()
        }
        (Some(403), Action::Remove) => "Theme cannot be removed. This might be because this theme \
             is active. If that's the case, activate another theme and try again."
            .into(),
        (Some(403), _) => "Operation forbidden.".into(),
        _ => format!("An error occurred: {err:#}"),
    }
}

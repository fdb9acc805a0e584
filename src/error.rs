/// Errors from the remote catalog and stats endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body was not the JSON shape we expect.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("Playlist is not loaded")]
    NotReady,

    #[error("Track index {index} is outside the playlist of {len} tracks")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failures inside the media engine thread.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Unable to fetch media: {0}")]
    Fetch(#[from] ApiError),

    #[error("Media stream failed: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Media loader stopped: {0}")]
    Loader(#[from] tokio::task::JoinError),

    #[error("Unable to decode media: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),

    #[error("No audio output: {0}")]
    Output(#[from] rodio::StreamError),

    #[error("Unable to open audio sink: {0}")]
    Sink(#[from] rodio::PlayError),
}

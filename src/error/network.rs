use thiserror::Error;

/// Transport-level failures: the request never produced an HTTP response.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// 无法建立连接
    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    /// 请求超时
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// 其他传输层错误
    #[error("Network request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl NetworkError {
    /// The underlying reqwest error.
    #[must_use]
    pub const fn inner(&self) -> &reqwest::Error {
        match self {
            Self::Connect(err) | Self::Timeout(err) | Self::Transport(err) => err,
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Transport(err)
        }
    }
}

use thiserror::Error;

/// Why a load attempt failed. The first failure wins and nothing is retried.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Network failure or a non-success HTTP status.
    #[error("スプレッドシートの取得に失敗しました (Status: {}): {reason}", status_label(.status))]
    Fetch { status: Option<u16>, reason: String },

    /// The CSV text could not be tokenized.
    #[error("スプレッドシートの解析中にエラーが発生しました: {0}")]
    Parse(String),

    /// Extraction or normalization failed.
    #[error("データの処理中にエラーが発生しました: {0}")]
    Processing(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "network".to_string(),
    }
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Fetch { .. } => "fetch",
            LoadError::Parse(_) => "parse",
            LoadError::Processing(_) => "processing",
        }
    }
}

use std::time::Duration;

use thiserror::Error;

/// Chrome起動失敗時に付ける対処方法
pub const BROWSER_LAUNCH_HINT: &str =
    "Chrome がインストールされているか、Chrome とドライバのバージョンが一致しているか確認してください";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("日付形式が不正です: {input} (YYYY-MM-DD で指定してください)")]
    InvalidDate { input: String },

    #[error("開始日は終了日以前である必要があります: start={start}, end={end}")]
    InvalidRange { start: String, end: String },

    #[error("ブラウザ起動エラー: {0} ({hint})", hint = BROWSER_LAUNCH_HINT)]
    BrowserLaunch(String),

    #[error("ブラウザ操作エラー: {0}")]
    BrowserSession(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTPステータスエラー: {status} ({url})")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("タイムアウト: {after:?} 応答がありません ({url})")]
    Timeout { after: Duration, url: String },

    #[error("URL生成エラー: {0}")]
    Url(#[from] url::ParseError),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}

impl ReportError {
    /// 入力値エラー（ネットワークアクセス前に検出されるもの）か
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidDate { .. } | ReportError::InvalidRange { .. }
        )
    }
}

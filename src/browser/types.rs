//! ブラウザセッション関連の型定義

use std::path::PathBuf;

use chromiumoxide::cdp::browser_protocol::network::Cookie;

/// Chromeプロファイルの選択（いずれか一つ）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfileMode {
    /// 普段使いのChromeプロファイルに接続（ログイン状態を再利用）
    RealProfile { profile_name: String },
    /// 指定ディレクトリの専用プロファイル（実行間でログインが残る）
    Persistent { dir: PathBuf },
    /// 使い捨てプロファイル（終了時に削除、毎回ログインが必要）
    #[default]
    Ephemeral,
}

impl ProfileMode {
    /// CLIフラグから選択
    pub fn from_flags(
        use_real_profile: bool,
        profile_name: impl Into<String>,
        persist_dir: Option<PathBuf>,
    ) -> Self {
        if use_real_profile {
            ProfileMode::RealProfile {
                profile_name: profile_name.into(),
            }
        } else if let Some(dir) = persist_dir {
            ProfileMode::Persistent { dir }
        } else {
            ProfileMode::Ephemeral
        }
    }

    /// `--profile-directory` に渡す名前
    pub fn profile_directory(&self) -> &str {
        match self {
            ProfileMode::RealProfile { profile_name } => profile_name,
            _ => "Default",
        }
    }
}

/// ブラウザから取り出したクッキー（HTTPクライアントへの受け渡し用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl BrowserCookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
        }
    }
}

impl From<Cookie> for BrowserCookie {
    fn from(c: Cookie) -> Self {
        let path = if c.path.is_empty() {
            "/".to_string()
        } else {
            c.path
        };
        Self {
            name: c.name,
            value: c.value,
            domain: c.domain,
            path,
        }
    }
}

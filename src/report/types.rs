//! レポートダウンロード関連の型定義

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// サービスID指定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServiceIds {
    /// 未指定（設定の既定IDを使う）
    #[default]
    Default,
    Single(String),
    List(Vec<String>),
}

impl ServiceIds {
    /// カンマ区切り文字列から作成（空要素は除く）
    pub fn from_csv(input: Option<&str>) -> Self {
        let ids: Vec<String> = input
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if ids.is_empty() {
            ServiceIds::Default
        } else {
            ServiceIds::List(ids)
        }
    }

    /// カンマ区切りに正規化（空なら既定値）
    pub fn normalize(&self, default: &str) -> String {
        let joined = match self {
            ServiceIds::Default => String::new(),
            ServiceIds::Single(id) => id.clone(),
            ServiceIds::List(ids) => ids.join(","),
        };

        if joined.is_empty() {
            default.to_string()
        } else {
            joined
        }
    }
}

impl From<Vec<String>> for ServiceIds {
    fn from(ids: Vec<String>) -> Self {
        ServiceIds::List(ids)
    }
}

impl From<&str> for ServiceIds {
    fn from(id: &str) -> Self {
        ServiceIds::Single(id.to_string())
    }
}

impl<T: Into<ServiceIds>> From<Option<T>> for ServiceIds {
    fn from(ids: Option<T>) -> Self {
        ids.map(Into::into).unwrap_or_default()
    }
}

/// 解決済みのレポート要求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub cus_id: u32,
    pub pro_id: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// 開始日のローカル0時（エポックミリ秒）
    pub start_ts: i64,
    /// 終了日のローカル0時（エポックミリ秒）
    pub end_ts: i64,
    pub svc_ids: String,
}

impl ReportQuery {
    /// エンドポイントのクエリパラメータ（順序固定）
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("cusId", self.cus_id.to_string()),
            ("proId", self.pro_id.to_string()),
            ("stcName", String::new()),
            ("date", format!("{},{}", self.start_ts, self.end_ts)),
            ("pn", String::new()),
            ("pmoId", String::new()),
            ("svc_id", self.svc_ids.clone()),
            ("svcNow_id", String::new()),
            ("acc_id", String::new()),
            ("type", "0".to_string()),
        ]
    }
}

/// 取得できなかった理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// ログインページへリダイレクトされた
    LoginRedirect { final_url: String, debug_path: PathBuf },
    /// HTML が返ってきた（エラーページ・ログインページ）
    HtmlBody { debug_path: PathBuf },
    /// 保存したファイルが Excel 形式ではない（ファイルは残す）
    InvalidSignature { path: PathBuf },
    /// 保存したファイルを読み返せなかった
    Unreadable { path: PathBuf },
}

impl UnavailableReason {
    /// 調査用に残したファイル
    pub fn artifact(&self) -> &Path {
        match self {
            UnavailableReason::LoginRedirect { debug_path, .. } => debug_path,
            UnavailableReason::HtmlBody { debug_path } => debug_path,
            UnavailableReason::InvalidSignature { path } => path,
            UnavailableReason::Unreadable { path } => path,
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::LoginRedirect {
                final_url,
                debug_path,
            } => write!(
                f,
                "redirected to login ({}); HTML saved to {}",
                final_url,
                debug_path.display()
            ),
            UnavailableReason::HtmlBody { debug_path } => write!(
                f,
                "server returned HTML (likely login or error page); saved to {}",
                debug_path.display()
            ),
            UnavailableReason::InvalidSignature { path } => write!(
                f,
                "{} does not look like an Excel file (signature check failed)",
                path.display()
            ),
            UnavailableReason::Unreadable { path } => write!(
                f,
                "could not read back {} for signature check",
                path.display()
            ),
        }
    }
}

/// ダウンロード結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded {
        path: PathBuf,
        bytes: u64,
        content_type: Option<String>,
    },
    Unavailable(UnavailableReason),
}

impl FetchOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FetchOutcome::Downloaded { path, .. } => Some(path),
            FetchOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_downloaded(&self) -> bool {
        matches!(self, FetchOutcome::Downloaded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_IDS: &str = "879,898,1145";

    #[test]
    fn test_normalize_list() {
        let ids = ServiceIds::from(vec!["1".to_string(), "2".to_string(), "3".to_string()]);
        assert_eq!(ids.normalize(DEFAULT_IDS), "1,2,3");
    }

    #[test]
    fn test_normalize_absent_uses_default() {
        assert_eq!(ServiceIds::Default.normalize(DEFAULT_IDS), DEFAULT_IDS);
        assert_eq!(
            ServiceIds::from(None::<Vec<String>>).normalize(DEFAULT_IDS),
            DEFAULT_IDS
        );
    }

    #[test]
    fn test_normalize_scalar() {
        assert_eq!(ServiceIds::from("42").normalize(DEFAULT_IDS), "42");
    }

    #[test]
    fn test_normalize_empty_falls_back() {
        assert_eq!(ServiceIds::List(vec![]).normalize(DEFAULT_IDS), DEFAULT_IDS);
        assert_eq!(ServiceIds::from("").normalize(DEFAULT_IDS), DEFAULT_IDS);
    }

    #[test]
    fn test_from_csv_drops_blanks() {
        assert_eq!(
            ServiceIds::from_csv(Some(" 1, ,2,3 ,")),
            ServiceIds::List(vec!["1".into(), "2".into(), "3".into()])
        );
        assert_eq!(ServiceIds::from_csv(Some(" , ")), ServiceIds::Default);
        assert_eq!(ServiceIds::from_csv(None), ServiceIds::Default);
    }

    #[test]
    fn test_outcome_path() {
        let ok = FetchOutcome::Downloaded {
            path: PathBuf::from("a.xlsx"),
            bytes: 10,
            content_type: None,
        };
        assert_eq!(ok.path(), Some(Path::new("a.xlsx")));
        assert!(ok.is_downloaded());

        let bad = FetchOutcome::Unavailable(UnavailableReason::HtmlBody {
            debug_path: PathBuf::from("a_debug.html"),
        });
        assert!(bad.path().is_none());
        assert!(!bad.is_downloaded());
    }

    #[test]
    fn test_unavailable_artifact() {
        let redirect = UnavailableReason::LoginRedirect {
            final_url: "https://www.wareconn.com/login".into(),
            debug_path: PathBuf::from("r.xlsx_debug.html"),
        };
        assert_eq!(redirect.artifact(), Path::new("r.xlsx_debug.html"));

        let invalid = UnavailableReason::InvalidSignature {
            path: PathBuf::from("r.xlsx"),
        };
        assert_eq!(invalid.artifact(), Path::new("r.xlsx"));
        assert!(invalid.to_string().contains("r.xlsx"));
    }
}

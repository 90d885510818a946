//! レポート(Excel)ダウンロードモジュール
//!
//! 日付範囲とサービスIDからリクエストURLを組み立て、セッションのクッキーで取得し、
//! レスポンスを判定して保存する。

mod fetcher;
mod query;
mod response;
mod types;

pub use fetcher::ReportFetcher;
pub use query::{
    build_report_url, date_str_to_timestamp_ms, date_to_timestamp_ms, parse_date,
    resolve_date_range, restore_literal_commas,
};
pub use response::{detect_signature, filename_from_content_disposition, FileSignature};
pub use types::{FetchOutcome, ReportQuery, ServiceIds, UnavailableReason};

//! レスポンスの判定（ログインリダイレクト・ファイル名・シグネチャ）

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::io::AsyncReadExt;

/// XLSX（ZIPコンテナ）
const XLSX_SIGNATURE: &[u8] = b"PK\x03\x04";
/// XLS（OLE複合ファイル）
const XLS_SIGNATURE: &[u8] = b"\xD0\xCF\x11\xE0";
const SIGNATURE_LEN: u64 = 8;

const LOGIN_DEBUG_BASE: &str = "wareconn_download";
const DEBUG_SUFFIX: &str = "_debug.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSignature {
    Xlsx,
    Xls,
}

pub fn detect_signature(head: &[u8]) -> Option<FileSignature> {
    if head.starts_with(XLSX_SIGNATURE) {
        Some(FileSignature::Xlsx)
    } else if head.starts_with(XLS_SIGNATURE) {
        Some(FileSignature::Xls)
    } else {
        None
    }
}

/// 保存済みファイルの先頭を読み返してシグネチャを判定
pub async fn read_signature(path: &Path) -> std::io::Result<Option<FileSignature>> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::with_capacity(SIGNATURE_LEN as usize);
    file.take(SIGNATURE_LEN).read_to_end(&mut head).await?;
    Ok(detect_signature(&head))
}

/// 最終URLがログインページか（大文字小文字は区別しない）
pub fn is_login_redirect(final_url: &str, marker: &str) -> bool {
    final_url
        .to_ascii_lowercase()
        .contains(&marker.to_ascii_lowercase())
}

pub fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

/// Content-Disposition からファイル名を取り出す
///
/// `filename=` の後ろだけを見る簡易版。ディレクトリ部分は捨てる。
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let (_, raw) = header.rsplit_once("filename=")?;
    let trimmed = raw.trim_matches(|c: char| c == '"' || c == ';' || c == ' ');
    let name = trimmed
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

pub fn default_filename(now: DateTime<Local>) -> String {
    format!("wareconn_data_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// 保存ファイル名を決める（指定 > サーバー提案 > タイムスタンプ）
pub fn resolve_output_name(
    explicit: Option<&str>,
    content_disposition: Option<&str>,
    now: DateTime<Local>,
) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| content_disposition.and_then(filename_from_content_disposition))
        .unwrap_or_else(|| default_filename(now))
}

/// 拡張子を `_debug.html` に置き換えたパス
pub fn debug_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| LOGIN_DEBUG_BASE.to_string());
    path.with_file_name(format!("{}{}", stem, DEBUG_SUFFIX))
}

/// ログインリダイレクト時のデバッグファイル
///
/// ファイル名決定前なので指定名のみ使い、拡張子は残したまま `_debug.html` を付ける。
pub fn login_debug_path(output_dir: &Path, explicit: Option<&str>) -> PathBuf {
    output_dir.join(format!(
        "{}{}",
        explicit.unwrap_or(LOGIN_DEBUG_BASE),
        DEBUG_SUFFIX
    ))
}

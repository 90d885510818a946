//! ブラウザセッション起動モジュール
//!
//! Chrome を起動してユーザーにログインしてもらい、ログイン済みのクッキーを
//! HTTPクライアントへ受け渡す。ダウンロード処理とはクッキーの受け渡しだけでつながる。

mod bootstrapper;
mod types;

pub use bootstrapper::{real_chrome_user_data_dir, ChromeBootstrapper};
pub use types::{BrowserCookie, ProfileMode};

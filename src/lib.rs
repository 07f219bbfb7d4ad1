//! dired - ディレクトリを編集可能なテキストとして扱うファイラー
//!
//! ディレクトリの内容を固定幅の行として描画し、
//! 行の編集・選択・コマンドからファイル操作を行う

// コアモジュール
pub mod config;
pub mod error;
pub mod logging;

// データ層
pub mod file;
pub mod identity;
pub mod listing;
pub mod location;

// ロジック層
pub mod input;
pub mod view;

// 表示層
pub mod app;
pub mod frontend;
pub mod ui;

// 公開API
pub use app::{App, CliArgs};
pub use error::{DiredError, FormatError, Result};
pub use frontend::TuiApplication;
pub use identity::IdentityResolver;
pub use listing::{Entry, EntryKind, ListingBuffer, ModifiedAt};
pub use location::{LocationCodec, Locator};
pub use view::{Cursor, ViewController};

//! ビュー層
//!
//! ディレクトリビューの状態遷移と変更通知

pub mod controller;
pub mod notifier;

pub use controller::{
    CreateFileOutcome, Cursor, DeleteOutcome, EnterOutcome, LineRange, ViewController, ViewOptions,
};
pub use notifier::{ChangeNotifier, ChannelListener, ListenerId, ListingEvent, ListingListener};

//! UIモジュール
//!
//! ratatuiベースの描画部品

pub mod listing;
pub mod minibuffer;

pub use listing::{adjust_scroll, LineKind, ListingScreen};
pub use minibuffer::{MinibufferRenderer, MinibufferState};

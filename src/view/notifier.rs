//! 変更通知
//!
//! リスティングの内容が変わるたびに表示側へイベントを配信する

use crate::location::Locator;
use std::collections::BTreeMap;
use std::sync::mpsc;

/// リスナーの一意識別子
pub type ListenerId = usize;

/// リスティングの変更イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEvent {
    /// ディレクトリを開いた（再読み込みを含む）
    Opened { locator: Locator },
    /// 選択状態が変わった（一回の操作につき一度だけ通知）
    SelectionChanged { locator: Locator, lines: usize },
    /// テキストが手編集された
    Edited { locator: Locator },
    /// ビューを閉じた
    Closed,
}

impl ListingEvent {
    /// 対象のロケーター
    pub fn locator(&self) -> Option<&Locator> {
        match self {
            ListingEvent::Opened { locator }
            | ListingEvent::SelectionChanged { locator, .. }
            | ListingEvent::Edited { locator } => Some(locator),
            ListingEvent::Closed => None,
        }
    }
}

/// 変更リスナー
pub trait ListingListener {
    fn on_change(&mut self, event: &ListingEvent);
}

/// イベントをチャネルへ転送するリスナー
pub struct ChannelListener {
    sender: mpsc::Sender<ListingEvent>,
}

impl ChannelListener {
    /// リスナーと受信側を作る
    pub fn new() -> (Self, mpsc::Receiver<ListingEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl ListingListener for ChannelListener {
    fn on_change(&mut self, event: &ListingEvent) {
        if self.sender.send(event.clone()).is_err() {
            log::debug!("listing event dropped: receiver closed");
        }
    }
}

/// 変更通知の配信
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: BTreeMap<ListenerId, Box<dyn ListingListener>>,
    next_id: ListenerId,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// リスナーを登録
    pub fn add_listener(&mut self, listener: Box<dyn ListingListener>) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    /// リスナーを削除
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// 全リスナーへ登録順に配信
    pub fn notify(&mut self, event: ListingEvent) {
        for listener in self.listeners.values_mut() {
            listener.on_change(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

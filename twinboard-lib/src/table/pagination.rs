//! Pagination bridge between the table and whoever fetches pages.
//!
//! The table never fetches or computes pages. It only forwards a user's
//! next/previous click to the bridge, and only while the caller says such a
//! page exists.

use tokio::sync::mpsc;

use super::settings::TableSettings;

/// Receives page-advance requests from the table.
pub trait PaginationBridge: Send {
    fn load_next_page(&mut self);
    fn load_previous_page(&mut self);
}

/// Bridge built from two closures.
pub struct CallbackBridge<N, P> {
    next: N,
    previous: P,
}

/// Creates a bridge from a next-page and a previous-page callback.
pub fn callbacks<N, P>(next: N, previous: P) -> CallbackBridge<N, P>
where
    N: FnMut() + Send,
    P: FnMut() + Send,
{
    CallbackBridge { next, previous }
}

impl<N, P> PaginationBridge for CallbackBridge<N, P>
where
    N: FnMut() + Send,
    P: FnMut() + Send,
{
    fn load_next_page(&mut self) {
        (self.next)()
    }

    fn load_previous_page(&mut self) {
        (self.previous)()
    }
}

/// A page-advance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageIntent {
    Next,
    Previous,
}

/// Bridge that forwards requests over a channel to an async fetch loop.
#[derive(Debug, Clone)]
pub struct ChannelBridge {
    tx: mpsc::UnboundedSender<PageIntent>,
}

impl ChannelBridge {
    /// Creates the bridge and the receiving end for the fetch loop.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PageIntent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, intent: PageIntent) {
        if self.tx.send(intent).is_err() {
            log::debug!("Page request {:?} dropped: fetch loop has stopped", intent);
        }
    }
}

impl PaginationBridge for ChannelBridge {
    fn load_next_page(&mut self) {
        self.send(PageIntent::Next);
    }

    fn load_previous_page(&mut self) {
        self.send(PageIntent::Previous);
    }
}

/// Advisory page position plus the caller-owned capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page_index: usize,
    pub page_size: usize,
    pub can_load_next: bool,
    pub can_load_previous: bool,
}

impl PaginationState {
    pub fn new(settings: &TableSettings, can_load_next: bool, can_load_previous: bool) -> Self {
        Self {
            page_index: settings.page_index(),
            page_size: settings.page_size(),
            can_load_next,
            can_load_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn test_callback_bridge_calls_closures() {
        let next = Arc::new(AtomicUsize::new(0));
        let previous = Arc::new(AtomicUsize::new(0));
        let (n, p) = (next.clone(), previous.clone());
        let mut bridge = callbacks(
            move || {
                n.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                p.fetch_add(1, Ordering::SeqCst);
            },
        );
        bridge.load_next_page();
        bridge.load_next_page();
        bridge.load_previous_page();
        assert_eq!(next.load(Ordering::SeqCst), 2);
        assert_eq!(previous.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channel_bridge_forwards_intents() {
        let (mut bridge, mut rx) = ChannelBridge::new();
        bridge.load_previous_page();
        bridge.load_next_page();
        assert_eq!(rx.try_recv().ok(), Some(PageIntent::Previous));
        assert_eq!(rx.try_recv().ok(), Some(PageIntent::Next));
        drop(rx);
        bridge.load_next_page();
    }
}

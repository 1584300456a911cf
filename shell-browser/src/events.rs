use std::cell::RefCell;
use std::collections::VecDeque;

use crate::item_id::ItemIdList;
use crate::namespace::FolderHandle;

/// Observable events raised by a [`ShellBrowser`](crate::ShellBrowser).
///
/// Drained with [`ShellBrowser::take_events`](crate::ShellBrowser::take_events).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrowserEvent {
    /// A new folder was committed.
    NavigationComplete {
        /// The committed folder.
        folder: ItemIdList,
    },
    /// A navigation failed; the previous folder is still current.
    NavigationFailed {
        /// Failure description.
        message: String,
    },
    /// The host view reported a selection change.
    SelectionChanged,
    /// The host view finished refreshing its item list.
    ListRefreshed,
    /// A failed navigation tore the view down and it could not be rebuilt for
    /// the still-current folder. Navigating again rebuilds it.
    ViewLost {
        /// The current folder, now shown without a view.
        folder: ItemIdList,
        /// Why the rebuild failed.
        message: String,
    },
    /// Device access was declined; the view shows placeholder text.
    ViewCancelled {
        /// The committed folder.
        folder: ItemIdList,
        /// The placeholder text shown.
        message: String,
    },
}

/// Most events kept between two [`take_events`](crate::ShellBrowser::take_events)
/// calls. Once full, the oldest event is dropped for each new one.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Queue shared between the browser and its callback surface.
#[derive(Debug)]
pub(crate) struct EventQueue {
    events: RefCell<VecDeque<BrowserEvent>>,
    capacity: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }
}

impl EventQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            events: RefCell::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push(&self, event: BrowserEvent) {
        let mut events = self.events.borrow_mut();
        if events.len() == self.capacity {
            let _dropped = events.pop_front();
            browser_trace!(dropped = ?_dropped, "event queue full");
        }
        events.push_back(event);
    }

    pub(crate) fn take(&self) -> Vec<BrowserEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.events.borrow().len()
    }
}

/// Token returned by [`ShellBrowser::on_navigation_complete`](crate::ShellBrowser::on_navigation_complete).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&FolderHandle)>;

/// Navigation-complete subscribers, notified in subscription order.
#[derive(Default)]
pub(crate) struct NavigationListeners {
    next: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

impl NavigationListeners {
    pub(crate) fn add(&mut self, listener: Listener) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn notify(&mut self, folder: &FolderHandle) {
        for (_, listener) in &mut self.listeners {
            listener(folder);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::MemoryNamespace;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn queue_drains_in_order() {
        let queue = EventQueue::default();
        queue.push(BrowserEvent::SelectionChanged);
        queue.push(BrowserEvent::ListRefreshed);
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.take(),
            vec![BrowserEvent::SelectionChanged, BrowserEvent::ListRefreshed]
        );
        assert!(queue.take().is_empty());
    }

    #[test]
    fn full_queue_drops_oldest() {
        let queue = EventQueue::with_capacity(2);
        queue.push(BrowserEvent::SelectionChanged);
        queue.push(BrowserEvent::ListRefreshed);
        queue.push(BrowserEvent::NavigationFailed {
            message: "denied".into(),
        });
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.take(),
            vec![
                BrowserEvent::ListRefreshed,
                BrowserEvent::NavigationFailed {
                    message: "denied".into()
                },
            ]
        );
    }

    #[test]
    fn removed_listeners_are_not_called() {
        let ns = MemoryNamespace::new("Desktop");
        let folder = FolderHandle::bind(&ns, ItemIdList::root().into()).unwrap();
        let calls = Rc::new(Cell::new(0));

        let mut listeners = NavigationListeners::default();
        let first = {
            let calls = Rc::clone(&calls);
            listeners.add(Box::new(move |_: &FolderHandle| calls.set(calls.get() + 1)))
        };
        let second = {
            let calls = Rc::clone(&calls);
            listeners.add(Box::new(move |_: &FolderHandle| calls.set(calls.get() + 10)))
        };
        assert_ne!(first, second);

        listeners.notify(&folder);
        assert_eq!(calls.get(), 11);
        assert!(listeners.remove(second));
        assert!(!listeners.remove(second));
        listeners.notify(&folder);
        assert_eq!(calls.get(), 12);
    }
}

/*!
    Bounded FIFO queues connecting the pipeline stages.
*/

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct QueueInner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/**
    A FIFO queue with cooperative shutdown.

    Producers never block: back-pressure is enforced by the caller checking
    `len()` against its budget and dropping, not by the queue itself.
    Consumers block in `pop` until an item arrives or the queue is closed.
*/
pub struct MediaQueue<T> {
    inner: Mutex<QueueInner<T>>,
    not_empty: Condvar,
}

impl<T> MediaQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    /**
        Append an item. Items pushed after `close` are discarded.
    */
    pub fn push(&self, item: T) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return;
        }
        inner.items.push_back(item);
        self.not_empty.notify_one();
    }

    /**
        Remove and return the oldest item, blocking while the queue is empty.

        Returns `None` once the queue has been closed and drained, or on a
        wake-up that finds the queue empty; callers loop.
    */
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();

        while inner.items.is_empty() && !inner.closed {
            inner = self.not_empty.wait(inner).unwrap();
        }

        inner.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().items.is_empty()
    }

    /**
        Close the queue: wakes every waiter, and subsequent `pop` calls
        return `None` as soon as the backlog is drained.
    */
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        self.not_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }
}

impl<T> Default for MediaQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn pop_is_fifo() {
        let queue = MediaQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
    }

    #[test]
    fn close_wakes_blocked_pop() {
        let queue = Arc::new(MediaQueue::<u32>::new());

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        // Give the waiter time to block.
        thread::sleep(Duration::from_millis(50));
        queue.close();

        assert_eq!(waiter.join().unwrap(), None);
    }

    #[test]
    fn close_drains_backlog_before_returning_none() {
        let queue = MediaQueue::new();
        queue.push("a");
        queue.close();

        assert_eq!(queue.pop(), Some("a"));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn push_after_close_is_discarded() {
        let queue = MediaQueue::new();
        queue.close();
        queue.push(1);

        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}

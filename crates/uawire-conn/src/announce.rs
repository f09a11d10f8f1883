use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

use tracing::{debug, warn};
use uawire_edf::EdfData;

/// Receives announcement trees for a subscribed kind.
pub trait AnnounceHandler: Send + Sync {
    fn announce(&self, tree: EdfData);
}

impl<F> AnnounceHandler for F
where
    F: Fn(EdfData) + Send + Sync,
{
    fn announce(&self, tree: EdfData) {
        self(tree)
    }
}

type HandlerMap = RwLock<HashMap<String, Arc<dyn AnnounceHandler>>>;

/// Fans announcements out to subscribed handlers.
///
/// Dispatch happens on one dedicated thread fed by a bounded queue, so
/// handlers observe announcements in stream order and a slow handler
/// back-pressures the publisher instead of spawning unbounded work. A
/// handler that panics stops the router; remaining announcements are
/// dropped. Dropping the router drains the queue, then joins the thread.
pub struct AnnounceRouter {
    handlers: Arc<HandlerMap>,
    queue: Option<SyncSender<EdfData>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AnnounceRouter {
    /// Start a router whose queue holds up to `queue_depth` announcements.
    pub fn new(queue_depth: usize) -> Self {
        let (tx, rx) = sync_channel::<EdfData>(queue_depth);
        let handlers: Arc<HandlerMap> = Arc::new(RwLock::new(HashMap::new()));

        let worker_handlers = Arc::clone(&handlers);
        let worker = thread::spawn(move || {
            for tree in rx {
                dispatch(&worker_handlers, tree);
            }
        });

        Self {
            handlers,
            queue: Some(tx),
            worker: Some(worker),
        }
    }

    /// Register `handler` for announcements whose value equals `kind`.
    ///
    /// Kinds match exactly (case-sensitive). Subscribing a kind again
    /// replaces the previous handler.
    pub fn subscribe(&self, kind: impl Into<String>, handler: Arc<dyn AnnounceHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind.into(), handler);
    }

    /// Queue an announcement for dispatch, blocking while the queue is full.
    pub fn publish(&self, tree: EdfData) {
        if let Some(queue) = &self.queue {
            if queue.send(tree).is_err() {
                debug!("announcement router stopped; dropping announcement");
            }
        }
    }
}

impl Drop for AnnounceRouter {
    fn drop(&mut self) {
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn dispatch(handlers: &HandlerMap, tree: EdfData) {
    let kind = match tree.string_value() {
        Ok(kind) => kind.to_string(),
        Err(err) => {
            warn!(error = %err, "dropping announcement without string value");
            return;
        }
    };

    let handler = handlers
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&kind)
        .cloned();

    match handler {
        Some(handler) => handler.announce(tree),
        None => warn!(kind = %kind, "no handler for announcement"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn dispatches_matching_kind() {
        let router = AnnounceRouter::new(8);
        let (tx, rx) = mpsc::channel();
        router.subscribe(
            "user_on",
            Arc::new(move |tree: EdfData| {
                tx.send(tree).unwrap();
            }),
        );

        router.publish(EdfData::string("announce", "user_on").with_string("name", "brian"));

        let tree = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(tree.string_value().unwrap(), "user_on");
        assert_eq!(tree.child("name").unwrap().string_value().unwrap(), "brian");
    }

    #[test]
    fn resubscribe_replaces_handler() {
        let router = AnnounceRouter::new(8);
        let (first_tx, first_rx) = mpsc::channel();
        let (second_tx, second_rx) = mpsc::channel();

        router.subscribe(
            "user_on",
            Arc::new(move |tree: EdfData| {
                first_tx.send(tree).unwrap();
            }),
        );
        router.subscribe(
            "user_on",
            Arc::new(move |tree: EdfData| {
                second_tx.send(tree).unwrap();
            }),
        );

        router.publish(EdfData::string("announce", "user_on"));

        assert!(second_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert!(first_rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn kinds_are_case_sensitive() {
        let router = AnnounceRouter::new(8);
        let (tx, rx) = mpsc::channel();
        router.subscribe(
            "User_On",
            Arc::new(move |tree: EdfData| {
                tx.send(tree).unwrap();
            }),
        );

        router.publish(EdfData::string("announce", "user_on"));
        router.publish(EdfData::string("announce", "User_On"));

        let tree = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(tree.string_value().unwrap(), "User_On");
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn preserves_publish_order() {
        let router = AnnounceRouter::new(4);
        let seen: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        router.subscribe(
            "tick",
            Arc::new(move |tree: EdfData| {
                let n = tree.child("n").unwrap().integer_value().unwrap();
                sink.lock().unwrap().push(n);
            }),
        );

        for n in 0..16 {
            router.publish(EdfData::string("announce", "tick").with_integer("n", n));
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        while seen.lock().unwrap().len() < 16 {
            assert!(Instant::now() < deadline, "announcements not delivered");
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(*seen.lock().unwrap(), (0..16).collect::<Vec<i32>>());
    }

    #[test]
    fn unknown_kind_is_dropped() {
        let router = AnnounceRouter::new(8);
        let (tx, rx) = mpsc::channel();
        router.subscribe(
            "known",
            Arc::new(move |tree: EdfData| {
                tx.send(tree).unwrap();
            }),
        );

        router.publish(EdfData::string("announce", "nobody_listens"));
        router.publish(EdfData::string("announce", "known"));

        let tree = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(tree.string_value().unwrap(), "known");
    }

    #[test]
    fn announcement_without_string_value_is_dropped() {
        let router = AnnounceRouter::new(8);
        let (tx, rx) = mpsc::channel();
        router.subscribe(
            "known",
            Arc::new(move |tree: EdfData| {
                tx.send(tree).unwrap();
            }),
        );

        router.publish(EdfData::integer("announce", 5));
        router.publish(EdfData::string("announce", "known"));

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn drop_drains_pending_announcements() {
        let router = AnnounceRouter::new(16);
        let (tx, rx) = mpsc::channel();
        router.subscribe(
            "tick",
            Arc::new(move |tree: EdfData| {
                tx.send(tree).unwrap();
            }),
        );

        for n in 0..5 {
            router.publish(EdfData::string("announce", "tick").with_integer("n", n));
        }
        drop(router);

        for n in 0..5 {
            let tree = rx.recv_timeout(Duration::from_secs(1)).unwrap();
            assert_eq!(tree.child("n").unwrap().integer_value().unwrap(), n);
        }
    }
}

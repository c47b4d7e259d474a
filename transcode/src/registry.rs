/*!
    Process-wide registry of live output stream names.

    Several engines can serve the same application; this registry is how they
    avoid announcing the same output stream name twice. It is an explicitly
    owned object, not ambient global state: the application constructs one
    and hands it to every engine.
*/

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/**
    Maps each application id to the set of its currently-live output stream
    names.
*/
#[derive(Debug, Default)]
pub struct StreamRegistry {
    inner: Mutex<HashMap<u32, HashSet<String>>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Claim `name` under `application_id`.

        Returns false when the name is already live for that application;
        the caller must then drop the duplicate stream.
    */
    pub fn register(&self, application_id: u32, name: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner
            .entry(application_id)
            .or_default()
            .insert(name.to_string())
    }

    /**
        Release the given names for `application_id`.

        Only the caller's own names are removed; other engines sharing the
        application keep theirs.
    */
    pub fn release(&self, application_id: u32, names: impl IntoIterator<Item = impl AsRef<str>>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(live) = inner.get_mut(&application_id) {
            for name in names {
                live.remove(name.as_ref());
            }
            if live.is_empty() {
                inner.remove(&application_id);
            }
        }
    }

    /**
        Whether `name` is currently live for `application_id`.
    */
    pub fn contains(&self, application_id: u32, name: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .get(&application_id)
            .is_some_and(|live| live.contains(name))
    }

    /**
        Number of live names for `application_id`.
    */
    pub fn len(&self, application_id: u32) -> usize {
        self.inner
            .lock()
            .unwrap()
            .get(&application_id)
            .map_or(0, HashSet::len)
    }
}

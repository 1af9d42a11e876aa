//! Live corpus reference with atomic wholesale replacement.

use std::sync::{Arc, RwLock};

use tracing::info;

use super::Corpus;

/// Shared pointer to the current corpus snapshot.
///
/// Readers take an `Arc` snapshot and classify against it without holding
/// any lock. A reload swaps the pointer; scans already running keep the
/// snapshot they started with.
#[derive(Debug)]
pub struct CorpusHandle {
    current: RwLock<Arc<Corpus>>,
}

impl CorpusHandle {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            current: RwLock::new(Arc::new(corpus)),
        }
    }

    /// The corpus in effect right now.
    pub fn snapshot(&self) -> Arc<Corpus> {
        // The guarded value is a plain Arc, so a poisoned lock still holds a
        // complete snapshot.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the corpus, returning the previous snapshot.
    pub fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        let next = Arc::new(corpus);
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *guard, Arc::clone(&next))
        };
        info!(
            from = previous.version(),
            to = next.version(),
            entries = next.len(),
            "corpus replaced"
        );
        previous
    }

    pub fn version(&self) -> String {
        self.snapshot().version().to_string()
    }
}

impl Default for CorpusHandle {
    fn default() -> Self {
        Self::new(Corpus::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlagBase, FlagCategory, Tier};

    fn single(version: &str, id: &str) -> Corpus {
        let mut base = FlagBase::new(id.into(), "CALL 999 NOW".into());
        base.keywords = vec![id.into()];
        Corpus::new(version, vec![FlagCategory::new(Tier::Red, base)]).unwrap()
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let handle = CorpusHandle::new(single("v1", "stroke"));
        let before = handle.snapshot();

        let previous = handle.replace(single("v2", "sepsis"));

        assert_eq!(previous.version(), "v1");
        assert_eq!(before.version(), "v1");
        assert!(before.get("stroke").is_some());
        assert_eq!(handle.version(), "v2");
        assert!(handle.snapshot().get("sepsis").is_some());
    }

    #[test]
    fn test_concurrent_readers() {
        let handle = Arc::new(CorpusHandle::default());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || {
                    let corpus = handle.snapshot();
                    crate::classifier::classify("worst headache of my life", &corpus)
                })
            })
            .collect();

        let results: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}

use pingwatch_core::Sample;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

struct Ring {
    samples:  RwLock<VecDeque<Sample>>,
    capacity: usize,
}

/// Create the rolling history of one target.
///
/// The writer half is not `Clone`: only the owning sampler can append.
/// Readers are cheap to clone and only ever see whole snapshots.
///
/// # Panics
///
/// Panics if `capacity` is 0.
pub fn history(capacity: usize) -> (HistoryWriter, HistoryReader) {
    assert!(capacity > 0, "history capacity must be greater than 0");
    let ring = Arc::new(Ring {
        samples: RwLock::new(VecDeque::with_capacity(capacity)),
        capacity,
    });
    (
        HistoryWriter { ring: Arc::clone(&ring) },
        HistoryReader { ring },
    )
}

/// Append side of a history.
pub struct HistoryWriter {
    ring: Arc<Ring>,
}

impl HistoryWriter {
    /// Push a new sample, evicting the oldest if at capacity.
    pub fn append(&mut self, sample: Sample) {
        let mut samples = self.ring.samples.write().unwrap_or_else(PoisonError::into_inner);
        if samples.len() == self.ring.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}

/// Read side of a history.
#[derive(Clone)]
pub struct HistoryReader {
    ring: Arc<Ring>,
}

impl HistoryReader {
    /// Copy the current contents, oldest first.
    pub fn snapshot(&self) -> HistorySnapshot {
        let samples = self.ring.samples.read().unwrap_or_else(PoisonError::into_inner);
        HistorySnapshot(samples.iter().copied().collect())
    }

    pub fn len(&self) -> usize {
        self.ring.samples.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}

impl std::fmt::Debug for HistoryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryReader")
            .field("len", &self.len())
            .field("capacity", &self.ring.capacity)
            .finish()
    }
}

/// Point-in-time copy of a history.  Later appends never touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot(Vec<Sample>);

impl HistorySnapshot {
    pub fn as_slice(&self) -> &[Sample] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn successes(&self) -> usize {
        self.0.iter().filter(|s| s.is_success()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Sample::{Failure as F, Success as S};

    fn fill(writer: &mut HistoryWriter, samples: &[Sample]) {
        for &s in samples {
            writer.append(s);
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let (mut w, r) = history(3);
        fill(&mut w, &[S, S, S, F]);
        assert_eq!(r.snapshot().as_slice(), &[S, S, F]);
    }

    #[test]
    fn full_history_keeps_length_and_shifts_by_one() {
        let (mut w, r) = history(5);
        fill(&mut w, &[F, S, S, F, S]);
        let before = r.snapshot();

        w.append(F);
        let after = r.snapshot();

        assert_eq!(after.len(), 5);
        assert_eq!(&after.as_slice()[..4], &before.as_slice()[1..]);
        assert_eq!(after.as_slice()[4], F);
    }

    #[test]
    fn snapshot_is_detached_from_later_appends() {
        let (mut w, r) = history(4);
        fill(&mut w, &[S, F]);
        let snap = r.snapshot();
        fill(&mut w, &[S, S, S]);
        assert_eq!(snap.as_slice(), &[S, F]);
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn repeated_snapshots_are_equal() {
        let (mut w, r) = history(4);
        fill(&mut w, &[S, F, S]);
        assert_eq!(r.snapshot(), r.snapshot());
    }

    #[test]
    fn never_exceeds_capacity() {
        let (mut w, r) = history(7);
        for i in 0..100 {
            w.append(Sample::from_success(i % 3 == 0));
            assert!(r.snapshot().len() <= 7);
        }
        assert_eq!(r.len(), 7);
    }

    #[test]
    fn empty_history() {
        let (_w, r) = history(3);
        assert!(r.is_empty());
        assert!(r.snapshot().is_empty());
        assert_eq!(r.snapshot().successes(), 0);
    }

    #[test]
    fn concurrent_readers_see_whole_prefixes() {
        let (mut w, r) = history(1000);
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let r = r.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = r.snapshot();
                        // Writer appends S,F,S,F,... so order must alternate from the start.
                        for (i, s) in snap.iter().enumerate() {
                            assert_eq!(s.is_success(), i % 2 == 0);
                        }
                    }
                })
            })
            .collect();

        for i in 0..1000 {
            w.append(Sample::from_success(i % 2 == 0));
        }
        for h in readers {
            h.join().unwrap();
        }
        assert_eq!(r.len(), 1000);
    }
}

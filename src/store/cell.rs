use std::sync::{PoisonError, RwLock};

/// The single state slot of a store.
///
/// Readers always observe a whole value: the slot is only ever replaced,
/// never mutated in place.
pub(crate) struct StateCell<S> {
    value: RwLock<S>,
}

impl<S: Clone> StateCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            value: RwLock::new(initial),
        }
    }

    pub(crate) fn get(&self) -> S {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let value = self.value.read().unwrap_or_else(PoisonError::into_inner);
        f(&value)
    }

    pub(crate) fn replace(&self, next: S) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn replace_swaps_whole_value() {
        let cell = StateCell::new((1, 1));
        cell.replace((2, 2));
        assert_eq!(cell.get(), (2, 2));
        assert_eq!(cell.with(|s| s.0 + s.1), 4);
    }

    #[test]
    fn concurrent_readers_never_see_torn_values() {
        let cell = Arc::new(StateCell::new((0u64, 0u64)));

        let writer = {
            let cell = Arc::clone(&cell);
            thread::spawn(move || {
                for i in 1..=1_000u64 {
                    cell.replace((i, i));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let (a, b) = cell.get();
                        assert_eq!(a, b);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cell.get(), (1_000, 1_000));
    }
}

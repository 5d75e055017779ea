use slotmap::{Key, SlotMap};

/// A vertex's contiguous run `[first, last]` inside a shared [`ChainPool`].
///
/// `last` is the final entry, not one past it. A vertex with nothing queued
/// holds `None` instead of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainRange<K> {
    pub first: K,
    pub last: K,
}

#[derive(Debug)]
struct Link<K, T> {
    value: T,
    next: Option<K>,
}

/// Shared ordered storage in which every vertex owns one run of entries.
///
/// Entries of a run are linked in arrival order, so appending to one vertex
/// never shifts the runs of other vertices and handles stay stable.
#[derive(Debug)]
pub struct ChainPool<K: Key, T> {
    links: SlotMap<K, Link<K, T>>,
}

impl<K: Key, T> Default for ChainPool<K, T> {
    fn default() -> Self {
        Self {
            links: SlotMap::with_key(),
        }
    }
}

impl<K: Key, T> ChainPool<K, T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` at the end of `range` and returns its handle.
    pub fn append(&mut self, range: &mut Option<ChainRange<K>>, value: T) -> K {
        let key = self.links.insert(Link { value, next: None });
        match range {
            Some(run) => {
                if let Some(tail) = self.links.get_mut(run.last) {
                    tail.next = Some(key);
                }
                run.last = key;
            }
            None => {
                *range = Some(ChainRange {
                    first: key,
                    last: key,
                });
            }
        }
        key
    }

    /// Iterates the entries of `range` in arrival order.
    #[must_use]
    pub fn iter(&self, range: Option<ChainRange<K>>) -> ChainIter<'_, K, T> {
        ChainIter {
            links: &self.links,
            next: range.map(|run| run.first),
        }
    }

    /// Returns the entry behind a handle.
    #[must_use]
    pub fn get(&self, key: K) -> Option<&T> {
        self.links.get(key).map(|link| &link.value)
    }

    /// Removes every entry of `range` for which `keep(handle, entry)` returns `false`.
    ///
    /// Removed entries are returned in arrival order; `range` is rewritten
    /// to cover the survivors, or set to `None` if none are left.
    pub fn retain(
        &mut self,
        range: &mut Option<ChainRange<K>>,
        mut keep: impl FnMut(K, &T) -> bool,
    ) -> Vec<T> {
        let keys: Vec<K> = self.iter(*range).map(|(key, _)| key).collect();
        let mut kept: Vec<K> = Vec::with_capacity(keys.len());
        let mut removed = Vec::new();

        for key in keys {
            let retain = self.links.get(key).is_some_and(|link| keep(key, &link.value));
            if retain {
                kept.push(key);
            } else if let Some(link) = self.links.remove(key) {
                removed.push(link.value);
            }
        }

        for pair in kept.windows(2) {
            if let Some(link) = self.links.get_mut(pair[0]) {
                link.next = Some(pair[1]);
            }
        }
        *range = match (kept.first(), kept.last()) {
            (Some(&first), Some(&last)) => {
                if let Some(link) = self.links.get_mut(last) {
                    link.next = None;
                }
                Some(ChainRange { first, last })
            }
            _ => None,
        };
        removed
    }

    /// Removes and returns every entry of `range`.
    pub fn take(&mut self, range: &mut Option<ChainRange<K>>) -> Vec<T> {
        self.retain(range, |_, _| false)
    }

    /// Total number of live entries across all runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if no run holds any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Iterator over one run of a [`ChainPool`].
pub struct ChainIter<'a, K: Key, T> {
    links: &'a SlotMap<K, Link<K, T>>,
    next: Option<K>,
}

impl<'a, K: Key, T> Iterator for ChainIter<'a, K, T> {
    type Item = (K, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        let link = self.links.get(key)?;
        self.next = link.next;
        Some((key, &link.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    slotmap::new_key_type! {
        struct TestKey;
    }

    fn values(pool: &ChainPool<TestKey, u32>, range: Option<ChainRange<TestKey>>) -> Vec<u32> {
        pool.iter(range).map(|(_, v)| *v).collect()
    }

    #[test]
    fn runs_interleave_without_mixing() {
        let mut pool = ChainPool::new();
        let mut a = None;
        let mut b = None;
        pool.append(&mut a, 1);
        pool.append(&mut b, 10);
        pool.append(&mut a, 2);
        pool.append(&mut b, 20);
        pool.append(&mut a, 3);

        assert_eq!(values(&pool, a), vec![1, 2, 3]);
        assert_eq!(values(&pool, b), vec![10, 20]);
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn retain_relinks_survivors() {
        let mut pool = ChainPool::new();
        let mut run = None;
        for v in 1..=5 {
            pool.append(&mut run, v);
        }

        let removed = pool.retain(&mut run, |_, v| v % 2 == 1);
        assert_eq!(removed, vec![2, 4]);
        assert_eq!(values(&pool, run), vec![1, 3, 5]);

        // Appending after a retain continues from the new tail.
        pool.append(&mut run, 7);
        assert_eq!(values(&pool, run), vec![1, 3, 5, 7]);
    }

    #[test]
    fn retain_dropping_head_and_tail() {
        let mut pool = ChainPool::new();
        let mut run = None;
        for v in 1..=4 {
            pool.append(&mut run, v);
        }
        let removed = pool.retain(&mut run, |_, v| *v == 2 || *v == 3);
        assert_eq!(removed, vec![1, 4]);
        assert_eq!(values(&pool, run), vec![2, 3]);
    }

    #[test]
    fn take_empties_range() {
        let mut pool = ChainPool::new();
        let mut run = None;
        pool.append(&mut run, 4);
        pool.append(&mut run, 5);

        assert_eq!(pool.take(&mut run), vec![4, 5]);
        assert!(run.is_none());
        assert!(pool.is_empty());
        assert_eq!(values(&pool, run), Vec::<u32>::new());
    }
}

use crate::dates::now_ms;
use crate::model::TodoId;

/// Time-based id source for tiers that have no key generator of their own.
///
/// Ids look like creation timestamps but are strictly increasing: a second id
/// requested within the same millisecond gets `last + 1`. `floor` is the largest
/// id already stored, so a reopened list never hands out a duplicate.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: TodoId,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, floor: TodoId) -> TodoId {
        let id = now_ms().max(self.last + 1).max(floor + 1);
        self.last = id;
        id
    }
}

/// Largest id in `items`, or 0.
pub fn max_id<'a>(ids: impl IntoIterator<Item = &'a TodoId>) -> TodoId {
    ids.into_iter().copied().max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique_in_tight_loop() {
        let mut ids = IdGenerator::new();
        let issued: HashSet<TodoId> = (0..1000).map(|_| ids.next(0)).collect();
        assert_eq!(issued.len(), 1000);
    }

    #[test]
    fn test_ids_respect_floor() {
        let mut ids = IdGenerator::new();
        let far_future = now_ms() + 1_000_000;
        assert_eq!(ids.next(far_future), far_future + 1);
        assert_eq!(ids.next(0), far_future + 2);
    }

    #[test]
    fn test_max_id() {
        assert_eq!(max_id(&[3, 9, 4]), 9);
        assert_eq!(max_id(&[]), 0);
    }
}

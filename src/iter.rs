/// Forward iteration over LIVE buckets in physical index order.
use crate::bucket::BucketStore;

pub struct Iter<'a> {
    store: &'a BucketStore,
    cursor: u32,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(store: &'a BucketStore) -> Self {
        Iter { store, cursor: 0 }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.store.num_buckets() {
            let idx = self.cursor;
            self.cursor += 1;
            if self.store.is_live(idx) {
                return Some((self.store.key(idx), self.store.value(idx)));
            }
        }
        None
    }
}

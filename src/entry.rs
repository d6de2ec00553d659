/// A key-value pair stored by `RedBlackMap`. Ordering is supplied externally by `ByKey`, so the
/// entry itself carries no ordering.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Entry<K, V> {
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

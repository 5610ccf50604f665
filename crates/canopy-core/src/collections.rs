#[cfg(feature = "std-hash")]
pub(crate) mod map {
    pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V>;
    pub(crate) type HashSet<K> = std::collections::HashSet<K>;
    pub(crate) type IndexMap<K, V> = indexmap::IndexMap<K, V>;
}

#[cfg(not(feature = "std-hash"))]
pub(crate) mod map {
    pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
    pub(crate) type HashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;
    pub(crate) type IndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;
}

use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::hash::Hasher;

use crate::hash_table::HashEq;
use crate::hash_table::HashTable;

/// Adapts a standard [`BuildHasher`] to the table's seeded callback
/// contract.
///
/// The table seed is fed into the hasher stream ahead of the value, so the
/// produced hash is deterministic per (value, seed) pair and changes
/// whenever the table reseeds on rehash.
struct BuildHashEq<S> {
    hash_builder: S,
}

impl<T, S> HashEq<T> for BuildHashEq<S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn hash(&self, entry: &T, seed: u64) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        hasher.write_u64(seed);
        entry.hash(&mut hasher);
        hasher.finish()
    }

    fn equals(&self, lhs: &T, rhs: &T) -> bool {
        lhs == rhs
    }
}

/// A hash set implemented on top of the flat group [`HashTable`].
///
/// `HashSet<T, S>` stores values of type `T` where `T` implements
/// `Hash + Eq` and uses a configurable hasher builder `S` to hash values.
/// The builder must produce hashes that are well distributed across all 64
/// bits; the underlying table uses the low bits for placement and the high
/// byte for its comparison filter.
pub struct HashSet<T, S> {
    table: HashTable<T, BuildHashEq<S>>,
}

impl<T, S> Debug for HashSet<T, S>
where
    T: Debug + Hash + Eq,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new hash set with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use flat_hash::HashSet;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    ///
    /// let set: HashSet<i32, _> = HashSet::with_hasher(SimpleHasher);
    /// assert!(set.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(BuildHashEq { hash_builder }),
        }
    }

    /// Creates a new hash set with the specified capacity and hasher
    /// builder.
    ///
    /// The actual capacity may be larger than requested due to the
    /// group-based organization of the underlying table.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let mut set = Self::with_hasher(hash_builder);
        if capacity > 0 {
            set.table.reserve(capacity);
        }
        set
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of elements the set can hold before the next
    /// growth rehash.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use flat_hash::HashSet;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    ///
    /// let set: HashSet<i32, _> = HashSet::with_capacity_and_hasher(100, SimpleHasher);
    /// assert!(set.capacity() >= 100);
    /// ```
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// The set rehashes to the smallest group count whose load-factor
    /// budget covers `len() + additional` elements; adding that many
    /// elements afterwards will not allocate.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(self.table.len() + additional);
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was newly inserted. That is:
    ///
    /// - If the set did not previously contain this value, `true` is
    ///   returned.
    /// - If the set already contained this value, `false` is returned and
    ///   the stored value is replaced by `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use flat_hash::HashSet;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    ///
    /// let mut set = HashSet::with_hasher(SimpleHasher);
    /// assert_eq!(set.insert(37), true);
    /// assert_eq!(set.insert(37), false);
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        self.table.insert(value).is_none()
    }

    /// Adds a value to the set, replacing an existing equal value.
    ///
    /// Returns the replaced value, if any. Unlike [`insert`], this exposes
    /// the displaced element, which matters when equal values are
    /// distinguishable.
    ///
    /// [`insert`]: HashSet::insert
    pub fn replace(&mut self, value: T) -> Option<T> {
        self.table.insert(value)
    }

    /// Returns `true` if the set contains a value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use flat_hash::HashSet;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    ///
    /// let mut set = HashSet::with_hasher(SimpleHasher);
    /// set.insert(1);
    /// assert!(set.contains(&1));
    /// assert!(!set.contains(&2));
    /// ```
    pub fn contains(&self, value: &T) -> bool {
        self.table.find(value).is_some()
    }

    /// Returns a reference to the value in the set, if any, that is equal
    /// to the given value.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.table.find(value)
    }

    /// Removes a value from the set. Returns whether the value was present
    /// in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use flat_hash::HashSet;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    ///
    /// let mut set = HashSet::with_hasher(SimpleHasher);
    /// set.insert(1);
    /// assert_eq!(set.remove(&1), true);
    /// assert_eq!(set.remove(&1), false);
    /// ```
    pub fn remove(&mut self, value: &T) -> bool {
        self.table.erase(value).is_some()
    }

    /// Removes and returns the value in the set, if any, that is equal to
    /// the given one.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.table.erase(value)
    }

    /// Returns an iterator over the values of the set, in arbitrary order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }
}

impl<T, S> HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new hash set using the default hasher builder.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash set with the specified capacity using the default
    /// hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<T, S> Default for HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the values of a [`HashSet`].
pub struct Iter<'a, T> {
    inner: crate::hash_table::Iter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

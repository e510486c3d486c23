//! A flat, open-addressed hash table built from cache-line-sized groups.
//!
//! The table is one contiguous array of groups. Each group packs seven
//! entry slots into a single 64-byte cache line together with one byte of
//! presence/saturation metadata and one hint byte per slot. An entry's
//! 64-bit hash is split in two: the low bits (masked by the group count,
//! which is always a power of two) select the home group, and the high byte
//! becomes the slot hint. Lookups broadcast the wanted hint across the
//! group's metadata with a single SSE2 compare and only call the user
//! equality callback on slots whose hint byte matches and whose presence bit
//! is set.
//!
//! ## Design
//!
//! Probing walks the triangular-number quadratic sequence
//! `(start + i*(i+1)/2) & mask`. For power-of-two sizes this sequence is a
//! permutation of the group range, so every group is visited exactly once
//! before the sequence repeats. Do not substitute another quadratic form
//! without proving the same coverage.
//!
//! Deletion is tombstone-free. Bit 7 of a group's status byte records
//! whether the group has *ever* had all seven slots occupied at once, and
//! erase never clears it. A probe may stop at the first group whose
//! was-full bit is clear: had the entry been present, insertion would have
//! found a free slot no later than that group. The stale saturation history
//! this leaves behind is shed wholesale on the next rehash, which rebuilds
//! every group from scratch.
//!
//! The table grows when `count` exceeds 67% of the slot capacity (checked
//! before an insert) and shrinks when it falls below a quarter of that
//! (checked after an erase), never below four groups. Every resize
//! reallocates the group array and derives a fresh seed by mixing the new
//! array's base address, so adversarial key sets cannot keep their
//! collision structure across a rehash.
//!
//! Hashing and equality are supplied through the monomorphized [`HashEq`]
//! trait; both calls sit on the innermost probing loop, which is why they
//! are not boxed or function pointers.
//!
//! ## Safety invariants
//!
//! 1. A presence bit of 1 marks the corresponding `MaybeUninit` slot as
//!    initialized; every `assume_init_*` in this module is justified by a
//!    presence bit observed through `is_occupied` or a mask produced by
//!    `hint_match` (which ANDs with the presence bits).
//! 2. For every occupied slot `i`, `hints[i]` is the high byte of the
//!    entry's hash under the table's current seed. Upsert overwrites the
//!    entry without touching the hint because equal entries hash equally.
//! 3. The sum of presence-bit popcounts across all groups equals `count`.
//! 4. `groups.len()` is a power of two and at least `MIN_GROUPS`, so
//!    `hash & (groups.len() - 1)` is always in bounds.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;
#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;
#[cfg(feature = "stats")]
use core::cell::Cell;
use core::fmt::Debug;
use core::mem;
use core::mem::MaybeUninit;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(all(feature = "stats", feature = "std"))] {
        macro_rules! dump_stats {
            ($table:expr, $op:expr) => {
                $table.dump_stats($op)
            };
        }
    } else {
        macro_rules! dump_stats {
            ($table:expr, $op:expr) => {};
        }
    }
}

/// Entry slots per group.
const GROUP_ENTRIES: usize = 7;
/// Low seven status bits: one presence bit per slot.
const ENTRIES_MASK: u8 = 0x7F;
/// Status bit 7: set once the group has had all seven slots occupied.
const WAS_FULL_BIT: u8 = 0x80;
/// Smallest group array; also the size of a freshly created table.
const MIN_GROUPS: usize = 4;

const L1_CACHE_LINE_SIZE: usize = 64;

const MAX_LOAD_FACTOR: f64 = 0.67;
const MIN_LOAD_FACTOR: f64 = MAX_LOAD_FACTOR / 4.0;

/// Prefetches the group array into the cache ahead of a probe walk.
///
/// # Safety
///
/// The caller must ensure that `ptr` points to a memory location that is
/// safe to read from. While `_mm_prefetch` might not fault on invalid
/// addresses, the behavior is undefined if the address is not valid for
/// reads.
#[inline(always)]
unsafe fn prefetch<T>(ptr: *const T) {
    if (cfg!(target_arch = "x86") || cfg!(target_arch = "x86_64")) && cfg!(target_feature = "sse") {
        unsafe {
            _mm_prefetch(ptr as *const i8, _MM_HINT_T0);
        }
    }
}

/// Finalizer-style 64-bit mixer used to derive table seeds from the group
/// array's base address.
#[inline(always)]
fn mix64(mut n: u64) -> u64 {
    const Z: u64 = 0x9FB2_1C65_1E98_DF25;

    n ^= n.rotate_left(49) ^ n.rotate_left(24);
    n = n.wrapping_mul(Z);
    n ^= n >> 35;
    n = n.wrapping_mul(Z);
    n ^= n >> 28;

    n
}

/// The slot hint is the leftmost byte of the hash. The low bits pick the
/// home group, so taking the hint from the opposite end keeps the two
/// decompositions uncorrelated.
#[inline(always)]
fn hash_hint(hash: u64) -> u8 {
    (hash >> 56) as u8
}

/// Hashing and equality callbacks for table entries.
///
/// The table stores a value of this trait and consults it for every hash
/// and comparison, monomorphized into the probing loop.
pub trait HashEq<V> {
    /// Hashes an entry under the given seed.
    ///
    /// Must be deterministic in its inputs, produce the same value for
    /// entries that [`equals`] considers equal, and distribute well across
    /// **all** 64 bits: the low bits select the home group and the high
    /// byte feeds the hint filter, so a weak hash degrades both.
    ///
    /// [`equals`]: HashEq::equals
    fn hash(&self, entry: &V, seed: u64) -> u64;

    /// A reflexive, symmetric, transitive equivalence consistent with
    /// [`hash`].
    ///
    /// [`hash`]: HashEq::hash
    fn equals(&self, lhs: &V, rhs: &V) -> bool;
}

/// Group of entries with metadata.
///
/// Entries are stored in groups for two purposes:
/// 1. A whole group's metadata and entries land in one L1 cache line.
/// 2. Avoiding tombstones: one sticky bit per group records whether it was
///    ever full, which is all probing needs to decide whether to stop.
#[repr(C, align(64))]
struct Group<V> {
    /// Bits 0..6: presence bits for the seven slots. Bit 7: set once the
    /// group has been completely full; never cleared by erase, only
    /// discarded when a rehash rebuilds the group array.
    status: u8,
    /// One byte of each entry's hash. Lets a probe reject slots without
    /// calling the equality callback; meaningful only while the slot's
    /// presence bit is set.
    hints: [u8; GROUP_ENTRIES],
    /// The entries. Initialized exactly where presence bits are set.
    entries: [MaybeUninit<V>; GROUP_ENTRIES],
}

const _: () = assert!(
    mem::size_of::<Group<*mut ()>>() == L1_CACHE_LINE_SIZE,
    "a group of pointer-width entries must be exactly one cache line"
);

impl<V> Group<V> {
    fn empty() -> Self {
        Group {
            status: 0,
            hints: [0; GROUP_ENTRIES],
            entries: [const { MaybeUninit::uninit() }; GROUP_ENTRIES],
        }
    }

    #[inline(always)]
    fn was_full(&self) -> bool {
        self.status & WAS_FULL_BIT != 0
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        self.status & ENTRIES_MASK == ENTRIES_MASK
    }

    #[inline(always)]
    fn is_occupied(&self, idx: usize) -> bool {
        (self.status >> idx) & 0x1 != 0
    }

    /// Index of the lowest-numbered empty slot.
    ///
    /// Presence bits occupy bits 0..6, so after inversion the first set bit
    /// is the first empty slot; an empty presence bit always sorts below
    /// the (inverted) was-full bit.
    #[inline(always)]
    fn first_empty(&self) -> usize {
        debug_assert!(!self.is_full());
        (!self.status).trailing_zeros() as usize
    }

    /// Bitmask of slots whose hint byte equals `hint` and which are
    /// currently occupied.
    #[inline(always)]
    fn hint_match(&self, hint: u8) -> u8 {
        if (cfg!(target_arch = "x86") || cfg!(target_arch = "x86_64"))
            && cfg!(target_feature = "sse2")
        {
            // SAFETY: We have ensured that we are on x86/x86_64 with SSE2
            // support.
            unsafe { self.hint_match_sse2(hint) }
        } else {
            let mut matches: u8 = 0;
            for i in 0..GROUP_ENTRIES {
                if self.hints[i] == hint {
                    matches |= 1 << i;
                }
            }
            matches & self.status & ENTRIES_MASK
        }
    }

    /// SSE2 version of `hint_match`.
    ///
    /// # Safety
    ///
    /// The caller must ensure the CPU supports SSE2 instructions.
    #[inline(always)]
    unsafe fn hint_match_sse2(&self, hint: u8) -> u8 {
        // SAFETY: `status` and `hints` are the first 8 bytes of the group
        // (`repr(C)`), so the 8-byte load stays in bounds and reads only
        // initialized metadata. Lane 0 holds the status byte and lanes
        // 8..15 are zeroed by the load; both are shifted or masked out of
        // the result, which is additionally ANDed with the presence bits.
        unsafe {
            let meta = _mm_loadl_epi64(self as *const Self as *const __m128i);
            let target = _mm_set1_epi8(hint as i8);
            let matches = _mm_movemask_epi8(_mm_cmpeq_epi8(meta, target)) as u32;
            (matches >> 1) as u8 & self.status & ENTRIES_MASK
        }
    }

    /// Installs an entry into an empty slot. This is the only place the
    /// was-full bit is set.
    #[inline(always)]
    fn insert(&mut self, idx: usize, entry: V, hint: u8) {
        debug_assert!(idx < GROUP_ENTRIES);
        debug_assert!(!self.is_occupied(idx));
        self.entries[idx].write(entry);
        self.hints[idx] = hint;
        self.status |= 0x1 << idx;
        if self.is_full() {
            self.status = ENTRIES_MASK | WAS_FULL_BIT;
        }
    }

    /// Overwrites the entry in an occupied slot, returning the previous
    /// entry. The hint is left alone: equal entries hash equally.
    ///
    /// # Safety
    ///
    /// The slot's presence bit must be set.
    #[inline(always)]
    unsafe fn update(&mut self, idx: usize, entry: V) -> V {
        debug_assert!(idx < GROUP_ENTRIES);
        debug_assert!(self.is_occupied(idx));
        // SAFETY: Caller guarantees the slot is occupied, so it holds an
        // initialized entry; the read moves it out before the overwrite.
        unsafe {
            let previous = self.entries[idx].assume_init_read();
            self.entries[idx].write(entry);
            previous
        }
    }

    /// Removes the entry from an occupied slot and returns it. Does not
    /// touch the was-full bit.
    ///
    /// # Safety
    ///
    /// The slot's presence bit must be set.
    #[inline(always)]
    unsafe fn erase(&mut self, idx: usize) -> V {
        debug_assert!(idx < GROUP_ENTRIES);
        debug_assert!(self.is_occupied(idx));
        // SAFETY: Caller guarantees the slot is occupied, so it holds an
        // initialized entry.
        let entry = unsafe { self.entries[idx].assume_init_read() };
        self.hints[idx] = 0;
        self.status &= !(0x1 << idx);
        entry
    }

    /// # Safety
    ///
    /// The slot's presence bit must be set.
    #[inline(always)]
    unsafe fn entry_ref(&self, idx: usize) -> &V {
        debug_assert!(self.is_occupied(idx));
        // SAFETY: Caller guarantees the slot is occupied.
        unsafe { self.entries[idx].assume_init_ref() }
    }
}

fn new_group_array<V>(size_in_groups: usize) -> Box<[Group<V>]> {
    (0..size_in_groups).map(|_| Group::empty()).collect()
}

/// Quadratic probing sequence over group positions.
///
/// Assumes the group count is a power of two, so the modulo reduces to a
/// mask and the triangular stepping formula `start + i*(i+1)/2` visits
/// every group exactly once per cycle.
struct ProbeSequence {
    start: usize,
    iteration: usize,
    size_mask: usize,
}

impl ProbeSequence {
    #[inline(always)]
    fn new(hash: u64, size_in_groups: usize) -> Self {
        debug_assert!(size_in_groups.is_power_of_two());
        let size_mask = size_in_groups - 1;
        ProbeSequence {
            start: hash as usize & size_mask,
            iteration: 0,
            size_mask,
        }
    }

    #[inline(always)]
    fn position(&self) -> usize {
        (self.start + self.iteration * (self.iteration + 1) / 2) & self.size_mask
    }

    #[inline(always)]
    fn next(&mut self) {
        self.iteration += 1;
    }
}

#[cfg(feature = "stats")]
#[derive(Default)]
struct Counters {
    /// `hint_sum / hint_count` should be close to 255 / 2 for a
    /// well-distributed hasher.
    hint_sum: Cell<u64>,
    hint_count: Cell<u64>,
    find_count: Cell<u64>,
    find_probe_count: Cell<u64>,
    find_max_probe_count: Cell<u64>,
    insert_count: Cell<u64>,
    insert_probe_count: Cell<u64>,
    insert_max_probe_count: Cell<u64>,
    compare_count: Cell<u64>,
    equal_count: Cell<u64>,
}

#[cfg(feature = "stats")]
impl Counters {
    fn bump(cell: &Cell<u64>) {
        cell.set(cell.get() + 1);
    }

    fn record_find(&self) {
        Self::bump(&self.find_count);
    }

    fn record_find_probe(&self, probes: u64) {
        Self::bump(&self.find_probe_count);
        self.find_max_probe_count
            .set(self.find_max_probe_count.get().max(probes));
    }

    fn record_insert(&self) {
        Self::bump(&self.insert_count);
    }

    fn record_insert_probe(&self, probes: u64) {
        Self::bump(&self.insert_probe_count);
        self.insert_max_probe_count
            .set(self.insert_max_probe_count.get().max(probes));
    }

    fn record_compare(&self) {
        Self::bump(&self.compare_count);
    }

    fn record_equal(&self) {
        Self::bump(&self.equal_count);
    }

    fn record_hint(&self, hint: u8) {
        self.hint_sum.set(self.hint_sum.get() + u64::from(hint));
        Self::bump(&self.hint_count);
    }
}

/// Snapshot of the diagnostic counters maintained under the `stats`
/// feature.
///
/// The counters have no semantic effect and their dump format is not a
/// stable interface.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct Stats {
    /// Current size of the group array.
    pub size_in_groups: usize,
    /// Number of entries in the table.
    pub count: usize,
    /// `count / (size_in_groups * 7)`.
    pub load_factor: f64,
    /// Average hint byte of inserted entries; near 127.5 for a
    /// well-distributed hasher.
    pub avg_hint: f64,
    /// Fraction of equality calls that confirmed a match.
    pub hitrate: f64,
    /// Number of find operations.
    pub find_count: u64,
    /// Average groups probed per find.
    pub find_avg_probe_length: f64,
    /// Most groups probed by a single find.
    pub find_max_probe_length: u64,
    /// Number of empty-slot searches.
    pub insert_count: u64,
    /// Average groups probed per empty-slot search.
    pub insert_avg_probe_length: f64,
    /// Most groups probed by a single empty-slot search.
    pub insert_max_probe_length: u64,
}

#[cfg(feature = "stats")]
impl Stats {
    /// Pretty-prints the snapshot to stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Statistics ===");
        println!(
            "Population: {} entries in {} groups ({:.2}% load factor)",
            self.count,
            self.size_in_groups,
            self.load_factor * 100.0
        );
        println!("Average hint: {:.2}", self.avg_hint);
        println!("Comparison hitrate: {:.2}%", self.hitrate * 100.0);
        println!(
            "Find: {} ops, {:.3} avg / {} max probed groups",
            self.find_count, self.find_avg_probe_length, self.find_max_probe_length
        );
        println!(
            "Insert: {} ops, {:.3} avg / {} max probed groups",
            self.insert_count, self.insert_avg_probe_length, self.insert_max_probe_length
        );
    }
}

/// A flat hash table of entries identified by user-supplied hash and
/// equality callbacks.
///
/// `HashTable<V, C>` stores values of type `V` by value and never
/// interprets them; identity is governed entirely by the [`HashEq`]
/// callbacks. Prefer the [`HashSet`] wrapper for types that implement
/// `Hash + Eq` unless you are implementing your own set structure.
///
/// Growing and shrinking rehash every entry into a fresh allocation, so no
/// interior position is stable across mutation.
///
/// [`HashSet`]: crate::hash_set::HashSet
pub struct HashTable<V, C> {
    groups: Box<[Group<V>]>,
    seed: u64,
    count: usize,
    hash_eq: C,

    #[cfg(feature = "stats")]
    counters: Counters,
}

impl<V, C> Debug for HashTable<V, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("size_in_groups", &self.groups.len())
            .field("count", &self.count)
            .field(
                "groups",
                &self
                    .groups
                    .iter()
                    .map(|group| {
                        let hints = (0..GROUP_ENTRIES)
                            .map(|i| {
                                if group.is_occupied(i) {
                                    format!("{:02x}", group.hints[i])
                                } else {
                                    "..".to_string()
                                }
                            })
                            .collect::<Vec<_>>()
                            .join(" ");
                        format!("{:08b} | {}", group.status, hints)
                    })
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<V, C> HashTable<V, C>
where
    C: HashEq<V>,
{
    /// Creates an empty table owning the given callbacks.
    ///
    /// The table starts at four groups. The seed is derived by mixing the
    /// group array's base address, so it varies across tables and
    /// allocations, frustrating adversarial key sequences.
    pub fn new(hash_eq: C) -> Self {
        let groups = new_group_array::<V>(MIN_GROUPS);
        let seed = mix64(groups.as_ptr() as u64);
        Self {
            groups,
            seed,
            count: 0,
            hash_eq,

            #[cfg(feature = "stats")]
            counters: Counters::default(),
        }
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of entries the table can hold before the next
    /// growth rehash.
    pub fn capacity(&self) -> usize {
        (MAX_LOAD_FACTOR * (self.groups.len() * GROUP_ENTRIES) as f64) as usize
    }

    /// Returns an iterator over the entries, in arbitrary order.
    ///
    /// The order is stable as long as the table is not mutated.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            groups: &self.groups,
            group_index: 0,
            slot_index: 0,
        }
    }

    /// Inserts an entry, replacing an equal one.
    ///
    /// If an entry equal to `entry` is already present it is overwritten
    /// and the previous entry is returned; the count is unchanged.
    /// Otherwise the entry is installed in the first free slot on its
    /// probe path and `None` is returned.
    pub fn insert(&mut self, entry: V) -> Option<V> {
        dump_stats!(self, "insert");

        if self.should_grow_up() {
            self.grow_up();
        }

        // SAFETY: `groups` is a live allocation owned by `self`.
        unsafe { prefetch(self.groups.as_ptr()) };
        let hash = self.hash(&entry);
        let hint = hash_hint(hash);
        if let Some((group, idx)) = self.find_slot(&entry, hash) {
            // SAFETY: `find_slot` only returns occupied slots.
            return Some(unsafe { self.groups[group].update(idx, entry) });
        }

        #[cfg(feature = "stats")]
        self.counters.record_hint(hint);

        let (group, idx) = self.find_empty_slot(hash);
        self.groups[group].insert(idx, entry, hint);
        self.count += 1;
        None
    }

    /// Inserts an entry without searching for an equal one.
    ///
    /// The caller promises the entry is not already present. If it is, the
    /// table will hold both until one is erased, and `find` returns an
    /// unspecified one of them.
    pub fn insert_new(&mut self, entry: V) {
        if self.should_grow_up() {
            self.grow_up();
        }

        // SAFETY: `groups` is a live allocation owned by `self`.
        unsafe { prefetch(self.groups.as_ptr()) };
        let hash = self.hash(&entry);
        let hint = hash_hint(hash);
        let (group, idx) = self.find_empty_slot(hash);
        self.groups[group].insert(idx, entry, hint);
        self.count += 1;
    }

    /// Finds the stored entry equal to `probe`.
    ///
    /// The probe need not be the stored entry; it only has to hash and
    /// compare equal to it.
    #[inline]
    pub fn find(&self, probe: &V) -> Option<&V> {
        dump_stats!(self, "find");

        // SAFETY: `groups` is a live allocation owned by `self`.
        unsafe { prefetch(self.groups.as_ptr()) };
        let hash = self.hash(probe);
        let (group, idx) = self.find_slot(probe, hash)?;
        // SAFETY: `find_slot` only returns occupied slots.
        Some(unsafe { self.groups[group].entry_ref(idx) })
    }

    /// Removes and returns the stored entry equal to `probe`.
    ///
    /// Returns `None` if no equal entry is present. The group's was-full
    /// bit is left set, which is what keeps later probes correct without
    /// tombstones.
    pub fn erase(&mut self, probe: &V) -> Option<V> {
        dump_stats!(self, "erase");

        // SAFETY: `groups` is a live allocation owned by `self`.
        unsafe { prefetch(self.groups.as_ptr()) };
        let hash = self.hash(probe);
        let (group, idx) = self.find_slot(probe, hash)?;
        // SAFETY: `find_slot` only returns occupied slots.
        let entry = unsafe { self.groups[group].erase(idx) };
        self.count -= 1;

        if self.should_grow_down() {
            self.grow_down();
        }

        Some(entry)
    }

    /// Rehashes the table so that `entries` entries fit without further
    /// allocation.
    ///
    /// The target size may be smaller than the current one; reserving below
    /// the current population simply rehashes into the smallest array the
    /// load factor permits.
    pub fn reserve(&mut self, entries: usize) {
        let total_entries = (entries as f64 / MAX_LOAD_FACTOR) as usize;
        let size_in_groups = (total_entries / GROUP_ENTRIES + 1).next_power_of_two();
        self.resize(size_in_groups);
    }

    /// Returns a snapshot of the diagnostic counters.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> Stats {
        let ratio = |num: u64, den: u64| if den != 0 { num as f64 / den as f64 } else { 0.0 };
        let c = &self.counters;
        Stats {
            size_in_groups: self.groups.len(),
            count: self.count,
            load_factor: self.count as f64 / (self.groups.len() * GROUP_ENTRIES) as f64,
            avg_hint: ratio(c.hint_sum.get(), c.hint_count.get()),
            hitrate: ratio(c.equal_count.get(), c.compare_count.get()),
            find_count: c.find_count.get(),
            find_avg_probe_length: ratio(c.find_probe_count.get(), c.find_count.get()),
            find_max_probe_length: c.find_max_probe_count.get(),
            insert_count: c.insert_count.get(),
            insert_avg_probe_length: ratio(c.insert_probe_count.get(), c.insert_count.get()),
            insert_max_probe_length: c.insert_max_probe_count.get(),
        }
    }

    #[cfg(all(feature = "stats", feature = "std"))]
    fn dump_stats(&self, op: &str) {
        let stats = self.stats();
        eprintln!("{op}:");
        eprintln!("\tsize_in_groups: {}", stats.size_in_groups);
        eprintln!("\tcount: {}", stats.count);
        eprintln!("\tavg_hint: {}", stats.avg_hint);
        eprintln!("\tload_factor: {}", stats.load_factor);
        eprintln!("\thitrate: {}", stats.hitrate);
        eprintln!(
            "\tfind:\n\t\tavg_probe_length: {}\n\t\tmax_probe_length: {}",
            stats.find_avg_probe_length, stats.find_max_probe_length
        );
        eprintln!(
            "\tinsert:\n\t\tavg_probe_length: {}\n\t\tmax_probe_length: {}",
            stats.insert_avg_probe_length, stats.insert_max_probe_length
        );
    }

    #[inline(always)]
    fn hash(&self, entry: &V) -> u64 {
        self.hash_eq.hash(entry, self.seed)
    }

    /// Locates the occupied slot holding an entry equal to `probe`.
    ///
    /// Walks the probe sequence; per group, candidates are narrowed by the
    /// hint scan before the equality callback runs. The walk stops at the
    /// first group whose was-full bit is clear: had the entry been
    /// inserted, it would have landed there or earlier.
    #[inline]
    fn find_slot(&self, probe: &V, hash: u64) -> Option<(usize, usize)> {
        #[cfg(feature = "stats")]
        self.counters.record_find();

        let hint = hash_hint(hash);
        let mut seq = ProbeSequence::new(hash, self.groups.len());

        loop {
            #[cfg(feature = "stats")]
            self.counters.record_find_probe(seq.iteration as u64 + 1);

            let position = seq.position();
            let group = &self.groups[position];
            let mut matches = group.hint_match(hint);
            while matches != 0 {
                let idx = matches.trailing_zeros() as usize;
                matches ^= 1 << idx;

                #[cfg(feature = "stats")]
                self.counters.record_compare();

                // SAFETY: `hint_match` masks with the presence bits, so
                // `idx` is an occupied slot.
                if self.hash_eq.equals(probe, unsafe { group.entry_ref(idx) }) {
                    #[cfg(feature = "stats")]
                    self.counters.record_equal();

                    return Some((position, idx));
                }
            }

            if !group.was_full() {
                return None;
            }

            seq.next();
        }
    }

    /// Locates the first free slot on the probe path for `hash`.
    ///
    /// A free slot is guaranteed to exist by the growth policy: the load
    /// factor never reaches 1, so some group on the full-coverage probe
    /// sequence is not full.
    #[inline]
    fn find_empty_slot(&self, hash: u64) -> (usize, usize) {
        #[cfg(feature = "stats")]
        self.counters.record_insert();

        let mut seq = ProbeSequence::new(hash, self.groups.len());

        loop {
            #[cfg(feature = "stats")]
            self.counters.record_insert_probe(seq.iteration as u64 + 1);

            let position = seq.position();
            let group = &self.groups[position];
            if !group.is_full() {
                return (position, group.first_empty());
            }
            seq.next();
        }
    }

    #[inline(always)]
    fn should_grow_up(&self) -> bool {
        let max_count = (MAX_LOAD_FACTOR * (self.groups.len() * GROUP_ENTRIES) as f64) as usize;
        self.count > max_count
    }

    #[inline(always)]
    fn should_grow_down(&self) -> bool {
        let min_count = (MIN_LOAD_FACTOR * (self.groups.len() * GROUP_ENTRIES) as f64) as usize;
        self.count < min_count && self.groups.len() > MIN_GROUPS
    }

    fn grow_up(&mut self) {
        self.resize(self.groups.len() * 2);
    }

    fn grow_down(&mut self) {
        self.resize(self.groups.len() / 2);
    }

    /// Rehashes every entry into a fresh group array of `size_in_groups`
    /// groups under a fresh seed.
    ///
    /// Reinsertion goes through the insert-new path: the source is already
    /// deduplicated, so no equality search is needed. If the requested size
    /// is too small for the population, reinsertion grows the new array as
    /// it goes. Only groups that genuinely fill during reinsertion end up
    /// with the was-full bit set; saturation history from the old
    /// arrangement does not survive.
    #[cold]
    fn resize(&mut self, size_in_groups: usize) {
        dump_stats!(self, "resize");

        let size_in_groups = size_in_groups.max(MIN_GROUPS);
        assert!(size_in_groups.is_power_of_two(), "size must be a power of 2");

        let new_groups = new_group_array::<V>(size_in_groups);
        self.seed = mix64(new_groups.as_ptr() as u64);
        let old_groups = mem::replace(&mut self.groups, new_groups);
        self.count = 0;

        for group in old_groups.iter() {
            for idx in 0..GROUP_ENTRIES {
                if group.is_occupied(idx) {
                    // SAFETY: The presence bit marks the slot initialized.
                    // The old array is freed without dropping its slots, so
                    // this read is the single transfer of ownership.
                    let entry = unsafe { group.entries[idx].assume_init_read() };
                    self.insert_new(entry);
                }
            }
        }
    }
}

impl<V, C> Drop for HashTable<V, C> {
    fn drop(&mut self) {
        if mem::needs_drop::<V>() && self.count > 0 {
            for group in self.groups.iter_mut() {
                for idx in 0..GROUP_ENTRIES {
                    if group.is_occupied(idx) {
                        // SAFETY: The presence bit marks the slot
                        // initialized, and nothing reads it after this.
                        unsafe { group.entries[idx].assume_init_drop() };
                    }
                }
            }
        }
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// Created by [`HashTable::iter`]. Yields `&V` in group order, slot order
/// within a group.
pub struct Iter<'a, V> {
    groups: &'a [Group<V>],
    group_index: usize,
    slot_index: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let groups = self.groups;
        while self.group_index < groups.len() {
            let group = &groups[self.group_index];
            while self.slot_index < GROUP_ENTRIES {
                let slot = self.slot_index;
                self.slot_index += 1;
                if group.is_occupied(slot) {
                    // SAFETY: The presence bit marks the slot initialized.
                    return Some(unsafe { group.entry_ref(slot) });
                }
            }
            self.group_index += 1;
            self.slot_index = 0;
        }
        None
    }
}

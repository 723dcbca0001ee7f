use crate::types::ClassId;

pub type Word = u64;
pub const WORD_BITS: usize = 64;

/// Number of words needed to hold classes `1..=classes`.
#[inline(always)]
pub fn words_for(classes: usize) -> usize {
    classes.div_ceil(WORD_BITS).max(1)
}

#[inline(always)]
fn bit(class: ClassId) -> (usize, Word) {
    debug_assert!(class >= 1, "classes are 1-based");
    let b = class as usize - 1;
    (b / WORD_BITS, 1 << (b % WORD_BITS))
}

/// Flags `class` in a raw bitset row. Idempotent.
#[inline(always)]
pub fn mark(row: &mut [Word], class: ClassId) {
    let (w, m) = bit(class);
    row[w] |= m;
}

#[inline(always)]
pub fn contains(row: &[Word], class: ClassId) -> bool {
    let (w, m) = bit(class);
    row[w] & m != 0
}

/// ORs `src` into `dst`, word by word.
#[inline]
pub fn union_into(src: &[Word], dst: &mut [Word]) {
    debug_assert_eq!(src.len(), dst.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d |= *s;
    }
}

/// True iff every class `1..=classes` is flagged in `row`.
pub fn is_complete(row: &[Word], classes: usize) -> bool {
    let full = classes / WORD_BITS;
    if row[..full].iter().any(|&w| w != Word::MAX) {
        return false;
    }
    let tail = classes % WORD_BITS;
    if tail == 0 {
        return true;
    }
    let mask = (1 << tail) - 1;
    row[full] & mask == mask
}

/// True iff every class flagged in `required` is also flagged in `row`.
/// `row` may be wider than `required`; the excess words never matter.
#[inline]
pub fn contains_all(row: &[Word], required: &ClassSet) -> bool {
    debug_assert!(row.len() >= required.words.len());
    required.words.iter().zip(row).all(|(r, s)| r & !s == 0)
}

/// Set of item classes `1..=capacity`, stored as a word array sized from the
/// capacity at construction. Inserting a class above the capacity is a
/// programming error, never a silent truncation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSet {
    capacity: usize,
    words: Box<[Word]>,
}

impl ClassSet {
    pub fn new(capacity: usize) -> Self {
        ClassSet {
            capacity,
            words: vec![0; words_for(capacity)].into_boxed_slice(),
        }
    }

    pub fn singleton(capacity: usize, class: ClassId) -> Self {
        let mut set = Self::new(capacity);
        set.insert(class);
        set
    }

    /// Set holding every class `1..=capacity`.
    pub fn full(capacity: usize) -> Self {
        let mut set = Self::new(capacity);
        for w in 0..capacity / WORD_BITS {
            set.words[w] = Word::MAX;
        }
        let tail = capacity % WORD_BITS;
        if tail > 0 {
            set.words[capacity / WORD_BITS] = (1 << tail) - 1;
        }
        set
    }

    #[inline(always)]
    pub fn insert(&mut self, class: ClassId) {
        debug_assert!(class as usize <= self.capacity);
        mark(&mut self.words, class);
    }

    #[inline(always)]
    pub fn remove(&mut self, class: ClassId) {
        let (w, m) = bit(class);
        self.words[w] &= !m;
    }

    #[inline(always)]
    pub fn contains(&self, class: ClassId) -> bool {
        contains(&self.words, class)
    }

    pub fn union_with(&mut self, other: &ClassSet) {
        union_into(&other.words, &mut self.words);
    }

    pub fn is_complete(&self) -> bool {
        is_complete(&self.words, self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Flagged classes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            let mut bits = w;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let b = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some((wi * WORD_BITS + b + 1) as ClassId)
            })
        })
    }
}

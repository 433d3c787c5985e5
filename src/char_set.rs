// Copyright 2026 Mara Lindqvist.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Immutable sets of non-negative integers (code points), represented as sorted, disjoint,
//! non-adjacent closed intervals.
//!
//! This is the transition-label type used everywhere else in the crate: the graph builder
//! (`builder`) reads it off the caller's `FiniteAutomaton`, the elimination engine
//! (`eliminate`) unions it when two edges collapse into one, and the AST (`ast`) stores it
//! directly inside `CharacterClass`.

use once_cell::sync::OnceCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{ConversionError, Result};

/// A closed interval `[min, max]` of non-negative integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharRange {
    pub min: u32,
    pub max: u32,
}

impl CharRange {
    pub fn new(min: u32, max: u32) -> CharRange {
        CharRange { min, max }
    }

    pub fn single(c: u32) -> CharRange {
        CharRange { min: c, max: c }
    }

    fn len(&self) -> u32 {
        self.max - self.min + 1
    }

    /// `true` when `self` and `other` overlap or touch (i.e. unioning them yields one range).
    fn adjacent_or_overlapping(&self, other: &CharRange) -> bool {
        self.min <= other.max.saturating_add(1) && other.min <= self.max.saturating_add(1)
    }
}

/// An immutable set of code points in `[0, maximum]`, stored as a sorted sequence of
/// disjoint, non-adjacent ranges.
///
/// Cloning a `CharSet` is cheap: the range list is reference-counted, so every derived set
/// (unions, intersections, ...) only allocates when its contents actually differ from an
/// existing set.
#[derive(Clone, Debug, Eq, Hash)]
pub struct CharSet {
    maximum: u32,
    ranges: Arc<[CharRange]>,
}

impl PartialEq for CharSet {
    fn eq(&self, other: &Self) -> bool {
        self.maximum == other.maximum && self.ranges == other.ranges
    }
}

/// Total order: by `maximum`, then empty before non-empty, then by smallest member, then by
/// range count, then lexicographically over `(min, max)` pairs.
impl PartialOrd for CharSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CharSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.maximum
            .cmp(&other.maximum)
            .then_with(|| self.ranges.is_empty().cmp(&other.ranges.is_empty()).reverse())
            .then_with(|| {
                let a = self.ranges.first().map(|r| r.min);
                let b = other.ranges.first().map(|r| r.min);
                a.cmp(&b)
            })
            .then_with(|| self.ranges.len().cmp(&other.ranges.len()))
            .then_with(|| {
                self.ranges
                    .iter()
                    .map(|r| (r.min, r.max))
                    .cmp(other.ranges.iter().map(|r| (r.min, r.max)))
            })
    }
}

type InternCache = Mutex<HashMap<u32, Arc<[CharRange]>>>;

fn empty_cache() -> &'static InternCache {
    static CACHE: OnceCell<InternCache> = OnceCell::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn all_cache() -> &'static InternCache {
    static CACHE: OnceCell<InternCache> = OnceCell::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn interned(cache: &'static InternCache, maximum: u32, build: impl FnOnce() -> Arc<[CharRange]>) -> Arc<[CharRange]> {
    let mut guard = cache.lock().unwrap_or_else(|p| p.into_inner());
    guard.entry(maximum).or_insert_with(build).clone()
}

impl CharSet {
    /// The empty set over `[0, maximum]`. May return an interned value.
    pub fn empty(maximum: u32) -> CharSet {
        CharSet {
            maximum,
            ranges: interned(empty_cache(), maximum, || Arc::from(Vec::new())),
        }
    }

    /// The universal set `{0, ..., maximum}`. May return an interned value.
    pub fn all(maximum: u32) -> CharSet {
        CharSet {
            maximum,
            ranges: interned(all_cache(), maximum, || Arc::from(vec![CharRange::new(0, maximum)])),
        }
    }

    pub fn single(c: u32, maximum: u32) -> Result<CharSet> {
        CharSet::from_ranges(maximum, vec![CharRange::single(c)])
    }

    /// Builds a `CharSet` from an arbitrary (possibly unsorted, possibly overlapping) list of
    /// ranges, validating each one and normalizing the result to the sorted/disjoint/
    /// non-adjacent form.
    pub fn from_ranges(maximum: u32, ranges: Vec<CharRange>) -> Result<CharSet> {
        for r in &ranges {
            validate_range(r, maximum)?;
        }
        if ranges.is_empty() {
            return Ok(CharSet::empty(maximum));
        }
        let mut sorted = ranges;
        sorted.sort_by_key(|r| (r.min, r.max));
        let coalesced = coalesce(sorted);
        Ok(CharSet {
            maximum,
            ranges: Arc::from(coalesced),
        })
    }

    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    pub fn ranges(&self) -> &[CharRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0].min == 0 && self.ranges[0].max == self.maximum
    }

    fn check_domain(&self, other: &CharSet) -> Result<()> {
        if self.maximum != other.maximum {
            Err(ConversionError::DomainMismatch {
                left_maximum: self.maximum,
                right_maximum: other.maximum,
            })
        } else {
            Ok(())
        }
    }

    /// The complement of `self` within `[0, maximum]`.
    pub fn negate(&self) -> CharSet {
        if self.is_empty() {
            return CharSet::all(self.maximum);
        }
        if self.is_full() {
            return CharSet::empty(self.maximum);
        }
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut cursor = 0u32;
        for r in self.ranges.iter() {
            if cursor < r.min {
                out.push(CharRange::new(cursor, r.min - 1));
            }
            cursor = r.max.saturating_add(1);
        }
        if cursor <= self.maximum {
            out.push(CharRange::new(cursor, self.maximum));
        }
        CharSet {
            maximum: self.maximum,
            ranges: Arc::from(out),
        }
    }

    /// Binary union.
    pub fn union(&self, other: &CharSet) -> Result<CharSet> {
        self.check_domain(other)?;
        let mut merged: Vec<CharRange> = Vec::with_capacity(self.ranges.len() + other.ranges.len());
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            if self.ranges[i].min <= other.ranges[j].min {
                merged.push(self.ranges[i]);
                i += 1;
            } else {
                merged.push(other.ranges[j]);
                j += 1;
            }
        }
        merged.extend_from_slice(&self.ranges[i..]);
        merged.extend_from_slice(&other.ranges[j..]);
        Ok(CharSet {
            maximum: self.maximum,
            ranges: Arc::from(coalesce(merged)),
        })
    }

    /// Variadic union over foreign ranges (e.g. freshly parsed, unsorted, possibly
    /// overlapping). Each range is validated against `maximum`.
    pub fn union_ranges<I: IntoIterator<Item = CharRange>>(&self, maximum: u32, ranges: I) -> Result<CharSet> {
        self.check_domain(&CharSet::empty(maximum))?;
        let mut all: Vec<CharRange> = self.ranges.to_vec();
        for r in ranges {
            validate_range(&r, maximum)?;
            all.push(r);
        }
        all.sort_by_key(|r| (r.min, r.max));
        Ok(CharSet {
            maximum: self.maximum,
            ranges: Arc::from(coalesce(all)),
        })
    }

    pub fn intersect(&self, other: &CharSet) -> Result<CharSet> {
        self.check_domain(other)?;
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = self.ranges[i];
            let b = other.ranges[j];
            let lo = a.min.max(b.min);
            let hi = a.max.min(b.max);
            if lo <= hi {
                out.push(CharRange::new(lo, hi));
            }
            if a.max < b.max {
                i += 1;
            } else {
                j += 1;
            }
        }
        Ok(CharSet {
            maximum: self.maximum,
            ranges: Arc::from(out),
        })
    }

    /// Set difference `self \ other`.
    pub fn without(&self, other: &CharSet) -> Result<CharSet> {
        self.check_domain(other)?;
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        let mut cur = self.ranges.get(i).copied();
        while let Some(mut a) = cur {
            if j >= other.ranges.len() || other.ranges[j].min > a.max {
                out.push(a);
                i += 1;
                cur = self.ranges.get(i).copied();
                continue;
            }
            let b = other.ranges[j];
            if b.max < a.min {
                j += 1;
                continue;
            }
            if a.min < b.min {
                out.push(CharRange::new(a.min, b.min - 1));
            }
            if b.max < a.max {
                a = CharRange::new(b.max + 1, a.max);
                cur = Some(a);
                j += 1;
            } else {
                i += 1;
                cur = self.ranges.get(i).copied();
            }
        }
        Ok(CharSet {
            maximum: self.maximum,
            ranges: Arc::from(out),
        })
    }

    pub fn has(&self, c: u32) -> bool {
        self.ranges
            .binary_search_by(|r| {
                if c < r.min {
                    Ordering::Greater
                } else if c > r.max {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn is_superset_of(&self, other: &CharSet) -> Result<bool> {
        self.check_domain(other)?;
        let mut i = 0;
        'outer: for b in other.ranges.iter() {
            while i < self.ranges.len() {
                let a = self.ranges[i];
                if a.max < b.min {
                    i += 1;
                    continue;
                }
                if a.min <= b.min && b.max <= a.max {
                    continue 'outer;
                }
                return Ok(false);
            }
            return Ok(false);
        }
        Ok(true)
    }

    pub fn is_subset_of(&self, other: &CharSet) -> Result<bool> {
        other.is_superset_of(self)
    }

    pub fn is_disjoint_with(&self, other: &CharSet) -> Result<bool> {
        Ok(self.common_character(other)?.is_none())
    }

    /// The smallest code point common to both sets, if any.
    pub fn common_character(&self, other: &CharSet) -> Result<Option<u32>> {
        self.check_domain(other)?;
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = self.ranges[i];
            let b = other.ranges[j];
            let lo = a.min.max(b.min);
            let hi = a.max.min(b.max);
            if lo <= hi {
                return Ok(Some(lo));
            }
            if a.max < b.max {
                i += 1;
            } else {
                j += 1;
            }
        }
        Ok(None)
    }
}

fn validate_range(r: &CharRange, maximum: u32) -> Result<()> {
    if r.min > r.max || r.max > maximum {
        Err(ConversionError::RangeOutOfBounds {
            min: r.min,
            max: r.max,
            maximum,
        })
    } else {
        Ok(())
    }
}

/// Fuses adjacent/overlapping ranges in a list that is already sorted by `min`.
fn coalesce(sorted: Vec<CharRange>) -> Vec<CharRange> {
    let mut out: Vec<CharRange> = Vec::with_capacity(sorted.len());
    for r in sorted {
        match out.last_mut() {
            Some(last) if last.adjacent_or_overlapping(&r) => {
                last.max = last.max.max(r.max);
            }
            _ => out.push(r),
        }
    }
    out
}

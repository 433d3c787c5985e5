// Copyright 2026 Mara Lindqvist.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Post-elimination AST simplification: a set of size-reducing rewrites applied
//! bottom-up to a fixed point (or until `ConversionOptions::maximum_optimization_passes` is
//! hit), never growing the total node count.

use log::{debug, warn};

use crate::ast::{Bound, Concatenation, Element, Expression, Parent, Quantifier};
use crate::error::Result;
use crate::factory::NodeFactory;

/// Repeatedly rewrites `expr` until no pass changes it, or `max_passes` is reached.
/// `Some(0)` runs zero passes and returns `expr` unchanged.
pub fn simplify(factory: &mut NodeFactory, expr: &mut Expression, max_passes: Option<usize>) -> Result<()> {
    let mut passes = 0usize;
    loop {
        if let Some(limit) = max_passes {
            if passes >= limit {
                if passes > 0 {
                    warn!("fa2regex: simplifier hit the pass limit of {limit} before reaching a fixed point");
                }
                return Ok(());
            }
        }
        let changed = simplify_parent(factory, expr)?;
        passes += 1;
        if !changed {
            debug!("fa2regex: simplifier reached a fixed point after {passes} pass(es)");
            return Ok(());
        }
    }
}

fn simplify_parent<P: Parent>(factory: &mut NodeFactory, parent: &mut P) -> Result<bool> {
    let mut changed = false;
    for alt in parent.alternatives_mut().iter_mut() {
        changed |= simplify_concatenation(factory, alt)?;
    }
    changed |= inline_single_alternation_alternatives(parent);
    changed |= empty_string_normalization(factory, parent)?;
    changed |= factor_common_prefix_suffix(factory, parent)?;
    Ok(changed)
}

fn simplify_concatenation(factory: &mut NodeFactory, c: &mut Concatenation) -> Result<bool> {
    let mut changed = false;
    for el in c.elements.iter_mut() {
        changed |= simplify_element(factory, el)?;
    }
    changed |= inline_trivial_elements(c);
    changed |= merge_adjacent_quantifiers(c);
    Ok(changed)
}

fn simplify_element(factory: &mut NodeFactory, el: &mut Element) -> Result<bool> {
    match el {
        Element::CharacterClass(_) => Ok(false),
        Element::Alternation(a) => simplify_parent(factory, a),
        Element::Assertion(a) => simplify_parent(factory, a),
        Element::Quantifier(q) => {
            let mut changed = simplify_parent(factory, q)?;
            changed |= nest_quantifier_fusion(q);
            Ok(changed)
        }
    }
}

/// A `Concatenation` whose sole element is itself an `Alternation` is spliced into the
/// parent's alternatives list in place.
fn inline_single_alternation_alternatives<P: Parent>(parent: &mut P) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < parent.alternatives().len() {
        let is_single_alt = parent.alternatives()[i].elements.len() == 1
            && matches!(parent.alternatives()[i].elements[0], Element::Alternation(_));
        if !is_single_alt {
            i += 1;
            continue;
        }
        let removed = parent.alternatives_mut().remove(i);
        let Element::Alternation(inner) = removed.elements.into_iter().next().unwrap() else {
            unreachable!()
        };
        let n = inner.alternatives.len();
        for (k, sub) in inner.alternatives.into_iter().enumerate() {
            parent.alternatives_mut().insert(i + k, sub);
        }
        changed = true;
        i += n;
    }
    changed
}

/// If a `Parent` has >= 2 alternatives and one is the empty string, drops it; if what remains
/// does not already admit the empty string, either lowers an `x{1,n}` alternative's minimum to
/// zero, or wraps the remainder in a fresh `{0,1}` quantifier.
fn empty_string_normalization<P: Parent>(factory: &mut NodeFactory, parent: &mut P) -> Result<bool> {
    if parent.alternatives().len() < 2 {
        return Ok(false);
    }
    let Some(empty_idx) = parent.alternatives().iter().position(Concatenation::is_empty_string) else {
        return Ok(false);
    };
    parent.alternatives_mut().remove(empty_idx);

    if parent.alternatives().iter().any(Concatenation::can_match_empty_string) {
        return Ok(true);
    }

    let quant_idx = parent.alternatives().iter().position(|c| {
        c.elements.len() == 1 && matches!(&c.elements[0], Element::Quantifier(q) if q.min >= 1)
    });
    if let Some(qi) = quant_idx {
        if let Element::Quantifier(q) = &mut parent.alternatives_mut()[qi].elements[0] {
            q.min = 0;
        }
    } else {
        let remaining = std::mem::take(parent.alternatives_mut());
        let wrapped = factory.quantifier(remaining, 0, Bound::Finite(1))?;
        let new_concat = factory.concatenation(vec![wrapped])?;
        *parent.alternatives_mut() = vec![new_concat];
    }
    Ok(true)
}

/// Finds the longest common prefix and (non-overlapping) suffix shared by every alternative of
/// `parent`, and rewrites them as `prefix . (middle1 | middle2 | ...) . suffix` inside a single
/// alternative. Shared with the `concat` combinator, which applies it opportunistically to an
/// Alternation operand before splicing it into a bigger sequence.
pub(crate) fn factor_common_prefix_suffix<P: Parent>(factory: &mut NodeFactory, parent: &mut P) -> Result<bool> {
    let n = parent.alternatives().len();
    if n < 2 {
        return Ok(false);
    }
    let min_len = parent.alternatives().iter().map(|c| c.elements.len()).min().unwrap();

    let mut prefix_len = 0;
    while prefix_len < min_len {
        let first = &parent.alternatives()[0].elements[prefix_len];
        if parent.alternatives().iter().all(|c| &c.elements[prefix_len] == first) {
            prefix_len += 1;
        } else {
            break;
        }
    }

    let remaining_min = min_len - prefix_len;
    let mut suffix_len = 0;
    while suffix_len < remaining_min {
        let first_len = parent.alternatives()[0].elements.len();
        let first = &parent.alternatives()[0].elements[first_len - 1 - suffix_len];
        let matches = parent.alternatives().iter().all(|c| {
            let l = c.elements.len();
            &c.elements[l - 1 - suffix_len] == first
        });
        if matches {
            suffix_len += 1;
        } else {
            break;
        }
    }

    if prefix_len == 0 && suffix_len == 0 {
        return Ok(false);
    }

    let alts = std::mem::take(parent.alternatives_mut());
    let mut prefix_elems = Vec::new();
    let mut suffix_elems = Vec::new();
    let mut middles = Vec::with_capacity(alts.len());
    for (i, mut c) in alts.into_iter().enumerate() {
        let len = c.elements.len();
        let suf = c.elements.split_off(len - suffix_len);
        let mid = c.elements.split_off(prefix_len);
        if i == 0 {
            prefix_elems = c.elements;
            suffix_elems = suf;
        }
        middles.push(Concatenation { elements: mid });
    }

    let mut new_elements = prefix_elems;
    if middles.iter().all(|m| m.elements.is_empty()) {
        // every alternative is fully consumed by the shared prefix/suffix: nothing left to alternate over.
    } else if middles.windows(2).all(|w| w[0] == w[1]) {
        new_elements.extend(middles.into_iter().next().unwrap().elements);
    } else {
        let alt_elem = factory.alternation(middles)?;
        new_elements.push(alt_elem);
    }
    new_elements.extend(suffix_elems);

    let new_concat = factory.concatenation(new_elements)?;
    *parent.alternatives_mut() = vec![new_concat];
    Ok(true)
}

/// `x{1,1} -> x`; `x{0,1} -> x` when `x` can already match the empty string on its own; a
/// one-alternative `Alternation` element is spliced in place.
fn inline_trivial_elements(c: &mut Concatenation) -> bool {
    let mut changed = false;
    let mut new_elements = Vec::with_capacity(c.elements.len());
    for el in std::mem::take(&mut c.elements) {
        match el {
            Element::Quantifier(q) if is_redundant_optional(&q) => {
                changed = true;
                if q.alternatives.len() == 1 {
                    new_elements.extend(q.alternatives.into_iter().next().unwrap().elements);
                } else {
                    new_elements.push(Element::Alternation(crate::ast::Alternation { alternatives: q.alternatives }));
                }
            }
            Element::Alternation(a) if a.alternatives.len() == 1 => {
                changed = true;
                new_elements.extend(a.alternatives.into_iter().next().unwrap().elements);
            }
            other => new_elements.push(other),
        }
    }
    c.elements = new_elements;
    changed
}

fn is_redundant_optional(q: &Quantifier) -> bool {
    if q.max != Bound::Finite(1) {
        return false;
    }
    match q.min {
        1 => true,
        0 => q.alternatives.iter().any(Concatenation::can_match_empty_string),
        _ => false,
    }
}

/// `q . x -> q'` and `x . q -> q'` when `x` equals `q`'s (single-element) body, widening the
/// count by one; `q1 . q2 -> q'` when both quantify the same body, summing the counts.
fn merge_adjacent_quantifiers(c: &mut Concatenation) -> bool {
    let mut changed = false;
    let mut out: Vec<Element> = Vec::with_capacity(c.elements.len());
    for el in std::mem::take(&mut c.elements) {
        if let Some(merged) = out.last().and_then(|last| try_merge(last, &el)) {
            *out.last_mut().unwrap() = merged;
            changed = true;
        } else {
            out.push(el);
        }
    }
    c.elements = out;
    changed
}

fn try_merge(last: &Element, next: &Element) -> Option<Element> {
    if let (Element::Quantifier(q1), Element::Quantifier(q2)) = (last, next) {
        if q1.alternatives == q2.alternatives {
            return Some(Element::Quantifier(Quantifier {
                alternatives: q1.alternatives.clone(),
                min: q1.min.saturating_add(q2.min),
                max: q1.max.saturating_add(q2.max),
            }));
        }
    }
    if let Element::Quantifier(q) = last {
        if q.alternatives.len() == 1 && q.alternatives[0].elements.len() == 1 && &q.alternatives[0].elements[0] == next {
            return Some(Element::Quantifier(Quantifier {
                alternatives: q.alternatives.clone(),
                min: q.min.saturating_add(1),
                max: q.max.saturating_add(Bound::Finite(1)),
            }));
        }
    }
    if let Element::Quantifier(q) = next {
        if q.alternatives.len() == 1 && q.alternatives[0].elements.len() == 1 && &q.alternatives[0].elements[0] == last {
            return Some(Element::Quantifier(Quantifier {
                alternatives: q.alternatives.clone(),
                min: q.min.saturating_add(1),
                max: q.max.saturating_add(Bound::Finite(1)),
            }));
        }
    }
    None
}

/// A `{0,1}` or `{1,1}` quantifier wrapping a single inner quantifier with the same small
/// minimum fuses into one: `outer.min *= inner.min`, `outer.max = safeMul(outer.max, inner.max)`.
fn nest_quantifier_fusion(q: &mut Quantifier) -> bool {
    if q.min > 1 {
        return false;
    }
    if q.alternatives.len() != 1 || q.alternatives[0].elements.len() != 1 {
        return false;
    }
    let collapses = matches!(&q.alternatives[0].elements[0], Element::Quantifier(inner) if inner.min <= 1);
    if !collapses {
        return false;
    }
    let outer_min = q.min;
    let outer_max = q.max;
    let mut alt = q.alternatives.pop().unwrap();
    let Element::Quantifier(inner) = alt.elements.pop().unwrap() else {
        unreachable!()
    };
    q.min = outer_min * inner.min;
    q.max = outer_max.safe_mul(inner.max);
    q.alternatives = inner.alternatives;
    true
}

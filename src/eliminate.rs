// Copyright 2026 Mara Lindqvist.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The state-elimination engine: repeatedly removes interior states from the graph built
//! by `builder`, in cost-minimizing order, applying cheap local simplifications to the
//! frontier after every removal, until a single residual transition remains.
//!
//! Graph edges are labeled with a bare `Element` (see `graph::Graph`); a transition of more
//! than one element, or the empty string, is represented by wrapping it in a single-alternative
//! `Alternation` (the same convention `builder::elem_of` uses). The combinators below work
//! against the unwrapped `Concatenation` and cross that boundary via `edge_to_concat` /
//! `concat_to_edge`.

use std::collections::VecDeque;

use log::trace;

use crate::ast::{Bound, Concatenation, Element, Quantifier};
use crate::char_set::CharSet;
use crate::error::{ConversionError, Result};
use crate::factory::NodeFactory;
use crate::graph::{Graph, StateId};

fn edge_to_concat(e: &Element) -> Concatenation {
    match e {
        Element::Alternation(a) if a.alternatives.len() == 1 => a.alternatives[0].clone(),
        other => Concatenation { elements: vec![other.clone()] },
    }
}

fn concat_to_edge(factory: &mut NodeFactory, c: Concatenation) -> Result<Element> {
    if c.elements.len() == 1 {
        Ok(c.elements.into_iter().next().unwrap())
    } else {
        factory.alternation(vec![c])
    }
}

/// Kleene star. Collapses `(x{0,0})* -> ε` and `(x{0,n})*`/`(x{1,n})* -> x*` in place;
/// otherwise wraps `a` as the sole alternative of a fresh `{0, inf}` quantifier.
fn star(factory: &mut NodeFactory, mut a: Concatenation) -> Result<Concatenation> {
    if let Some(q) = single_quantifier_mut(&mut a) {
        if q.max == Bound::Finite(0) {
            return Ok(Element::empty_concatenation());
        }
        if q.min == 0 || q.min == 1 {
            q.min = 0;
            q.max = Bound::Infinite;
            return Ok(a);
        }
    }
    if a.is_empty_string() {
        return Ok(a);
    }
    let wrapped = factory.quantifier(vec![a], 0, Bound::Infinite)?;
    factory.concatenation(vec![wrapped])
}

/// Kleene plus, preserving at-least-one semantics.
fn plus(factory: &mut NodeFactory, mut a: Concatenation) -> Result<Concatenation> {
    if let Some(q) = single_quantifier_mut(&mut a) {
        if q.max == Bound::Finite(0) {
            return Ok(Element::empty_concatenation());
        }
        if q.min == 0 || q.min == 1 {
            q.max = Bound::Infinite;
            return Ok(a);
        }
    }
    if a.is_empty_string() {
        return Ok(a);
    }
    let wrapped = factory.quantifier(vec![a], 1, Bound::Infinite)?;
    factory.concatenation(vec![wrapped])
}

/// Sequential composition `a . b`. Flattens the two (already-flat) element sequences in
/// place; if either operand reduces to a single Alternation of >= 2 alternatives, that
/// alternation is first passed through the common prefix/suffix factoring shared with the
/// post-elimination simplifier, so the concatenation does not blow up through distributivity.
fn concat(factory: &mut NodeFactory, mut a: Concatenation, mut b: Concatenation) -> Result<Concatenation> {
    maybe_factor(factory, &mut a)?;
    maybe_factor(factory, &mut b)?;
    a.elements.extend(b.elements);
    Ok(a)
}

fn maybe_factor(factory: &mut NodeFactory, c: &mut Concatenation) -> Result<()> {
    if c.elements.len() == 1 {
        if let Element::Alternation(alt) = &mut c.elements[0] {
            if alt.alternatives.len() >= 2 {
                crate::simplify::factor_common_prefix_suffix(factory, alt)?;
            }
        }
    }
    Ok(())
}

/// Union `a | b`. Unions two bare character classes directly; appends into an existing
/// Alternation operand (merging the new alternative into an existing single-CharacterClass
/// alternative when possible); otherwise builds a fresh two-alternative Alternation.
fn union(factory: &mut NodeFactory, a: Concatenation, b: Concatenation) -> Result<Concatenation> {
    if let (Some(ca), Some(cb)) = (single_char_class(&a), single_char_class(&b)) {
        let merged = ca.union(cb)?;
        let el = factory.char_class(merged)?;
        return factory.concatenation(vec![el]);
    }
    if is_single_alternation(&a) {
        let mut a = a;
        push_alternative(&mut a, b)?;
        return Ok(a);
    }
    if is_single_alternation(&b) {
        let mut b = b;
        push_alternative(&mut b, a)?;
        return Ok(b);
    }
    let alt = factory.alternation(vec![a, b])?;
    factory.concatenation(vec![alt])
}

fn push_alternative(host: &mut Concatenation, new_alt: Concatenation) -> Result<()> {
    let Element::Alternation(alt) = &mut host.elements[0] else {
        unreachable!("push_alternative called on a non-Alternation host")
    };
    if let Some(new_cs) = single_char_class(&new_alt) {
        for existing in alt.alternatives.iter_mut() {
            if let Some(existing_cs) = single_char_class(existing) {
                let merged = existing_cs.union(new_cs)?;
                existing.elements[0] = Element::char_class(merged);
                return Ok(());
            }
        }
    }
    alt.alternatives.push(new_alt);
    Ok(())
}

fn single_char_class(c: &Concatenation) -> Option<&CharSet> {
    if c.elements.len() == 1 {
        c.elements[0].as_char_class().map(|cc| &cc.characters)
    } else {
        None
    }
}

fn is_single_alternation(c: &Concatenation) -> bool {
    c.elements.len() == 1 && matches!(c.elements[0], Element::Alternation(_))
}

fn single_quantifier_mut(c: &mut Concatenation) -> Option<&mut Quantifier> {
    if c.elements.len() == 1 {
        c.elements[0].as_quantifier_mut()
    } else {
        None
    }
}

/// Replaces the edge `from -> to` with `union(existing, t)` if one is already present,
/// otherwise adds `t` as a fresh edge.
fn link_with_union(graph: &mut Graph, factory: &mut NodeFactory, from: StateId, to: StateId, t: Concatenation) -> Result<()> {
    match graph.get_edge(from, to) {
        Some(existing) => {
            let merged = union(factory, edge_to_concat(existing), t)?;
            let edge = concat_to_edge(factory, merged)?;
            graph.relink(from, to, edge)
        }
        None => {
            let edge = concat_to_edge(factory, t)?;
            graph.link(from, to, edge)
        }
    }
}

/// `(|in|-1) x (|out|-1) x 3` with a self-loop, `|in| x |out| x 2` without -- an estimate of
/// the size of the transitions `remove_state` would produce.
fn cost(graph: &Graph, s: StateId) -> u64 {
    let in_deg = graph.in_degree(s) as u64;
    let out_deg = graph.out_degree(s) as u64;
    if graph.has_self_loop(s) {
        (in_deg - 1) * (out_deg - 1) * 3
    } else {
        in_deg * out_deg * 2
    }
}

/// Removes `s`, replacing it with direct edges between every in-neighbor/out-neighbor pair,
/// each a concatenation of (a copy of) the in-edge, (a copy of) the starred self-loop if any,
/// and (a copy of) the out-edge, unioned into any pre-existing edge between that pair. Returns
/// the neighbors that gained or lost an edge, for re-seeding the trivialization worklist.
fn remove_state(graph: &mut Graph, factory: &mut NodeFactory, s: StateId) -> Result<Vec<StateId>> {
    let self_loop = graph.get_edge(s, s).map(edge_to_concat);
    let starred_loop = match self_loop {
        Some(t) => Some(star(factory, t)?),
        None => None,
    };

    let in_edges: Vec<(StateId, Concatenation)> = graph
        .in_edges(s)
        .filter(|&(f, _)| f != s)
        .map(|(f, e)| (f, edge_to_concat(e)))
        .collect();
    let out_edges: Vec<(StateId, Concatenation)> = graph
        .out_edges(s)
        .filter(|&(t, _)| t != s)
        .map(|(t, e)| (t, edge_to_concat(e)))
        .collect();

    for (i, in_t) in &in_edges {
        for (o, out_t) in &out_edges {
            let label = match &starred_loop {
                Some(r) => {
                    let copy_in = factory.copy_concatenation(in_t)?;
                    let copy_r = factory.copy_concatenation(r)?;
                    let copy_out = factory.copy_concatenation(out_t)?;
                    let mid = concat(factory, copy_r, copy_out)?;
                    concat(factory, copy_in, mid)?
                }
                None => {
                    let copy_in = factory.copy_concatenation(in_t)?;
                    let copy_out = factory.copy_concatenation(out_t)?;
                    concat(factory, copy_in, copy_out)?
                }
            };
            link_with_union(graph, factory, *i, *o, label)?;
        }
    }

    Ok(graph.isolate(s))
}

/// Rule 1: folds a self-loop into the unique side (in or out) when one exists, avoiding the
/// full `O(in x out)` blow-up `remove_state` would otherwise incur.
fn collapse_self_loop(graph: &mut Graph, factory: &mut NodeFactory, s: StateId) -> Result<bool> {
    let Some(loop_t) = graph.get_edge(s, s).map(edge_to_concat) else {
        return Ok(false);
    };
    let real_in: Vec<(StateId, Concatenation)> = graph
        .in_edges(s)
        .filter(|&(f, _)| f != s)
        .map(|(f, e)| (f, edge_to_concat(e)))
        .collect();
    let real_out: Vec<(StateId, Concatenation)> = graph
        .out_edges(s)
        .filter(|&(t, _)| t != s)
        .map(|(t, e)| (t, edge_to_concat(e)))
        .collect();

    if real_in.len() != 1 && real_out.len() != 1 {
        return Ok(false);
    }

    if real_in.len() == 1 {
        let (from, a) = real_in[0].clone();
        if a == loop_t {
            let a_copy = factory.copy_concatenation(&a)?;
            let plussed = plus(factory, a_copy)?;
            let edge = concat_to_edge(factory, plussed)?;
            graph.relink(from, s, edge)?;
        } else {
            let loop_copy = factory.copy_concatenation(&loop_t)?;
            let star_t = star(factory, loop_copy)?;
            for (to, b) in &real_out {
                let star_copy = factory.copy_concatenation(&star_t)?;
                let b_copy = factory.copy_concatenation(b)?;
                let fused = concat(factory, star_copy, b_copy)?;
                let edge = concat_to_edge(factory, fused)?;
                graph.relink(s, *to, edge)?;
            }
        }
    } else {
        let (to, b) = real_out[0].clone();
        if b == loop_t {
            let b_copy = factory.copy_concatenation(&b)?;
            let plussed = plus(factory, b_copy)?;
            let edge = concat_to_edge(factory, plussed)?;
            graph.relink(s, to, edge)?;
        } else {
            let loop_copy = factory.copy_concatenation(&loop_t)?;
            let star_t = star(factory, loop_copy)?;
            for (from, a) in &real_in {
                let a_copy = factory.copy_concatenation(a)?;
                let star_copy = factory.copy_concatenation(&star_t)?;
                let fused = concat(factory, a_copy, star_copy)?;
                let edge = concat_to_edge(factory, fused)?;
                graph.relink(*from, s, edge)?;
            }
        }
    }
    graph.unlink(s, s);
    Ok(true)
}

/// Rule 2: if `s` has exactly one in-edge, one out-edge, and no self-loop, folds
/// `A -[a]-> s -[b]-> C` into `A -[a.b]-> C` and drops `s` from the interior set.
fn absorb_trivial(
    graph: &mut Graph,
    factory: &mut NodeFactory,
    s: StateId,
    interior: &mut Vec<StateId>,
) -> Result<Option<(StateId, StateId)>> {
    if graph.has_self_loop(s) || graph.in_degree(s) != 1 || graph.out_degree(s) != 1 {
        return Ok(None);
    }
    let (from, a) = graph.in_edges(s).next().map(|(f, e)| (f, edge_to_concat(e))).unwrap();
    let (to, b) = graph.out_edges(s).next().map(|(t, e)| (t, edge_to_concat(e))).unwrap();

    let fused = concat(factory, a, b)?;
    graph.unlink(from, s);
    graph.unlink(s, to);
    link_with_union(graph, factory, from, to, fused)?;
    interior.retain(|&x| x != s);
    Ok(Some((from, to)))
}

/// Drains `worklist` to a fixed point, applying both trivialization rules to every affected
/// state, re-enqueuing neighbors whose edges changed as a result.
fn trivialize(graph: &mut Graph, factory: &mut NodeFactory, interior: &mut Vec<StateId>, seed: Vec<StateId>) -> Result<()> {
    let mut queue: VecDeque<StateId> = seed.into_iter().collect();
    while let Some(s) = queue.pop_front() {
        if !interior.contains(&s) {
            continue;
        }
        if let Some((a, b)) = absorb_trivial(graph, factory, s, interior)? {
            for n in [a, b] {
                if interior.contains(&n) {
                    queue.push_back(n);
                }
            }
            continue;
        }
        if collapse_self_loop(graph, factory, s)? {
            queue.push_back(s);
        }
    }
    Ok(())
}

/// Runs the elimination loop to completion and returns the single residual transition as a
/// `Concatenation`, ready to seed an `Expression`'s sole alternative.
pub fn eliminate(graph: &mut Graph, factory: &mut NodeFactory) -> Result<Concatenation> {
    let initial = graph.initial();
    let mut interior: Vec<StateId> = graph
        .all_states()
        .filter(|&s| s != initial && !graph.is_final(s))
        .collect();

    let seed = interior.clone();
    trivialize(graph, factory, &mut interior, seed)?;

    while !interior.is_empty() {
        let (idx, &s) = interior
            .iter()
            .enumerate()
            .min_by_key(|&(_, &st)| cost(graph, st))
            .expect("interior is non-empty");
        interior.remove(idx);
        trace!("fa2regex: eliminating state {s} (cost {}), {} remaining", cost(graph, s), interior.len());
        let affected = remove_state(graph, factory, s)?;
        let seed: Vec<StateId> = affected.into_iter().filter(|a| interior.contains(a)).collect();
        trivialize(graph, factory, &mut interior, seed)?;
    }

    finalize(graph)
}

fn finalize(graph: &Graph) -> Result<Concatenation> {
    let finals: Vec<StateId> = graph.finals().iter().copied().collect();
    if finals.len() != 1 {
        return Err(ConversionError::StateEliminationFailed(format!(
            "expected exactly one final state, found {}",
            finals.len()
        )));
    }
    let f = finals[0];
    if graph.out_degree(f) != 0 {
        return Err(ConversionError::StateEliminationFailed(
            "the final state retained an outgoing edge".to_string(),
        ));
    }
    if graph.in_degree(f) != 1 {
        return Err(ConversionError::StateEliminationFailed(format!(
            "the final state has {} incoming edges, expected exactly one",
            graph.in_degree(f)
        )));
    }
    let (from, label) = graph.in_edges(f).next().map(|(s, e)| (s, edge_to_concat(e))).unwrap();
    if from != graph.initial() {
        return Err(ConversionError::StateEliminationFailed(
            "the final state's sole incoming edge does not originate at the initial state".to_string(),
        ));
    }
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char_set::CharRange;

    fn cc(c: char, maximum: u32) -> Element {
        Element::char_class(CharSet::from_ranges(maximum, vec![CharRange::single(c as u32)]).unwrap())
    }

    fn cc_concat(c: char, maximum: u32) -> Concatenation {
        Concatenation { elements: vec![cc(c, maximum)] }
    }

    #[test]
    fn star_collapses_zero_max_to_empty_string() {
        let mut factory = NodeFactory::new(1000);
        let q = Concatenation {
            elements: vec![Element::Quantifier(Quantifier {
                alternatives: vec![cc_concat('a', 255)],
                min: 0,
                max: Bound::Finite(0),
            })],
        };
        let result = star(&mut factory, q).unwrap();
        assert!(result.is_empty_string());
    }

    #[test]
    fn star_of_plain_concat_wraps_in_quantifier() {
        let mut factory = NodeFactory::new(1000);
        let result = star(&mut factory, cc_concat('a', 255)).unwrap();
        assert_eq!(result.elements.len(), 1);
        match &result.elements[0] {
            Element::Quantifier(q) => {
                assert_eq!(q.min, 0);
                assert_eq!(q.max, Bound::Infinite);
            }
            _ => panic!("expected a quantifier"),
        }
    }

    #[test]
    fn union_of_two_char_classes_merges_sets() {
        let mut factory = NodeFactory::new(1000);
        let result = union(&mut factory, cc_concat('a', 255), cc_concat('b', 255)).unwrap();
        assert_eq!(result.elements.len(), 1);
        let cs = result.elements[0].as_char_class().unwrap();
        assert!(cs.characters.has(b'a' as u32));
        assert!(cs.characters.has(b'b' as u32));
    }

    #[test]
    fn concat_flattens_elements() {
        let mut factory = NodeFactory::new(1000);
        let result = concat(&mut factory, cc_concat('a', 255), cc_concat('b', 255)).unwrap();
        assert_eq!(result.elements.len(), 2);
    }

    #[test]
    fn eliminate_single_char_fa() {
        let mut factory = NodeFactory::new(1000);
        let mut graph = Graph::new();
        let temp_initial = graph.create_node();
        let q0 = graph.create_node();
        let q1 = graph.create_node();
        let temp_final = graph.create_node();
        let epsilon = factory.alternation(vec![Element::empty_concatenation()]).unwrap();
        graph.link(temp_initial, q0, epsilon.clone()).unwrap();
        graph.link(q0, q1, cc('a', 255)).unwrap();
        graph.link(q1, temp_final, epsilon).unwrap();
        graph.set_initial(temp_initial);
        graph.set_finals([temp_final]);

        let residual = eliminate(&mut graph, &mut factory).unwrap();
        assert_eq!(residual, cc_concat('a', 255));
    }

    #[test]
    fn eliminate_self_loop_yields_star() {
        let mut factory = NodeFactory::new(1000);
        let mut graph = Graph::new();
        let temp_initial = graph.create_node();
        let q0 = graph.create_node();
        let temp_final = graph.create_node();
        let epsilon = factory.alternation(vec![Element::empty_concatenation()]).unwrap();
        graph.link(temp_initial, q0, epsilon.clone()).unwrap();
        graph.link(q0, q0, cc('a', 255)).unwrap();
        graph.link(q0, temp_final, epsilon).unwrap();
        graph.set_initial(temp_initial);
        graph.set_finals([temp_final]);

        let residual = eliminate(&mut graph, &mut factory).unwrap();
        assert_eq!(residual.elements.len(), 1);
        match &residual.elements[0] {
            Element::Quantifier(q) => {
                assert_eq!(q.min, 0);
                assert_eq!(q.max, Bound::Infinite);
            }
            other => panic!("expected a quantifier, got {other:?}"),
        }
    }
}

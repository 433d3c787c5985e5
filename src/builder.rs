// Copyright 2026 Mara Lindqvist.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Translates an external finite automaton into the internal `Graph`, with a single source
//! and a single drain, pruning anything that cannot reach the drain.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use log::trace;

use crate::char_set::CharSet;
use crate::error::Result;
use crate::factory::NodeFactory;
use crate::graph::{Graph, StateId};

/// The input contract: a finite automaton over character sets, with a single initial state,
/// a final-state predicate, and outgoing edges labeled by disjoint (per source state) charsets
/// of a consistent alphabet.
pub trait FiniteAutomaton {
    /// Any hashable, clonable state identity.
    type State: Clone + Eq + Hash;

    fn initial(&self) -> Self::State;
    fn is_final(&self, state: &Self::State) -> bool;

    /// At most one entry per target state; every `CharSet` shares the same `maximum`. Empty
    /// charsets are permitted.
    fn out_edges(&self, state: &Self::State) -> Vec<(Self::State, CharSet)>;
}

/// The result of translating a `FiniteAutomaton`: either the language is empty (no reachable
/// final state), or a `Graph` whose `initial()` has no incoming edges and whose unique
/// `finals()` member has no outgoing edges.
pub enum BuildResult {
    EmptyLanguage,
    Graph(Graph),
}

pub fn build<A: FiniteAutomaton>(automaton: &A, factory: &mut NodeFactory) -> Result<BuildResult> {
    let mut graph = Graph::new();
    let mut translated: HashMap<A::State, StateId> = HashMap::new();

    let start_external = automaton.initial();
    let start_node = graph.create_node();
    translated.insert(start_external.clone(), start_node);

    // A fresh node that becomes the graph's permanent initial state. It is linked to the
    // translated start state by an epsilon edge rather than the other way around, so that the
    // translated start state remains an ordinary interior state even when it is itself
    // accepting (e.g. `q0` initial-and-final with a self-loop, scenario S2) -- otherwise it
    // could never be eliminated into the star it represents, and the graph's initial state
    // would need to double as a final state, which the engine forbids.
    let temp_initial = graph.create_node();
    graph.link(temp_initial, start_node, factory.empty_concatenation().map(elem_of)?)?;
    graph.set_initial(temp_initial);

    let mut stack = vec![start_external];
    let mut visited: HashSet<A::State> = HashSet::new();

    while let Some(state) = stack.pop() {
        if !visited.insert(state.clone()) {
            continue;
        }
        let node = *translated.get(&state).expect("state was pushed after translation");

        if automaton.is_final(&state) {
            graph.add_final(node);
        }

        let mut edges = automaton.out_edges(&state);
        edges.sort_by(|a, b| edge_order_key(&a.1).cmp(&edge_order_key(&b.1)));

        for (target, charset) in edges {
            let target_node = *translated
                .entry(target.clone())
                .or_insert_with(|| graph.create_node());
            if !visited.contains(&target) {
                stack.push(target);
            }
            let label = factory.char_class(charset)?;
            graph.link(node, target_node, label)?;
        }
    }

    if graph.finals().is_empty() {
        trace!("fa2regex: no reachable final state, returning the empty language");
        return Ok(BuildResult::EmptyLanguage);
    }

    let temp_final = graph.create_node();
    let finals: Vec<StateId> = graph.finals().iter().copied().collect();
    for f in finals {
        graph.link(f, temp_final, factory.empty_concatenation().map(elem_of)?)?;
    }
    graph.set_finals([temp_final]);

    prune_dead_states(&mut graph, temp_final);

    Ok(BuildResult::Graph(graph))
}

fn elem_of(c: crate::ast::Concatenation) -> crate::ast::Element {
    // An empty `Concatenation` is the empty-string transition; wrap it as an `Alternation` of
    // one so it composes uniformly with the combinators in `eliminate`, which operate on
    // `Element`.
    crate::ast::Element::Alternation(crate::ast::Alternation { alternatives: vec![c] })
}

fn edge_order_key(cs: &CharSet) -> (bool, Vec<(u32, u32)>) {
    // `false < true`, so non-empty charsets (key `false`) sort ahead of the empty one.
    (cs.is_empty(), cs.ranges().iter().map(|r| (r.min, r.max)).collect())
}

/// Computes the set of states that can reach `drain` (reverse DFS over incoming edges) and
/// isolates everything else, without deleting any state.
fn prune_dead_states(graph: &mut Graph, drain: StateId) {
    let mut live: HashSet<StateId> = HashSet::new();
    let mut stack = vec![drain];
    while let Some(s) = stack.pop() {
        if !live.insert(s) {
            continue;
        }
        for (from, _) in graph.in_edges(s).map(|(s, e)| (s, e.clone())).collect::<Vec<_>>() {
            stack.push(from);
        }
    }

    let dead: Vec<StateId> = graph.all_states().filter(|s| !live.contains(s)).collect();
    for s in &dead {
        trace!("fa2regex: pruning dead state {s}");
        graph.isolate(*s);
    }
}

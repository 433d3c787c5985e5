// Copyright 2026 Mara Lindqvist.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Concrete end-to-end conversion scenarios, exercised through the public API only.

use std::collections::{HashMap, HashSet};

use fa2regex::{fa_to_regex, ConversionError, ConversionOptions, CharSet, FiniteAutomaton};

const MAX: u32 = 255;

struct TableAutomaton {
    initial: u32,
    finals: HashSet<u32>,
    edges: HashMap<u32, Vec<(u32, CharSet)>>,
}

impl FiniteAutomaton for TableAutomaton {
    type State = u32;

    fn initial(&self) -> u32 {
        self.initial
    }

    fn is_final(&self, s: &u32) -> bool {
        self.finals.contains(s)
    }

    fn out_edges(&self, s: &u32) -> Vec<(u32, CharSet)> {
        self.edges.get(s).cloned().unwrap_or_default()
    }
}

fn single(c: char) -> CharSet {
    CharSet::single(c as u32, MAX).unwrap()
}

/// A tiny backtracking matcher over the produced AST, used only to sanity-check scenario
/// output against the language the source automaton was built to describe.
fn matches_all(expr: &fa2regex::Expression, inputs: &[&str], expected: bool) {
    use fa2regex::ast::{Concatenation, Element};

    fn match_concat<'a>(c: &Concatenation, s: &'a str) -> Vec<&'a str> {
        let mut rests = vec![s];
        for el in &c.elements {
            let mut next = Vec::new();
            for r in rests {
                next.extend(match_element(el, r));
            }
            rests = next;
        }
        rests
    }

    fn match_element<'a>(el: &Element, s: &'a str) -> Vec<&'a str> {
        match el {
            Element::CharacterClass(cc) => {
                let mut chars = s.chars();
                match chars.next() {
                    Some(c) if cc.characters.has(c as u32) => vec![chars.as_str()],
                    _ => vec![],
                }
            }
            Element::Alternation(a) => a.alternatives.iter().flat_map(|c| match_concat(c, s)).collect(),
            Element::Assertion(_) => vec![],
            Element::Quantifier(q) => {
                let mut frontier = vec![s];
                let mut reachable = HashSet::new();
                if q.min == 0 {
                    reachable.insert(s);
                }
                let mut reps = 0u32;
                while !frontier.is_empty() {
                    if let fa2regex::ast::Bound::Finite(max) = q.max {
                        if reps >= max {
                            break;
                        }
                    }
                    reps += 1;
                    let mut next_frontier = Vec::new();
                    for r in &frontier {
                        for alt in &q.alternatives {
                            for rest in match_concat(alt, r) {
                                if reps >= q.min {
                                    reachable.insert(rest);
                                }
                                next_frontier.push(rest);
                            }
                        }
                    }
                    next_frontier.dedup();
                    if next_frontier == frontier {
                        break;
                    }
                    frontier = next_frontier;
                }
                reachable.into_iter().collect()
            }
        }
    }

    fn accepts(expr: &fa2regex::Expression, s: &str) -> bool {
        expr.alternatives.iter().any(|c| match_concat(c, s).iter().any(|rest| rest.is_empty()))
    }

    for &input in inputs {
        assert_eq!(accepts(expr, input), expected, "input {input:?} against {expr:?}");
    }
}

#[test]
fn s1_single_character() {
    let fa = TableAutomaton {
        initial: 0,
        finals: HashSet::from([1]),
        edges: HashMap::from([(0, vec![(1, single('a'))])]),
    };
    let expr = fa_to_regex(&fa, ConversionOptions::default()).unwrap();
    matches_all(&expr, &["a"], true);
    matches_all(&expr, &["", "b", "aa"], false);
}

#[test]
fn s2_initial_final_self_loop_becomes_star() {
    let fa = TableAutomaton {
        initial: 0,
        finals: HashSet::from([0]),
        edges: HashMap::from([(0, vec![(0, single('a'))])]),
    };
    let expr = fa_to_regex(&fa, ConversionOptions::default()).unwrap();
    matches_all(&expr, &["", "a", "aa", "aaaa"], true);
    matches_all(&expr, &["b", "ab"], false);
}

#[test]
fn s3_alternation_of_two_single_character_paths() {
    // `FiniteAutomaton::out_edges` allows at most one entry per target state, so a caller
    // translating e.g. an edge table with two parallel transitions between the same pair of
    // states already unions the charsets before handing them to the builder.
    let fa = TableAutomaton {
        initial: 0,
        finals: HashSet::from([1]),
        edges: HashMap::from([(0, vec![(1, single('a').union(&single('b')).unwrap())])]),
    };
    let expr = fa_to_regex(&fa, ConversionOptions::default()).unwrap();
    matches_all(&expr, &["a", "b"], true);
    matches_all(&expr, &["", "c", "ab"], false);
}

#[test]
fn s4_common_prefix_is_factored() {
    // 0 -a-> 1 -x-> 3 (final), 0 -a-> 2 -y-> 3 (final): "a(x|y)".
    let fa = TableAutomaton {
        initial: 0,
        finals: HashSet::from([3]),
        edges: HashMap::from([
            (0, vec![(1, single('a')), (2, single('a'))]),
            (1, vec![(3, single('x'))]),
            (2, vec![(3, single('y'))]),
        ]),
    };
    let expr = fa_to_regex(&fa, ConversionOptions::default()).unwrap();
    matches_all(&expr, &["ax", "ay"], true);
    matches_all(&expr, &["a", "x", "y", "axy"], false);
}

#[test]
fn s5_unreachable_final_yields_empty_language() {
    let fa = TableAutomaton {
        initial: 0,
        finals: HashSet::from([2]),
        edges: HashMap::from([(0, vec![(1, single('a'))])]),
    };
    let expr = fa_to_regex(&fa, ConversionOptions::default()).unwrap();
    assert_eq!(expr, fa2regex::Expression::default());
}

#[test]
fn s6_node_ceiling_is_enforced() {
    let mut edges = HashMap::new();
    for i in 0..500u32 {
        edges.insert(i, vec![(i + 1, single('a'))]);
    }
    let fa = TableAutomaton { initial: 0, finals: HashSet::from([500]), edges };
    let options = ConversionOptions::default().with_maximum_nodes(4);
    let result = fa_to_regex(&fa, options);
    assert!(matches!(result, Err(ConversionError::TooManyNodes { limit: 4 })));
}

// Copyright 2026 Mara Lindqvist.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Turns a finite automaton over character sets into an equivalent regular expression AST,
//! then simplifies it.
//!
//! The entry point is [`fa_to_regex`]: implement [`FiniteAutomaton`] for whatever automaton
//! representation you already have, hand it over with a [`ConversionOptions`], and get back an
//! [`ast::Expression`] built by classical state elimination and cleaned up by a handful of
//! size-reducing AST rewrites.
//!
//! ```no_run
//! use fa2regex::{fa_to_regex, ConversionOptions, FiniteAutomaton};
//! use fa2regex::CharSet;
//!
//! struct MyAutomaton;
//!
//! impl FiniteAutomaton for MyAutomaton {
//!     type State = u32;
//!     fn initial(&self) -> u32 { 0 }
//!     fn is_final(&self, state: &u32) -> bool { *state == 1 }
//!     fn out_edges(&self, state: &u32) -> Vec<(u32, CharSet)> {
//!         match state {
//!             0 => vec![(1, CharSet::single(b'a' as u32, 255).unwrap())],
//!             _ => vec![],
//!         }
//!     }
//! }
//!
//! let expr = fa_to_regex(&MyAutomaton, ConversionOptions::default()).unwrap();
//! ```

pub mod ast;
mod builder;
pub mod char_set;
mod eliminate;
mod error;
mod factory;
mod graph;
mod options;
mod simplify;

pub use ast::Expression;
pub use builder::FiniteAutomaton;
pub use char_set::{CharRange, CharSet};
pub use error::{ConversionError, Result};
pub use options::ConversionOptions;

use log::debug;

use builder::BuildResult;
use factory::NodeFactory;

/// Converts `automaton` into an equivalent, simplified [`Expression`].
///
/// Returns `Ok(Expression::default())` (no alternatives, matching no string) if no final state
/// is reachable from the initial state. Fails with [`ConversionError::TooManyNodes`] if the
/// conversion would need more than `options.maximum_nodes` AST nodes.
pub fn fa_to_regex<A: FiniteAutomaton>(automaton: &A, options: ConversionOptions) -> Result<Expression> {
    debug!(
        "fa2regex: starting conversion (maximum_nodes={}, maximum_optimization_passes={:?})",
        options.maximum_nodes, options.maximum_optimization_passes
    );

    let mut factory = NodeFactory::new(options.maximum_nodes);

    let mut graph = match builder::build(automaton, &mut factory)? {
        BuildResult::EmptyLanguage => {
            debug!("fa2regex: no reachable final state, returning the empty language");
            return Ok(Expression::default());
        }
        BuildResult::Graph(graph) => graph,
    };
    debug!("fa2regex: built a graph with {} states", graph_size(&graph));

    let residual = eliminate::eliminate(&mut graph, &mut factory)?;
    let mut expression = Expression { alternatives: vec![residual] };

    simplify::simplify(&mut factory, &mut expression, options.maximum_optimization_passes)?;
    debug!("fa2regex: conversion finished, {} AST nodes allocated", factory.node_count());

    Ok(expression)
}

fn graph_size(graph: &graph::Graph) -> usize {
    graph.num_states()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

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
        CharSet::single(c as u32, 255).unwrap()
    }

    #[test]
    fn empty_language_when_unreachable() {
        let fa = TableAutomaton { initial: 0, finals: HashSet::new(), edges: HashMap::new() };
        let expr = fa_to_regex(&fa, ConversionOptions::default()).unwrap();
        assert_eq!(expr, Expression::default());
    }

    #[test]
    fn single_character_fa_produces_single_char_class() {
        let fa = TableAutomaton {
            initial: 0,
            finals: HashSet::from([1]),
            edges: HashMap::from([(0, vec![(1, single('a'))])]),
        };
        let expr = fa_to_regex(&fa, ConversionOptions::default()).unwrap();
        assert_eq!(expr.alternatives.len(), 1);
        assert_eq!(expr.alternatives[0].elements.len(), 1);
        assert_eq!(expr.alternatives[0].elements[0], ast::Element::char_class(single('a')));
    }

    #[test]
    fn node_budget_is_enforced() {
        let mut edges = HashMap::new();
        let mut finals = HashSet::new();
        for i in 0..200u32 {
            edges.insert(i, vec![(i + 1, single('a'))]);
        }
        finals.insert(200);
        let fa = TableAutomaton { initial: 0, finals, edges };
        let options = ConversionOptions::default().with_maximum_nodes(5);
        let result = fa_to_regex(&fa, options);
        assert!(matches!(result, Err(ConversionError::TooManyNodes { limit: 5 })));
    }
}

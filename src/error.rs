// Copyright 2026 Mara Lindqvist.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error taxonomy for the conversion pipeline.
//!
//! Every fallible entry point in this crate returns `Result<_, ConversionError>`. Variants
//! carry enough context for a caller to render a diagnostic without re-deriving it from the
//! inputs.

use thiserror::Error;

/// Everything that can go wrong while converting a finite automaton into a regular
/// expression AST.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// A `CharRange` violated `0 <= min <= max <= maximum` at `CharSet` construction.
    #[error("range [{min}, {max}] is out of bounds for an alphabet of size {maximum}")]
    RangeOutOfBounds { min: u32, max: u32, maximum: u32 },

    /// A binary `CharSet` operation was attempted between sets with different `maximum`.
    #[error("domain mismatch: left alphabet maximum {left_maximum}, right alphabet maximum {right_maximum}")]
    DomainMismatch { left_maximum: u32, right_maximum: u32 },

    /// `Graph::link` was called on a pair of states that already has an edge.
    #[error("states {from} and {to} are already linked")]
    AlreadyLinked { from: usize, to: usize },

    /// `Graph::relink` was called on a pair of states with no existing edge.
    #[error("states {from} and {to} are not linked")]
    NotLinked { from: usize, to: usize },

    /// The AST node budget (`ConversionOptions::maximum_nodes`) was exhausted.
    #[error("exceeded the node budget of {limit} AST nodes")]
    TooManyNodes { limit: usize },

    /// A defensive invariant of the state-elimination engine was violated. This indicates a
    /// bug in the engine itself, or a malformed `FiniteAutomaton` implementation (e.g. one
    /// whose `out_edges` is not stable across two calls for the same state).
    #[error("state elimination failed to reach its terminal invariant: {0}")]
    StateEliminationFailed(String),

    /// An "impossible" match arm was reached during variant dispatch.
    #[error("unreachable: {0}")]
    Unreachable(&'static str),
}

pub type Result<T> = std::result::Result<T, ConversionError>;

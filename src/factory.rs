// Copyright 2026 Mara Lindqvist.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Constructs AST nodes on behalf of the builder and the elimination engine, enforcing the
//! global node-count ceiling (`ConversionOptions::maximum_nodes`) and providing the deep
//! structural `copy` used whenever a sub-AST must be duplicated along more than one new edge.

use crate::ast::{AssertionKind, Bound, Concatenation, Element};
use crate::char_set::CharSet;
use crate::error::{ConversionError, Result};

/// Owns the shared node-count budget for one conversion. A fresh `NodeFactory` is created per
/// call to `fa_to_regex` and dropped with it; nothing here outlives a single conversion.
#[derive(Debug)]
pub struct NodeFactory {
    limit: usize,
    count: usize,
}

impl NodeFactory {
    pub fn new(limit: usize) -> NodeFactory {
        NodeFactory { limit, count: 0 }
    }

    pub fn node_count(&self) -> usize {
        self.count
    }

    fn bump(&mut self) -> Result<()> {
        self.count += 1;
        if self.count > self.limit {
            Err(ConversionError::TooManyNodes { limit: self.limit })
        } else {
            Ok(())
        }
    }

    pub fn char_class(&mut self, characters: CharSet) -> Result<Element> {
        self.bump()?;
        Ok(Element::char_class(characters))
    }

    pub fn empty_concatenation(&mut self) -> Result<Concatenation> {
        self.bump()?;
        Ok(Concatenation { elements: Vec::new() })
    }

    pub fn concatenation(&mut self, elements: Vec<Element>) -> Result<Concatenation> {
        self.bump()?;
        Ok(Concatenation { elements })
    }

    pub fn alternation(&mut self, alternatives: Vec<Concatenation>) -> Result<Element> {
        self.bump()?;
        Ok(Element::Alternation(crate::ast::Alternation { alternatives }))
    }

    pub fn quantifier(&mut self, alternatives: Vec<Concatenation>, min: u32, max: Bound) -> Result<Element> {
        self.bump()?;
        Ok(Element::Quantifier(crate::ast::Quantifier { alternatives, min, max }))
    }

    #[allow(dead_code)]
    pub fn assertion(&mut self, kind: AssertionKind, negate: bool, alternatives: Vec<Concatenation>) -> Result<Element> {
        self.bump()?;
        Ok(Element::Assertion(crate::ast::Assertion { kind, negate, alternatives }))
    }

    /// Deep structural clone of `elem`, counting every copied node against the budget. The
    /// elimination engine always copies a sub-AST before handing it to a mutating combinator
    /// (`concat`/`union`/`star`/`plus`) whenever that sub-AST is reachable from more than one
    /// new edge (see `remove_state` in `eliminate`).
    pub fn copy_element(&mut self, elem: &Element) -> Result<Element> {
        self.bump()?;
        Ok(match elem {
            Element::CharacterClass(c) => Element::CharacterClass(c.clone()),
            Element::Alternation(a) => Element::Alternation(crate::ast::Alternation {
                alternatives: self.copy_concatenations(&a.alternatives)?,
            }),
            Element::Quantifier(q) => Element::Quantifier(crate::ast::Quantifier {
                alternatives: self.copy_concatenations(&q.alternatives)?,
                min: q.min,
                max: q.max,
            }),
            Element::Assertion(a) => Element::Assertion(crate::ast::Assertion {
                kind: a.kind,
                negate: a.negate,
                alternatives: self.copy_concatenations(&a.alternatives)?,
            }),
        })
    }

    pub fn copy_concatenation(&mut self, c: &Concatenation) -> Result<Concatenation> {
        self.bump()?;
        let elements = c
            .elements
            .iter()
            .map(|e| self.copy_element(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(Concatenation { elements })
    }

    fn copy_concatenations(&mut self, cs: &[Concatenation]) -> Result<Vec<Concatenation>> {
        cs.iter().map(|c| self.copy_concatenation(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_toward_budget() {
        let mut f = NodeFactory::new(2);
        assert!(f.char_class(CharSet::empty(10)).is_ok());
        assert!(f.char_class(CharSet::empty(10)).is_ok());
        assert!(f.char_class(CharSet::empty(10)).is_err());
    }

    #[test]
    fn copy_counts_every_node() {
        let mut f = NodeFactory::new(100);
        let leaf = f.char_class(CharSet::empty(10)).unwrap();
        let inner = f.concatenation(vec![leaf]).unwrap();
        let alt = f.alternation(vec![inner]).unwrap();
        let before = f.node_count();
        let copy = f.copy_element(&alt).unwrap();
        assert_eq!(copy, alt);
        // one node for the Alternation, one for its Concatenation, one for the CharacterClass.
        assert_eq!(f.node_count(), before + 3);
    }

    #[test]
    fn copy_respects_budget() {
        let mut f = NodeFactory::new(3);
        let leaf = f.char_class(CharSet::empty(10)).unwrap();
        let inner = f.concatenation(vec![leaf]).unwrap();
        let alt = f.alternation(vec![inner]).unwrap();
        assert!(f.copy_element(&alt).is_err());
    }
}

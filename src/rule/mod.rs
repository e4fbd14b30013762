//! Boolean cell expressions over signed surface numbers.
//!
//! A [`HeadRule`] is a tree whose leaves are signed surface numbers and
//! whose inner nodes are n-ary intersections and unions. A positive number
//! selects the positive half-space of the surface, a negative number the
//! complementary one. Complement is applied structurally (De Morgan), so it
//! never needs a node of its own.
//!
//! The empty intersection is all of space and is the default rule. The
//! empty union is the null region; it only appears as the complement of
//! all space.

mod composite;
mod evaluate;
mod parse;
mod simplify;

pub use composite::{get_head_rule, Composite};
pub use evaluate::Crossing;

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

use crate::error::{CombLayerError, Result, RuleError};

/// A node of a rule tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleNode {
    /// A signed surface half-space.
    Surf(i32),
    /// All children hold. Empty means all space.
    Intersection(Vec<RuleNode>),
    /// Any child holds. Empty means the null region.
    Union(Vec<RuleNode>),
}

impl RuleNode {
    fn complement(&self) -> RuleNode {
        match self {
            RuleNode::Surf(s) => RuleNode::Surf(-s),
            RuleNode::Intersection(items) => {
                RuleNode::Union(items.iter().map(RuleNode::complement).collect())
            }
            RuleNode::Union(items) => {
                RuleNode::Intersection(items.iter().map(RuleNode::complement).collect())
            }
        }
    }

    fn visit_leaves(&self, f: &mut impl FnMut(i32)) {
        match self {
            RuleNode::Surf(s) => f(*s),
            RuleNode::Intersection(items) | RuleNode::Union(items) => {
                for item in items {
                    item.visit_leaves(f);
                }
            }
        }
    }

    fn map_leaves(&mut self, f: &mut impl FnMut(i32) -> i32) {
        match self {
            RuleNode::Surf(s) => *s = f(*s),
            RuleNode::Intersection(items) | RuleNode::Union(items) => {
                for item in items {
                    item.map_leaves(f);
                }
            }
        }
    }

    /// Removes every leaf for which `drop` is true. A group emptied by the
    /// removal is removed too; `None` means nothing remains. Groups that
    /// were empty to begin with (all space, null) are kept.
    fn prune(self, drop: &impl Fn(i32) -> bool) -> Option<RuleNode> {
        match self {
            RuleNode::Surf(s) => (!drop(s)).then_some(RuleNode::Surf(s)),
            RuleNode::Intersection(items) if items.is_empty() => Some(RuleNode::Intersection(items)),
            RuleNode::Union(items) if items.is_empty() => Some(RuleNode::Union(items)),
            RuleNode::Intersection(items) => {
                let kept: Vec<_> = items.into_iter().filter_map(|n| n.prune(drop)).collect();
                (!kept.is_empty()).then_some(RuleNode::Intersection(kept))
            }
            RuleNode::Union(items) => {
                let kept: Vec<_> = items.into_iter().filter_map(|n| n.prune(drop)).collect();
                (!kept.is_empty()).then_some(RuleNode::Union(kept))
            }
        }
    }

    /// Evaluates the expression with `leaf` deciding each signed surface.
    pub(crate) fn evaluate(&self, leaf: &mut impl FnMut(i32) -> Result<bool>) -> Result<bool> {
        match self {
            RuleNode::Surf(s) => leaf(*s),
            RuleNode::Intersection(items) => {
                for item in items {
                    if !item.evaluate(leaf)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            RuleNode::Union(items) => {
                for item in items {
                    if item.evaluate(leaf)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn write_mcnp(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            RuleNode::Surf(s) => write!(f, "{s}"),
            RuleNode::Intersection(items) => {
                if items.is_empty() && nested {
                    return f.write_str("()");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    item.write_mcnp(f, true)?;
                }
                Ok(())
            }
            RuleNode::Union(items) => {
                if items.is_empty() {
                    return f.write_str("#()");
                }
                if nested {
                    f.write_str("(")?;
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" : ")?;
                    }
                    // Intersections bind tighter than unions; no brackets needed
                    item.write_mcnp(f, false)?;
                }
                if nested {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

/// A boolean region over signed surface numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadRule {
    root: RuleNode,
}

impl Default for HeadRule {
    fn default() -> Self {
        Self::all_space()
    }
}

impl From<i32> for HeadRule {
    fn from(surf: i32) -> Self {
        Self {
            root: RuleNode::Surf(surf),
        }
    }
}

impl FromStr for HeadRule {
    type Err = CombLayerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl HeadRule {
    /// The rule covering all of space (an empty intersection).
    #[must_use]
    pub fn all_space() -> Self {
        Self {
            root: RuleNode::Intersection(Vec::new()),
        }
    }

    /// The null region (an empty union).
    #[must_use]
    pub fn null() -> Self {
        Self {
            root: RuleNode::Union(Vec::new()),
        }
    }

    /// Wraps and normalizes a rule tree.
    #[must_use]
    pub fn from_node(node: RuleNode) -> Self {
        Self {
            root: simplify::normalize(node),
        }
    }

    /// Intersection of the given signed surfaces.
    #[must_use]
    pub fn from_surfaces(surfs: &[i32]) -> Self {
        Self::from_node(RuleNode::Intersection(
            surfs.iter().map(|&s| RuleNode::Surf(s)).collect(),
        ))
    }

    /// Parses a rule written with absolute signed surface numbers.
    ///
    /// Juxtaposition is intersection, `:` is union, parentheses group and
    /// `#(...)` complements a group. Intersection binds tighter than union.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] on malformed input.
    pub fn parse(text: &str) -> Result<Self> {
        let node = parse::parse_with(text, &mut |n| {
            if n == 0 {
                Err(RuleError::ZeroSurface.into())
            } else {
                Ok(n)
            }
        })?;
        Ok(Self::from_node(node))
    }

    /// The root of the rule tree.
    #[must_use]
    pub fn node(&self) -> &RuleNode {
        &self.root
    }

    /// True for the all-space rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(&self.root, RuleNode::Intersection(items) if items.is_empty())
    }

    /// True for the null region.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(&self.root, RuleNode::Union(items) if items.is_empty())
    }

    /// True if the top level of the rule is a union of several parts.
    #[must_use]
    pub fn is_union(&self) -> bool {
        matches!(&self.root, RuleNode::Union(items) if items.len() > 1)
    }

    /// The complement of this rule.
    #[must_use]
    pub fn complement(&self) -> Self {
        Self::from_node(self.root.complement())
    }

    /// Complements this rule in place.
    pub fn make_complement(&mut self) {
        *self = self.complement();
    }

    /// `self ∩ other`.
    #[must_use]
    pub fn intersect(&self, other: &HeadRule) -> Self {
        Self::from_node(RuleNode::Intersection(vec![
            self.root.clone(),
            other.root.clone(),
        ]))
    }

    /// `self ∪ other`.
    #[must_use]
    pub fn union(&self, other: &HeadRule) -> Self {
        Self::from_node(RuleNode::Union(vec![self.root.clone(), other.root.clone()]))
    }

    /// Intersects `other` into this rule.
    pub fn add_intersection(&mut self, other: &HeadRule) {
        *self = self.intersect(other);
    }

    /// Intersects a single signed surface into this rule.
    pub fn add_intersection_surf(&mut self, surf: i32) {
        self.add_intersection(&HeadRule::from(surf));
    }

    /// Unions `other` into this rule.
    pub fn add_union(&mut self, other: &HeadRule) {
        *self = self.union(other);
    }

    /// Set of surface numbers referenced, without sign.
    #[must_use]
    pub fn surf_set(&self) -> BTreeSet<i32> {
        let mut out = BTreeSet::new();
        self.root.visit_leaves(&mut |s| {
            out.insert(s.abs());
        });
        out
    }

    /// Set of signed surface numbers referenced.
    #[must_use]
    pub fn signed_surf_set(&self) -> BTreeSet<i32> {
        let mut out = BTreeSet::new();
        self.root.visit_leaves(&mut |s| {
            out.insert(s);
        });
        out
    }

    /// True if surface `|surf|` appears with either sign.
    #[must_use]
    pub fn contains_surf(&self, surf: i32) -> bool {
        let target = surf.abs();
        let mut found = false;
        self.root.visit_leaves(&mut |s| found |= s.abs() == target);
        found
    }

    /// The first signed surface in the rule, if any.
    #[must_use]
    pub fn primary_surface(&self) -> Option<i32> {
        let mut first = None;
        self.root.visit_leaves(&mut |s| {
            first.get_or_insert(s);
        });
        first
    }

    /// Splits the rule into its top-level components: the terms of a top
    /// intersection, the alternatives of a top union, or the rule itself.
    #[must_use]
    pub fn top_rules(&self) -> Vec<HeadRule> {
        match &self.root {
            RuleNode::Intersection(items) | RuleNode::Union(items) => items
                .iter()
                .map(|n| HeadRule { root: n.clone() })
                .collect(),
            RuleNode::Surf(_) => vec![self.clone()],
        }
    }

    /// Deletes every leaf that references surface `|surf|`.
    ///
    /// Groups emptied by the removal disappear with it; removing every leaf
    /// leaves all space.
    pub fn remove_surf(&mut self, surf: i32) {
        let target = surf.abs();
        self.prune_leaves(&|s| s.abs() == target);
    }

    /// Replaces `old` by `new`, keeping sense: leaf `old` becomes `new` and
    /// leaf `-old` becomes `-new`.
    pub fn substitute_surf(&mut self, old: i32, new: i32) {
        let mut root = self.root.clone();
        root.map_leaves(&mut |s| {
            if s == old {
                new
            } else if s == -old {
                -new
            } else {
                s
            }
        });
        *self = Self::from_node(root);
    }

    /// Re-applies algebraic simplification.
    pub fn simplify(&mut self) {
        self.root = simplify::normalize(std::mem::replace(
            &mut self.root,
            RuleNode::Intersection(Vec::new()),
        ));
    }

    pub(crate) fn prune_leaves(&mut self, drop: &impl Fn(i32) -> bool) {
        let root = std::mem::replace(&mut self.root, RuleNode::Intersection(Vec::new()));
        self.root = match root.prune(drop) {
            Some(node) => simplify::normalize(node),
            None => RuleNode::Intersection(Vec::new()),
        };
    }
}

impl fmt::Display for HeadRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.write_mcnp(f, false)
    }
}

impl Mul for HeadRule {
    type Output = HeadRule;

    fn mul(self, rhs: HeadRule) -> HeadRule {
        self.intersect(&rhs)
    }
}

impl Mul<&HeadRule> for &HeadRule {
    type Output = HeadRule;

    fn mul(self, rhs: &HeadRule) -> HeadRule {
        self.intersect(rhs)
    }
}

impl Add for HeadRule {
    type Output = HeadRule;

    fn add(self, rhs: HeadRule) -> HeadRule {
        self.union(&rhs)
    }
}

impl Add<&HeadRule> for &HeadRule {
    type Output = HeadRule;

    fn add(self, rhs: &HeadRule) -> HeadRule {
        self.union(rhs)
    }
}

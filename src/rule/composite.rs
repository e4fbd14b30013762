//! Building rules from component-local surface offsets.
//!
//! Components number their surfaces `build_index + offset` and write rules
//! in terms of the offsets (`"1 -2 -3"`). A [`Composite`] resolves each
//! chunk of such text against an explicitly named base, so a rule mixing
//! surfaces from two components records which base every term came from.

use tracing::trace;

use crate::error::{IndexError, Result, RuleError};
use crate::register::SurfaceRegister;

use super::{parse, HeadRule};

fn resolve(register: &SurfaceRegister, base: i32, offset: i32) -> Result<i32> {
    if offset == 0 {
        return Err(RuleError::ZeroSurface.into());
    }
    let index = base
        .checked_add(offset.abs())
        .ok_or_else(|| IndexError::out_of_range("surface offset", offset, usize::MAX))?;
    let global = register.real_surf(index)?;
    trace!(base, offset, global, "composite term resolved");
    Ok(if offset < 0 { -global } else { global })
}

fn resolve_text(register: &SurfaceRegister, base: i32, text: &str) -> Result<HeadRule> {
    let node = parse::parse_with(text, &mut |n| resolve(register, base, n))?;
    Ok(HeadRule::from_node(node))
}

/// Resolves `text` (signed offsets) against `base` in one step.
///
/// # Errors
///
/// Returns an error if the text is malformed or references an offset that
/// was never registered under `base`.
pub fn get_head_rule(register: &SurfaceRegister, base: i32, text: &str) -> Result<HeadRule> {
    resolve_text(register, base, text)
}

/// Incremental rule builder over one or more component bases.
///
/// ```ignore
/// let rule = Composite::new(&register, pipe_index)
///     .with("1 -2 -7")?
///     .with_base(flange_index, "17")?
///     .finish();
/// ```
#[derive(Debug)]
pub struct Composite<'a> {
    register: &'a SurfaceRegister,
    base: i32,
    rule: HeadRule,
}

impl<'a> Composite<'a> {
    /// Starts an all-space rule whose default base is `base`.
    #[must_use]
    pub fn new(register: &'a SurfaceRegister, base: i32) -> Self {
        Self {
            register,
            base,
            rule: HeadRule::all_space(),
        }
    }

    /// Intersects `text`, resolved against the default base.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or an offset is unknown.
    pub fn with(self, text: &str) -> Result<Self> {
        let base = self.base;
        self.with_base(base, text)
    }

    /// Intersects `text`, resolved against another component's base.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or an offset is unknown.
    pub fn with_base(mut self, base: i32, text: &str) -> Result<Self> {
        let chunk = resolve_text(self.register, base, text)?;
        self.rule.add_intersection(&chunk);
        Ok(self)
    }

    /// Unions `text`, resolved against `base`, with everything built so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or an offset is unknown.
    pub fn or_base(mut self, base: i32, text: &str) -> Result<Self> {
        let chunk = resolve_text(self.register, base, text)?;
        self.rule.add_union(&chunk);
        Ok(self)
    }

    /// Intersects an already-built rule (absolute surface numbers).
    #[must_use]
    pub fn with_rule(mut self, rule: &HeadRule) -> Self {
        self.rule.add_intersection(rule);
        self
    }

    /// Returns the finished rule.
    #[must_use]
    pub fn finish(self) -> HeadRule {
        self.rule
    }
}

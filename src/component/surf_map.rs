use std::collections::BTreeMap;

use crate::error::{IndexError, LookupError, Result};
use crate::rule::HeadRule;

/// Component-local table of named signed surfaces.
///
/// A leading `-` on a lookup name reverses the sense: `signed_surf("-front")`
/// is the negation of `signed_surf("front")`.
#[derive(Debug, Clone, Default)]
pub struct SurfMap {
    surfs: BTreeMap<String, Vec<i32>>,
}

fn split_sign(name: &str) -> (i32, &str) {
    match name.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, name),
    }
}

impl SurfMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to a single signed surface, replacing any earlier binding.
    pub fn set_surf(&mut self, name: &str, surf: i32) {
        self.surfs.insert(name.to_string(), vec![surf]);
    }

    /// Appends a signed surface to `name`.
    pub fn add_surf(&mut self, name: &str, surf: i32) {
        self.surfs.entry(name.to_string()).or_default().push(surf);
    }

    #[must_use]
    pub fn has_surf(&self, name: &str) -> bool {
        self.surfs.contains_key(split_sign(name).1)
    }

    /// The first surface bound to `name`, as stored.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown name.
    pub fn surf(&self, name: &str) -> Result<i32> {
        self.surf_at(name, 0)
    }

    /// The `index`-th surface bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown name, an index error past the
    /// end of the list.
    pub fn surf_at(&self, name: &str, index: usize) -> Result<i32> {
        let list = self.surfs(name)?;
        list.get(index).copied().ok_or_else(|| {
            IndexError::out_of_range("surface list", i64::try_from(index).unwrap_or(i64::MAX), list.len())
                .into()
        })
    }

    /// # Errors
    ///
    /// Returns a lookup error for an unknown name.
    pub fn surfs(&self, name: &str) -> Result<&[i32]> {
        self.surfs
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| LookupError::not_found("named surface", name).into())
    }

    /// First surface of `name`, negated for a `-name` lookup.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown name.
    pub fn signed_surf(&self, name: &str) -> Result<i32> {
        let (sign, key) = split_sign(name);
        Ok(sign * self.surf(key)?)
    }

    /// Intersection of every surface bound to `name`; complemented for a
    /// `-name` lookup.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown name.
    pub fn surf_rule(&self, name: &str) -> Result<HeadRule> {
        let (sign, key) = split_sign(name);
        let rule = HeadRule::from_surfaces(self.surfs(key)?);
        Ok(if sign < 0 { rule.complement() } else { rule })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.surfs.keys().map(String::as_str)
    }
}

//! Entity resolution against the cached view.
//!
//! The northbound schema has no unique index on names, so lookups scan the
//! cached table and insist on at most one match.

use crate::error::{OvnError, Result};
use crate::model::{Model, Named};

use super::OvnClient;

impl OvnClient {
    /// All cached rows of `M` accepted by `predicate`.
    pub fn where_cache<M, F>(&self, predicate: F) -> Result<Vec<M>>
    where
        M: Model,
        F: Fn(&M) -> bool,
    {
        let rows = self.store.select(M::TABLE, &|_| true)?;
        let mut models = Vec::with_capacity(rows.len());
        for row in &rows {
            let model = M::from_row(row)?;
            if predicate(&model) {
                models.push(model);
            }
        }
        Ok(models)
    }

    /// Resolve exactly one row of `M` matching `predicate`.
    ///
    /// `what` names the lookup in errors. Zero matches yield `Ok(None)` when
    /// `ignore_not_found` is set and `NotFound` otherwise; more than one
    /// match is always `Ambiguous`.
    pub fn resolve<M, F>(
        &self,
        what: &str,
        predicate: F,
        ignore_not_found: bool,
    ) -> Result<Option<M>>
    where
        M: Model,
        F: Fn(&M) -> bool,
    {
        let mut matches = self.where_cache(predicate)?;

        match matches.len() {
            0 if ignore_not_found => Ok(None),
            0 => Err(OvnError::NotFound {
                kind: M::TABLE,
                name: what.to_string(),
            }),
            1 => Ok(matches.pop()),
            count => Err(OvnError::Ambiguous {
                kind: M::TABLE,
                name: what.to_string(),
                count,
            }),
        }
    }

    /// Resolve a named row by exact name.
    pub fn get_by_name<M: Named>(&self, name: &str, ignore_not_found: bool) -> Result<Option<M>> {
        self.resolve(name, |m: &M| m.name() == name, ignore_not_found)
    }

    /// Resolve a named row that must exist.
    pub fn require<M: Named>(&self, name: &str) -> Result<M> {
        self.get_by_name(name, false)?.ok_or_else(|| OvnError::NotFound {
            kind: M::TABLE,
            name: name.to_string(),
        })
    }

    /// Whether exactly one row named `name` exists. Ambiguity is an error.
    pub fn exists<M: Named>(&self, name: &str) -> Result<bool> {
        Ok(self.get_by_name::<M>(name, true)?.is_some())
    }

    /// Resolve each name, skipping the ones that no longer exist, and return
    /// the UUIDs found. Ambiguity still fails the whole call.
    pub(crate) fn resolve_uuids<M: Named>(&self, names: &[&str]) -> Result<Vec<String>> {
        let mut uuids = Vec::with_capacity(names.len());
        for name in names {
            if let Some(model) = self.get_by_name::<M>(name, true)? {
                uuids.push(model.uuid().to_string());
            }
        }
        Ok(uuids)
    }
}

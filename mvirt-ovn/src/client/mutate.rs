//! Mutation operation builder.
//!
//! Turns a resolved entity plus a list of mutation intents into store
//! operations without touching the store.

use crate::error::{OvnError, Result, ResultExt};
use crate::model::{Model, Named};
use crate::store::{Mutation, Mutator, Operation};

use super::OvnClient;

/// A mutation intent: a pure function of the resolved entity that yields the
/// column change to apply, or `None` to skip.
pub type MutationFn<'a, M> = &'a dyn Fn(&M) -> Option<Mutation>;

/// Build the mutate operations for `entity`.
///
/// `None` intents are dropped; if every intent declines, no operation is
/// produced. A missing entity is a contract violation reported as
/// `InvalidArgument`. Mutations on undeclared columns, and assignments that
/// would overwrite a relationship column, are rejected the same way.
pub fn build_mutate_ops<M: Model>(
    entity: Option<&M>,
    intents: &[MutationFn<'_, M>],
) -> Result<Vec<Operation>> {
    let Some(entity) = entity else {
        return Err(OvnError::InvalidArgument(format!(
            "cannot mutate a missing {}",
            M::TABLE.kind()
        )));
    };

    let mut mutations = Vec::with_capacity(intents.len());
    for intent in intents {
        let Some(mutation) = intent(entity) else {
            continue;
        };

        if !M::COLUMNS.contains(&mutation.column.as_str()) {
            return Err(OvnError::InvalidArgument(format!(
                "{} has no column {}",
                M::TABLE,
                mutation.column
            )));
        }
        if mutation.mutator == Mutator::Assign
            && M::REFERENCES.contains(&mutation.column.as_str())
        {
            return Err(OvnError::InvalidArgument(format!(
                "{}.{} holds references and may only be mutated with insert or delete",
                M::TABLE,
                mutation.column
            )));
        }

        mutations.push(mutation);
    }

    if mutations.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Operation::mutate(entity, mutations)])
}

impl OvnClient {
    /// Resolve the named entity (which must exist) and build its mutate
    /// operations.
    pub fn entity_op<M: Named>(
        &self,
        name: &str,
        intents: &[MutationFn<'_, M>],
    ) -> Result<Vec<Operation>> {
        let entity = self
            .get_by_name::<M>(name, false)
            .context_with(|| {
                format!(
                    "get {} {} when generate mutate operations",
                    M::TABLE.kind(), name
                )
            })?;

        if intents.is_empty() {
            return Ok(Vec::new());
        }

        build_mutate_ops(entity.as_ref(), intents).context_with(|| {
            format!("generate operations for mutating {} {}", M::TABLE.kind(), name)
        })
    }
}

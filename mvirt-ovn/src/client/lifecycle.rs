//! Idempotent lifecycle operations and the generic relationship composer.
//!
//! These are the building blocks the kind-specific modules delegate to:
//! create-if-absent, delete-if-present, batched deletes collapsed into one
//! transaction, and attach/detach of children to a parent set column.

use tracing::info;

use crate::error::{Result, ResultExt};
use crate::model::{Model, Named};
use crate::store::{Mutation, Mutator, Operation};

use super::{OvnClient, build_mutate_ops};

/// Operations removing `uuids` from `column` of every row in `parents`.
///
/// Used by deletes of contained rows, which detach from their owner in the
/// same transaction.
pub(crate) fn detach_ops<P: Model>(
    parents: &[P],
    column: &str,
    uuids: &[String],
) -> Result<Vec<Operation>> {
    let mut ops = Vec::with_capacity(parents.len());
    for parent in parents {
        let mutation = |_: &P| Mutation::members(column, uuids, Mutator::Delete);
        ops.extend(build_mutate_ops(Some(parent), &[&mutation])?);
    }
    Ok(ops)
}

/// Delete operations for already resolved rows.
pub(crate) fn delete_ops<M: Model>(rows: &[M]) -> Vec<Operation> {
    rows.iter().map(Operation::delete).collect()
}

impl OvnClient {
    /// Create `model` unless a row with the same name exists.
    ///
    /// Returns `true` when a row was written.
    pub async fn create_if_absent<M: Named>(&self, label: &str, model: M) -> Result<bool> {
        let kind = M::TABLE.kind();
        let name = model.name().to_string();

        if self.exists::<M>(&name)? {
            return Ok(false);
        }

        self.transact(label, vec![Operation::create(&model)])
            .await
            .context_with(|| format!("create {} {}", kind, name))?;

        info!(kind, name = %name, uuid = model.uuid(), "created");
        Ok(true)
    }

    /// Operations deleting the row named `name`, or none if it is absent.
    pub fn delete_op<M: Named>(&self, name: &str) -> Result<Vec<Operation>> {
        let Some(model) = self
            .get_by_name::<M>(name, true)
            .context_with(|| {
                format!("get {} {} when generate delete operations", M::TABLE.kind(), name)
            })?
        else {
            return Ok(Vec::new());
        };

        Ok(vec![Operation::delete(&model)])
    }

    /// Delete the row named `name` if it exists.
    pub async fn delete_by_name<M: Named>(&self, label: &str, name: &str) -> Result<()> {
        self.delete_many::<M>(label, &[name]).await
    }

    /// Delete every named row in one transaction.
    ///
    /// Missing names are skipped. Any ambiguous name aborts the batch before
    /// anything is submitted. An empty batch is accepted as a no-op.
    pub async fn delete_many<M: Named>(&self, label: &str, names: &[&str]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let mut ops = Vec::with_capacity(names.len());
        for name in names {
            ops.extend(self.delete_op::<M>(name)?);
        }

        if ops.is_empty() {
            return Ok(());
        }

        let deleted = ops.len();
        self.transact(label, ops)
            .await
            .context_with(|| format!("delete {} {:?}", M::TABLE.kind(), names))?;

        info!(kind = M::TABLE.kind(), ?names, deleted, "deleted");
        Ok(())
    }

    /// Operations inserting or deleting `child_uuids` in `column` of the
    /// parent named `parent` (which must exist).
    pub fn update_members_op<P: Named>(
        &self,
        parent: &str,
        column: &str,
        child_uuids: &[String],
        mutator: Mutator,
    ) -> Result<Vec<Operation>> {
        if child_uuids.is_empty() {
            return Ok(Vec::new());
        }

        let mutation = |_: &P| Mutation::members(column, child_uuids, mutator);
        self.entity_op::<P>(parent, &[&mutation])
    }

    /// Attach or detach the children named `children` to or from `parent`.
    ///
    /// Children that no longer exist are treated as already detached and
    /// skipped; the parent must exist. If no child resolves, nothing is
    /// submitted.
    pub async fn update_children<P: Named, C: Named>(
        &self,
        label: &str,
        parent: &str,
        column: &str,
        mutator: Mutator,
        children: &[&str],
    ) -> Result<()> {
        if children.is_empty() {
            return Ok(());
        }

        let uuids = self.resolve_uuids::<C>(children)?;
        if uuids.is_empty() {
            return Ok(());
        }

        let ops = self
            .update_members_op::<P>(parent, column, &uuids, mutator)
            .context_with(|| {
                format!(
                    "generate operations for {} {} update {} {:?}",
                    P::TABLE.kind(), parent, column, children
                )
            })?;

        self.transact(label, ops).await.context_with(|| {
            format!("{} {} update {} {:?}", P::TABLE.kind(), parent, column, children)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use crate::error::ErrorKind;
    use crate::model::{LoadBalancer, LogicalSwitch};
    use crate::store::{Mutator, Operation, Store};

    fn lb(name: &str) -> LoadBalancer {
        LoadBalancer {
            uuid: super::super::new_uuid(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_if_absent_is_idempotent() {
        let (client, store) = testing::client();

        assert!(client.create_if_absent("lb-add", lb("lb1")).await.unwrap());
        assert!(!client.create_if_absent("lb-add", lb("lb1")).await.unwrap());

        assert_eq!(store.transaction_count(), 1);
        assert_eq!(client.where_cache(|_: &LoadBalancer| true).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let (client, store) = testing::client();

        client.delete_by_name::<LoadBalancer>("lb-del", "gone").await.unwrap();
        client.delete_many::<LoadBalancer>("lb-del", &[]).await.unwrap();
        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_many_aborts_on_ambiguity() {
        let (client, store) = testing::client();
        client.create_if_absent("lb-add", lb("a")).await.unwrap();
        store
            .transact(vec![Operation::create(&lb("dup")), Operation::create(&lb("dup"))])
            .await
            .unwrap();
        let before = store.transaction_count();

        let err = client
            .delete_many::<LoadBalancer>("lb-del", &["a", "dup"])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Ambiguous);
        assert_eq!(store.transaction_count(), before);
        assert!(client.exists::<LoadBalancer>("a").unwrap());
    }

    #[tokio::test]
    async fn test_update_children_requires_parent() {
        let (client, _store) = testing::client();
        client.create_if_absent("lb-add", lb("lb1")).await.unwrap();

        let err = client
            .update_children::<LogicalSwitch, LoadBalancer>(
                "ls-lb-update",
                "missing-switch",
                "load_balancer",
                Mutator::Insert,
                &["lb1"],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_children_without_live_children_is_noop() {
        let (client, store) = testing::client();

        // Parent is not even looked up when no child resolves
        client
            .update_children::<LogicalSwitch, LoadBalancer>(
                "ls-lb-update",
                "missing-switch",
                "load_balancer",
                Mutator::Insert,
                &["gone"],
            )
            .await
            .unwrap();
        assert_eq!(store.transaction_count(), 0);
    }
}

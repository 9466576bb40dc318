//! Query runtime
//!
//! A query is a pure function from the global scope tree (plus parameters)
//! to a result, bound to a working set and a lock timeout. Running a query
//! is the only sanctioned way to read the global scope: `execute` obtains
//! the read lock within the configured timeout, runs the function, and
//! releases the lock whatever happens.
//!
//! `execute_async` runs the same discipline on a blocking worker task.
//! Cancellation is honored at exactly two checkpoints, before lock
//! acquisition and immediately after; once the body runs, it runs to
//! completion.

use crate::model::tree::ScopeTree;
use crate::workingset::WorkingSet;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type QueryFn<P, R> = dyn Fn(&ScopeTree, P) -> R + Send + Sync;

/// A read-only query over a working set's global scope.
pub struct Query<P, R> {
    working_set: WorkingSet,
    timeout: Duration,
    func: Arc<QueryFn<P, R>>,
}

impl<P, R> Clone for Query<P, R> {
    fn clone(&self) -> Self {
        Self {
            working_set: self.working_set.clone(),
            timeout: self.timeout,
            func: Arc::clone(&self.func),
        }
    }
}

impl<P, R> Query<P, R> {
    /// Bind a query function to a working set with a lock timeout. Multi-
    /// parameter queries take a tuple as `P`.
    pub fn new(
        working_set: &WorkingSet,
        timeout: Duration,
        func: impl Fn(&ScopeTree, P) -> R + Send + Sync + 'static,
    ) -> Self {
        Self {
            working_set: working_set.clone(),
            timeout,
            func: Arc::new(func),
        }
    }

    /// The configured lock timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the query body under the read lock. Fails with `LockTimeout`
    /// when the lock cannot be obtained in time and `Disposed` after the
    /// working set is gone; the lock is released on every path.
    pub fn execute(&self, params: P) -> Result<R> {
        let scope = self.working_set.try_obtain_read_lock(self.timeout)?;
        Ok((self.func)(&scope, params))
    }
}

impl<P, R> Query<P, R>
where
    P: Send + 'static,
    R: Send + 'static,
{
    /// Run the query on a blocking worker task. The token is checked before
    /// lock acquisition and immediately after; a cancelled query never runs
    /// its body.
    pub async fn execute_async(&self, params: P, cancel: CancellationToken) -> Result<R> {
        let query = self.clone();
        let handle = tokio::task::spawn_blocking(move || {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let scope = query.working_set.try_obtain_read_lock(query.timeout)?;
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            Ok((query.func)(&scope, params))
        });
        match handle.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Err(_) => Err(Error::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ScopeFragment;
    use crate::language::Language;
    use crate::location::{SourceLocation, StructuralPath};
    use crate::model::scope::{NamespaceData, ScopeKind};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn populate(ws: &WorkingSet) {
        let mut tree = ScopeTree::new();
        let ns = tree.create_scope(
            ScopeKind::Namespace(NamespaceData::named("App")),
            Language::CSharp,
        );
        tree.add_location(
            ns,
            SourceLocation::definition(
                "a.cs",
                1,
                1,
                StructuralPath::parse("/unit/namespace[1]").unwrap(),
            ),
        );
        tree.attach(tree.root(), ns);
        ws.add_fragment("a.cs", ScopeFragment::new(tree, Vec::new()))
            .unwrap();
    }

    #[test]
    fn test_execute_runs_under_read_lock() {
        let ws = WorkingSet::new();
        populate(&ws);

        let query = Query::new(&ws, Duration::from_millis(100), |tree, name: String| {
            tree.named_children(tree.root(), &name).len()
        });
        assert_eq!(query.execute("App".to_string()).unwrap(), 1);
        assert_eq!(query.execute("Missing".to_string()).unwrap(), 0);

        // The lock was released: a write goes through afterwards.
        assert!(ws.remove_file("a.cs").unwrap());
    }

    #[test]
    fn test_readers_do_not_exclude_each_other() {
        let ws = WorkingSet::new();
        populate(&ws);
        let query = Query::new(&ws, Duration::from_millis(50), |tree, (): ()| {
            tree.files().count()
        });

        let scope = ws.try_obtain_read_lock(Duration::from_millis(100)).unwrap();
        // Readers don't exclude each other.
        assert_eq!(query.execute(()).unwrap(), 1);
        drop(scope);
    }

    #[test]
    fn test_execute_on_disposed_working_set_fails() {
        let ws = WorkingSet::new();
        let query = Query::new(&ws, Duration::from_millis(50), |_, (): ()| 0usize);
        ws.dispose();
        assert!(matches!(query.execute(()), Err(Error::Disposed)));
    }

    #[tokio::test]
    async fn test_execute_async_returns_result() {
        let ws = WorkingSet::new();
        populate(&ws);
        let query = Query::new(&ws, Duration::from_millis(100), |tree, (): ()| {
            tree.files().count()
        });
        let result = query.execute_async((), CancellationToken::new()).await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_query_never_runs_its_body() {
        static RAN: AtomicBool = AtomicBool::new(false);

        let ws = WorkingSet::new();
        populate(&ws);
        let query = Query::new(&ws, Duration::from_millis(100), |_, (): ()| {
            RAN.store(true, Ordering::SeqCst);
        });

        let token = CancellationToken::new();
        token.cancel();
        let result = query.execute_async((), token).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!RAN.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_multi_parameter_queries_take_tuples() {
        let ws = WorkingSet::new();
        populate(&ws);
        let query = Query::new(
            &ws,
            Duration::from_millis(100),
            |tree, (name, want): (String, usize)| {
                tree.named_children(tree.root(), &name).len() == want
            },
        );
        assert!(query
            .execute_async(("App".to_string(), 1), CancellationToken::new())
            .await
            .unwrap());
    }
}

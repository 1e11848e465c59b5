//! Behavior composition - ordered augmentations over a page component
//!
//! A page acquires its optional capabilities (filtering, paging, sorting,
//! dirty-tracking) by composing an ordered sequence of augmentations onto
//! itself. Composition yields an [`OpTable`]: named operations the UI can
//! invoke on the page. Each augmentation contributes state initialization
//! (run exactly once, in application order) and zero or more named
//! operations.
//!
//! # Shadowing
//!
//! When two augmentations contribute the same operation name, the
//! later-applied handler is the one invoked. The earlier handler stays
//! reachable, but only through the [`Parent`] handle the active handler
//! receives - delegation up the chain is always deliberate, never implicit.
//!
//! Shadowing itself must be declared: a later augmentation takes over an
//! existing name only with [`Op::overriding`]. An undeclared collision is a
//! [`ComposeError`] at composition time, not a silent last-wins.
//!
//! # Capability checks
//!
//! "Does this page support filtering?" is answered by tagged presence
//! ([`OpTable::supports`]), which is independent of the order augmentations
//! were applied in.

use futures::future::LocalBoxFuture;
use std::collections::HashMap;
use std::fmt;

/// Future returned by an operation handler.
///
/// Handlers run on the UI event-loop task and hold `&mut` access to their
/// page across awaits; they are deliberately not `Send`.
pub type OpFuture<'a> = LocalBoxFuture<'a, anyhow::Result<()>>;

/// An operation handler: plain function over the page plus a parent handle
pub type OpFn<P> = for<'a> fn(&'a mut P, Parent<P>) -> OpFuture<'a>;

/// A named operation contributed by an augmentation
pub struct Op<P> {
    name: &'static str,
    handler: OpFn<P>,
    overriding: bool,
}

impl<P> Op<P> {
    /// Contribute a new operation; composing fails if the name exists
    pub fn new(name: &'static str, handler: OpFn<P>) -> Self {
        Self {
            name,
            handler,
            overriding: false,
        }
    }

    /// Take over an existing operation; the shadowed handler becomes the
    /// parent of this one
    pub fn overriding(name: &'static str, handler: OpFn<P>) -> Self {
        Self {
            name,
            handler,
            overriding: true,
        }
    }
}

/// A bundle of state initialization and named operations
pub struct Augmentation<P> {
    name: &'static str,
    init: fn(&mut P),
    ops: Vec<Op<P>>,
}

impl<P> Augmentation<P> {
    pub fn new(name: &'static str, init: fn(&mut P)) -> Self {
        Self {
            name,
            init,
            ops: Vec::new(),
        }
    }

    pub fn op(mut self, op: Op<P>) -> Self {
        self.ops.push(op);
        self
    }
}

/// Composition failure: an undeclared operation-name collision
#[derive(Debug, PartialEq, Eq)]
pub enum ComposeError {
    Conflict {
        op: &'static str,
        earlier: &'static str,
        later: &'static str,
    },
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeError::Conflict { op, earlier, later } => write!(
                f,
                "operation '{}' from '{}' collides with '{}'; declare it with Op::overriding",
                op, later, earlier
            ),
        }
    }
}

impl std::error::Error for ComposeError {}

/// Applies augmentations in order and builds the operation table
pub struct Composer<P> {
    augmentations: Vec<Augmentation<P>>,
}

impl<P> Composer<P> {
    pub fn new() -> Self {
        Self {
            augmentations: Vec::new(),
        }
    }

    pub fn with(mut self, augmentation: Augmentation<P>) -> Self {
        self.augmentations.push(augmentation);
        self
    }

    /// Run every augmentation's init exactly once, in application order,
    /// and collect the operation chains. On error the target is partially
    /// initialized and must be discarded.
    pub fn apply(self, target: &mut P) -> Result<OpTable<P>, ComposeError> {
        let mut chains: HashMap<&'static str, Vec<ChainEntry<P>>> = HashMap::new();
        let mut applied = Vec::with_capacity(self.augmentations.len());

        for augmentation in self.augmentations {
            (augmentation.init)(target);
            applied.push(augmentation.name);

            for op in augmentation.ops {
                let chain = chains.entry(op.name).or_default();
                if let Some(current) = chain.last() {
                    if !op.overriding {
                        return Err(ComposeError::Conflict {
                            op: op.name,
                            earlier: current.augmentation,
                            later: augmentation.name,
                        });
                    }
                    tracing::debug!(
                        "operation '{}': '{}' shadows '{}'",
                        op.name,
                        augmentation.name,
                        current.augmentation
                    );
                }
                chain.push(ChainEntry {
                    augmentation: augmentation.name,
                    handler: op.handler,
                });
            }
        }

        Ok(OpTable { chains, applied })
    }
}

impl<P> Default for Composer<P> {
    fn default() -> Self {
        Self::new()
    }
}

struct ChainEntry<P> {
    augmentation: &'static str,
    handler: OpFn<P>,
}

/// The composed operations of one page
pub struct OpTable<P> {
    chains: HashMap<&'static str, Vec<ChainEntry<P>>>,
    applied: Vec<&'static str>,
}

impl<P> fmt::Debug for OpTable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpTable")
            .field("ops", &self.chains.keys().collect::<Vec<_>>())
            .field("applied", &self.applied)
            .finish()
    }
}

impl<P> OpTable<P> {
    /// A table with no operations, for pages before composition finishes
    pub fn empty() -> Self {
        Self {
            chains: HashMap::new(),
            applied: Vec::new(),
        }
    }

    /// Tagged capability presence, order-independent
    pub fn supports(&self, name: &str) -> bool {
        self.chains.contains_key(name)
    }

    /// All operation names, sorted for stable display
    pub fn operations(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.chains.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Augmentation names in application order
    #[allow(dead_code)]
    pub fn applied(&self) -> &[&'static str] {
        &self.applied
    }

    /// The augmentation whose handler is active for an operation
    #[allow(dead_code)]
    pub fn provider(&self, name: &str) -> Option<&'static str> {
        self.chains
            .get(name)
            .and_then(|c| c.last())
            .map(|e| e.augmentation)
    }

    /// Invoke the active (last-contributed) handler for an operation
    pub async fn invoke(&self, target: &mut P, name: &str) -> anyhow::Result<()> {
        let chain = self
            .chains
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("operation '{}' is not available on this page", name))?;

        let mut handlers: Vec<OpFn<P>> = chain.iter().map(|e| e.handler).collect();
        let active = handlers.pop().expect("composed chains are never empty");
        active(target, Parent { chain: handlers }).await
    }
}

/// Handle to the handlers shadowed by the active one.
///
/// `invoke` runs the nearest shadowed handler, which in turn receives a
/// handle to the rest of the chain. An exhausted handle is a no-op.
pub struct Parent<P> {
    chain: Vec<OpFn<P>>,
}

impl<P> Parent<P> {
    /// A handle with nothing above it
    #[allow(dead_code)]
    pub fn root() -> Self {
        Self { chain: Vec::new() }
    }

    #[allow(dead_code)]
    pub fn is_root(&self) -> bool {
        self.chain.is_empty()
    }

    /// Delegate to the shadowed handler
    pub fn invoke(mut self, target: &mut P) -> OpFuture<'_> {
        Box::pin(async move {
            match self.chain.pop() {
                None => Ok(()),
                Some(handler) => handler(target, Self { chain: self.chain }).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        inits: Vec<&'static str>,
        calls: Vec<&'static str>,
    }

    fn record_search(p: &mut Probe, _parent: Parent<Probe>) -> OpFuture<'_> {
        Box::pin(async move {
            p.calls.push("first.search");
            Ok(())
        })
    }

    fn record_export(p: &mut Probe, _parent: Parent<Probe>) -> OpFuture<'_> {
        Box::pin(async move {
            p.calls.push("first.export");
            Ok(())
        })
    }

    fn shadowing_search(p: &mut Probe, parent: Parent<Probe>) -> OpFuture<'_> {
        Box::pin(async move {
            parent.invoke(p).await?;
            p.calls.push("second.search");
            Ok(())
        })
    }

    fn silent_search(p: &mut Probe, _parent: Parent<Probe>) -> OpFuture<'_> {
        Box::pin(async move {
            p.calls.push("second.search-only");
            Ok(())
        })
    }

    fn first() -> Augmentation<Probe> {
        Augmentation::new("first", |p: &mut Probe| p.inits.push("first"))
            .op(Op::new("search", record_search))
            .op(Op::new("export", record_export))
    }

    #[tokio::test]
    async fn test_disjoint_ops_all_exposed_and_inits_run_once_in_order() {
        let second = Augmentation::new("second", |p: &mut Probe| p.inits.push("second"));

        let mut probe = Probe::default();
        let table = Composer::new()
            .with(first())
            .with(second)
            .apply(&mut probe)
            .unwrap();

        assert_eq!(probe.inits, vec!["first", "second"]);
        assert_eq!(table.applied(), &["first", "second"]);
        assert_eq!(table.operations(), vec!["export", "search"]);
        assert!(table.supports("search"));
        assert!(!table.supports("save"));

        table.invoke(&mut probe, "export").await.unwrap();
        assert_eq!(probe.calls, vec!["first.export"]);
    }

    #[tokio::test]
    async fn test_declared_override_shadows_and_delegates_via_parent() {
        let second = Augmentation::new("second", |_: &mut Probe| {})
            .op(Op::overriding("search", shadowing_search));

        let mut probe = Probe::default();
        let table = Composer::new()
            .with(first())
            .with(second)
            .apply(&mut probe)
            .unwrap();

        assert_eq!(table.provider("search"), Some("second"));

        table.invoke(&mut probe, "search").await.unwrap();
        // Parent delegation ran the shadowed handler first
        assert_eq!(probe.calls, vec!["first.search", "second.search"]);
    }

    #[tokio::test]
    async fn test_shadowed_handler_runs_only_through_parent() {
        let second = Augmentation::new("second", |_: &mut Probe| {})
            .op(Op::overriding("search", silent_search));

        let mut probe = Probe::default();
        let table = Composer::new()
            .with(first())
            .with(second)
            .apply(&mut probe)
            .unwrap();

        table.invoke(&mut probe, "search").await.unwrap();
        assert_eq!(probe.calls, vec!["second.search-only"]);
    }

    #[test]
    fn test_undeclared_collision_is_a_compose_error() {
        let second =
            Augmentation::new("second", |_: &mut Probe| {}).op(Op::new("search", silent_search));

        let mut probe = Probe::default();
        let err = Composer::new()
            .with(first())
            .with(second)
            .apply(&mut probe)
            .unwrap_err();

        assert_eq!(
            err,
            ComposeError::Conflict {
                op: "search",
                earlier: "first",
                later: "second",
            }
        );
    }

    #[tokio::test]
    async fn test_exhausted_parent_is_a_no_op() {
        let mut probe = Probe::default();
        Parent::<Probe>::root().invoke(&mut probe).await.unwrap();
        assert!(probe.calls.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_operation_is_an_error() {
        let mut probe = Probe::default();
        let table = Composer::new().with(first()).apply(&mut probe).unwrap();
        assert!(table.invoke(&mut probe, "save").await.is_err());
    }
}

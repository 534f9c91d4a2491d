//! The dimensional evaluation context
//!
//! An [`Evaluator`] assigns one current member to every hierarchy of the
//! cube, plus evaluation flags. `push` operations return a *new* evaluator
//! overriding part of the assignment; the receiver stays valid and
//! reusable, so sibling sub-evaluations never observe each other's state.
//!
//! For tight iteration loops there is an in-place mutate-then-restore form
//! ([`Evaluator::set_context`]); prefer the scoped [`Evaluator::with_member`]
//! / [`Evaluator::with_members`] helpers, which restore on every exit path
//! including errors and panics. The mutate form must never cross a
//! concurrency boundary.
//!
//! Depth is a counter computed at push time rather than a parent pointer:
//! ownership of a context lineage belongs to the call frame evaluating it.

use crate::cache::ResultCache;
use crate::config::EvalConfig;
use crate::data::CellReader;
use crate::error::{EvalError, EvalResult};
use crate::native::NativeProvider;
use hypercube_model::{Cube, HierarchyId, Member, SchemaReader};
use hypercube_types::TupleValue;
use indexmap::IndexMap;
use log::trace;
use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// State shared by one evaluator lineage: collaborators, the result cache,
/// and the cache-miss counter. One `QueryState` exists per query
/// execution and is never shared across executions.
pub struct QueryState {
    cube: Arc<Cube>,
    schema: Arc<dyn SchemaReader>,
    cells: Arc<dyn CellReader>,
    native: Option<Arc<dyn NativeProvider>>,
    config: EvalConfig,
    pub(crate) cache: Mutex<ResultCache>,
    missed: AtomicU64,
}

impl QueryState {
    /// Create the shared state for one query execution.
    pub fn new(
        cube: Arc<Cube>,
        schema: Arc<dyn SchemaReader>,
        cells: Arc<dyn CellReader>,
        config: EvalConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            cube,
            schema,
            cells,
            native: None,
            config,
            cache: Mutex::new(ResultCache::default()),
            missed: AtomicU64::new(0),
        })
    }

    /// As [`QueryState::new`], with a native-evaluation provider.
    pub fn with_native(
        cube: Arc<Cube>,
        schema: Arc<dyn SchemaReader>,
        cells: Arc<dyn CellReader>,
        native: Arc<dyn NativeProvider>,
        config: EvalConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            cube,
            schema,
            cells,
            native: Some(native),
            config,
            cache: Mutex::new(ResultCache::default()),
            missed: AtomicU64::new(0),
        })
    }

    /// The cube being queried
    pub fn cube(&self) -> &Arc<Cube> {
        &self.cube
    }

    /// The schema reader collaborator
    pub fn schema(&self) -> &Arc<dyn SchemaReader> {
        &self.schema
    }

    /// The fact-cell reader collaborator
    pub fn cells(&self) -> &Arc<dyn CellReader> {
        &self.cells
    }

    /// The native-evaluation provider, if any
    pub fn native(&self) -> Option<&Arc<dyn NativeProvider>> {
        self.native.as_ref()
    }

    /// Evaluation configuration
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// The shared result cache. The guard must not be held across an
    /// evaluation call.
    pub fn cache(&self) -> parking_lot::MutexGuard<'_, ResultCache> {
        self.cache.lock()
    }

    /// Record one provisional result caused by unfetched fact data.
    pub fn note_missing(&self) {
        self.missed.fetch_add(1, Ordering::Relaxed);
    }

    /// Total misses recorded so far in this execution.
    pub fn missed_count(&self) -> u64 {
        self.missed.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryState")
            .field("cube", &self.cube.name())
            .field("config", &self.config)
            .field("missed", &self.missed_count())
            .finish()
    }
}

/// The dimensional evaluation context: one current member per hierarchy,
/// evaluation flags, and shared per-query state.
#[derive(Debug)]
pub struct Evaluator {
    state: Arc<QueryState>,
    /// Full assignment in cube hierarchy order. Interior mutability exists
    /// solely for the save/restore iteration form.
    current: RefCell<IndexMap<HierarchyId, Arc<Member>>>,
    /// Aggregation domains pushed by aggregate functions, outermost first
    aggregations: Vec<Arc<Vec<TupleValue>>>,
    non_empty: bool,
    native_enabled: bool,
    eval_axes: bool,
    /// Hint: how many positions the surrounding iteration will evaluate
    iteration_length: Cell<usize>,
    depth: usize,
}

impl Evaluator {
    /// Create the root evaluator for a query: every hierarchy starts at
    /// its default member.
    pub fn root(state: Arc<QueryState>) -> EvalResult<Self> {
        let mut current = IndexMap::with_capacity(state.cube().hierarchies().len());
        for hierarchy in state.cube().hierarchies() {
            let default = state.cube().default_member(hierarchy.id)?.clone();
            current.insert(hierarchy.id, default);
        }
        Ok(Self {
            state,
            current: RefCell::new(current),
            aggregations: Vec::new(),
            non_empty: false,
            native_enabled: true,
            eval_axes: false,
            iteration_length: Cell::new(0),
            depth: 0,
        })
    }

    fn derive(&self) -> EvalResult<Self> {
        let limit = self.state.config().max_depth;
        if self.depth + 1 > limit {
            return Err(EvalError::RecursionLimit {
                limit,
                depth: self.depth + 1,
                context: self.format_current_context(),
            });
        }
        Ok(Self {
            state: Arc::clone(&self.state),
            current: RefCell::new(self.current.borrow().clone()),
            aggregations: self.aggregations.clone(),
            non_empty: self.non_empty,
            native_enabled: self.native_enabled,
            eval_axes: self.eval_axes,
            iteration_length: Cell::new(self.iteration_length.get()),
            depth: self.depth + 1,
        })
    }

    /// A no-op copy isolating a sub-evaluation from callee mutation.
    pub fn push(&self) -> EvalResult<Self> {
        self.derive()
    }

    /// Copy with one member override.
    pub fn push_member(&self, member: Arc<Member>) -> EvalResult<Self> {
        self.push_members([member])
    }

    /// Copy with an override per given member; members for different
    /// hierarchies are independent.
    pub fn push_members(
        &self,
        members: impl IntoIterator<Item = Arc<Member>>,
    ) -> EvalResult<Self> {
        let derived = self.derive()?;
        {
            let mut current = derived.current.borrow_mut();
            for member in members {
                trace!("push {} on {}", member.unique_name, member.hierarchy);
                current.insert(member.hierarchy, member);
            }
        }
        Ok(derived)
    }

    /// Copy with the non-empty flag overridden.
    pub fn push_non_empty(&self, non_empty: bool) -> EvalResult<Self> {
        let mut derived = self.derive()?;
        derived.non_empty = non_empty;
        Ok(derived)
    }

    /// Copy with non-empty and native-enabled overridden.
    pub fn push_flags(&self, non_empty: bool, native_enabled: bool) -> EvalResult<Self> {
        let mut derived = self.derive()?;
        derived.non_empty = non_empty;
        derived.native_enabled = native_enabled;
        Ok(derived)
    }

    /// Copy with the axis-evaluation mode overridden.
    pub fn push_eval_axes(&self, eval_axes: bool) -> EvalResult<Self> {
        let mut derived = self.derive()?;
        derived.eval_axes = eval_axes;
        Ok(derived)
    }

    /// Copy with the aggregation domain extended by the given tuples,
    /// keeping the same dimensional assignment.
    pub fn push_aggregation(&self, tuples: Vec<TupleValue>) -> EvalResult<Self> {
        let mut derived = self.derive()?;
        derived.aggregations.push(Arc::new(tuples));
        Ok(derived)
    }

    /// Replace the current member of the given member's hierarchy in
    /// place, returning the previous member for restoration.
    ///
    /// Callers must restore before the context is observed by anyone else;
    /// prefer [`Evaluator::with_member`], which guarantees it.
    pub fn set_context(&self, member: Arc<Member>) -> EvalResult<Arc<Member>> {
        let hierarchy = member.hierarchy;
        match self.current.borrow_mut().get_mut(&hierarchy) {
            Some(slot) => Ok(std::mem::replace(slot, member)),
            // A foreign member must leave the assignment untouched.
            None => Err(EvalError::UnboundHierarchy { hierarchy }),
        }
    }

    fn restore_context(&self, member: Arc<Member>) {
        self.current.borrow_mut().insert(member.hierarchy, member);
    }

    /// Run `body` with the member installed as current, restoring the
    /// previous member on every exit path.
    pub fn with_member<T>(
        &self,
        member: Arc<Member>,
        body: impl FnOnce(&Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let previous = self.set_context(member)?;
        let _guard = RestoreGuard {
            ev: self,
            saved: smallvec::smallvec![previous],
        };
        body(self)
    }

    /// As [`Evaluator::with_member`] for several members at once.
    pub fn with_members<T>(
        &self,
        members: &[Arc<Member>],
        body: impl FnOnce(&Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let mut saved: smallvec::SmallVec<[Arc<Member>; 4]> =
            smallvec::SmallVec::with_capacity(members.len());
        for member in members {
            match self.set_context(member.clone()) {
                Ok(previous) => saved.push(previous),
                Err(err) => {
                    for member in saved.into_iter().rev() {
                        self.restore_context(member);
                    }
                    return Err(err);
                }
            }
        }
        let _guard = RestoreGuard { ev: self, saved };
        body(self)
    }

    /// The current member of a hierarchy. Every hierarchy always has one.
    pub fn current_member(&self, hierarchy: HierarchyId) -> EvalResult<Arc<Member>> {
        self.current
            .borrow()
            .get(&hierarchy)
            .cloned()
            .ok_or(EvalError::UnboundHierarchy { hierarchy })
    }

    /// Snapshot of the full assignment in cube hierarchy order.
    pub fn current_members(&self) -> Vec<Arc<Member>> {
        self.current.borrow().values().cloned().collect()
    }

    /// Aggregation domains in push order, outermost first.
    pub fn aggregations(&self) -> &[Arc<Vec<TupleValue>>] {
        &self.aggregations
    }

    /// Whether non-empty filtering is in effect
    pub fn non_empty(&self) -> bool {
        self.non_empty
    }

    /// Whether native set evaluation may be used
    pub fn native_enabled(&self) -> bool {
        self.native_enabled && self.state.config().native_enabled
    }

    /// Whether a top-level axis is being evaluated
    pub fn eval_axes(&self) -> bool {
        self.eval_axes
    }

    /// Iteration-length hint for the surrounding loop
    pub fn iteration_length(&self) -> usize {
        self.iteration_length.get()
    }

    /// Set the iteration-length hint
    pub fn set_iteration_length(&self, length: usize) {
        self.iteration_length.set(length);
    }

    /// Distance from the root evaluator
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The shared per-query state
    pub fn state(&self) -> &Arc<QueryState> {
        &self.state
    }

    /// The cube being queried
    pub fn cube(&self) -> &Arc<Cube> {
        self.state.cube()
    }

    /// The schema reader collaborator
    pub fn schema(&self) -> &Arc<dyn SchemaReader> {
        self.state.schema()
    }

    /// The fact-cell reader collaborator
    pub fn cells(&self) -> &Arc<dyn CellReader> {
        self.state.cells()
    }

    /// Record one provisional result caused by unfetched fact data.
    pub fn note_missing(&self) {
        self.state.note_missing();
    }

    /// The current assignment as a diagnostic string, e.g.
    /// `([Time].[1997].[Q1], [Store].[All Stores])`.
    pub fn format_current_context(&self) -> String {
        let current = self.current.borrow();
        let mut out = String::from("(");
        for (i, member) in current.values().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&member.unique_name);
        }
        out.push(')');
        out
    }

    /// Bound check for set iterations.
    pub fn check_iteration(&self, produced: usize) -> EvalResult<()> {
        let limit = self.state.config().iteration_limit;
        if limit > 0 && produced > limit {
            return Err(EvalError::IterationLimit { limit });
        }
        Ok(())
    }
}

/// Restores saved members when dropped, so the save/restore discipline
/// holds on error and panic exits too.
struct RestoreGuard<'a> {
    ev: &'a Evaluator,
    saved: smallvec::SmallVec<[Arc<Member>; 4]>,
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        for member in self.saved.drain(..).rev() {
            self.ev.restore_context(member);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EmptyCellReader;
    use hypercube_model::{CubeBuilder, LevelId, MemberId};
    use pretty_assertions::assert_eq;

    fn test_state() -> Arc<QueryState> {
        let mut builder = CubeBuilder::new("Sales");
        let dim = builder.add_dimension("Time").unwrap();
        let time = builder.add_hierarchy(dim, "Time", true).unwrap();
        let year = builder.add_level(time, "Year").unwrap();
        builder.add_member(year, None, "1997").unwrap();
        builder.add_member(year, None, "1998").unwrap();
        let cube = builder.build().unwrap();
        QueryState::new(
            cube.clone(),
            cube,
            Arc::new(EmptyCellReader),
            EvalConfig::default(),
        )
    }

    #[test]
    fn root_starts_at_default_members() {
        let state = test_state();
        let ev = Evaluator::root(state).unwrap();
        let time = ev.cube().hierarchy_at(0).unwrap().id;
        assert!(ev.current_member(time).unwrap().all);
        assert_eq!(ev.depth(), 0);
    }

    #[test]
    fn push_does_not_mutate_receiver() {
        let state = test_state();
        let ev = Evaluator::root(state).unwrap();
        let time = ev.cube().hierarchy_at(0).unwrap().id;
        let y1997 = ev
            .cube()
            .member_by_unique_name("[Time].[1997]")
            .unwrap()
            .clone();
        let child = ev.push_member(y1997.clone()).unwrap();
        assert_eq!(child.current_member(time).unwrap().id, y1997.id);
        assert!(ev.current_member(time).unwrap().all);
        assert_eq!(child.depth(), 1);
    }

    #[test]
    fn set_context_returns_previous() {
        let state = test_state();
        let ev = Evaluator::root(state).unwrap();
        let y1997 = ev
            .cube()
            .member_by_unique_name("[Time].[1997]")
            .unwrap()
            .clone();
        let previous = ev.set_context(y1997.clone()).unwrap();
        assert!(previous.all);
        let restored = ev.set_context(previous).unwrap();
        assert_eq!(restored.id, y1997.id);
    }

    #[test]
    fn set_context_leaves_the_assignment_unchanged_on_foreign_hierarchies() {
        let state = test_state();
        let ev = Evaluator::root(state).unwrap();
        let before = ev.format_current_context();
        let alien = Arc::new(Member {
            id: MemberId(0),
            hierarchy: HierarchyId(99),
            level: LevelId(0),
            name: "alien".into(),
            unique_name: "[Alien].[alien]".into(),
            parent: None,
            all: false,
        });
        let err = ev.set_context(alien.clone()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::UnboundHierarchy {
                hierarchy: HierarchyId(99)
            }
        ));
        assert_eq!(ev.format_current_context(), before);

        let result: EvalResult<()> = ev.with_member(alien, |_| Ok(()));
        assert!(result.is_err());
        assert_eq!(ev.format_current_context(), before);
    }

    #[test]
    fn push_aggregation_extends_only_the_derived_context() {
        let state = test_state();
        let ev = Evaluator::root(state).unwrap();
        let y1997 = ev
            .cube()
            .member_by_unique_name("[Time].[1997]")
            .unwrap()
            .clone();
        let domain: Vec<TupleValue> = vec![smallvec::smallvec![y1997.clone()]];
        let derived = ev.push_aggregation(domain).unwrap();
        assert_eq!(derived.aggregations().len(), 1);
        assert_eq!(derived.aggregations()[0][0][0].id, y1997.id);
        // The dimensional assignment is carried unchanged and the
        // receiver keeps its own (empty) domain stack.
        assert_eq!(derived.format_current_context(), ev.format_current_context());
        assert!(ev.aggregations().is_empty());
    }

    #[test]
    fn with_member_restores_on_error() {
        let state = test_state();
        let ev = Evaluator::root(state).unwrap();
        let time = ev.cube().hierarchy_at(0).unwrap().id;
        let y1997 = ev
            .cube()
            .member_by_unique_name("[Time].[1997]")
            .unwrap()
            .clone();
        let before = ev.format_current_context();
        let result: EvalResult<()> =
            ev.with_member(y1997, |_| Err(EvalError::internal("boom")));
        assert!(result.is_err());
        assert_eq!(ev.format_current_context(), before);
        assert!(ev.current_member(time).unwrap().all);
    }

    #[test]
    fn deep_push_chain_hits_recursion_limit() {
        let mut builder = CubeBuilder::new("Sales");
        let dim = builder.add_dimension("Time").unwrap();
        let time = builder.add_hierarchy(dim, "Time", true).unwrap();
        let year = builder.add_level(time, "Year").unwrap();
        builder.add_member(year, None, "1997").unwrap();
        let cube = builder.build().unwrap();
        let state = QueryState::new(
            cube.clone(),
            cube,
            Arc::new(EmptyCellReader),
            EvalConfig::default().with_max_depth(3),
        );
        let root = Evaluator::root(state).unwrap();
        let a = root.push().unwrap();
        let b = a.push().unwrap();
        let c = b.push().unwrap();
        let err = c.push().unwrap_err();
        assert!(matches!(err, EvalError::RecursionLimit { limit: 3, .. }));
    }
}

//! Per-execution result cache
//!
//! Results are keyed by node identity, the projection of the current
//! context onto the hierarchies the node declares a dependency on, and
//! the non-empty flag. Two contexts differing only in hierarchies a node
//! does not depend on therefore share one entry; the soundness of that
//! sharing is exactly the soundness of [`Calc::depends_on`].
//!
//! The cache lives on the shared [`QueryState`](crate::context::QueryState)
//! and is dropped with it at the end of the execution. The
//! not-yet-available sentinel is never stored: a provisional result must
//! be recomputed once the underlying fact data has been fetched.

use crate::calc::{
    BooleanCalc, Calc, DateTimeCalc, DimensionCalc, DoubleCalc, HierarchyCalc, IntegerCalc,
    LevelCalc, MemberCalc, MemberIterCalc, MemberListCalc, ResultStyle, StringCalc, TupleCalc,
    TupleIterCalc, TupleListCalc, VoidCalc,
};
use crate::context::Evaluator;
use crate::error::EvalResult;
use hypercube_model::{HierarchyId, MemberId};
use hypercube_types::{CellValue, TypeShape};
use log::trace;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Cache key: node identity plus the dependent slice of the context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Address of the compiled node. Node trees are immutable and outlive
    /// the query state, so the address identifies the node for the whole
    /// execution.
    node: usize,
    /// `(hierarchy, member)` pairs for the hierarchies the node depends
    /// on, in cube hierarchy order.
    context: SmallVec<[(HierarchyId, MemberId); 4]>,
    /// Non-empty filtering changes what set-producing nodes return, so
    /// entries never cross that flag.
    non_empty: bool,
}

impl CacheKey {
    /// Project the evaluator's assignment onto `calc`'s dependencies.
    pub fn project(ev: &Evaluator, calc: &dyn Calc) -> EvalResult<Self> {
        let mut context = SmallVec::new();
        for hierarchy in ev.cube().hierarchies() {
            if calc.depends_on(hierarchy.id) {
                let member = ev.current_member(hierarchy.id)?;
                context.push((hierarchy.id, member.id));
            }
        }
        Ok(Self {
            node: calc as *const dyn Calc as *const () as usize,
            context,
            non_empty: ev.non_empty(),
        })
    }
}

/// The per-execution result store with hit statistics.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<CacheKey, CellValue>,
    lookups: u64,
    hits: u64,
}

impl ResultCache {
    fn lookup(&mut self, key: &CacheKey) -> Option<CellValue> {
        self.lookups += 1;
        let hit = self.entries.get(key).cloned();
        if hit.is_some() {
            self.hits += 1;
        }
        hit
    }

    fn store(&mut self, key: CacheKey, value: CellValue) {
        self.entries.insert(key, value);
    }

    /// Number of stored results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total lookups served
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    /// Lookups answered from the store
    pub fn hits(&self) -> u64 {
        self.hits
    }
}

impl Evaluator {
    /// Evaluate `calc` through the shared result cache.
    ///
    /// Misses evaluate the node and store the result; the sentinel for
    /// unfetched data propagates without being stored, so the miss is
    /// recorded where the value crosses a typed boundary, once.
    pub fn cached_eval(&self, calc: &dyn Calc) -> EvalResult<CellValue> {
        let key = CacheKey::project(self, calc)?;
        if let Some(value) = self.state().cache.lock().lookup(&key) {
            trace!("cache hit for node {:#x}", key.node);
            return Ok(value);
        }
        let value = calc.evaluate(self)?;
        if !value.is_not_yet_available() {
            self.state().cache.lock().store(key, value.clone());
        }
        Ok(value)
    }
}

/// Wraps a node so every untyped evaluation goes through the cache. The
/// compiler inserts these above expensive subtrees; the wrapper is
/// transparent to shape, style and dependency analysis.
#[derive(Debug)]
pub struct CachedCalc {
    inner: Box<dyn Calc>,
}

impl CachedCalc {
    pub fn new(inner: Box<dyn Calc>) -> Self {
        Self { inner }
    }
}

impl Calc for CachedCalc {
    fn result_type(&self) -> &TypeShape {
        self.inner.result_type()
    }

    fn children(&self) -> Vec<&dyn Calc> {
        vec![self.inner.as_ref()]
    }

    fn depends_on(&self, hierarchy: HierarchyId) -> bool {
        self.inner.depends_on(hierarchy)
    }

    fn result_style(&self) -> ResultStyle {
        self.inner.result_style()
    }

    fn evaluate(&self, ev: &Evaluator) -> EvalResult<CellValue> {
        ev.cached_eval(self.inner.as_ref())
    }
}

impl IntegerCalc for CachedCalc {}
impl DoubleCalc for CachedCalc {}
impl BooleanCalc for CachedCalc {}
impl StringCalc for CachedCalc {}
impl DateTimeCalc for CachedCalc {}
impl MemberCalc for CachedCalc {}
impl LevelCalc for CachedCalc {}
impl HierarchyCalc for CachedCalc {}
impl DimensionCalc for CachedCalc {}
impl TupleCalc for CachedCalc {}
impl MemberListCalc for CachedCalc {}
impl MemberIterCalc for CachedCalc {}
impl TupleListCalc for CachedCalc {}
impl TupleIterCalc for CachedCalc {}
impl VoidCalc for CachedCalc {}

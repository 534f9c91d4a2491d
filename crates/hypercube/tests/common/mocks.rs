//! Mock implementations for testing
//!
//! Provides a configurable fact-cell reader (with eager, lazy, and
//! self-loading lazy modes), an evaluation-counting calc wrapper, and a
//! scripted native provider.

use hypercube::eval::{
    Calc, CellReader, DoubleCalc, EvalResult, Evaluator, IntegerCalc, NativeProvider,
    NativeSetEvaluator, ResultStyle,
};
use hypercube::model::{HierarchyId, Member};
use hypercube::types::{CellValue, TupleValue, TypeShape};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A cell address: `(hierarchy, member)` pairs for the non-all members of
/// a context, sorted by hierarchy. Members left at their all-level
/// default do not constrain the address.
pub type CellKey = Vec<(u32, u32)>;

/// The address of the evaluator's current context.
pub fn context_key(ev: &Evaluator) -> CellKey {
    let mut key: CellKey = ev
        .current_members()
        .iter()
        .filter(|m| !m.all)
        .map(|m| (m.hierarchy.0, m.id.0))
        .collect();
    key.sort_unstable();
    key
}

fn member_key(members: &[&Arc<Member>]) -> CellKey {
    let mut key: CellKey = members.iter().map(|m| (m.hierarchy.0, m.id.0)).collect();
    key.sort_unstable();
    key
}

/// Cell reader over a programmable in-memory fact table.
///
/// In eager mode every cell answers immediately. In lazy mode a cell
/// answers [`CellValue::NotYetAvailable`] until it has been loaded; the
/// request is recorded, and [`MockCellReader::load_requested`] plays the
/// role of the batch fetch between evaluation passes. The self-loading
/// variant loads each cell as a side effect of the first request, so the
/// next pass finds it present without an explicit fetch step.
pub struct MockCellReader {
    values: Mutex<HashMap<CellKey, CellValue>>,
    loaded: Mutex<HashSet<CellKey>>,
    requested: Mutex<HashSet<CellKey>>,
    lazy: bool,
    auto_load: bool,
    reads: AtomicUsize,
}

impl MockCellReader {
    /// Every cell is available from the start.
    pub fn eager() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            loaded: Mutex::new(HashSet::new()),
            requested: Mutex::new(HashSet::new()),
            lazy: false,
            auto_load: false,
            reads: AtomicUsize::new(0),
        }
    }

    /// Cells must be loaded via [`MockCellReader::load_requested`].
    pub fn lazy() -> Self {
        Self {
            lazy: true,
            ..Self::eager()
        }
    }

    /// Lazy, but the first request for a cell loads it.
    pub fn lazy_self_loading() -> Self {
        Self {
            lazy: true,
            auto_load: true,
            ..Self::eager()
        }
    }

    /// Set the value of the cell addressed by the given members.
    pub fn set(&self, members: &[&Arc<Member>], value: CellValue) {
        self.values.lock().insert(member_key(members), value);
    }

    /// Load everything requested so far; returns how many cells loaded.
    pub fn load_requested(&self) -> usize {
        let requested: Vec<_> = self.requested.lock().drain().collect();
        let count = requested.len();
        let mut loaded = self.loaded.lock();
        for key in requested {
            loaded.insert(key);
        }
        count
    }

    /// Total `cell` calls observed.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Distinct cells loaded so far (lazy modes only).
    pub fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }
}

impl CellReader for MockCellReader {
    fn cell(&self, ev: &Evaluator) -> CellValue {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let key = context_key(ev);
        if self.lazy && !self.loaded.lock().contains(&key) {
            self.requested.lock().insert(key.clone());
            if self.auto_load {
                self.loaded.lock().insert(key);
            }
            return CellValue::NotYetAvailable;
        }
        self.values
            .lock()
            .get(&key)
            .cloned()
            .unwrap_or(CellValue::Null)
    }
}

/// Wraps a node and counts how often its untyped path actually runs, for
/// asserting cache behavior.
#[derive(Debug)]
pub struct CountingCalc {
    inner: Box<dyn Calc>,
    evaluations: AtomicUsize,
}

impl CountingCalc {
    pub fn new(inner: Box<dyn Calc>) -> Self {
        Self {
            inner,
            evaluations: AtomicUsize::new(0),
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl Calc for CountingCalc {
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
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.inner.evaluate(ev)
    }
}

impl DoubleCalc for CountingCalc {}
impl IntegerCalc for CountingCalc {}

#[derive(Debug)]
struct FixedTuples {
    tuples: Vec<TupleValue>,
}

impl NativeSetEvaluator for FixedTuples {
    fn evaluate_tuples(&self, _ev: &Evaluator) -> EvalResult<Vec<TupleValue>> {
        Ok(self.tuples.clone())
    }
}

/// Offers a fixed tuple list for one function name and counts offers.
#[derive(Debug)]
pub struct MockNativeProvider {
    function: String,
    tuples: Vec<TupleValue>,
    offers: AtomicUsize,
}

impl MockNativeProvider {
    pub fn new(function: impl Into<String>, tuples: Vec<TupleValue>) -> Self {
        Self {
            function: function.into(),
            tuples,
            offers: AtomicUsize::new(0),
        }
    }

    /// How many times a node consulted this provider.
    pub fn offers(&self) -> usize {
        self.offers.load(Ordering::Relaxed)
    }
}

impl NativeProvider for MockNativeProvider {
    fn native_for(
        &self,
        function: &str,
        _args: &[&dyn Calc],
        _ev: &Evaluator,
    ) -> Option<Arc<dyn NativeSetEvaluator>> {
        self.offers.fetch_add(1, Ordering::Relaxed);
        if function == self.function {
            Some(Arc::new(FixedTuples {
                tuples: self.tuples.clone(),
            }))
        } else {
            None
        }
    }
}

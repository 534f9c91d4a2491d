//! Cube fixtures and context helpers

use hypercube::eval::{CellReader, EvalConfig, EvalResult, Evaluator, GenericCalc, QueryState};
use hypercube::model::{Cube, CubeBuilder, Member};
use hypercube::types::TypeShape;
use std::sync::Arc;

/// Assert a double-shaped result, reporting the caller's location.
#[track_caller]
pub fn assert_double(value: EvalResult<f64>, expected: f64) {
    let value = value.unwrap();
    assert!(
        (value - expected).abs() < 1e-9,
        "expected {expected}, got {value}"
    );
}

/// Two-dimensional fixture: Time years 1995..1999 (with quarters under
/// 1997) and three store cities.
pub fn sales_cube() -> Arc<Cube> {
    let mut builder = CubeBuilder::new("Sales");
    let time_dim = builder.add_dimension("Time").unwrap();
    let time = builder.add_hierarchy(time_dim, "Time", true).unwrap();
    let year = builder.add_level(time, "Year").unwrap();
    let quarter = builder.add_level(time, "Quarter").unwrap();
    for name in ["1995", "1996", "1997", "1998", "1999"] {
        let id = builder.add_member(year, None, name).unwrap();
        if name == "1997" {
            for q in ["Q1", "Q2", "Q3", "Q4"] {
                builder.add_member(quarter, Some(id), q).unwrap();
            }
        }
    }
    let store_dim = builder.add_dimension("Store").unwrap();
    let store = builder.add_hierarchy(store_dim, "Store", true).unwrap();
    let city = builder.add_level(store, "Store City").unwrap();
    for name in ["Seattle", "Portland", "Berkeley"] {
        builder.add_member(city, None, name).unwrap();
    }
    builder.build().unwrap()
}

/// Single-hierarchy fixture with `n` months M01, M02, ...
pub fn month_cube(n: usize) -> Arc<Cube> {
    let mut builder = CubeBuilder::new("Inventory");
    let time_dim = builder.add_dimension("Time").unwrap();
    let time = builder.add_hierarchy(time_dim, "Time", true).unwrap();
    let month = builder.add_level(time, "Month").unwrap();
    for i in 1..=n {
        builder.add_member(month, None, format!("M{i:02}")).unwrap();
    }
    builder.build().unwrap()
}

/// Look up a member by unique name, e.g. `[Time].[1997]`.
pub fn member(cube: &Arc<Cube>, unique_name: &str) -> Arc<Member> {
    cube.member_by_unique_name(unique_name).unwrap().clone()
}

/// The months of a [`month_cube`] in declaration order.
pub fn months(cube: &Arc<Cube>, n: usize) -> Vec<Arc<Member>> {
    (1..=n)
        .map(|i| member(cube, &format!("[Time].[M{i:02}]")))
        .collect()
}

/// Root evaluator over a fresh query state with default configuration.
pub fn root(cube: Arc<Cube>, cells: Arc<dyn CellReader>) -> Evaluator {
    let state = QueryState::new(cube.clone(), cube, cells, EvalConfig::default());
    Evaluator::root(state).unwrap()
}

/// A numeric node that reads the fact cell under the ambient context.
pub fn cell_read_calc() -> GenericCalc {
    GenericCalc::new(
        TypeShape::numeric(),
        Arc::new(|ev: &Evaluator| Ok(ev.cells().cell(ev))),
    )
}

//! Named sets, set-producing nodes, and the native-evaluation seam

mod common;

use common::{MockCellReader, MockNativeProvider, member, root, sales_cube};
use hypercube::CubeBuilder;
use hypercube::eval::{
    Calc, ChildrenCalc, ConstantCalc, CrossJoinCalc, CurrentMemberCalc, EvalConfig, Evaluator,
    MemberListCalc, NamedSetEvaluator, NamedSetExpr, QueryState, TupleListCalc,
};
use hypercube::types::{CellValue, TupleValue, TypeError};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn years_expr(cube: &Arc<hypercube::Cube>) -> NamedSetExpr {
    let time = cube.hierarchy_at(0).unwrap().id;
    let years: Vec<_> = ["1995", "1996", "1997", "1998", "1999"]
        .iter()
        .map(|y| member(cube, &format!("[Time].[{y}]")))
        .collect();
    NamedSetExpr::Members(Arc::new(ConstantCalc::member_set(Some(time), years)))
}

#[test]
fn named_set_ordinal_walks_the_whole_set() {
    let cube = sales_cube();
    let ev = root(cube.clone(), Arc::new(MockCellReader::eager()));
    let set = NamedSetEvaluator::new("Years", years_expr(&cube), false);

    assert_eq!(set.current_ordinal(), None);
    let mut ordinals = Vec::new();
    for item in set.iterate_members(&ev).unwrap() {
        item.unwrap();
        ordinals.push(set.current_ordinal().unwrap());
    }
    assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
}

#[test]
fn static_set_ignores_the_referencing_context() {
    let cube = sales_cube();
    let ev = root(cube.clone(), Arc::new(MockCellReader::eager()));
    let time = ev.cube().hierarchy_at(0).unwrap().id;

    // Children of the Time current member: empty at the root (the All
    // member has no registered children), four quarters under 1997.
    let expr = NamedSetExpr::Members(Arc::new(ChildrenCalc::new(Box::new(
        CurrentMemberCalc::new(time),
    ))));

    let y1997 = member(&cube, "[Time].[1997]");
    let pushed = ev.push_member(y1997).unwrap();

    let static_set = NamedSetEvaluator::new("Current", expr.clone(), false);
    assert_eq!(static_set.members(&pushed).unwrap().len(), 0);

    let dynamic_set = NamedSetEvaluator::new("Current", expr, true);
    assert_eq!(dynamic_set.members(&pushed).unwrap().len(), 4);
    assert_eq!(dynamic_set.members(&ev).unwrap().len(), 0);
}

#[test]
fn children_come_back_in_declaration_order() {
    let cube = sales_cube();
    let ev = root(cube.clone(), Arc::new(MockCellReader::eager()));
    let children = ChildrenCalc::new(Box::new(ConstantCalc::member(member(
        &cube,
        "[Time].[1997]",
    ))));
    let quarters = children.evaluate_member_list(&ev).unwrap();
    let names: Vec<_> = quarters.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Q1", "Q2", "Q3", "Q4"]);
}

#[test]
fn crossjoin_rejects_operands_over_one_hierarchy() {
    let cube = sales_cube();
    let time = cube.hierarchy_at(0).unwrap().id;
    let years = vec![member(&cube, "[Time].[1997]")];
    let err = CrossJoinCalc::new(
        Box::new(ConstantCalc::member_set(Some(time), years.clone())),
        Box::new(ConstantCalc::member_set(Some(time), years)),
    )
    .unwrap_err();
    assert_eq!(err, TypeError::DuplicateHierarchyInTuple { hierarchy: time });
}

#[test]
fn constant_tuple_rejects_duplicate_hierarchies() {
    let cube = sales_cube();
    let err = ConstantCalc::tuple(smallvec::smallvec![
        member(&cube, "[Time].[1997]"),
        member(&cube, "[Time].[1998]"),
    ])
    .unwrap_err();
    assert!(matches!(err, TypeError::DuplicateHierarchyInTuple { .. }));
}

#[test]
fn crossjoin_preserves_right_fastest_order() {
    let cube = sales_cube();
    let ev = root(cube.clone(), Arc::new(MockCellReader::eager()));
    let time = cube.hierarchy_at(0).unwrap().id;
    let store = cube.hierarchy_at(1).unwrap().id;
    let y1997 = member(&cube, "[Time].[1997]");
    let y1998 = member(&cube, "[Time].[1998]");
    let seattle = member(&cube, "[Store].[Seattle]");
    let portland = member(&cube, "[Store].[Portland]");

    let join = CrossJoinCalc::new(
        Box::new(ConstantCalc::member_set(
            Some(time),
            vec![y1997.clone(), y1998.clone()],
        )),
        Box::new(ConstantCalc::member_set(
            Some(store),
            vec![seattle.clone(), portland.clone()],
        )),
    )
    .unwrap();

    let tuples = join.evaluate_tuple_list(&ev).unwrap();
    let expected: Vec<TupleValue> = vec![
        smallvec::smallvec![y1997.clone(), seattle.clone()],
        smallvec::smallvec![y1997, portland.clone()],
        smallvec::smallvec![y1998.clone(), seattle],
        smallvec::smallvec![y1998, portland],
    ];
    assert_eq!(tuples, expected);
}

/// Three hierarchies so a crossjoin over two of them leaves one to the
/// ambient context.
fn trio_cube() -> Arc<hypercube::Cube> {
    let mut builder = CubeBuilder::new("Trio");
    let time_dim = builder.add_dimension("Time").unwrap();
    let time = builder.add_hierarchy(time_dim, "Time", true).unwrap();
    let year = builder.add_level(time, "Year").unwrap();
    builder.add_member(year, None, "1997").unwrap();
    let store_dim = builder.add_dimension("Store").unwrap();
    let store = builder.add_hierarchy(store_dim, "Store", true).unwrap();
    let city = builder.add_level(store, "Store City").unwrap();
    builder.add_member(city, None, "Seattle").unwrap();
    let product_dim = builder.add_dimension("Product").unwrap();
    let product = builder.add_hierarchy(product_dim, "Product", true).unwrap();
    let line = builder.add_level(product, "Line").unwrap();
    builder.add_member(line, None, "P1").unwrap();
    builder.add_member(line, None, "P2").unwrap();
    builder.build().unwrap()
}

fn trio_join(cube: &Arc<hypercube::Cube>) -> CrossJoinCalc {
    let time = cube.hierarchy_at(0).unwrap().id;
    let store = cube.hierarchy_at(1).unwrap().id;
    CrossJoinCalc::new(
        Box::new(ConstantCalc::member_set(
            Some(time),
            vec![member(cube, "[Time].[1997]")],
        )),
        Box::new(ConstantCalc::member_set(
            Some(store),
            vec![member(cube, "[Store].[Seattle]")],
        )),
    )
    .unwrap()
}

#[test]
fn crossjoin_depends_on_the_hierarchies_its_tuples_leave_ambient() {
    let cube = trio_cube();
    let time = cube.hierarchy_at(0).unwrap().id;
    let store = cube.hierarchy_at(1).unwrap().id;
    let product = cube.hierarchy_at(2).unwrap().id;
    let join = trio_join(&cube);

    // The produced tuples pin Time and Store; the emptiness test under
    // non-empty filtering still reads cells that vary with Product.
    assert!(!join.depends_on(time));
    assert!(!join.depends_on(store));
    assert!(join.depends_on(product));
}

#[test]
fn cached_non_empty_crossjoin_is_split_per_filtering_context() {
    let cube = trio_cube();
    let reader = Arc::new(MockCellReader::eager());
    let y1997 = member(&cube, "[Time].[1997]");
    let seattle = member(&cube, "[Store].[Seattle]");
    let p1 = member(&cube, "[Product].[P1]");
    let p2 = member(&cube, "[Product].[P2]");
    reader.set(&[&y1997, &seattle, &p1], CellValue::Double(1.0));

    let ev = root(cube.clone(), reader);
    let join = trio_join(&cube);
    let pair: TupleValue = smallvec::smallvec![y1997.clone(), seattle.clone()];

    let filtered = ev.push_non_empty(true).unwrap();
    let under_p1 = filtered.push_member(p1).unwrap();
    assert_eq!(
        under_p1.cached_eval(&join).unwrap(),
        CellValue::TupleSet(vec![pair.clone()])
    );
    let under_p2 = filtered.push_member(p2.clone()).unwrap();
    assert_eq!(
        under_p2.cached_eval(&join).unwrap(),
        CellValue::TupleSet(Vec::new())
    );

    // An unfiltered evaluation never sees the filtered entries.
    let plain = ev.push_member(p2).unwrap();
    assert_eq!(
        plain.cached_eval(&join).unwrap(),
        CellValue::TupleSet(vec![pair])
    );
}

#[test]
fn native_provider_short_circuits_when_enabled() {
    let cube = sales_cube();
    let time = cube.hierarchy_at(0).unwrap().id;
    let store = cube.hierarchy_at(1).unwrap().id;
    let y1997 = member(&cube, "[Time].[1997]");
    let seattle = member(&cube, "[Store].[Seattle]");

    let scripted: Vec<TupleValue> = vec![smallvec::smallvec![y1997.clone(), seattle.clone()]];
    let provider = Arc::new(MockNativeProvider::new("CrossJoin", scripted.clone()));
    let state = QueryState::with_native(
        cube.clone(),
        cube.clone(),
        Arc::new(MockCellReader::eager()),
        provider.clone(),
        EvalConfig::default(),
    );
    let ev = Evaluator::root(state).unwrap();

    let join = CrossJoinCalc::new(
        Box::new(ConstantCalc::member_set(Some(time), vec![y1997.clone()])),
        Box::new(ConstantCalc::member_set(Some(store), vec![seattle.clone()])),
    )
    .unwrap();

    assert_eq!(join.evaluate_tuple_list(&ev).unwrap(), scripted);
    assert_eq!(provider.offers(), 1);

    // Iterating functions turn the flag off for their element expressions.
    let interpreted = ev.push_flags(false, false).unwrap();
    let tuples = join.evaluate_tuple_list(&interpreted).unwrap();
    assert_eq!(tuples, scripted);
    assert_eq!(provider.offers(), 1);
}

#[test]
fn named_tuple_set_resolves_through_the_tuple_protocol() {
    let cube = sales_cube();
    let ev = root(cube.clone(), Arc::new(MockCellReader::eager()));
    let time = cube.hierarchy_at(0).unwrap().id;
    let store = cube.hierarchy_at(1).unwrap().id;

    let join = CrossJoinCalc::new(
        Box::new(ConstantCalc::member_set(
            Some(time),
            vec![member(&cube, "[Time].[1997]")],
        )),
        Box::new(ConstantCalc::member_set(
            Some(store),
            vec![
                member(&cube, "[Store].[Seattle]"),
                member(&cube, "[Store].[Berkeley]"),
            ],
        )),
    )
    .unwrap();

    let set = NamedSetEvaluator::new("Pairs", NamedSetExpr::Tuples(Arc::new(join)), false);
    assert_eq!(set.tuples(&ev).unwrap().len(), 2);
    assert!(set.members(&ev).is_err());

    let mut ordinals = Vec::new();
    for tuple in set.iterate_tuples(&ev).unwrap() {
        assert_eq!(tuple.unwrap().len(), 2);
        ordinals.push(set.current_ordinal().unwrap());
    }
    assert_eq!(ordinals, vec![0, 1]);
}

#[test]
fn crossjoin_respects_the_iteration_limit() {
    let cube = sales_cube();
    let time = cube.hierarchy_at(0).unwrap().id;
    let store = cube.hierarchy_at(1).unwrap().id;
    let years: Vec<_> = ["1995", "1996", "1997"]
        .iter()
        .map(|y| member(&cube, &format!("[Time].[{y}]")))
        .collect();
    let stores = vec![
        member(&cube, "[Store].[Seattle]"),
        member(&cube, "[Store].[Portland]"),
    ];

    let state = QueryState::new(
        cube.clone(),
        cube.clone(),
        Arc::new(MockCellReader::eager()),
        EvalConfig::default().with_iteration_limit(4),
    );
    let ev = Evaluator::root(state).unwrap();

    let join = CrossJoinCalc::new(
        Box::new(ConstantCalc::member_set(Some(time), years)),
        Box::new(ConstantCalc::member_set(Some(store), stores)),
    )
    .unwrap();
    let err = join.evaluate_tuple_list(&ev).unwrap_err();
    assert!(matches!(
        err,
        hypercube::eval::EvalError::IterationLimit { limit: 4 }
    ));
}

#[test]
fn evaluating_a_member_set_yields_a_member_set_value() {
    let cube = sales_cube();
    let ev = root(cube.clone(), Arc::new(MockCellReader::eager()));
    let time = cube.hierarchy_at(0).unwrap().id;
    let years = vec![member(&cube, "[Time].[1997]")];
    let set = ConstantCalc::member_set(Some(time), years.clone());
    assert_eq!(
        hypercube::eval::Calc::evaluate(&set, &ev).unwrap(),
        CellValue::MemberSet(years)
    );
}

mod common;

use std::collections::BTreeMap;

use common::shape;
use nonomino::level::{LevelDescriptor, LevelMetadata, LevelPackage, ShapeFile};
use nonomino::{select_shapes, CoverMatrix, SelectOutcome, Shape, Solver};

/// A small authored level: a hook-shaped island and a far-away domino
/// slot, solved by one builtin bar and one custom hook in exactly one way.
fn authored_package() -> LevelPackage {
    let mut shape_index = BTreeMap::new();
    shape_index.insert("bar2".to_owned(), "builtin:bar2".to_owned());
    shape_index.insert("hook".to_owned(), "custom:hook.shape.json".to_owned());
    let mut color_index = BTreeMap::new();
    color_index.insert("bar2".to_owned(), "#3366FF".to_owned());
    color_index.insert("hook".to_owned(), "#FF6633".to_owned());

    let hook = ShapeFile::from_shape("hook", "Hook", &shape(&["##", "#."]));
    let mut custom_shapes = BTreeMap::new();
    custom_shapes.insert("hook.shape.json".to_owned(), hook);

    LevelPackage {
        metadata: LevelMetadata {
            version: 1,
            shape_index,
            color_index,
            author: None,
            description: Some("one bar, one hook".to_owned()),
            created_at: Some("2024-11-02".to_owned()),
        },
        level: LevelDescriptor {
            id: "corners-1".to_owned(),
            name: "Far Corners".to_owned(),
            difficulty: 1,
            rows: 3,
            cols: 4,
            target: Some(vec![
                "##..".to_owned(),
                "#...".to_owned(),
                "..##".to_owned(),
            ]),
            shape_ids: vec!["bar2".to_owned(), "hook".to_owned()],
        },
        custom_shapes,
    }
}

fn builtins() -> BTreeMap<String, Shape> {
    let mut builtins = BTreeMap::new();
    builtins.insert("bar2".to_owned(), shape(&["##"]));
    builtins
}

#[test]
fn authored_level_survives_the_container_byte_for_byte() {
    let package = authored_package();

    let first = package.encode().unwrap();
    let second = package.encode().unwrap();
    assert_eq!(first, second);

    let decoded = LevelPackage::decode(&first).unwrap();
    assert_eq!(decoded, package);
    assert_eq!(decoded.encode().unwrap(), first);
}

#[test]
fn decoded_level_is_playable_end_to_end() {
    let bytes = authored_package().encode().unwrap();
    let package = LevelPackage::decode(&bytes).unwrap();

    let board = package.level.to_board().unwrap();
    let shapes = package.resolve_shapes(&builtins()).unwrap();
    assert_eq!(shapes.len(), 2);

    // The level's own multiset covers the target in exactly one way
    // (hook on its island, bar in the domino slot).
    let matrix = CoverMatrix::build(&board, &shapes, None);
    assert_eq!(matrix.duplicate_factor(), 1);
    let mut solver = Solver::new(&matrix, None);
    let solutions = solver.solve_all(usize::MAX);
    assert_eq!(solutions.len(), 1);

    // Replaying the solution onto a live board wins the level.
    let mut live = package.level.to_board().unwrap();
    for (instance, &row_index) in solutions[0].iter().enumerate() {
        let placement = matrix.placement(row_index);
        assert!(live.try_place(
            &placement.oriented,
            placement.row as i32,
            placement.col as i32,
            instance as u32 + 1,
        ));
    }
    assert!(live.check_win_condition());

    // And the hint rows a renderer would draw match the two islands.
    assert_eq!(live.row_hints(), vec![vec![2], vec![1], vec![2]]);
    assert_eq!(
        live.col_hints(),
        vec![vec![2], vec![1], vec![1], vec![1]]
    );
}

#[test]
fn selector_reproduces_the_authored_multiset() {
    let bytes = authored_package().encode().unwrap();
    let package = LevelPackage::decode(&bytes).unwrap();

    let board = package.level.to_board().unwrap();
    let catalog = package.resolve_shapes(&builtins()).unwrap();

    let result = select_shapes(&board, &catalog, 4, 5_000);
    match result.outcome {
        SelectOutcome::Found(indices) => {
            // One bar and one hook, in catalog terms, in some order.
            let mut sorted = indices;
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1]);
        }
        other => panic!("expected Found, got {:?}", other),
    }
}

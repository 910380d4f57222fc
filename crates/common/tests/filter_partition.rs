//! Property tests for the filtered views of a todo list.

use std::collections::HashSet;

use proptest::prelude::*;
use tickmark_common::{FilterKind, TaskId, TodoList};

#[derive(Debug, Clone)]
enum Op {
    Create(String),
    Toggle(usize),
    Delete(usize),
    Rename(usize, String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z ]{0,8}".prop_map(Op::Create),
        (0usize..16).prop_map(Op::Toggle),
        (0usize..16).prop_map(Op::Delete),
        ((0usize..16), "[a-z ]{0,8}").prop_map(|(i, t)| Op::Rename(i, t)),
    ]
}

fn pick(list: &TodoList, index: usize) -> Option<TaskId> {
    if list.is_empty() {
        None
    } else {
        Some(list.tasks()[index % list.len()].id)
    }
}

fn apply(list: &mut TodoList, op: &Op) {
    match op {
        Op::Create(title) => {
            let _ = list.create(title);
        }
        Op::Toggle(i) => {
            if let Some(id) = pick(list, *i) {
                list.toggle(id).unwrap();
            }
        }
        Op::Delete(i) => {
            if let Some(id) = pick(list, *i) {
                list.delete(id).unwrap();
            }
        }
        Op::Rename(i, title) => {
            if let Some(id) = pick(list, *i) {
                let session = list.begin_edit(id).unwrap();
                list.commit_edit(session, title).unwrap();
            }
        }
    }
}

proptest! {
    #[test]
    fn active_and_completed_partition_all(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut list = TodoList::new();
        for op in &ops {
            apply(&mut list, op);
        }

        let all: Vec<TaskId> = list.view(FilterKind::All).iter().map(|t| t.id).collect();
        let active: HashSet<TaskId> = list.view(FilterKind::Active).iter().map(|t| t.id).collect();
        let completed: HashSet<TaskId> = list.view(FilterKind::Completed).iter().map(|t| t.id).collect();

        prop_assert!(active.is_disjoint(&completed));
        let union: HashSet<TaskId> = active.union(&completed).copied().collect();
        prop_assert_eq!(union, all.iter().copied().collect::<HashSet<_>>());
        prop_assert_eq!(active.len() + completed.len(), all.len());
    }

    #[test]
    fn orders_strictly_increase_and_ids_are_unique(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut list = TodoList::new();
        for op in &ops {
            apply(&mut list, op);
        }

        let orders: Vec<u64> = list.tasks().iter().map(|t| t.order).collect();
        prop_assert!(orders.windows(2).all(|w| w[0] < w[1]));

        let ids: HashSet<TaskId> = list.tasks().iter().map(|t| t.id).collect();
        prop_assert_eq!(ids.len(), list.len());
    }

    #[test]
    fn views_preserve_insertion_order(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut list = TodoList::new();
        for op in &ops {
            apply(&mut list, op);
        }

        for filter in FilterKind::ALL {
            let orders: Vec<u64> = list.view(filter).iter().map(|t| t.order).collect();
            prop_assert!(orders.windows(2).all(|w| w[0] < w[1]));
        }
    }
}

//! Root reducer of the demo host
//!
//! Three slices: `frame` (last tick seen), `counter`, and `todos`.

use crate::actions::HostAction;
use anyhow::{Context, bail};
use std::sync::Arc;
use tick_store::{CombinedReducer, combine_reducers, create_reducer};

#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub title: String,
    pub done: bool,
}

impl Todo {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            done: false,
        }
    }
}

pub fn root() -> CombinedReducer<HostAction> {
    combine_reducers()
        .slice("frame", frame)
        .slice(
            "counter",
            create_reducer(0i64)
                .on("increment", |count: &i64, _: &HostAction| {
                    count.checked_add(1).context("counter overflow")
                })
                .on("reset", |_: &i64, _: &HostAction| Ok(0)),
        )
        .slice("todos", todos)
}

fn frame(state: Option<&Arc<u64>>, action: &HostAction) -> anyhow::Result<Arc<u64>> {
    match (state, action) {
        (Some(current), HostAction::Tick { frame }) if **current == *frame => Ok(Arc::clone(current)),
        (_, HostAction::Tick { frame }) => Ok(Arc::new(*frame)),
        (Some(current), _) => Ok(Arc::clone(current)),
        (None, _) => Ok(Arc::new(0)),
    }
}

fn todos(state: Option<&Arc<Vec<Todo>>>, action: &HostAction) -> anyhow::Result<Arc<Vec<Todo>>> {
    let current = match state {
        Some(current) => current,
        None => return Ok(Arc::new(Vec::new())),
    };

    match action {
        HostAction::AddTodo(title) => {
            let mut next = current.as_ref().clone();
            next.push(Todo::new(title.as_str()));
            Ok(Arc::new(next))
        }
        HostAction::ToggleTodo(index) => {
            if *index >= current.len() {
                bail!("no todo at index {} ({} todos)", index, current.len());
            }
            let mut next = current.as_ref().clone();
            next[*index].done = !next[*index].done;
            Ok(Arc::new(next))
        }
        HostAction::TodosLoaded(titles) => {
            let mut next = current.as_ref().clone();
            next.extend(titles.iter().map(Todo::new));
            Ok(Arc::new(next))
        }
        _ => Ok(Arc::clone(current)),
    }
}

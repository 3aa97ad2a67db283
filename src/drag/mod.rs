//! Drag-and-drop reorder engine.
//!
//! A drag gesture has two phases:
//!
//! - **drag-over** fires on every pointer move. [`preview_move`] rearranges a
//!   working copy of the task list so the board renders correctly frame to
//!   frame. It is pure and never persisted.
//! - **drag-end** fires once. [`commit_move`] renumbers the categories the
//!   gesture touched, closes gaps left elsewhere by deletes, and returns the
//!   `{id, order, categoryId}` patches to send to the server.
//!
//! In a working list, list position is visual position: the tasks of one
//! category, read in list order, are the column top to bottom. The `order`
//! fields are left as persisted until the drop is committed.
//!
//! [`DragSession`] ties the two together for one gesture.

use std::collections::HashMap;

use crate::models::{Task, TaskPatch};

/// The element under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Another task card
    Task(String),
    /// The empty surface of a category column
    Category(String),
}

impl DropTarget {
    /// Target a task card.
    pub fn task(id: impl Into<String>) -> Self {
        DropTarget::Task(id.into())
    }

    /// Target a category surface.
    pub fn category(id: impl Into<String>) -> Self {
        DropTarget::Category(id.into())
    }
}

/// Rearrange the working list for a drag-over event.
///
/// Over a task the active task joins that task's category and is placed
/// next to it: below when its persisted `order` is lower than the over
/// task's, above otherwise. Within one column this is the list-move a
/// pointer drag from rest produces. Over a different category's surface it
/// is reassigned and appended.
///
/// The placement depends only on the other tasks and the persisted orders,
/// never on where the active task currently sits, so repeating an event
/// changes nothing: `preview_move(preview_move(w)) == preview_move(w)`.
pub fn preview_move(working: &[Task], active_id: &str, over: Option<&DropTarget>) -> Vec<Task> {
    let mut next = working.to_vec();

    let Some(over) = over else {
        return next;
    };
    let Some(active_index) = index_of(&next, active_id) else {
        return next;
    };

    match over {
        DropTarget::Task(over_id) => {
            if over_id == active_id || index_of(&next, over_id).is_none() {
                return next;
            }

            let mut task = next.remove(active_index);
            let Some(over_index) = index_of(&next, over_id) else {
                return working.to_vec();
            };
            let over_task = &next[over_index];
            let slot = if task.order < over_task.order {
                over_index + 1
            } else {
                over_index
            };
            task.category_id = over_task.category_id.clone();
            next.insert(slot, task);
        }
        DropTarget::Category(category_id) => {
            if next[active_index].category_id != *category_id {
                let mut task = next.remove(active_index);
                task.category_id = category_id.clone();
                next.push(task);
            }
        }
    }

    next
}

/// Compute the patches for a finished drop.
///
/// `baseline` is the persisted state the gesture started from, `working`
/// the visual state at drop time. The active task is placed in
/// `final_category_id` at its working-list position, then the destination
/// category and (if different) the source category are renumbered from 0
/// in visual order.
///
/// Returns nothing when the drop leaves every order and category as it was.
/// Otherwise every task of the moved categories is patched, destination
/// first, followed by every task of any other category whose orders have
/// gaps or duplicates.
pub fn commit_move(
    baseline: &[Task],
    working: &[Task],
    active_id: &str,
    final_category_id: &str,
) -> Vec<TaskPatch> {
    let Some(origin) = baseline.iter().find(|t| t.id == active_id) else {
        return Vec::new();
    };
    if index_of(working, active_id).is_none() {
        return Vec::new();
    }

    let mut moved = vec![final_category_id];
    if origin.category_id != final_category_id {
        moved.push(origin.category_id.as_str());
    }

    let category_of = |t: &Task| -> String {
        if t.id == active_id {
            final_category_id.to_string()
        } else {
            t.category_id.clone()
        }
    };

    let mut patches = Vec::new();
    for category_id in &moved {
        renumber(working, category_id, &category_of, &mut patches);
    }

    let before: HashMap<&str, &Task> = baseline.iter().map(|t| (t.id.as_str(), t)).collect();
    let changed = patches.iter().any(|p| match before.get(p.id.as_str()) {
        Some(prev) => prev.order != p.order || prev.category_id != p.category_id,
        None => true,
    });
    if !changed {
        return Vec::new();
    }

    let mut others: Vec<&str> = Vec::new();
    for task in working {
        let category_id = task.category_id.as_str();
        if !moved.contains(&category_id) && !others.contains(&category_id) {
            others.push(category_id);
        }
    }
    for category_id in others {
        if !is_dense(working, category_id) {
            renumber(working, category_id, &category_of, &mut patches);
        }
    }

    patches
}

/// Push a `0..n` patch for every task of `category_id`, in list order.
fn renumber(
    working: &[Task],
    category_id: &str,
    category_of: &impl Fn(&Task) -> String,
    patches: &mut Vec<TaskPatch>,
) {
    let members = working.iter().filter(|t| category_of(*t) == category_id);
    for (index, task) in members.enumerate() {
        patches.push(TaskPatch {
            id: task.id.clone(),
            order: index as u32,
            category_id: category_id.to_string(),
        });
    }
}

/// Tasks of one category in the order they appear in `tasks`.
pub fn tasks_in_category<'a>(tasks: &'a [Task], category_id: &'a str) -> impl Iterator<Item = &'a Task> {
    tasks.iter().filter(move |t| t.category_id == category_id)
}

/// Whether the tasks of `category_id` carry exactly the orders `0..n`.
pub fn is_dense(tasks: &[Task], category_id: &str) -> bool {
    let mut orders: Vec<u32> = tasks_in_category(tasks, category_id).map(|t| t.order).collect();
    orders.sort_unstable();
    orders.iter().enumerate().all(|(i, &o)| o == i as u32)
}

fn index_of(tasks: &[Task], id: &str) -> Option<usize> {
    tasks.iter().position(|t| t.id == id)
}

/// One drag gesture over a snapshot of the board.
#[derive(Debug, Clone)]
pub struct DragSession {
    baseline: Vec<Task>,
    working: Vec<Task>,
    active_id: String,
}

impl DragSession {
    /// Lift `active_id` off the board. Returns `None` if it isn't a known task.
    pub fn start(tasks: &[Task], active_id: &str) -> Option<Self> {
        index_of(tasks, active_id)?;

        let mut working = tasks.to_vec();
        working.sort_by_key(|t| t.order);

        Some(Self {
            baseline: tasks.to_vec(),
            working,
            active_id: active_id.to_string(),
        })
    }

    /// The current visual arrangement.
    pub fn working(&self) -> &[Task] {
        &self.working
    }

    /// Handle a drag-over event.
    pub fn over(&mut self, target: Option<&DropTarget>) {
        self.working = preview_move(&self.working, &self.active_id, target);
    }

    /// Handle the drop and return the patches to persist.
    ///
    /// The target is previewed once more, which changes nothing if the last
    /// drag-over event already reported it.
    pub fn end(mut self, target: Option<&DropTarget>) -> Vec<TaskPatch> {
        let final_category_id = match target {
            None => return Vec::new(),
            Some(DropTarget::Task(over_id)) => {
                if *over_id == self.active_id {
                    return Vec::new();
                }
                match self.working.iter().find(|t| t.id == *over_id) {
                    Some(over) => over.category_id.clone(),
                    None => return Vec::new(),
                }
            }
            Some(DropTarget::Category(category_id)) => category_id.clone(),
        };
        self.over(target);

        commit_move(
            &self.baseline,
            &self.working,
            &self.active_id,
            &final_category_id,
        )
    }
}

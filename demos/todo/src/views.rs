//! Render functions for the three todo views.

use crate::types::{Stats, Todo, Todos};
use fabulous_core::Snapshot;
use fabulous_vdom::{VElement, VNode, h};

/// `ul#todo-list` with one `li` per todo
#[must_use]
pub fn render_todo_list(todos: &Todos) -> VNode {
    h("ul#todo-list")
        .children(todos.iter().map(render_todo))
        .into_node()
}

fn render_todo(todo: &Todo) -> VElement {
    let item = h("li").attr("data-id", todo.id.to_string());
    let item = if todo.complete {
        item.class("completed")
    } else {
        item
    };

    item.child(
        h("div.view")
            .child(
                h("input.toggle")
                    .attr("type", "checkbox")
                    .prop_bool("checked", todo.complete),
            )
            .child(h("label").text(&todo.description))
            .child(h("button.destroy")),
    )
    .child(h("input.edit").attr("value", &todo.description))
}

/// The "toggle all" checkbox, checked when every todo is complete
#[must_use]
pub fn render_complete_all(stats: &Stats) -> VNode {
    h("input#toggle-all")
        .attr("type", "checkbox")
        .prop_bool("checked", stats.all_complete())
        .into_node()
}

/// Footer with the remaining count, filter links and the clear button
#[must_use]
pub fn render_footer(stats: &Stats) -> VNode {
    let remaining = stats.remaining();
    let label = if remaining == 1 {
        " item left"
    } else {
        " items left"
    };

    h("footer#footer")
        .child(
            h("span#todo-count")
                .child(h("strong").text(remaining.to_string()))
                .text(label),
        )
        .child(
            h("ul#filters").child(
                h("li")
                    .child(h("a").attr("href", "#/").text("All"))
                    .child(h("a").attr("href", "#/active").text("Active"))
                    .child(h("a").attr("href", "#/completed").text("Completed")),
            ),
        )
        .child(h("button#clear-completed").text(format!("Clear completed ({})", stats.complete)))
        .into_node()
}

/// Project a todo list snapshot onto its counts.
#[must_use]
pub fn stats(todos: Snapshot<Todos>) -> Snapshot<Stats> {
    todos.map(|todos| Stats::of(&todos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TodoId;
    use std::sync::Arc;
    use uuid::Uuid;

    fn todo(description: &str, complete: bool) -> Todo {
        Todo {
            id: TodoId::from_uuid(Uuid::nil()),
            description: description.to_string(),
            complete,
        }
    }

    #[test]
    fn todo_list_marks_completed_items() {
        let todos: Todos = Arc::new(vec![todo("milk", true)]);

        let html = render_todo_list(&todos).to_html();

        assert_eq!(
            html,
            concat!(
                r#"<ul id="todo-list">"#,
                r#"<li class="completed" data-id="00000000-0000-0000-0000-000000000000">"#,
                r#"<div class="view"><input checked class="toggle" type="checkbox">"#,
                r#"<label>milk</label><button class="destroy"></button></div>"#,
                r#"<input class="edit" value="milk"></li></ul>"#,
            )
        );
    }

    #[test]
    fn toggle_all_is_checked_only_when_everything_is_done() {
        let done = Stats { complete: 2, total: 2 };
        let open = Stats { complete: 1, total: 2 };

        assert!(render_complete_all(&done).to_html().contains("checked"));
        assert!(!render_complete_all(&open).to_html().contains("checked"));
        assert!(!render_complete_all(&Stats::default()).to_html().contains("checked"));
    }

    #[test]
    fn footer_pluralizes_remaining() {
        let one = render_footer(&Stats { complete: 1, total: 2 }).to_html();
        let many = render_footer(&Stats { complete: 0, total: 3 }).to_html();

        assert!(one.contains("<strong>1</strong> item left"));
        assert!(many.contains("<strong>3</strong> items left"));
        assert!(one.contains("Clear completed (1)"));
    }

    #[test]
    fn stats_projects_counts() {
        let todos: Todos = Arc::new(vec![todo("a", true), todo("b", false)]);
        let stats = stats(Snapshot::new(todos));
        assert_eq!(*stats.get(), Stats { complete: 1, total: 2 });
    }
}

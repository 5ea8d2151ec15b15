//! The todo model: actions in, snapshots out.

use crate::reducer::TodoReducer;
use crate::store::TodoStore;
use crate::types::{Todo, TodoAction, Todos};
use async_stream::stream;
use fabulous_core::Snapshot;
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Fold `actions` over `initial`, emitting a snapshot per change.
///
/// The initial list is emitted first. Every action that changes the list is
/// saved to `store` and then emitted; rejected actions and no-ops are logged
/// and emit nothing. A failed save is logged and does not stop the model.
pub fn model<A>(
    actions: A,
    store: Arc<dyn TodoStore>,
    initial: Vec<Todo>,
) -> impl Stream<Item = Snapshot<Todos>> + Send
where
    A: Stream<Item = TodoAction> + Send,
{
    stream! {
        let reducer = TodoReducer::new();
        let mut todos: Todos = Arc::new(initial);
        tracing::info!(todos = todos.len(), "Model started");
        yield Snapshot::new(Arc::clone(&todos));

        let mut actions = std::pin::pin!(actions);
        while let Some(action) = actions.next().await {
            // Copies the list only while a view still holds the previous one
            match reducer.reduce(Arc::make_mut(&mut todos), action) {
                Ok(true) => {
                    if let Err(error) = store.save(&todos) {
                        tracing::error!(%error, "Failed to save todos");
                    }
                    yield Snapshot::new(Arc::clone(&todos));
                }
                Ok(false) => tracing::debug!("Action changed nothing"),
                Err(error) => tracing::warn!(%error, "Rejected action"),
            }
        }

        tracing::info!(todos = todos.len(), "Model stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use futures::stream;

    #[tokio::test]
    async fn emits_initial_then_each_change_and_saves() {
        let store = Arc::new(MemoryStore::new());
        let actions = stream::iter(vec![
            TodoAction::Add {
                description: "b".to_string(),
            },
            TodoAction::Remove { position: 9 },
            TodoAction::ClearCompleted,
            TodoAction::Toggle { position: 1 },
        ]);

        let snapshots: Vec<_> = model(actions, store.clone(), vec![Todo::create("a")])
            .map(Snapshot::into_inner)
            .collect()
            .await;

        let lengths: Vec<_> = snapshots.iter().map(|todos| todos.len()).collect();
        assert_eq!(lengths, vec![1, 2, 2]);
        assert!(snapshots[2][0].complete);
        // earlier snapshots are unaffected by later changes
        assert!(!snapshots[1][0].complete);

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved, *snapshots[2].as_ref());
    }
}

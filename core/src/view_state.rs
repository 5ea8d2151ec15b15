//! The two-state render tag.

use crate::backend::Backend;
use std::fmt;

/// What a view pipeline knows about its output.
///
/// A pipeline starts `Unmounted` with the placeholder surface supplied by the
/// caller. The first successful mount moves it to `Mounted`, and it never
/// goes back.
pub enum ViewState<B: Backend> {
    /// Nothing rendered yet; `placeholder` marks where the view will go
    Unmounted {
        /// Mount point supplied by the caller
        placeholder: B::Surface,
    },

    /// The view is live
    Mounted {
        /// Most recently returned live surface
        surface: B::Surface,
        /// Tree that `surface` currently reflects
        tree: B::Tree,
    },
}

impl<B: Backend> ViewState<B> {
    /// Initial state for a pipeline mounting at `placeholder`.
    #[must_use]
    pub const fn unmounted(placeholder: B::Surface) -> Self {
        Self::Unmounted { placeholder }
    }

    /// Check if a mount has succeeded
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        matches!(self, Self::Mounted { .. })
    }

    /// The live surface, or the placeholder before the first mount.
    #[must_use]
    pub const fn surface(&self) -> &B::Surface {
        match self {
            Self::Unmounted { placeholder } => placeholder,
            Self::Mounted { surface, .. } => surface,
        }
    }

    /// The last rendered tree, if mounted.
    #[must_use]
    pub const fn tree(&self) -> Option<&B::Tree> {
        match self {
            Self::Unmounted { .. } => None,
            Self::Mounted { tree, .. } => Some(tree),
        }
    }
}

impl<B> fmt::Debug for ViewState<B>
where
    B: Backend,
    B::Surface: fmt::Debug,
    B::Tree: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmounted { placeholder } => f
                .debug_struct("ViewState::Unmounted")
                .field("placeholder", placeholder)
                .finish(),
            Self::Mounted { surface, tree } => f
                .debug_struct("ViewState::Mounted")
                .field("surface", surface)
                .field("tree", tree)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    struct Labels;

    impl Backend for Labels {
        type Tree = String;
        type Patch = String;
        type Surface = u32;
        type Error = Infallible;

        fn mount(&self, placeholder: &u32, _tree: &String) -> Result<u32, Infallible> {
            Ok(placeholder + 1)
        }

        fn diff(&self, _old: &String, new: &String) -> String {
            new.clone()
        }

        fn apply(&self, surface: &u32, _patch: String) -> Result<u32, Infallible> {
            Ok(*surface)
        }
    }

    #[test]
    fn unmounted_exposes_placeholder_only() {
        let state = ViewState::<Labels>::unmounted(7);
        assert!(!state.is_mounted());
        assert_eq!(*state.surface(), 7);
        assert!(state.tree().is_none());
    }

    #[test]
    fn mounted_exposes_surface_and_tree() {
        let state = ViewState::<Labels>::Mounted {
            surface: 8,
            tree: "hello".to_string(),
        };
        assert!(state.is_mounted());
        assert_eq!(*state.surface(), 8);
        assert_eq!(state.tree().map(String::as_str), Some("hello"));
    }
}

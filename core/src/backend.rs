//! The tree differ/patcher capability.
//!
//! The pipeline treats the backend as a black box with three operations. It
//! never inspects trees, patches or surfaces itself.

/// Backend trait - diff trees and mutate the live surface
///
/// # Contract
///
/// - `mount` builds a live surface for `tree` and puts it where `placeholder`
///   was. It is only called once per pipeline, before any `apply`.
/// - `diff` is pure: `diff(t, t)` must produce an empty patch.
/// - `apply` either applies the whole patch and returns the surface handle
///   that now represents the view (which may differ from `surface` if the
///   root was replaced), or fails without mutating anything.
///
/// Surfaces are cheap handles to live nodes, so the pipeline can keep the
/// last good handle while a patch is in flight.
///
/// # Example
///
/// ```ignore
/// impl Backend for VdomBackend {
///     type Tree = VNode;
///     type Patch = PatchSet;
///     type Surface = NodeRef;
///     type Error = VdomError;
///
///     fn mount(&self, placeholder: &NodeRef, tree: &VNode) -> Result<NodeRef, VdomError> {
///         let node = placeholder.document().create(tree);
///         placeholder.replace_with(&node)?;
///         Ok(node)
///     }
///     // ...
/// }
/// ```
pub trait Backend: Send + Sync + 'static {
    /// Desired-output description produced by render functions
    type Tree: Send + 'static;

    /// Set of mutations turning one tree's output into another's
    type Patch: Send + 'static;

    /// Handle to a live output node
    type Surface: Clone + Send + 'static;

    /// Failure raised by `mount` or `apply`
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create the live output for `tree` and swap it in for `placeholder`.
    ///
    /// # Errors
    ///
    /// Returns an error if the placeholder cannot be replaced (for example
    /// because it is no longer attached to a parent).
    fn mount(&self, placeholder: &Self::Surface, tree: &Self::Tree)
    -> Result<Self::Surface, Self::Error>;

    /// Compute the patch turning `old` into `new`.
    fn diff(&self, old: &Self::Tree, new: &Self::Tree) -> Self::Patch;

    /// Apply `patch` to `surface`, returning the handle for the patched view.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch does not fit the surface. In that case
    /// the surface must be left untouched.
    fn apply(&self, surface: &Self::Surface, patch: Self::Patch)
    -> Result<Self::Surface, Self::Error>;
}

impl<B> Backend for std::sync::Arc<B>
where
    B: Backend,
{
    type Tree = B::Tree;
    type Patch = B::Patch;
    type Surface = B::Surface;
    type Error = B::Error;

    fn mount(
        &self,
        placeholder: &Self::Surface,
        tree: &Self::Tree,
    ) -> Result<Self::Surface, Self::Error> {
        (**self).mount(placeholder, tree)
    }

    fn diff(&self, old: &Self::Tree, new: &Self::Tree) -> Self::Patch {
        (**self).diff(old, new)
    }

    fn apply(
        &self,
        surface: &Self::Surface,
        patch: Self::Patch,
    ) -> Result<Self::Surface, Self::Error> {
        (**self).apply(surface, patch)
    }
}

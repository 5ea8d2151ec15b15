//! Render functions and their failures.
//!
//! A render function turns one state value into a tree describing the desired
//! output. It must be deterministic and free of side effects; the pipeline may
//! call it at any point after a snapshot arrives.

use thiserror::Error;

/// A render function raised an error for a given snapshot.
///
/// The pipeline never substitutes a default tree for a failed render. The
/// view keeps its previous state and the failure is reported downstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("render failed: {0}")]
pub struct RenderError(String);

impl RenderError {
    /// Create a new `RenderError` with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Render trait - `data → tree`
///
/// Implemented by [`RenderFn`] and [`TryRenderFn`]; construct them with
/// [`render_fn`] and [`try_render_fn`].
pub trait Render<T: ?Sized> {
    /// The tree type this render function produces
    type Tree;

    /// Render `data` into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the data cannot be rendered.
    fn render(&self, data: &T) -> Result<Self::Tree, RenderError>;
}

/// An infallible render function. See [`render_fn`].
#[derive(Clone, Copy, Debug)]
pub struct RenderFn<F>(F);

/// A fallible render function. See [`try_render_fn`].
#[derive(Clone, Copy, Debug)]
pub struct TryRenderFn<F>(F);

/// Adapt a pure closure `&T → Tree` into a [`Render`].
///
/// # Examples
///
/// ```
/// use fabulous_core::render::{render_fn, Render};
///
/// let render = render_fn(|items: &Vec<&str>| items.join(","));
/// assert_eq!(render.render(&vec!["a", "b"]).ok(), Some("a,b".to_string()));
/// ```
#[must_use]
pub const fn render_fn<F>(f: F) -> RenderFn<F> {
    RenderFn(f)
}

/// Adapt a fallible closure `&T → Result<Tree, RenderError>` into a [`Render`].
///
/// # Examples
///
/// ```
/// use fabulous_core::render::{try_render_fn, Render, RenderError};
///
/// let render = try_render_fn(|n: &i32| {
///     if *n < 0 {
///         Err(RenderError::new("negative"))
///     } else {
///         Ok(n.to_string())
///     }
/// });
/// assert!(render.render(&-1).is_err());
/// ```
#[must_use]
pub const fn try_render_fn<F>(f: F) -> TryRenderFn<F> {
    TryRenderFn(f)
}

impl<T, R, F> Render<T> for RenderFn<F>
where
    T: ?Sized,
    F: Fn(&T) -> R,
{
    type Tree = R;

    fn render(&self, data: &T) -> Result<R, RenderError> {
        Ok((self.0)(data))
    }
}

impl<T, R, F> Render<T> for TryRenderFn<F>
where
    T: ?Sized,
    F: Fn(&T) -> Result<R, RenderError>,
{
    type Tree = R;

    fn render(&self, data: &T) -> Result<R, RenderError> {
        (self.0)(data)
    }
}

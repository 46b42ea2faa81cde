use axum::Router;
use crate::app::AppContext;

/// Trait for composable route modules
///
/// Each feature area exposes its routes as a module that the [`App`](crate::App)
/// merges into one router. Handlers take `State<AppContext>`.
///
/// # Example
///
/// ```ignore
/// struct LessonsModule;
///
/// impl RouteModule for LessonsModule {
///     fn routes(&self) -> Router<AppContext> {
///         Router::new().route("/lessons/{lesson_id}/videos", get(list_playable_videos))
///     }
/// }
/// ```
pub trait RouteModule {
    /// Returns a router with all routes for this module
    fn routes(&self) -> Router<AppContext>;

    /// Optional path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Add this module's routes to an application router
    fn register(self, router: Router<AppContext>) -> Router<AppContext>
    where
        Self: Sized,
    {
        let routes = self.routes();

        if let Some(prefix) = self.prefix() {
            router.nest(prefix, routes)
        } else {
            router.merge(routes)
        }
    }
}

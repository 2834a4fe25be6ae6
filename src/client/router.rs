//! Client-side route dispatch.
//!
//! A minimal single-page-style router: exact-match paths plus `{param}`
//! segments for parameterized routes. Unmatched paths fall back to the
//! root handler — the app always lands somewhere rather than 404ing.

use std::collections::HashMap;

/// Parameters extracted from a matched route pattern.
#[derive(Debug, Default, Clone)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Route handler. Receives the extracted path parameters.
pub type RouteHandler = Box<dyn FnMut(&RouteParams)>;

enum Segment {
    Literal(String),
    Param(String),
}

struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    fn matches(&self, path: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    let value = urlencoding::decode(part)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| part.to_string());
                    params.insert(name.clone(), value);
                }
            }
        }
        Some(RouteParams(params))
    }
}

struct Route {
    pattern: RoutePattern,
    handler: RouteHandler,
}

/// Dispatches navigation to registered handlers, tracking the current
/// route and a history stack.
pub struct Router {
    routes: Vec<Route>,
    current: String,
    history: Vec<String>,
    initialized: bool,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            current: "/".to_string(),
            history: Vec::new(),
            initialized: false,
        }
    }

    /// Register a handler for a path pattern.
    pub fn add_route(&mut self, pattern: &str, handler: RouteHandler) {
        tracing::debug!(pattern = pattern, "Route registered");
        self.routes.push(Route {
            pattern: RoutePattern::parse(pattern),
            handler,
        });
    }

    /// Dispatch once for the startup route. A second call is a no-op.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.dispatch(&self.current.clone());
    }

    /// Navigate to `path`. Re-navigating to the current route is a no-op.
    pub fn navigate(&mut self, path: &str) {
        if path == self.current {
            tracing::debug!(path = path, "Already on route, skipping navigation");
            return;
        }
        self.history.push(std::mem::replace(&mut self.current, path.to_string()));
        self.dispatch(path);
    }

    /// The route currently displayed.
    pub fn current_route(&self) -> &str {
        &self.current
    }

    /// Previously visited routes, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn dispatch(&mut self, path: &str) {
        let matched = self
            .routes
            .iter()
            .position(|route| route.pattern.matches(path).is_some());

        match matched {
            Some(index) => {
                let params = self.routes[index].pattern.matches(path).unwrap_or_default();
                (self.routes[index].handler)(&params);
            }
            None => {
                // SPA default: unmatched paths land on the root handler
                tracing::debug!(path = path, "No handler, falling back to root");
                if let Some(index) = self
                    .routes
                    .iter()
                    .position(|route| route.pattern.matches("/").is_some())
                {
                    (self.routes[index].handler)(&RouteParams::default());
                }
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, RouteHandler) {
        let count = Rc::new(Cell::new(0));
        let captured = count.clone();
        let handler: RouteHandler = Box::new(move |_| captured.set(captured.get() + 1));
        (count, handler)
    }

    #[test]
    fn navigate_invokes_handler_exactly_once() {
        let mut router = Router::new();
        let (count, handler) = counter();
        router.add_route("/a", handler);

        router.navigate("/a");
        assert_eq!(count.get(), 1);
        assert_eq!(router.current_route(), "/a");
    }

    #[test]
    fn same_route_renavigation_is_noop() {
        let mut router = Router::new();
        let (count, handler) = counter();
        router.add_route("/a", handler);

        router.navigate("/a");
        router.navigate("/a");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn navigating_away_and_back_redispatches() {
        let mut router = Router::new();
        let (count_a, handler_a) = counter();
        let (count_b, handler_b) = counter();
        router.add_route("/a", handler_a);
        router.add_route("/b", handler_b);

        router.navigate("/a");
        router.navigate("/b");
        router.navigate("/a");
        assert_eq!(count_a.get(), 2);
        assert_eq!(count_b.get(), 1);
        assert_eq!(router.history(), ["/", "/a", "/b"]);
    }

    #[test]
    fn init_is_idempotent() {
        let mut router = Router::new();
        let (count, handler) = counter();
        router.add_route("/", handler);

        router.init();
        router.init();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn unmatched_path_falls_back_to_root() {
        let mut router = Router::new();
        let (root_count, root_handler) = counter();
        router.add_route("/", root_handler);

        router.navigate("/nope/nothing/here");
        assert_eq!(root_count.get(), 1);
    }

    #[test]
    fn parameterized_route_extracts_segments() {
        let mut router = Router::new();
        let seen = Rc::new(Cell::new(false));
        let captured = seen.clone();
        router.add_route(
            "/messages/{contact_id}/{contact_name}",
            Box::new(move |params| {
                assert_eq!(params.get("contact_id"), Some("c42"));
                assert_eq!(params.get("contact_name"), Some("Bob Jones"));
                captured.set(true);
            }),
        );

        router.navigate("/messages/c42/Bob%20Jones");
        assert!(seen.get());
    }

    #[test]
    fn wrong_segment_count_does_not_match() {
        let mut router = Router::new();
        let (root_count, root_handler) = counter();
        let (msg_count, msg_handler) = counter();
        router.add_route("/", root_handler);
        router.add_route("/messages/{contact_id}/{contact_name}", msg_handler);

        router.navigate("/messages/only-one");
        assert_eq!(msg_count.get(), 0);
        assert_eq!(root_count.get(), 1);
    }
}

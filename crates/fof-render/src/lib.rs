pub mod hit;
pub mod route;

pub use hit::{Hit, HitConfig, hit_test};
pub use route::{EdgeRoute, RouteConfig, route_all, route_edge};

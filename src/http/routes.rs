//! Table-driven route registry.
//!
//! One table feeds both request dispatch and the offline route printer, so
//! the printed documentation can never drift from what the server matches.

/// One registered route. `pattern` segments wrapped in braces capture path
/// parameters, e.g. `/api/items/{id}/status/`.
#[derive(Debug)]
pub struct Route {
    pub method: &'static str,
    pub pattern: &'static str,
    /// Handling function, module-qualified.
    pub handler: &'static str,
    pub name: &'static str,
}

pub const ROUTES: &[Route] = &[
    Route { method: "POST", pattern: "/api/auth/login/", handler: "service::session::login", name: "auth_login" },
    Route { method: "POST", pattern: "/api/auth/logout/", handler: "service::session::logout", name: "auth_logout" },
    Route { method: "POST", pattern: "/api/auth/refresh/", handler: "service::session::refresh", name: "auth_refresh" },
    Route { method: "GET", pattern: "/api/auth/me/", handler: "service::session::me", name: "auth_me" },
    Route { method: "GET", pattern: "/api/auth/profile/", handler: "service::accounts::profile_json", name: "auth_profile" },
    Route { method: "PUT", pattern: "/api/auth/profile/", handler: "service::accounts::update_profile", name: "auth_profile_update" },
    Route { method: "GET", pattern: "/api/auth/settings/", handler: "service::accounts::settings_json", name: "auth_settings" },
    Route { method: "PUT", pattern: "/api/auth/settings/", handler: "service::accounts::update_settings", name: "auth_settings_update" },
    Route { method: "GET", pattern: "/api/stats/", handler: "service::stats::dashboard_stats", name: "api_stats" },
    Route { method: "GET", pattern: "/api/boxes/", handler: "service::stats::boxes_with_warehouse", name: "api_boxes" },
    Route { method: "POST", pattern: "/api/boxes/", handler: "service::logistics::create_box", name: "api_boxes_create" },
    Route { method: "PUT", pattern: "/api/boxes/{id}/status/", handler: "service::logistics::set_box_status", name: "api_box_status" },
    Route { method: "POST", pattern: "/api/boxes/{id}/items/", handler: "service::logistics::add_item_to_box", name: "api_box_items" },
    Route { method: "GET", pattern: "/api/items/", handler: "service::stats::items_overview", name: "api_items" },
    Route { method: "POST", pattern: "/api/items/", handler: "service::logistics::receive_item", name: "api_items_create" },
    Route { method: "PUT", pattern: "/api/items/{id}/status/", handler: "service::logistics::set_item_status", name: "api_item_status" },
    Route { method: "GET", pattern: "/api/customers/", handler: "service::stats::customers_overview", name: "api_customers" },
    Route { method: "POST", pattern: "/api/customers/", handler: "service::accounts::create_user", name: "api_customers_create" },
    Route { method: "GET", pattern: "/api/warehouses/", handler: "service::logistics::list_warehouses", name: "api_warehouses" },
    Route { method: "POST", pattern: "/api/warehouses/", handler: "service::logistics::create_warehouse", name: "api_warehouses_create" },
    Route { method: "GET", pattern: "/api/boxes/{id}/items/", handler: "service::logistics::list_box_contents", name: "api_box_items_list" },
    Route { method: "GET", pattern: "/api/orders/", handler: "service::logistics::list_orders", name: "api_orders" },
    Route { method: "POST", pattern: "/api/orders/", handler: "service::logistics::create_order", name: "api_orders_create" },
    Route { method: "PUT", pattern: "/api/orders/{id}/status/", handler: "service::logistics::set_order_status", name: "api_order_status" },
    Route { method: "GET", pattern: "/api/labels/{barcode}/", handler: "service::logistics::find_label", name: "api_label_lookup" },
    Route { method: "GET", pattern: "/api/requests/", handler: "service::logistics::list_requests", name: "api_requests" },
    Route { method: "POST", pattern: "/api/requests/", handler: "service::logistics::create_request", name: "api_requests_create" },
    Route { method: "PUT", pattern: "/api/requests/{id}/status/", handler: "service::logistics::set_request_status", name: "api_request_status" },
    Route { method: "GET", pattern: "/api/domestic-orders/", handler: "service::logistics::list_domestic_orders", name: "api_domestic_orders" },
    Route { method: "POST", pattern: "/api/domestic-orders/", handler: "service::logistics::create_domestic_order", name: "api_domestic_orders_create" },
    Route { method: "GET", pattern: "/api/lockers/", handler: "service::logistics::list_lockers", name: "api_lockers" },
    Route { method: "GET", pattern: "/api/status-logs/", handler: "service::logistics::list_status_logs", name: "api_status_logs" },
    Route { method: "GET", pattern: "/metrics", handler: "metrics::gather_text", name: "metrics" },
];

/// Captured path parameters, in pattern order.
pub type PathParams = Vec<(&'static str, String)>;

/// Match a request against the registry.
///
/// Trailing slashes are tolerated in both directions, matching how the
/// patterns themselves are written.
pub fn match_route(method: &str, path: &str) -> Option<(&'static Route, PathParams)> {
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for route in ROUTES {
        if route.method != method {
            continue;
        }
        let pattern_segments: Vec<&str> =
            route.pattern.split('/').filter(|s| !s.is_empty()).collect();
        if pattern_segments.len() != path_segments.len() {
            continue;
        }

        let mut params = PathParams::new();
        let mut matched = true;
        for (pat, seg) in pattern_segments.iter().zip(&path_segments) {
            if let Some(name) = pat.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                params.push((name, (*seg).to_string()));
            } else if pat != seg {
                matched = false;
                break;
            }
        }
        if matched {
            return Some((route, params));
        }
    }
    None
}

/// Render the registry as a markdown table.
pub fn render_route_table() -> String {
    let mut out = String::from("| Method | Path | Handler | Name |\n|--------|------|---------|------|\n");
    for route in ROUTES {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            route.method, route.pattern, route.handler, route.name
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_route_matches() {
        let (route, params) = match_route("GET", "/api/stats/").unwrap();
        assert_eq!(route.name, "api_stats");
        assert!(params.is_empty());
    }

    #[test]
    fn test_trailing_slash_is_tolerated() {
        assert!(match_route("GET", "/api/stats").is_some());
        assert!(match_route("GET", "/metrics").is_some());
        assert!(match_route("GET", "/metrics/").is_some());
    }

    #[test]
    fn test_method_is_part_of_the_match() {
        assert!(match_route("POST", "/api/auth/login/").is_some());
        assert!(match_route("GET", "/api/auth/login/").is_none());
        assert!(match_route("DELETE", "/api/items/").is_none());
    }

    #[test]
    fn test_path_params_are_captured() {
        let (route, params) =
            match_route("PUT", "/api/items/0bd81318-3bb5-4dcf-9db4-8bd11ae9b371/status/").unwrap();
        assert_eq!(route.name, "api_item_status");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0, "id");
        assert_eq!(params[0].1, "0bd81318-3bb5-4dcf-9db4-8bd11ae9b371");
    }

    #[test]
    fn test_unknown_path_does_not_match() {
        assert!(match_route("GET", "/api/unknown/").is_none());
        assert!(match_route("GET", "/").is_none());
    }

    #[test]
    fn test_route_table_lists_every_route() {
        let table = render_route_table();
        for route in ROUTES {
            assert!(table.contains(route.pattern), "missing {}", route.pattern);
            assert!(table.contains(route.name), "missing {}", route.name);
        }
        assert_eq!(table.lines().count(), ROUTES.len() + 2);
    }

    #[test]
    fn test_route_names_are_unique() {
        let mut names: Vec<&str> = ROUTES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }
}

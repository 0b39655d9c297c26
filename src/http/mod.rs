//! HTTP surface.
//!
//! A `may_minihttp` service dispatching against the route registry in
//! [`routes`]. Handlers parse JSON bodies, call into the service layer and
//! map [`ServiceError`] onto status codes with `{"error": ...}` bodies.

pub mod routes;

use may_minihttp::{HttpServer, HttpService, Request, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::io::{self, Read};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{TokenIssuer, TokenKind};
use crate::db::ClientExecutor;
use crate::domain::{user, EntityKind, ItemFilter, ItemStatus, User};
use crate::metrics::{gather_text, METRICS};
use crate::service::{accounts, logistics, session, stats, ServiceError};

/// Shared state behind the HTTP surface.
#[derive(Clone)]
pub struct ApiService {
    executor: Arc<ClientExecutor>,
    issuer: Arc<TokenIssuer>,
}

impl ApiService {
    pub fn new(executor: Arc<ClientExecutor>, issuer: Arc<TokenIssuer>) -> Self {
        Self { executor, issuer }
    }

    /// Serve forever on `bind`.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` when the listener cannot be started.
    pub fn serve(self, bind: &str) -> io::Result<()> {
        tracing::info!("cartage listening on http://{bind}");
        let server = HttpServer(self).start(bind)?;
        server
            .join()
            .map_err(|e| io::Error::other(format!("server failed: {e:?}")))?;
        Ok(())
    }
}

impl HttpService for ApiService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method = req.method().to_string();
        let raw_path = req.path().to_string();
        let bearer = bearer_token(&req);
        let mut body = Vec::new();
        req.body().read_to_end(&mut body)?;

        let (path, query) = match raw_path.split_once('?') {
            Some((p, q)) => (p.to_string(), q.to_string()),
            None => (raw_path, String::new()),
        };

        // The metrics endpoint speaks text, not JSON.
        if method == "GET" && (path == "/metrics" || path == "/metrics/") {
            res.header("Content-Type: text/plain; charset=utf-8");
            res.body_mut().extend_from_slice(&gather_text());
            METRICS.record_http_response(200);
            return Ok(());
        }

        let (status, payload) = match self.dispatch(&method, &path, &query, bearer, &body) {
            Ok((status, payload)) => (status, payload),
            Err(e) => {
                if e.status() >= 500 {
                    tracing::error!("{method} {path} failed: {e}");
                }
                (e.status(), json!({ "error": e.message() }))
            }
        };

        write_json(res, status, &payload);
        METRICS.record_http_response(status);
        Ok(())
    }
}

impl ApiService {
    fn dispatch(
        &self,
        method: &str,
        path: &str,
        query: &str,
        bearer: Option<String>,
        body: &[u8],
    ) -> Result<(u16, Value), ServiceError> {
        let db = self.executor.as_ref();

        let (route, params) = routes::match_route(method, path)
            .ok_or_else(|| ServiceError::NotFound("Not found".into()))?;

        match route.name {
            // Session surface
            "auth_login" => {
                let req = parse_body(body)?;
                Ok((200, session::login(db, &self.issuer, req)?))
            }
            "auth_logout" => {
                self.authenticate(db, bearer)?;
                let req = parse_body(body)?;
                Ok((200, session::logout(db, &self.issuer, req)?))
            }
            "auth_refresh" => {
                let req = parse_body(body)?;
                Ok((200, session::refresh(db, &self.issuer, req)?))
            }
            "auth_me" => {
                let caller = self.authenticate(db, bearer)?;
                Ok((200, session::me(&caller)))
            }
            "auth_profile" => {
                let caller = self.authenticate(db, bearer)?;
                Ok((200, accounts::profile_json(&caller)))
            }
            "auth_profile_update" => {
                let caller = self.authenticate(db, bearer)?;
                let req = parse_body(body)?;
                let updated = accounts::update_profile(db, caller, req)?;
                Ok((200, accounts::profile_json(&updated)))
            }
            "auth_settings" => {
                let caller = self.authenticate(db, bearer)?;
                Ok((200, accounts::settings_json(&caller)))
            }
            "auth_settings_update" => {
                let caller = self.authenticate(db, bearer)?;
                let req = parse_body(body)?;
                let updated = accounts::update_settings(db, caller, req)?;
                Ok((200, accounts::settings_json(&updated)))
            }

            // Open read surface
            "api_stats" => Ok((200, stats::dashboard_stats(db)?)),
            "api_boxes" => Ok((200, stats::boxes_with_warehouse(db)?)),
            "api_items" => {
                let filter = item_filter_from_query(query)?;
                Ok((200, stats::items_overview(db, &filter)?))
            }
            "api_customers" => Ok((200, stats::customers_overview(db)?)),

            // Administrative write surface
            "api_customers_create" => {
                let caller = self.authenticate(db, bearer)?;
                require_admin(&caller)?;
                let req = parse_body(body)?;
                let (created, lockers) = accounts::create_user(&self.executor, req)?;
                Ok((
                    201,
                    json!({
                        "user": accounts::identity_json(&created),
                        "lockers": lockers.iter().map(|l| l.code.clone()).collect::<Vec<_>>(),
                    }),
                ))
            }
            "api_warehouses" => {
                let warehouses = logistics::list_warehouses(db)?;
                Ok((
                    200,
                    Value::Array(warehouses.iter().map(logistics::warehouse_json).collect()),
                ))
            }
            "api_warehouses_create" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let req = parse_body(body)?;
                let wh = logistics::create_warehouse(db, req)?;
                Ok((201, logistics::warehouse_json(&wh)))
            }
            "api_items_create" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let req = parse_body(body)?;
                let created = logistics::receive_item(db, req)?;
                Ok((201, logistics::item_json(&created)))
            }
            "api_item_status" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let id = path_uuid(&params, "id")?;
                let req = parse_body(body)?;
                let updated = logistics::set_item_status(db, id, req, Some(caller.id))?;
                Ok((200, logistics::item_json(&updated)))
            }
            "api_boxes_create" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let req = parse_body(body)?;
                let created = logistics::create_box(db, req)?;
                Ok((201, logistics::box_json(&created, None)))
            }
            "api_box_status" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let id = path_uuid(&params, "id")?;
                let req = parse_body(body)?;
                let updated = logistics::set_box_status(db, id, req, Some(caller.id))?;
                Ok((200, logistics::box_json(&updated, None)))
            }
            "api_box_items" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let id = path_uuid(&params, "id")?;
                let req = parse_body(body)?;
                let linked = logistics::add_item_to_box(&self.executor, id, req, Some(caller.id))?;
                Ok((201, linked))
            }
            "api_box_items_list" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let id = path_uuid(&params, "id")?;
                Ok((200, logistics::list_box_contents(db, id)?))
            }
            "api_orders" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let orders = logistics::list_orders(db)?;
                Ok((
                    200,
                    Value::Array(orders.iter().map(logistics::order_json).collect()),
                ))
            }
            "api_order_status" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let id = path_uuid(&params, "id")?;
                let req = parse_body(body)?;
                let updated = logistics::set_order_status(db, id, req)?;
                Ok((200, logistics::order_json(&updated)))
            }
            "api_label_lookup" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let barcode = params
                    .iter()
                    .find(|(k, _)| *k == "barcode")
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| ServiceError::Validation("missing barcode".into()))?;
                Ok((200, logistics::find_label(db, &barcode)?))
            }
            "api_orders_create" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let req = parse_body(body)?;
                let (created, label) = logistics::create_order(db, req)?;
                let mut payload = logistics::order_json(&created);
                payload["barcode_number"] = json!(label.barcode_number);
                Ok((201, payload))
            }
            "api_requests" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let requests = logistics::list_requests(db)?;
                Ok((
                    200,
                    Value::Array(requests.iter().map(logistics::request_json).collect()),
                ))
            }
            "api_requests_create" => {
                self.authenticate(db, bearer)?;
                let req = parse_body(body)?;
                let created = logistics::create_request(db, req)?;
                Ok((201, logistics::request_json(&created)))
            }
            "api_request_status" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let id = path_uuid(&params, "id")?;
                let req = parse_body(body)?;
                let updated = logistics::set_request_status(db, id, req)?;
                Ok((200, logistics::request_json(&updated)))
            }
            "api_domestic_orders" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let customer_id = query_param(query, "customer")
                    .ok_or_else(|| ServiceError::Validation("customer is required".into()))?;
                let customer_id = parse_uuid(&customer_id)?;
                Ok((200, logistics::list_domestic_orders(db, customer_id)?))
            }
            "api_domestic_orders_create" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let req = parse_body(body)?;
                let created = logistics::create_domestic_order(db, req)?;
                Ok((201, logistics::domestic_order_json(&created)))
            }
            "api_lockers" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let customer_id = match query_param(query, "customer") {
                    Some(raw) => Some(parse_uuid(&raw)?),
                    None => None,
                };
                Ok((200, logistics::list_lockers(db, customer_id)?))
            }
            "api_status_logs" => {
                let caller = self.authenticate(db, bearer)?;
                require_staff(&caller)?;
                let entity_type = query_param(query, "entity_type")
                    .ok_or_else(|| ServiceError::Validation("entity_type is required".into()))?;
                let entity_type = EntityKind::from_str(&entity_type)
                    .map_err(|e| ServiceError::Validation(e.to_string()))?;
                let entity_id = query_param(query, "entity_id")
                    .ok_or_else(|| ServiceError::Validation("entity_id is required".into()))?;
                let entity_id = parse_uuid(&entity_id)?;
                Ok((200, logistics::list_status_logs(db, entity_type, entity_id)?))
            }

            other => Err(ServiceError::Internal(format!("unrouted handler {other}"))),
        }
    }

    /// Resolve the bearer token to an account.
    fn authenticate(
        &self,
        db: &dyn crate::db::DbExecutor,
        bearer: Option<String>,
    ) -> Result<User, ServiceError> {
        let token = bearer.ok_or_else(|| {
            ServiceError::Unauthorized("Authentication credentials were not provided".into())
        })?;
        let claims = self
            .issuer
            .verify(&token, TokenKind::Access)
            .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".into()))?;
        user::find_by_id(db, claims.sub)?
            .filter(|u| u.is_active)
            .ok_or_else(|| ServiceError::Unauthorized("Invalid or expired token".into()))
    }
}

fn require_staff(caller: &User) -> Result<(), ServiceError> {
    if caller.is_employee() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You do not have permission to perform this action".into(),
        ))
    }
}

fn require_admin(caller: &User) -> Result<(), ServiceError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "You do not have permission to perform this action".into(),
        ))
    }
}

/// Extract the bearer token from the Authorization header, if present.
fn bearer_token(req: &Request) -> Option<String> {
    for header in req.headers() {
        if header.name.eq_ignore_ascii_case("authorization") {
            let value = std::str::from_utf8(header.value).ok()?;
            return value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
                .map(str::to_string);
        }
    }
    None
}

/// Parse a JSON request body. An empty body reads as an empty object so
/// partial-update endpoints accept it.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    let effective = if body.is_empty() { b"{}".as_slice() } else { body };
    serde_json::from_slice(effective)
        .map_err(|e| ServiceError::Validation(format!("Invalid JSON body: {e}")))
}

fn parse_uuid(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::Validation(format!("invalid id: {raw}")))
}

fn path_uuid(params: &routes::PathParams, name: &str) -> Result<Uuid, ServiceError> {
    let raw = params
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| ServiceError::Validation(format!("missing path parameter {name}")))?;
    parse_uuid(raw)
}

/// Minimal query-string lookup. Values are enum tokens and UUIDs, so no
/// percent-decoding is applied.
fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key && !v.is_empty()).then(|| v.to_string())
    })
}

fn item_filter_from_query(query: &str) -> Result<ItemFilter, ServiceError> {
    let status = match query_param(query, "status") {
        Some(raw) => Some(
            ItemStatus::from_str(&raw).map_err(|e| ServiceError::Validation(e.to_string()))?,
        ),
        None => None,
    };
    Ok(ItemFilter {
        status,
        category: query_param(query, "category"),
    })
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Internal Server Error",
    }
}

fn write_json(res: &mut Response, status: u16, payload: &Value) {
    res.status_code(status as usize, reason_phrase(status));
    res.header("Content-Type: application/json");
    let body = serde_json::to_vec(payload).unwrap_or_else(|_| b"{}".to_vec());
    res.body_mut().extend_from_slice(&body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_lookup() {
        assert_eq!(
            query_param("status=in_transit&category=books", "status").as_deref(),
            Some("in_transit")
        );
        assert_eq!(
            query_param("status=in_transit&category=books", "category").as_deref(),
            Some("books")
        );
        assert_eq!(query_param("status=", "status"), None);
        assert_eq!(query_param("", "status"), None);
    }

    #[test]
    fn test_item_filter_from_query() {
        let filter = item_filter_from_query("status=delivered").unwrap();
        assert_eq!(filter.status, Some(ItemStatus::Delivered));
        assert!(filter.category.is_none());

        assert!(item_filter_from_query("status=bogus").is_err());

        let empty = item_filter_from_query("").unwrap();
        assert!(empty.status.is_none());
    }

    #[test]
    fn test_parse_body_defaults_empty_to_object() {
        #[derive(serde::Deserialize)]
        struct Empty {}
        assert!(parse_body::<Empty>(b"").is_ok());
        assert!(parse_body::<Empty>(b"{}").is_ok());
        assert!(parse_body::<Empty>(b"not json").is_err());
    }

    #[test]
    fn test_parse_uuid_rejects_garbage() {
        assert!(parse_uuid("0bd81318-3bb5-4dcf-9db4-8bd11ae9b371").is_ok());
        assert!(parse_uuid("42").is_err());
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(403), "Forbidden");
        assert_eq!(reason_phrase(500), "Internal Server Error");
        assert_eq!(reason_phrase(503), "Internal Server Error");
    }
}

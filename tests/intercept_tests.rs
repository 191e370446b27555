//! Tests for the handler adapter
//!
//! # Test Coverage
//!
//! - Context-only and parameterized handler shapes
//! - Path/query coercion failures mapped to `400 invalid params`
//! - Success status declarations (`success = "201"`) and their validation
//! - Response translation: JSON, text, absent values, absent sequences
//! - Response-only handlers
//! - Body decoding and validation failures, with and without the `validate` flag
//! - Handler error kinds mapped to 400/500
//! - Idempotence of a registered endpoint

use brrtbind::dispatcher::{DispatchContext, RequestParts, ResponseBody};
use brrtbind::{
    intercept, try_intercept, BindParams, ErrorKind, HandlerError, Intercepted, Json,
    RegistrationError, Validate,
};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

mod common;
use common::{MockContext, Written};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Default, BindParams)]
struct GetUser {
    #[bind(path = "id")]
    id: u64,
}

fn find_user(id: u64) -> Option<User> {
    (id == 42).then(|| User {
        id: 42,
        name: "a".to_string(),
    })
}

fn get_user(_ctx: &MockContext, p: GetUser) -> Result<Option<Json<User>>, HandlerError> {
    Ok(find_user(p.id).map(Json))
}

fn run(endpoint: &Intercepted<MockContext>, mut ctx: MockContext) -> MockContext {
    endpoint.handle(&mut ctx);
    ctx
}

#[test]
fn test_get_user_found() {
    let endpoint: Intercepted<MockContext> = intercept(get_user);
    let ctx = run(&endpoint, MockContext::new().path("id", "42"));
    assert_eq!(
        ctx.response(),
        &Written::Json(StatusCode::OK, json!({"ID": 42, "Name": "a"}))
    );
    assert_eq!(ctx.response().body(), r#"{"ID":42,"Name":"a"}"#);
    assert!(!ctx.aborted);

    let decoded: User = serde_json::from_str(&ctx.response().body()).unwrap();
    assert_eq!(decoded.name, "a");
}

static GUARDED_CALLS: AtomicUsize = AtomicUsize::new(0);

fn get_user_guarded(_ctx: &MockContext, p: GetUser) -> Result<Option<Json<User>>, HandlerError> {
    GUARDED_CALLS.fetch_add(1, Ordering::SeqCst);
    Ok(find_user(p.id).map(Json))
}

#[test]
fn test_get_user_bad_id_never_reaches_data_layer() {
    let endpoint: Intercepted<MockContext> = intercept(get_user_guarded);
    for bad in ["abc", "-1", "4 2", ""] {
        let ctx = run(&endpoint, MockContext::new().path("id", bad));
        assert_eq!(
            ctx.response(),
            &Written::Text(StatusCode::BAD_REQUEST, "invalid params".to_string()),
            "id={bad:?}"
        );
        assert!(ctx.aborted);
    }
    assert_eq!(GUARDED_CALLS.load(Ordering::SeqCst), 0);
}

#[test]
fn test_absent_optional_is_status_only() {
    let endpoint: Intercepted<MockContext> = intercept(get_user);
    let ctx = run(&endpoint, MockContext::new().path("id", "7"));
    assert_eq!(ctx.response(), &Written::Status(StatusCode::OK));
    assert_eq!(ctx.response().body(), "");
}

#[test]
fn test_missing_path_segment_is_invalid_params() {
    let endpoint: Intercepted<MockContext> = intercept(get_user);
    let ctx = run(&endpoint, MockContext::new());
    assert_eq!(ctx.response().status(), 400);
    assert_eq!(ctx.response().body(), "invalid params");
}

#[derive(Debug, Default, BindParams)]
#[bind(success = "201")]
struct CreateThing {
    #[bind(query = "name")]
    name: String,
}

fn create_thing(_ctx: &MockContext, p: CreateThing) -> Result<(), HandlerError> {
    assert_eq!(p.name, "widget");
    Ok(())
}

#[test]
fn test_success_code_with_empty_body() {
    let endpoint: Intercepted<MockContext> = intercept(create_thing);
    assert_eq!(endpoint.info().success, StatusCode::CREATED);
    let ctx = run(&endpoint, MockContext::new().query("name", "widget"));
    assert_eq!(ctx.response(), &Written::Status(StatusCode::CREATED));
}

#[derive(Debug, Default, BindParams)]
struct Malformed {
    #[bind(success = "abc")]
    _marker: (),
}

fn malformed(_ctx: &MockContext, _p: Malformed) -> Result<(), HandlerError> {
    Ok(())
}

#[test]
fn test_malformed_success_fails_registration() {
    let err = try_intercept::<MockContext, _, _>(malformed).unwrap_err();
    match &err {
        RegistrationError::InvalidSuccessCode { code, handler } => {
            assert_eq!(code, "abc");
            assert!(handler.contains("malformed"), "handler: {handler}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("abc"));
}

#[test]
#[should_panic(expected = "invalid http error code: abc")]
fn test_malformed_success_panics_on_intercept() {
    let _endpoint: Intercepted<MockContext> = intercept(malformed);
}

#[derive(Debug, Default, BindParams)]
#[bind(success = 204)]
struct Twice {
    #[bind(success = "201")]
    _marker: (),
}

#[test]
fn test_duplicate_success_fails_registration() {
    let result = try_intercept::<MockContext, _, _>(|_ctx: &MockContext, _p: Twice| {
        Ok::<(), HandlerError>(())
    });
    assert!(matches!(
        result,
        Err(RegistrationError::DuplicateSuccessCode { .. })
    ));
}

#[test]
fn test_context_only_shapes() {
    let error_only: Intercepted<MockContext> =
        intercept(|_ctx: &MockContext| Ok::<(), HandlerError>(()));
    let with_value: Intercepted<MockContext> =
        intercept(|_ctx: &MockContext| Ok::<_, HandlerError>("pong"));
    let no_returns: Intercepted<MockContext> = intercept(|_ctx: &MockContext| {});

    assert_eq!(error_only.info().input_arity, 1);
    assert_eq!(error_only.info().output_arity, 1);
    assert_eq!(with_value.info().output_arity, 2);
    assert_eq!(error_only.info().params, None);
    assert_eq!(no_returns.info().output_arity, 0);

    assert_eq!(
        run(&error_only, MockContext::new()).response(),
        &Written::Status(StatusCode::OK)
    );
    assert_eq!(
        run(&with_value, MockContext::new()).response(),
        &Written::Text(StatusCode::OK, "pong".to_string())
    );
    assert_eq!(
        run(&no_returns, MockContext::new()).response(),
        &Written::Status(StatusCode::OK)
    );
}

fn user_names(_ctx: &MockContext) -> Vec<String> {
    vec!["a".to_string()]
}

fn user_by_id(_ctx: &MockContext, p: GetUser) -> Option<Json<User>> {
    find_user(p.id).map(Json)
}

#[test]
fn test_response_only_shapes() {
    let names: Intercepted<MockContext> = intercept(user_names);
    let by_id: Intercepted<MockContext> = intercept(user_by_id);
    assert_eq!(names.info().input_arity, 1);
    assert_eq!(names.info().output_arity, 1);
    assert_eq!(by_id.info().input_arity, 2);
    assert_eq!(by_id.info().output_arity, 1);

    assert_eq!(
        run(&names, MockContext::new()).response(),
        &Written::Json(StatusCode::OK, json!(["a"]))
    );
    assert_eq!(
        run(&by_id, MockContext::new().path("id", "42")).response(),
        &Written::Json(StatusCode::OK, json!({"ID": 42, "Name": "a"}))
    );
    assert_eq!(
        run(&by_id, MockContext::new().path("id", "7")).response(),
        &Written::Status(StatusCode::OK)
    );

    let ctx = run(&by_id, MockContext::new().path("id", "x"));
    assert_eq!(
        ctx.response(),
        &Written::Text(StatusCode::BAD_REQUEST, "invalid params".to_string())
    );
}

#[derive(Debug, Default, BindParams)]
struct ListTags {
    #[bind(query = "empty")]
    empty: Option<bool>,
}

fn list_tags(_ctx: &MockContext, p: ListTags) -> Result<Option<Vec<String>>, HandlerError> {
    if p.empty == Some(true) {
        return Ok(None);
    }
    Ok(Some(vec!["a".to_string(), "b".to_string()]))
}

#[test]
fn test_absent_sequence_is_empty_array() {
    let endpoint: Intercepted<MockContext> = intercept(list_tags);
    let ctx = run(&endpoint, MockContext::new().query("empty", "true"));
    assert_eq!(ctx.response().body(), "[]");

    let ctx = run(&endpoint, MockContext::new());
    assert_eq!(ctx.response(), &Written::Json(StatusCode::OK, json!(["a", "b"])));
}

#[test]
fn test_same_input_same_response() {
    let endpoint: Intercepted<MockContext> = intercept(list_tags);
    let first = run(&endpoint, MockContext::new().query("empty", "false"));
    let second = run(&endpoint.clone(), MockContext::new().query("empty", "false"));
    assert_eq!(first.response(), second.response());
    assert_eq!(first.response().body(), second.response().body());
}

#[derive(Debug, Default, Deserialize)]
struct NewPost {
    title: String,
}

impl Validate for NewPost {
    fn validate(&self) -> Result<(), HandlerError> {
        if self.title.trim().is_empty() {
            return Err(HandlerError::bad_request("title is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, BindParams)]
#[bind(success = "201")]
struct CreatePost {
    #[bind(path = "user_id")]
    user_id: u64,
    #[bind(body, validate)]
    post: NewPost,
}

static POSTS_CREATED: AtomicUsize = AtomicUsize::new(0);

fn create_post(_ctx: &MockContext, p: CreatePost) -> Result<Json<serde_json::Value>, HandlerError> {
    POSTS_CREATED.fetch_add(1, Ordering::SeqCst);
    Ok(Json(json!({"user": p.user_id, "title": p.post.title})))
}

#[test]
fn test_body_bound_and_validated() {
    let endpoint: Intercepted<MockContext> = intercept(create_post);
    let ctx = run(
        &endpoint,
        MockContext::new()
            .path("user_id", "9")
            .json_body(json!({"title": "hello"})),
    );
    assert_eq!(
        ctx.response(),
        &Written::Json(StatusCode::CREATED, json!({"user": 9, "title": "hello"}))
    );
}

#[test]
fn test_validation_failure_stops_before_handler() {
    let endpoint: Intercepted<MockContext> = intercept(create_post);
    let before = POSTS_CREATED.load(Ordering::SeqCst);
    let ctx = run(
        &endpoint,
        MockContext::new()
            .path("user_id", "9")
            .json_body(json!({"title": "  "})),
    );
    assert_eq!(
        ctx.response(),
        &Written::Text(StatusCode::BAD_REQUEST, "title is required".to_string())
    );
    assert!(ctx.aborted);
    assert_eq!(POSTS_CREATED.load(Ordering::SeqCst), before);
}

#[derive(Debug, Default, BindParams)]
struct DraftPost {
    #[bind(request = "json")]
    post: NewPost,
}

static DRAFTS_SAVED: AtomicUsize = AtomicUsize::new(0);

fn save_draft(_ctx: &MockContext, p: DraftPost) -> Result<String, HandlerError> {
    DRAFTS_SAVED.fetch_add(1, Ordering::SeqCst);
    Ok(format!("handler ran with title={:?}", p.post.title))
}

#[test]
fn test_validate_impl_runs_without_flag() {
    let endpoint: Intercepted<MockContext> = intercept(save_draft);
    let ctx = run(&endpoint, MockContext::new().json_body(json!({"title": ""})));
    assert_eq!(
        ctx.response(),
        &Written::Text(StatusCode::BAD_REQUEST, "title is required".to_string())
    );
    assert!(ctx.aborted);
    assert_eq!(DRAFTS_SAVED.load(Ordering::SeqCst), 0);
}

#[derive(Debug, Default, Deserialize)]
struct Note {
    text: String,
}

#[derive(Debug, Default, BindParams)]
struct SaveNote {
    #[bind(body)]
    note: Note,
}

#[test]
fn test_body_without_validate_impl_is_not_checked() {
    let endpoint: Intercepted<MockContext> =
        intercept(|_ctx: &MockContext, p: SaveNote| Ok::<_, HandlerError>(p.note.text));
    let ctx = run(&endpoint, MockContext::new().json_body(json!({"text": ""})));
    assert_eq!(ctx.response(), &Written::Text(StatusCode::OK, String::new()));
}

#[test]
fn test_malformed_body_is_400_with_decoder_message() {
    let endpoint: Intercepted<MockContext> = intercept(create_post);
    let ctx = run(
        &endpoint,
        MockContext::new().path("user_id", "9").raw_body(b"{not json"),
    );
    let response = ctx.response();
    assert_eq!(response.status(), 400);
    assert!(response.body().contains("key must be a string"), "{response:?}");

    let ctx = run(&endpoint, MockContext::new().path("user_id", "9"));
    assert_eq!(ctx.response().status(), 400);
    assert!(ctx.response().body().contains("EOF"));
}

#[derive(Debug, Default, BindParams)]
struct Lookup {
    #[bind(query = "mode")]
    mode: String,
}

fn failing(_ctx: &MockContext, p: Lookup) -> Result<String, HandlerError> {
    match p.mode.as_str() {
        "params" => Err(HandlerError::invalid_params()),
        "anyhow" => Err(anyhow::anyhow!("database unavailable").into()),
        "internal" => Err(HandlerError::internal("boom")),
        _ => Ok(format!("mode={}", p.mode)),
    }
}

#[test]
fn test_handler_error_kinds() {
    let endpoint: Intercepted<MockContext> = intercept(failing);

    let ctx = run(&endpoint, MockContext::new().query("mode", "params"));
    assert_eq!(
        ctx.response(),
        &Written::Text(StatusCode::BAD_REQUEST, "invalid params".to_string())
    );

    let ctx = run(&endpoint, MockContext::new().query("mode", "anyhow"));
    assert_eq!(
        ctx.response(),
        &Written::Text(
            StatusCode::INTERNAL_SERVER_ERROR,
            "database unavailable".to_string()
        )
    );
    assert!(ctx.aborted);

    let ctx = run(&endpoint, MockContext::new().query("mode", "internal"));
    assert_eq!(ctx.response().status(), 500);

    let ctx = run(&endpoint, MockContext::new().query("mode", "ok"));
    assert_eq!(
        ctx.response(),
        &Written::Text(StatusCode::OK, "mode=ok".to_string())
    );
}

#[test]
fn test_anyhow_keeps_wrapped_kind() {
    let err: HandlerError = anyhow::Error::new(HandlerError::invalid_params()).into();
    assert_eq!(err.kind(), ErrorKind::InvalidParameters);
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_handler_info() {
    let endpoint: Intercepted<MockContext> = intercept(create_post);
    let info = endpoint.info();
    assert!(info.name.ends_with("create_post"), "{}", info.name);
    assert!(info.params.is_some_and(|p| p.ends_with("CreatePost")));
    assert_eq!(info.input_arity, 2);
    assert_eq!(info.output_arity, 2);
    assert_eq!(info.bindings.len(), 2);
    assert_eq!(info.bindings[0].to_string(), "path=user_id");
    assert_eq!(info.bindings[1].to_string(), "body=json");
}

#[test]
fn test_dispatch_context_host() {
    fn whoami(ctx: &DispatchContext, p: GetUser) -> Result<String, HandlerError> {
        Ok(format!("{} {}", ctx.method(), p.id))
    }

    let endpoint: Intercepted<DispatchContext> = intercept(whoami);
    let handle = endpoint.into_fn();
    let mut ctx =
        DispatchContext::from_parts(RequestParts::new(Method::GET, "/users/5").with_path_param("id", "5"));
    handle(&mut ctx);
    let response = ctx.into_response();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, ResponseBody::Text("GET 5".to_string()));
}

//! Tests for the request dispatcher and the error protocol
//!
//! # Test Coverage
//!
//! - URL, scalar, list and form-object argument binding end to end
//! - Action selection through `_action_`
//! - Context path handling and `contextBaseUrl`
//! - NotFound, BadRequest and Internal failures, each redirected exactly once
//! - Handler errors and panics recovered as Internal
//! - Committed responses absorbing failures
//! - Dispatch without an error controller, or with one that serves no GET
//! - Panicking controller factories and non-finite numbers
//! - First-match route ordering

mod common;

use common::{error_controller, full_app, test_controller, TestBean};
use serde_json::json;
use webframe::coerce::ParamType;
use webframe::descriptor::{ArgumentSpec, ControllerDef, HandlerDef};
use webframe::dispatcher::{Arguments, ErrorReport, ERROR_TYPE_KEY, EXCEPTION_KEY};
use webframe::services::ServiceRegistry;
use webframe::{
    AppConfig, DefinitionError, DispatchError, DispatchOutcome, ErrorKind, RequestContext,
    WebApp, WebRequest, WebResponse,
};

fn dispatch(app: &WebApp, mut req: WebRequest) -> (WebRequest, WebResponse, DispatchOutcome) {
    let mut res = WebResponse::new();
    let outcome = app.dispatch(&mut req, &mut res).unwrap();
    (req, res, outcome)
}

/// Follow an error redirect with the same session and return the rendered report.
fn follow_error_redirect(app: &WebApp, req: &WebRequest, res: &WebResponse) -> serde_json::Value {
    let location = res.redirect_location().unwrap();
    let follow = WebRequest::get(location).with_session(req.session().clone());
    let (follow, follow_res, outcome) = dispatch(app, follow);
    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(follow_res.forwarded_to(), Some("error.jsp"));
    follow.attribute("error").cloned().unwrap()
}

#[test]
fn test_binds_url_object_and_list_arguments() {
    let app = full_app();
    let req = WebRequest::get(
        "/test/hello%20world/42?testBean.strValue=hello&testBean.intValue=33\
         &testBean.floatValue=3.14&testBean.doubleValue=153.14433\
         &testBean.listInt=1&testBean.listInt=2&numbers=5&numbers=6",
    );
    let (req, res, outcome) = dispatch(&app, req);

    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(res.forwarded_to(), Some("/WEB-INF/jsp/test.jsp"));
    assert_eq!(req.attribute("param1"), Some(&json!("hello world")));
    assert_eq!(req.attribute("param2"), Some(&json!(42)));
    assert_eq!(req.attribute("numbers"), Some(&json!([5, 6])));

    let bean: TestBean = serde_json::from_value(req.attribute("testBean").cloned().unwrap()).unwrap();
    assert_eq!(bean.str_value.as_deref(), Some("hello"));
    assert_eq!(bean.int_value, Some(33));
    assert_eq!(bean.float_value, Some(3.14f32));
    assert_eq!(bean.double_value, Some(153.14433));
    assert_eq!(bean.list_int, vec![1, 2]);
    assert!(bean.more_beans.is_empty());
}

#[test]
fn test_absent_optional_arguments() {
    let app = full_app();
    let (req, _res, outcome) = dispatch(&app, WebRequest::get("/test/only/7"));

    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(req.attribute("numbers"), Some(&json!([])));
    let bean: TestBean = serde_json::from_value(req.attribute("testBean").cloned().unwrap()).unwrap();
    assert_eq!(bean, TestBean::default());
}

#[test]
fn test_unconvertible_object_field_binds_absent() {
    let app = full_app();
    let (req, _res, outcome) =
        dispatch(&app, WebRequest::get("/test/a/1?testBean.intValue=lots"));
    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(req.attribute("testBean"), Some(&json!(null)));
}

#[test]
fn test_context_path_and_base_url() {
    let app = full_app();
    let req = WebRequest::get("/app/test/x/2")
        .with_context_path("/app")
        .with_server("example.com", 8080);
    let (req, _res, outcome) = dispatch(&app, req);

    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(req.attribute("param1"), Some(&json!("x")));
    assert_eq!(req.attribute("contextBaseUrl"), Some(&json!("//example.com:8080/app/")));
}

#[test]
fn test_configured_context_path() {
    let app = common::catalog().start(&common::full_config().with_context_path("/shop"));
    let (req, res, outcome) = dispatch(&app, WebRequest::post("/shop/test/a/1").with_param("title", "milk"));

    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(req.context_path(), "/shop");
    assert_eq!(req.attribute("title"), Some(&json!("milk")));
    assert_eq!(res.redirect_location(), Some("/shop/todo/"));
    assert_eq!(res.status(), 302);
}

#[test]
fn test_not_found_redirects_once() {
    let app = full_app();
    let (req, res, outcome) = dispatch(&app, WebRequest::get("/nowhere"));

    assert_eq!(
        outcome,
        DispatchOutcome::ErrorRedirect {
            kind: ErrorKind::NotFound,
            location: "/error".to_string(),
        }
    );
    assert_eq!(res.status(), 302);
    assert!(res.is_committed());
    assert_eq!(
        req.session().get::<ErrorKind>(ERROR_TYPE_KEY).as_deref(),
        Some(&ErrorKind::NotFound)
    );
    assert!(!req.session().contains(EXCEPTION_KEY));

    let report = follow_error_redirect(&app, &req, &res);
    assert_eq!(report["httpStatusCode"], json!(404));
    assert_eq!(report["kind"], json!("NotFound"));
    assert_eq!(report["message"], json!("Null"));
}

#[test]
fn test_not_found_clears_an_earlier_fault() {
    let app = full_app();
    let (req, _res, _outcome) = dispatch(&app, WebRequest::get("/test/a/1?_action_=fail"));
    assert!(req.session().contains(EXCEPTION_KEY));

    let again = WebRequest::get("/nowhere").with_session(req.session().clone());
    let (again, res, _outcome) = dispatch(&app, again);
    assert!(!again.session().contains(EXCEPTION_KEY));
    let report = follow_error_redirect(&app, &again, &res);
    assert_eq!(report["kind"], json!("NotFound"));
    assert_eq!(report["message"], json!("Null"));
}

#[test]
fn test_unknown_action_and_method_are_not_found() {
    let app = full_app();
    for req in [
        WebRequest::get("/test/a/1?_action_=missing"),
        WebRequest::new("PUT", "/test/a/1"),
        WebRequest::new("PATCH", "/todo/"),
        WebRequest::new("BREW", "/todo/"),
    ] {
        let (_req, _res, outcome) = dispatch(&app, req);
        assert!(
            matches!(outcome, DispatchOutcome::ErrorRedirect { kind: ErrorKind::NotFound, .. }),
            "unexpected outcome {outcome:?}"
        );
    }
}

#[test]
fn test_missing_required_argument_is_bad_request() {
    let app = full_app();
    let (req, res, outcome) = dispatch(&app, WebRequest::post("/test/a/1"));

    assert!(matches!(
        outcome,
        DispatchOutcome::ErrorRedirect { kind: ErrorKind::BadRequest, .. }
    ));
    // The handler never ran.
    assert!(req.attribute("title").is_none());
    assert!(res.forwarded_to().is_none());

    let report = follow_error_redirect(&app, &req, &res);
    assert_eq!(report["httpStatusCode"], json!(400));
    assert_eq!(report["message"], json!("Required HTTP Request Parameter [title]"));
}

#[test]
fn test_malformed_url_argument_is_internal() {
    let app = full_app();
    let (_req, _res, outcome) = dispatch(&app, WebRequest::get("/test/a/not-a-number"));
    assert!(matches!(
        outcome,
        DispatchOutcome::ErrorRedirect { kind: ErrorKind::InternalServerError, .. }
    ));
}

#[test]
fn test_handler_error_is_internal_with_causes() {
    let app = full_app();
    let (req, res, outcome) = dispatch(&app, WebRequest::get("/test/a/1?_action_=fail"));
    assert!(matches!(
        outcome,
        DispatchOutcome::ErrorRedirect { kind: ErrorKind::InternalServerError, .. }
    ));

    let report = follow_error_redirect(&app, &req, &res);
    assert_eq!(report["httpStatusCode"], json!(500));
    assert!(report["message"]
        .as_str()
        .unwrap()
        .starts_with("handler [fail] failed"));
    let causes = report["causes"].as_array().unwrap();
    assert_eq!(causes.last(), Some(&json!("database unavailable")));
}

#[test]
fn test_handler_panic_is_internal() {
    let app = full_app();
    let (req, _res, outcome) = dispatch(&app, WebRequest::get("/test/a/1?_action_=explode"));
    assert!(matches!(
        outcome,
        DispatchOutcome::ErrorRedirect { kind: ErrorKind::InternalServerError, .. }
    ));

    let report = ErrorReport::from_session(req.session()).unwrap();
    assert!(report.message.contains("kaboom"));
}

#[test]
fn test_controller_factory_panic_is_internal() {
    struct Fragile;
    impl Fragile {
        fn show(&mut self, _ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
            Ok(())
        }
    }

    let mut app = WebApp::new(ServiceRegistry::empty());
    app.register_controller(
        &ControllerDef::new("Fragile", "/fragile", || -> Fragile { panic!("constructor failed") })
            .handler(HandlerDef::get("show", Fragile::show)),
    )
    .unwrap();
    app.register_error_controller(&error_controller()).unwrap();

    let (req, res, outcome) = dispatch(&app, WebRequest::get("/fragile"));
    assert_eq!(
        outcome,
        DispatchOutcome::ErrorRedirect {
            kind: ErrorKind::InternalServerError,
            location: "/error".to_string(),
        }
    );
    let report = follow_error_redirect(&app, &req, &res);
    assert_eq!(report["httpStatusCode"], json!(500));
    assert!(report["message"].as_str().unwrap().contains("constructor failed"));
}

#[test]
fn test_non_finite_required_number_is_rejected() {
    #[derive(Default)]
    struct Gauge;
    impl Gauge {
        fn record(&mut self, ctx: &mut RequestContext<'_>, args: &Arguments) -> anyhow::Result<()> {
            let reading: f64 = args.get(0)?;
            ctx.set_model("reading", reading)
        }
    }

    let mut app = WebApp::new(ServiceRegistry::empty());
    app.register_controller(
        &ControllerDef::new("Gauge", "/gauge", Gauge::default).handler(
            HandlerDef::get("record", Gauge::record)
                .arg(ArgumentSpec::request("x", ParamType::DOUBLE).required()),
        ),
    )
    .unwrap();
    app.register_error_controller(&error_controller()).unwrap();

    for raw in ["NaN", "inf", "-inf"] {
        let (req, _res, outcome) =
            dispatch(&app, WebRequest::get("/gauge").with_param("x", raw));
        assert!(matches!(
            outcome,
            DispatchOutcome::ErrorRedirect { kind: ErrorKind::InternalServerError, .. }
        ));
        assert!(req.attribute("reading").is_none());
    }

    let (req, _res, outcome) = dispatch(&app, WebRequest::get("/gauge").with_param("x", "2.5"));
    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(req.attribute("reading"), Some(&json!(2.5)));
}

#[test]
fn test_committed_response_absorbs_failure() {
    let app = full_app();
    let (req, res, outcome) = dispatch(&app, WebRequest::get("/test/a/1?_action_=partial"));

    assert_eq!(
        outcome,
        DispatchOutcome::Absorbed {
            kind: ErrorKind::InternalServerError
        }
    );
    assert_eq!(res.body(), "half a page");
    assert!(res.redirect_location().is_none());
    assert!(!req.session().contains(ERROR_TYPE_KEY));
}

#[test]
fn test_without_error_controller_failure_returns_to_transport() {
    let app = common::catalog().start(&AppConfig::default().with_controllers(&["TestController"]));
    let mut req = WebRequest::get("/nowhere");
    let mut res = WebResponse::new();

    let err = app.dispatch(&mut req, &mut res).unwrap_err();
    assert!(matches!(err, DispatchError::NotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(res.redirect_location().is_none());
    assert!(!res.is_committed());
}

#[test]
fn test_error_controller_without_get_is_still_redirected_to() {
    #[derive(Default)]
    struct PostOnly;
    impl PostOnly {
        fn submit(&mut self, _ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
            Ok(())
        }
    }

    let mut app = WebApp::new(ServiceRegistry::empty());
    app.register_error_controller(
        &ControllerDef::new("PostOnly", "/oops", PostOnly::default)
            .handler(HandlerDef::post("submit", PostOnly::submit)),
    )
    .unwrap();

    let (req, res, outcome) = dispatch(&app, WebRequest::get("/missing"));
    assert_eq!(
        outcome,
        DispatchOutcome::ErrorRedirect {
            kind: ErrorKind::NotFound,
            location: "/oops".to_string(),
        }
    );
    assert_eq!(res.redirect_location(), Some("/oops"));
    assert_eq!(
        req.session().get::<ErrorKind>(ERROR_TYPE_KEY).as_deref(),
        Some(&ErrorKind::NotFound)
    );
}

#[test]
fn test_first_registered_route_wins() {
    #[derive(Default)]
    struct Marker;
    impl Marker {
        fn mark(&mut self, ctx: &mut RequestContext<'_>, args: &Arguments) -> anyhow::Result<()> {
            let which: Option<String> = args.get(0)?;
            ctx.set_model("matched", which.unwrap_or_else(|| "literal".to_string()))
        }
    }

    let mut app = WebApp::new(ServiceRegistry::empty());
    app.register_controller(
        &ControllerDef::new("Wide", "/a/{x}", Marker::default).handler(
            HandlerDef::get("mark", Marker::mark).arg(ArgumentSpec::url("x", ParamType::TEXT)),
        ),
    )
    .unwrap();
    app.register_controller(
        &ControllerDef::new("Narrow", "/a/b", Marker::default)
            .handler(HandlerDef::get("mark", Marker::mark)),
    )
    .unwrap();

    let (req, _res, _outcome) = dispatch(&app, WebRequest::get("/a/b"));
    assert_eq!(req.attribute("matched"), Some(&json!("b")));
}

#[test]
fn test_primitive_parameter_is_rejected_at_registration() {
    #[derive(Default)]
    struct Counter;
    impl Counter {
        fn bump(&mut self, _ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
            Ok(())
        }
    }

    let mut app = WebApp::new(ServiceRegistry::empty());
    let err = app
        .register_controller(
            &ControllerDef::new("Counter", "/count", Counter::default).handler(
                HandlerDef::get("bump", Counter::bump)
                    .arg(ArgumentSpec::request("by", ParamType::Primitive("int"))),
            ),
        )
        .unwrap_err();
    assert!(matches!(err, DefinitionError::PrimitiveParameter { index: 0, .. }));
    assert!(app.routes().is_empty());
    assert!(app.controller("Counter").is_none());
}

#[test]
fn test_error_controller_is_routable() {
    let mut app = WebApp::new(ServiceRegistry::empty());
    app.register_controller(&test_controller()).unwrap();
    app.register_error_controller(&error_controller()).unwrap();

    let (req, _res, outcome) = dispatch(&app, WebRequest::get("/error"));
    assert_eq!(outcome, DispatchOutcome::Handled);
    assert_eq!(req.attribute("error"), Some(&json!(null)));
}

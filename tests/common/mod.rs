//! Shared fixtures for the integration tests: a form bean, a handful of controllers
//! covering every argument shape, two mutually injected services and an error
//! controller that renders the stored [`ErrorReport`].

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use webframe::coerce::ParamType;
use webframe::descriptor::{ArgumentSpec, ControllerDef, HandlerDef};
use webframe::dispatcher::{Arguments, ErrorReport};
use webframe::services::{Inject, Service, ServiceDef};
use webframe::{AppConfig, Application, FormObject, RequestContext, WebApp};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, FormObject)]
#[serde(rename_all = "camelCase")]
pub struct TestBean {
    pub str_value: Option<String>,
    pub int_value: Option<i32>,
    pub float_value: Option<f32>,
    pub double_value: Option<f64>,
    pub list_int: Vec<i32>,
    pub more_beans: Vec<TestBean>,
}

/// Controller exercising URL, scalar, list and object arguments.
#[derive(Default)]
pub struct TestController;

impl TestController {
    pub fn index(&mut self, ctx: &mut RequestContext<'_>, args: &Arguments) -> anyhow::Result<()> {
        let param1: Option<String> = args.get(0)?;
        let param2: Option<i32> = args.get(1)?;
        let bean: Option<TestBean> = args.get(2)?;
        let numbers: Vec<i32> = args.get(3)?;
        ctx.set_model("param1", param1)?;
        ctx.set_model("param2", param2)?;
        ctx.set_model("testBean", bean)?;
        ctx.set_model("numbers", numbers)?;
        ctx.view("test")
    }

    pub fn save(&mut self, ctx: &mut RequestContext<'_>, args: &Arguments) -> anyhow::Result<()> {
        let title: String = args.named("title")?;
        ctx.set_model("title", title)?;
        ctx.redirect_to("TodoController")
    }

    pub fn fail(&mut self, _ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("database unavailable").context("loading page"))
    }

    pub fn explode(&mut self, _ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
        panic!("kaboom");
    }

    pub fn partial(&mut self, ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
        ctx.response_mut().write("half a page");
        ctx.response_mut().flush();
        anyhow::bail!("stream interrupted")
    }
}

pub fn test_controller() -> ControllerDef<TestController> {
    ControllerDef::new("TestController", "/test/{param1}/{param2}", TestController::default)
        .handler(
            HandlerDef::get("index", TestController::index)
                .arg(ArgumentSpec::url("param1", ParamType::TEXT))
                .arg(ArgumentSpec::url("param2", ParamType::INTEGER))
                .arg(ArgumentSpec::request("testBean", ParamType::object::<TestBean>()))
                .arg(ArgumentSpec::request("numbers", ParamType::list_of(ParamType::INTEGER))),
        )
        .handler(
            HandlerDef::post("save", TestController::save)
                .arg(ArgumentSpec::request("title", ParamType::TEXT).required()),
        )
        .handler(HandlerDef::get("fail", TestController::fail).action("fail"))
        .handler(HandlerDef::get("explode", TestController::explode).action("explode"))
        .handler(HandlerDef::get("partial", TestController::partial).action("partial"))
}

#[derive(Default)]
pub struct TodoListService {
    items: Mutex<Vec<String>>,
    pub audit: Inject<AuditService>,
}

impl TodoListService {
    pub fn add(&self, item: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.push(item.to_string());
        }
        if let Some(audit) = self.audit.get() {
            audit.record();
        }
    }

    pub fn items(&self) -> Vec<String> {
        self.items.lock().map(|items| items.clone()).unwrap_or_default()
    }
}

impl Service for TodoListService {}

#[derive(Default)]
pub struct AuditService {
    events: AtomicUsize,
    pub initialized: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub todos: Inject<TodoListService>,
}

impl AuditService {
    pub fn record(&self) {
        self.events.fetch_add(1, Ordering::SeqCst);
    }

    pub fn events(&self) -> usize {
        self.events.load(Ordering::SeqCst)
    }
}

impl Service for AuditService {
    fn initialize(&self) {
        self.initialized.fetch_add(1, Ordering::SeqCst);
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Controller backed by an injected service.
#[derive(Default)]
pub struct TodoController {
    todos: Inject<TodoListService>,
}

impl TodoController {
    pub fn list(&mut self, ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
        let items = self.todos.try_get()?.items();
        ctx.set_model("todos", items)?;
        ctx.view("todo")
    }

    pub fn add(&mut self, ctx: &mut RequestContext<'_>, args: &Arguments) -> anyhow::Result<()> {
        let title: String = args.get(0)?;
        self.todos.try_get()?.add(&title);
        ctx.redirect_to("TodoController")
    }
}

pub fn todo_controller() -> ControllerDef<TodoController> {
    ControllerDef::new("TodoController", "/todo/", TodoController::default)
        .inject(|c| &c.todos)
        .handler(HandlerDef::get("list", TodoController::list))
        .handler(
            HandlerDef::post("add", TodoController::add)
                .arg(ArgumentSpec::request("title", ParamType::TEXT).required()),
        )
}

#[derive(Default)]
pub struct ErrorController;

impl ErrorController {
    pub fn show(&mut self, ctx: &mut RequestContext<'_>, _args: &Arguments) -> anyhow::Result<()> {
        let report = ErrorReport::from_session(ctx.session());
        if let Some(report) = &report {
            ctx.response_mut().set_status(report.http_status_code);
        }
        ctx.set_model("error", report)?;
        ctx.public_view("error")
    }
}

pub fn error_controller() -> ControllerDef<ErrorController> {
    ControllerDef::new("ErrorController", "/error", ErrorController::default)
        .handler(HandlerDef::get("show", ErrorController::show))
}

pub fn catalog() -> Application {
    Application::new()
        .service(ServiceDef::new("TodoListService", TodoListService::default).require(|s| &s.audit))
        .service(ServiceDef::new("AuditService", AuditService::default).require(|s| &s.todos))
        .controller(test_controller())
        .controller(todo_controller())
        .controller(error_controller())
}

pub fn full_config() -> AppConfig {
    AppConfig::default()
        .with_services(&["TodoListService", "AuditService"])
        .with_controllers(&["TestController", "TodoController"])
        .with_error_handler("ErrorController")
}

/// Every fixture controller and service, with the error controller configured.
pub fn full_app() -> WebApp {
    catalog().start(&full_config())
}

pub fn shared_app() -> Arc<WebApp> {
    Arc::new(full_app())
}

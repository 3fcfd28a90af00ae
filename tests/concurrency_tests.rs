//! One shared application serving many request threads at once.

mod common;

use common::{shared_app, AuditService, TodoListService};
use serde_json::json;
use webframe::{DispatchOutcome, ErrorKind, WebRequest, WebResponse};

const THREADS: usize = 8;
const REQUESTS_PER_THREAD: usize = 25;

#[test]
fn test_parallel_dispatch_shares_services() {
    let app = shared_app();

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let app = &app;
            scope.spawn(move || {
                for i in 0..REQUESTS_PER_THREAD {
                    let mut req =
                        WebRequest::post("/todo/").with_param("title", &format!("item-{t}-{i}"));
                    let mut res = WebResponse::new();
                    let outcome = app.dispatch(&mut req, &mut res).unwrap();
                    assert_eq!(outcome, DispatchOutcome::Handled);
                }
            });
        }
    });

    let todos = app.services().get::<TodoListService>().unwrap();
    assert_eq!(todos.items().len(), THREADS * REQUESTS_PER_THREAD);
    let audit = app.services().get::<AuditService>().unwrap();
    assert_eq!(audit.events(), THREADS * REQUESTS_PER_THREAD);
}

#[test]
fn test_parallel_mixed_outcomes_stay_isolated() {
    let app = shared_app();

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let app = &app;
            scope.spawn(move || {
                for i in 0..REQUESTS_PER_THREAD {
                    if i % 2 == 0 {
                        let mut req = WebRequest::get(&format!("/test/t{t}/{i}"));
                        let mut res = WebResponse::new();
                        app.dispatch(&mut req, &mut res).unwrap();
                        assert_eq!(req.attribute("param1"), Some(&json!(format!("t{t}"))));
                        assert_eq!(req.attribute("param2"), Some(&json!(i)));
                    } else {
                        let mut req = WebRequest::get(&format!("/missing/{t}/{i}"));
                        let mut res = WebResponse::new();
                        let outcome = app.dispatch(&mut req, &mut res).unwrap();
                        assert!(matches!(
                            outcome,
                            DispatchOutcome::ErrorRedirect { kind: ErrorKind::NotFound, .. }
                        ));
                    }
                }
            });
        }
    });
}

use actix_web::{
    App,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    test::TestRequest,
    web::Data,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};

use crate::{
    config::Config,
    model::{employee::Employee, project::Project},
    routes,
    tracker::{AttendanceTracker, memory::MemoryStore},
    utils::{employee_cache::EmployeeCache, key_lock::KeyLocks},
};

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "SERVER_ADDR" => Some("127.0.0.1:0".to_string()),
        "DATABASE_URL" => Some("mysql://test@localhost/site_access".to_string()),
        _ => None,
    })
    .expect("test config")
}

/// Store seeded with one active employee, one inactive employee and one project.
pub fn seeded_store() -> MemoryStore {
    MemoryStore::default()
        .with_employee(Employee {
            id: 1,
            national_id: "1032456789".into(),
            full_name: "Juan Perez".into(),
            position: Some("Driller".into()),
            status: "active".into(),
        })
        .with_employee(Employee {
            id: 2,
            national_id: "55".into(),
            full_name: "Ana Gomez".into(),
            position: None,
            status: "inactive".into(),
        })
        .with_project(Project {
            id: 10,
            name: "Frente 3".into(),
            status: "active".into(),
        })
}

pub fn test_app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    test_app_with(Arc::new(seeded_store()))
}

/// App over a caller-held store, for tests that inspect what was written.
pub fn test_app_with(store: Arc<MemoryStore>) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let config = test_config();
    let tracker = AttendanceTracker::new(
        store,
        EmployeeCache::new(100, Duration::from_secs(60)),
        KeyLocks::new(100, Duration::from_secs(60)),
        config.tracker_settings(),
    );

    App::new()
        .app_data(Data::new(tracker))
        .configure(|cfg| routes::configure(cfg, &config))
}

/// Rate limiting keys on the peer address, which test requests lack by default.
pub fn test_request(req: TestRequest) -> TestRequest {
    req.peer_addr(SocketAddr::from(([127, 0, 0, 1], 40000)))
}

//! End-to-end tour: interface registration, blueprints, lifetimes,
//! factories, collections, and child scopes.
//!
//! Run with `RUST_LOG=ambar_container=trace` to watch the container work.

use std::sync::Arc;

use ambar::prelude::*;

trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("[log] {message}");
    }
}

#[derive(Clone)]
struct Config {
    database_url: String,
}

struct Database {
    config: Config,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger
            .log(&format!("{} <- {sql}", self.config.database_url));
        format!("rows for `{sql}`")
    }
}

struct UserService {
    database: Arc<Database>,
}

impl UserService {
    fn user_names(&self) -> String {
        self.database.query("SELECT name FROM users")
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ambar_container=debug".into()),
        )
        .init();

    let container = Container::new();

    // Trait objects register through a coercion closure.
    container.register_handler(None, |_| Ok(Arc::new(ConsoleLogger) as Arc<dyn Logger>));

    container.register_instance(
        None,
        Config {
            database_url: "postgres://localhost/app".into(),
        },
    );

    container.add_blueprint(
        Blueprint::of::<Database>()
            .constructor(|(config, logger): (Dep<Config>, Dep<Arc<dyn Logger>>)| {
                Ok(Database {
                    config: config.required()?,
                    logger: logger.required()?,
                })
            })
            .build(),
    );
    container.register_singleton_as::<Arc<Database>, Database, _>(None, Arc::new);

    container.add_blueprint(
        Blueprint::of::<UserService>()
            .constructor(|(database,): (Dep<Arc<Database>>,)| {
                Ok(UserService {
                    database: database.required()?,
                })
            })
            .build(),
    );
    container.register_per_request::<UserService>(None);

    container.on_activated(|instance| {
        if instance.downcast_ref::<UserService>().is_some() {
            println!("[event] user service activated");
        }
    });

    tracing::info!("container composed");

    let service = container
        .get_instance::<UserService>(None)?
        .ok_or_else(|| AmbarError::construction::<UserService>("service not registered"))?;
    println!("{}", service.user_names());

    // Keyed registrations coexist with the unkeyed one.
    container.register_instance(
        Some("replica"),
        Config {
            database_url: "postgres://replica/app".into(),
        },
    );
    if let Some(replica) = container.get_instance::<Config>(Some("replica"))? {
        println!("replica at {}", replica.database_url);
    }

    // A factory defers creation; every call is an ordinary resolution.
    let services = container.get_factory::<UserService>(None)?;
    let again = services.create()?.map(|s| s.user_names());
    println!("factory-made: {again:?}");

    // Collections gather every producer of a type, in registration order.
    container.register_instance(None, 10u32);
    container.register_instance(None, 20u32);
    println!("limits: {:?}", container.get_collection::<u32>(None)?);

    // Children see pre-fork registrations; their own stay private.
    let request_scope = container.create_child_container();
    request_scope.register_instance(None, String::from("request-id-17"));
    println!(
        "scoped id: {:?}, parent sees: {:?}",
        request_scope.get_instance::<String>(None)?,
        container.get_instance::<String>(None)?,
    );

    Ok(())
}

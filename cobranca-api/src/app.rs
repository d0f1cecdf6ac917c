/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use cobranca_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::security::{security_headers, SecurityHeaders},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use cobranca_shared::auth::{
    jwt::TokenService,
    middleware::{require_auth, AuthGate},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds state, deriving the token service from the configuration
    pub fn new(db: PgPool, config: Config) -> Self {
        let tokens = TokenService::new(&config.jwt.secret, config.token_ttl());

        Self {
            db,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        }
    }

    /// Gate state for protected routes, backed by the same pool
    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::new(self.tokens.clone(), Arc::new(self.db.clone()))
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET    /health                   public
/// ├── GET    /verificar-email          public
/// ├── POST   /usuario                  public (registration)
/// ├── POST   /login                    public
/// ├── GET    /usuario                  authenticated
/// ├── PUT    /usuario                  authenticated
/// ├── POST   /clientes                 authenticated
/// ├── GET    /clientes                 authenticated
/// ├── GET    /clientes/:id             authenticated
/// ├── PUT    /clientes/:id             authenticated
/// ├── POST   /cobrancas                authenticated
/// ├── GET    /cobrancas                authenticated
/// ├── GET    /cobrancas/cliente/:id    authenticated
/// ├── PUT    /cobrancas/:id            authenticated
/// └── DELETE /cobrancas/:id            authenticated
/// ```
///
/// Layers, outermost first: security headers, CORS, tracing.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/verificar-email", get(routes::auth::check_email))
        .route("/usuario", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route(
            "/usuario",
            get(routes::users::profile).put(routes::users::update_profile),
        )
        .route(
            "/clientes",
            post(routes::customers::create_customer).get(routes::customers::list_customers),
        )
        .route(
            "/clientes/:id",
            get(routes::customers::get_customer).put(routes::customers::update_customer),
        )
        .route(
            "/cobrancas",
            post(routes::charges::create_charge).get(routes::charges::list_charges),
        )
        .route(
            "/cobrancas/cliente/:id",
            get(routes::charges::list_customer_charges),
        )
        .route(
            "/cobrancas/:id",
            put(routes::charges::update_charge).delete(routes::charges::delete_charge),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth_gate(),
            require_auth,
        ));

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    let security = SecurityHeaders::new(state.config.api.production);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(middleware::from_fn_with_state(security, security_headers))
        .with_state(state)
}

//! # Client Records Backend
//!
//! A small client-record management backend: a REST API over a single
//! `clients` table, a lazily initialized PostgreSQL connection pool, a SQL
//! migration runner and a password resolver backed by Google Cloud Secret
//! Manager. Built with [Axum](https://crates.io/crates/axum) and
//! [sqlx](https://crates.io/crates/sqlx), with OpenAPI/Swagger documentation
//! via [utoipa](https://crates.io/crates/utoipa).
//!
//! ## Key Features
//!
//! - **Lazy Pool**: The pool is built, probed and cached on first use and
//!   reset only by an explicit close.
//!
//! - **Secret Resolution**: The database password comes from local
//!   configuration or from a named secret, fetched once and cached.
//!
//! - **Migrations**: `*.sql` files are applied in file-name order and
//!   recorded in a `schema_migrations` ledger, so re-runs only apply new
//!   files.
//!
//! - **OpenAPI Documentation**: Swagger UI at `/swagger-ui/`.
//!
//! ## Architecture
//!
//! ```text
//! api / migrate / check_connection
//!   └── db::PoolManager            → lazily built PgPool
//!         └── secrets::SecretResolver → cached secret values
//!               └── secrets::GcpSecretStore → Secret Manager REST API
//! ```
//!
//! ## Module Structure
//!
//! - [`api`]: Router and request handlers.
//! - [`config`]: TOML and environment configuration.
//! - [`db`]: Pool manager, error types and client queries.
//! - [`error`]: API error responses.
//! - [`logging`]: Tracing subscriber setup.
//! - [`migrate`]: Migration ledger and runner.
//! - [`models`]: Response envelopes.
//! - [`secrets`]: Secret resolution and caching.
//! - [`state`]: Shared application state.
//!
//! ## Environment
//!
//! | Variable | Purpose |
//! |---|---|
//! | `DB_HOST` | Hostname, or a socket directory starting with `/` |
//! | `DB_PORT` | TCP port (default 5432) |
//! | `DB_USER`, `DB_NAME` | Required credentials |
//! | `DB_PASSWORD` | Local password |
//! | `DB_PASSWORD_SECRET` | Secret holding the password; overrides `DB_PASSWORD` |
//! | `DB_SSL` | `true` to require TLS |
//! | `GOOGLE_CLOUD_PROJECT` | Project owning the secret |
//! | `MIGRATIONS_DIR` | Migration directory (default `migrations`) |
//! | `HOST`, `PORT` | Listen address (default `0.0.0.0:3000`) |
//!
//! ## Quick Start
//!
//! ```bash
//! # Apply migrations
//! cargo run --bin migrate
//!
//! # Start the server
//! cargo run
//!
//! # Create a client
//! curl -X POST http://localhost:3000/api/clients \
//!   -H "Content-Type: application/json" \
//!   -d '{"full_name": "Ada Lovelace", "email": "ada@example.com"}'
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod secrets;
pub mod state;

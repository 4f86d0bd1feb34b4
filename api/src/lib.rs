// Module layout (Clean Architecture style)
// - bootstrap: env validation, configuration and startup
// - application: ports, auth use cases, email and runtime-script rendering
// - infrastructure: Postgres repositories, SMTP mailer, crypto
// - presentation: HTTP handlers, static bundle and routing

pub mod application;
pub mod bootstrap;
pub mod infrastructure;
pub mod presentation;

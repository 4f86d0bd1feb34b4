pub mod session_repository_sqlx;
pub mod user_repository_sqlx;
pub mod verification_repository_sqlx;

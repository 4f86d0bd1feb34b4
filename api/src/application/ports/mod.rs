pub mod mailer;
pub mod session_repository;
pub mod user_repository;
pub mod verification_repository;

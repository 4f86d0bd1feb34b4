pub mod email_templates;
pub mod runtime_env;

use crate::application::ports::mailer::OutgoingEmail;

pub fn reset_password(to: &str, url: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Reset your password".into(),
        text: format!("Click the link to reset your password: {url}"),
    }
}

pub fn verify_email(to: &str, url: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Verify your email".into(),
        text: format!("Click the link to verify your email: {url}"),
    }
}

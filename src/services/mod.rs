pub mod auth;
pub use auth::{AuthError, AuthService};

pub mod mailer;
pub use mailer::{LogMailer, Mailer};

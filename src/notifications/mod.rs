//! Outbound notifications (system email).

mod email;

pub use email::MailService;

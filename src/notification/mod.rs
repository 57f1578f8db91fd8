//! Dispatching of visitor reports to the transactional notification
//! collaborator.
//!
//! The [`Dispatcher`] guards on credential completeness, renders the
//! record into a template field map, and performs one fire-and-forget
//! send through a [`NotificationClient`] implementation.
//!
//! [`NotificationClient`]: crate::core::NotificationClient

pub mod dispatcher;
pub mod emailjs;

pub use dispatcher::Dispatcher;
pub use emailjs::EmailJsClient;

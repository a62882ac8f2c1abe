//! Session management.
//!
//! Holds the authentication flag and the current page, and gates every page
//! transition. There is exactly one session per process.
//!
//! # Example
//!
//! ```rust
//! use hoh_mis_assistant::session::{Credentials, Page, SessionController};
//!
//! let mut session = SessionController::new();
//! assert!(session.navigate(Page::Chat).is_err());
//!
//! session.sign_in(&Credentials::new("alice", "pw")).unwrap();
//! assert_eq!(session.current_page(), Page::Dashboard);
//! ```

mod controller;

pub use controller::{Credentials, Page, SessionController, SessionSnapshot, Transition};

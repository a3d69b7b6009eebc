//! Service layer.
//!
//! Rules that need more than one repository, or a side effect beyond the
//! database, live here. Handlers that only read go straight to the
//! repositories.

pub mod notification_service;
pub mod session_service;

pub use notification_service::{DispatchReport, LogPushSender, NotificationService, PushOutcome, PushSender};
pub use session_service::{SessionAdminUpdate, SessionDetails, SessionService, StartedSession};

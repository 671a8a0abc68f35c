//! Postgres repositories implementing the library storage seams.

pub mod account;
pub mod dismissal;
pub mod escalation;
pub mod prep;
pub mod schedule;

pub use account::AccountRepository;
pub use dismissal::DismissalRepository;
pub use escalation::EscalationStateRepository;
pub use prep::PrepArtifactRepository;
pub use schedule::ScheduleRepository;

/// Builds a decode error for a malformed stored column.
pub(crate) fn invalid_column(detail: impl Into<String>) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        detail.into(),
    )))
}

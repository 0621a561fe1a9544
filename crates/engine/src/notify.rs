use thiserror::Error;

use rotaplan_core::ids::UserId;

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Fire-and-forget alert sender. Delivery failures must never abort the
/// mutation or command flow that triggered them.
pub trait Notifier {
    fn notify(&self, user: UserId, subject: &str, body: &str) -> Result<(), NotifyError>;
}

pub(crate) fn notify_best_effort(
    notifier: Option<&dyn Notifier>,
    user: UserId,
    subject: &str,
    body: &str,
) {
    if let Some(notifier) = notifier
        && let Err(err) = notifier.notify(user, subject, body)
    {
        tracing::warn!(%user, error = %err, "notification dropped");
    }
}

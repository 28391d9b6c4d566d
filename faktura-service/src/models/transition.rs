//! Status transition guard.
//!
//! Evaluated before any write. Transitions are monotonic and
//! one-directional: an invoice only ever moves Unpaid -> Paid, a quote
//! only ever moves Pending -> Accepted or Pending -> Rejected.

use super::{DocumentKind, DocumentStatus};

/// Outcome of evaluating a requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The transition is legal and should be applied.
    Apply,
    /// The document is already in the requested state. Callers must
    /// treat this as success without re-issuing the derived writes.
    AlreadyApplied,
    /// The transition must not be applied.
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The requested status does not belong to this document kind's
    /// enum at all (400-class).
    InvalidTarget,
    /// The requested status is a legal value but unreachable from the
    /// current state (409-class).
    NotTransitionable,
}

fn belongs_to(kind: DocumentKind, status: DocumentStatus) -> bool {
    match kind {
        DocumentKind::Invoice => {
            matches!(status, DocumentStatus::Unpaid | DocumentStatus::Paid)
        }
        DocumentKind::Quote => matches!(
            status,
            DocumentStatus::Pending | DocumentStatus::Accepted | DocumentStatus::Rejected
        ),
    }
}

/// Decide whether `requested` may be applied to a document of `kind`
/// currently in `current`.
pub fn guard(kind: DocumentKind, current: DocumentStatus, requested: DocumentStatus) -> Decision {
    if !belongs_to(kind, requested) {
        return Decision::Reject(RejectReason::InvalidTarget);
    }

    match (kind, current, requested) {
        (DocumentKind::Invoice, DocumentStatus::Unpaid, DocumentStatus::Paid) => Decision::Apply,
        // Duplicate delivery of a payment event: success, no new writes.
        (DocumentKind::Invoice, DocumentStatus::Paid, DocumentStatus::Paid) => {
            Decision::AlreadyApplied
        }
        (DocumentKind::Quote, DocumentStatus::Pending, DocumentStatus::Accepted)
        | (DocumentKind::Quote, DocumentStatus::Pending, DocumentStatus::Rejected) => {
            Decision::Apply
        }
        _ => Decision::Reject(RejectReason::NotTransitionable),
    }
}

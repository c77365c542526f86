//! Cancellation and deadline context
//!
//! Every public operation of the SDK takes a [`RequestContext`]. Cancelling
//! the context, or letting its deadline pass, makes in-flight cache and
//! network operations return promptly with [`WechatError::Cancelled`] or
//! [`WechatError::Timeout`].

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::WechatError;

/// Caller-supplied cancellation token plus optional deadline.
///
/// Cloning is cheap; clones share the same cancellation state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().timeout(timeout)
    }

    /// A context bound to an existing cancellation token.
    pub fn from_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now, keeping an earlier one if present.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline, keeping an earlier one if present.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// A context cancelled together with this one but which can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error this context currently reports, if it is already done.
    pub fn err(&self) -> Option<WechatError> {
        if self.cancel.is_cancelled() {
            return Some(WechatError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(WechatError::Timeout),
            _ => None,
        }
    }

    /// Drive `fut` to completion unless the context finishes first.
    ///
    /// A context that is already done fails without polling `fut` at all.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<Interrupted>,
    {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled.into());
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Interrupted::DeadlineExceeded.into());
            }
        }

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled.into()),
            _ = expired => Err(Interrupted::DeadlineExceeded.into()),
            result = fut => result,
        }
    }
}

/// Why [`RequestContext::run`] stopped before the wrapped future finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    DeadlineExceeded,
}

impl From<Interrupted> for WechatError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => WechatError::Cancelled,
            Interrupted::DeadlineExceeded => WechatError::Timeout,
        }
    }
}

impl From<Interrupted> for crate::error::CacheError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => crate::error::CacheError::Cancelled,
            Interrupted::DeadlineExceeded => crate::error::CacheError::Timeout,
        }
    }
}

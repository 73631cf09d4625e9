//! Mount-lifetime resolution
//!
//! A mounted guard resolves identity and permissions in a background task
//! and publishes the decision on a watch channel. Unmounting (or dropping the
//! mount) cancels the task; no decision is published afterwards.

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::decision::{AccessDecision, Requirement};
use super::shell::{GuardShell, GuardView};
use crate::context::AccessContext;

pub struct GuardMount {
    decisions: watch::Receiver<AccessDecision>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl GuardMount {
    /// Spawn the resolution task on the current runtime; the initial
    /// decision is `Resolving`
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime. Use [`GuardMount::spawn_on`]
    /// from synchronous shells.
    pub fn spawn(context: AccessContext, requirement: Requirement) -> Self {
        Self::spawn_on(context, requirement, &Handle::current())
    }

    /// Spawn the resolution task on `runtime`
    pub fn spawn_on(context: AccessContext, requirement: Requirement, runtime: &Handle) -> Self {
        let (tx, rx) = watch::channel(AccessDecision::Resolving);
        let token = CancellationToken::new();
        let task_token = token.clone();

        let task = runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    tracing::debug!(requirement = ?requirement, "Guard unmounted before access resolved");
                }
                decision = context.evaluate(&requirement) => {
                    if !task_token.is_cancelled() {
                        let _ = tx.send(decision);
                    }
                }
            }
        });

        Self {
            decisions: rx,
            token,
            task,
        }
    }

    /// Latest published decision
    pub fn decision(&self) -> AccessDecision {
        *self.decisions.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccessDecision> {
        self.decisions.clone()
    }

    /// Wait for a final decision
    ///
    /// Returns the last published decision if the task ended without one.
    pub async fn settled(&mut self) -> AccessDecision {
        let settled = self
            .decisions
            .wait_for(|d| !d.is_loading())
            .await
            .map(|d| *d);
        settled.unwrap_or_else(|_| *self.decisions.borrow())
    }

    /// Render the latest decision through `shell`
    pub fn render<T>(&self, shell: &GuardShell, children: impl FnOnce() -> T) -> GuardView<T> {
        shell.apply(self.decision(), children)
    }

    pub fn is_unmounted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the in-flight resolution
    pub fn unmount(&self) {
        self.token.cancel();
    }
}

impl Drop for GuardMount {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

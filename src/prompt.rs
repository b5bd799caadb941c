//! Single-slot bridge between a modal input surface and the task awaiting it.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub label: String,
    /// Command template the value belongs to, for argument prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Current value shown in the input, if any.
    #[serde(default)]
    pub value: Value,
}

impl PromptRequest {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            context: None,
            value: Value::Null,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult {
    pub label: String,
    pub old_value: Value,
    pub new_value: Value,
}

impl PromptResult {
    pub fn changed(&self) -> bool {
        self.old_value != self.new_value
    }

    /// The submitted value as command text. Strings are used verbatim.
    pub fn text(&self) -> String {
        match &self.new_value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The user closed or dismissed the prompt surface.
    Closed,
    /// A newer prompt replaced this one before it settled.
    Abandoned,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Closed => f.write_str("prompt closed"),
            CancelReason::Abandoned => f.write_str("prompt abandoned"),
        }
    }
}

type Settled = Result<PromptResult, CancelReason>;

/// Receiving half of the current prompt.
#[derive(Debug)]
pub struct PendingPrompt {
    rx: oneshot::Receiver<Settled>,
}

impl PendingPrompt {
    pub async fn wait(self) -> Settled {
        // A dropped sender means `reset` replaced this slot.
        self.rx.await.unwrap_or(Err(CancelReason::Abandoned))
    }
}

/// Renewable single-slot future. At most one prompt is pending at a time.
#[derive(Debug, Default)]
pub struct PromptResolver {
    slot: Mutex<Option<oneshot::Sender<Settled>>>,
}

impl PromptResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards any unsettled prompt and opens a fresh one.
    pub fn reset(&self) -> PendingPrompt {
        let (tx, rx) = oneshot::channel();
        if self.slot.lock().replace(tx).is_some() {
            tracing::debug!("abandoned unsettled prompt");
        }
        PendingPrompt { rx }
    }

    /// Settles the current prompt. Returns false if nothing was pending.
    pub fn resolve(&self, result: PromptResult) -> bool {
        self.settle(Ok(result))
    }

    pub fn reject(&self, reason: CancelReason) -> bool {
        self.settle(Err(reason))
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    fn settle(&self, value: Settled) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            tracing::debug!("late prompt message ignored");
            return false;
        };
        // The waiter may have gone away; the message is simply lost.
        tx.send(value).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submitted(label: &str, value: &str) -> PromptResult {
        PromptResult {
            label: label.to_string(),
            old_value: Value::Null,
            new_value: json!(value),
        }
    }

    #[tokio::test]
    async fn resolve_reaches_the_waiter() {
        let resolver = PromptResolver::new();
        let pending = resolver.reset();
        assert!(resolver.is_pending());
        assert!(resolver.resolve(submitted("path", "/tmp")));
        assert_eq!(pending.wait().await.unwrap().text(), "/tmp");
        assert!(!resolver.is_pending());
    }

    #[tokio::test]
    async fn second_reset_orphans_the_first() {
        let resolver = PromptResolver::new();
        let first = resolver.reset();
        let second = resolver.reset();

        assert!(resolver.resolve(submitted("b", "second")));
        assert_eq!(second.wait().await.unwrap().text(), "second");
        assert_eq!(first.wait().await, Err(CancelReason::Abandoned));
    }

    #[tokio::test]
    async fn reject_cancels_the_waiter() {
        let resolver = PromptResolver::new();
        let pending = resolver.reset();
        assert!(resolver.reject(CancelReason::Closed));
        assert_eq!(pending.wait().await, Err(CancelReason::Closed));
    }

    #[test]
    fn settling_twice_is_a_noop() {
        let resolver = PromptResolver::new();
        let _pending = resolver.reset();
        assert!(resolver.resolve(submitted("a", "1")));
        assert!(!resolver.resolve(submitted("a", "2")));
        assert!(!resolver.reject(CancelReason::Closed));
    }

    #[test]
    fn settling_with_nothing_pending_is_a_noop() {
        let resolver = PromptResolver::new();
        assert!(!resolver.reject(CancelReason::Closed));
    }

    #[test]
    fn result_text_and_change_detection() {
        let r = PromptResult {
            label: "n".to_string(),
            old_value: json!(1),
            new_value: json!(2),
        };
        assert!(r.changed());
        assert_eq!(r.text(), "2");
    }
}

//! Scripted reply provider
//!
//! Answers from a queue of prepared steps instead of the network. Used by the
//! controller tests and by `--demo` mode, where it falls back to canned
//! replies keyed on the utterance.

use crate::commands::extract_commands;
use crate::error::ReplyError;
use crate::llm::ReplyProvider;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

enum Step {
    Reply(String),
    Fail(String),
    Gated(oneshot::Receiver<Result<String, String>>),
}

/// Releases a gated reply; dropping it fails the turn.
pub struct ReplyGate {
    tx: oneshot::Sender<Result<String, String>>,
}

impl ReplyGate {
    pub fn reply(self, content: impl Into<String>) {
        let _ = self.tx.send(Ok(content.into()));
    }

    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.tx.send(Err(reason.into()));
    }
}

/// Releases a held health check; dropping it reports unhealthy.
pub struct HealthGate {
    tx: oneshot::Sender<bool>,
}

impl HealthGate {
    pub fn release(self, healthy: bool) {
        let _ = self.tx.send(healthy);
    }
}

/// Reply provider driven by a script
#[derive(Clone, Default)]
pub struct ScriptedReplyProvider {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<Mutex<Vec<String>>>,
    healthy: Arc<Mutex<bool>>,
    health_gate: Arc<Mutex<Option<oneshot::Receiver<bool>>>>,
}

impl ScriptedReplyProvider {
    pub fn new() -> Self {
        Self {
            healthy: Arc::new(Mutex::new(true)),
            ..Self::default()
        }
    }

    /// Queue a successful reply
    pub fn push_reply(&self, content: impl Into<String>) -> &Self {
        self.push(Step::Reply(content.into()));
        self
    }

    /// Queue a failure
    pub fn push_failure(&self, reason: impl Into<String>) -> &Self {
        self.push(Step::Fail(reason.into()));
        self
    }

    /// Queue a reply that resolves only when the returned gate is released.
    pub fn push_gated(&self) -> ReplyGate {
        let (tx, rx) = oneshot::channel();
        self.push(Step::Gated(rx));
        ReplyGate { tx }
    }

    pub fn set_healthy(&self, healthy: bool) {
        if let Ok(mut flag) = self.healthy.lock() {
            *flag = healthy;
        }
    }

    /// Hold the next health check until the returned gate is released.
    pub fn gate_health(&self) -> HealthGate {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut gate) = self.health_gate.lock() {
            *gate = Some(rx);
        }
        HealthGate { tx }
    }

    /// Utterances received so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn push(&self, step: Step) {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(step);
        }
    }

    fn next_step(&self) -> Option<Step> {
        self.steps.lock().ok().and_then(|mut steps| steps.pop_front())
    }
}

#[async_trait]
impl ReplyProvider for ScriptedReplyProvider {
    async fn ask(&self, utterance: &str) -> Result<String, ReplyError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(utterance.to_string());
        }

        match self.next_step() {
            Some(Step::Reply(content)) => Ok(content),
            Some(Step::Fail(reason)) => Err(ReplyError::Scripted(reason)),
            Some(Step::Gated(rx)) => match rx.await {
                Ok(Ok(content)) => Ok(content),
                Ok(Err(reason)) => Err(ReplyError::Scripted(reason)),
                Err(_) => Err(ReplyError::Unavailable),
            },
            None => Ok(canned_reply(utterance)),
        }
    }

    async fn health_check(&self) -> bool {
        let gate = self.health_gate.lock().ok().and_then(|mut gate| gate.take());
        match gate {
            Some(rx) => rx.await.unwrap_or(false),
            None => self.healthy.lock().map(|flag| *flag).unwrap_or(false),
        }
    }
}

/// Offline answer used when the script is empty
pub fn canned_reply(utterance: &str) -> String {
    let commands = extract_commands(utterance);
    if let Some(command) = commands.first() {
        return format!(
            "That command looks fine. To see more detail, try:\n\n```\n{command} -o wide\n```\n\n{command} -o wide"
        );
    }

    let lower = utterance.to_lowercase();
    if lower.contains("crashloop") {
        "A CrashLoopBackOff usually means the container exits right after starting. Check the previous logs:\n\nkubectl logs <pod> --previous\nkubectl describe pod <pod>".to_string()
    } else if lower.contains("yaml") || lower.contains("deployment") {
        "Here is a minimal deployment:\n\n```yaml\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\nspec:\n  replicas: 2\n  selector:\n    matchLabels:\n      app: web\n  template:\n    metadata:\n      labels:\n        app: web\n    spec:\n      containers:\n        - name: web\n          image: nginx:1.27\n```\n\nkubectl apply -f deployment.yaml".to_string()
    } else if lower.contains("scale") {
        "Scale a deployment with:\n\nkubectl scale deployment <name> --replicas=3".to_string()
    } else if lower.contains("docker") || lower.contains("container") {
        "List running containers and their resource usage:\n\ndocker ps\ndocker stats --no-stream".to_string()
    } else {
        "I'm running in demo mode without a backend. Ask about kubectl, docker, helm, k9s or minikube and I'll suggest a command.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_is_consumed_in_order() {
        let provider = ScriptedReplyProvider::new();
        provider.push_reply("one").push_failure("boom");

        assert_eq!(provider.ask("a").await.unwrap(), "one");
        assert!(matches!(provider.ask("b").await, Err(ReplyError::Scripted(_))));
        assert_eq!(provider.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn dropped_gate_fails_the_call() {
        let provider = ScriptedReplyProvider::new();
        drop(provider.push_gated());
        assert!(matches!(provider.ask("x").await, Err(ReplyError::Unavailable)));
    }

    #[tokio::test]
    async fn empty_script_falls_back_to_canned_reply() {
        let provider = ScriptedReplyProvider::new();
        let reply = provider.ask("kubectl get pods").await.unwrap();
        assert!(reply.contains("kubectl get pods -o wide"));
    }

    #[test]
    fn canned_replies_carry_commands() {
        assert!(!extract_commands(&canned_reply("How do I debug a crashloop?")).is_empty());
        assert!(!extract_commands(&canned_reply("Show me a deployment YAML")).is_empty());
    }
}

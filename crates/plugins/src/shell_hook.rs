//! Shell-based hook handler that executes external commands.
//!
//! The handler spawns a child process for each event, passing the
//! [`HookPayload`] as JSON on stdin and interpreting the response:
//!
//! - Exit 0, no stdout → [`HookAction::Continue`]
//! - Exit 0, stdout `{"action": "modify", "data": {"message": "..."}}` → [`HookAction::ModifyPayload`]
//! - Exit 0, stdout `{"action": "block", "reason": "..."}` → [`HookAction::Block`]
//! - Exit 1 → [`HookAction::Block`] with stderr as reason
//! - Other exit codes, timeout → error (non-fatal, logged by registry)

use std::{collections::HashMap, time::Duration};

use {
    anyhow::{Context, Result, bail},
    async_trait::async_trait,
    plume_config::ShellHookConfigEntry,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tokio::{io::AsyncWriteExt, process::Command},
    tracing::{debug, warn},
};

use crate::hooks::{HookAction, HookEvent, HookHandler, HookPayload};

/// Response format expected from shell hooks on stdout.
#[derive(Debug, Deserialize, Serialize)]
struct ShellHookResponse {
    action: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
}

/// A hook handler that executes an external shell command.
pub struct ShellHookHandler {
    hook_name: String,
    command: String,
    subscribed_events: Vec<HookEvent>,
    priority: i32,
    timeout: Duration,
    env: HashMap<String, String>,
}

impl ShellHookHandler {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        events: Vec<HookEvent>,
        timeout: Duration,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            hook_name: name.into(),
            command: command.into(),
            subscribed_events: events,
            priority: 0,
            timeout,
            env,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Create from a config entry whose event names were already resolved.
    pub fn from_config(config: &ShellHookConfigEntry, events: Vec<HookEvent>) -> Self {
        Self::new(
            config.name.clone(),
            config.command.clone(),
            events,
            Duration::from_secs(config.timeout),
            config.env.clone(),
        )
        .with_priority(config.priority)
    }

    fn interpret_stdout(&self, stdout: &str) -> HookAction {
        if stdout.is_empty() {
            return HookAction::Continue;
        }

        match serde_json::from_str::<ShellHookResponse>(stdout) {
            Ok(resp) => match resp.action.as_str() {
                "modify" => match resp.data {
                    Some(data) => HookAction::ModifyPayload(data),
                    None => {
                        warn!(hook = %self.hook_name, "modify action without data, continuing");
                        HookAction::Continue
                    },
                },
                "block" => HookAction::Block(
                    resp.reason
                        .unwrap_or_else(|| format!("hook '{}' blocked the action", self.hook_name)),
                ),
                _ => HookAction::Continue,
            },
            Err(e) => {
                warn!(hook = %self.hook_name, error = %e, "failed to parse hook stdout as JSON, continuing");
                HookAction::Continue
            },
        }
    }
}

#[async_trait]
impl HookHandler for ShellHookHandler {
    fn name(&self) -> &str {
        &self.hook_name
    }

    fn events(&self) -> &[HookEvent] {
        &self.subscribed_events
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    async fn handle(&self, event: HookEvent, payload: &HookPayload) -> Result<HookAction> {
        let payload_json =
            serde_json::to_string(payload).context("failed to serialize hook payload")?;

        debug!(
            hook = %self.hook_name,
            event = %event,
            command = %self.command,
            payload_len = payload_json.len(),
            "spawning shell hook"
        );

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .envs(&self.env)
            .env("PLUME_HOOK_EVENT", event.to_string())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn hook command: {}", self.command))?;

        // Ignore broken pipe: the child may not read its stdin.
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(payload_json.as_bytes()).await
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(e.into());
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "hook '{}' timed out after {:?}",
                    self.hook_name, self.timeout
                )
            })?
            .with_context(|| format!("hook '{}' failed to complete", self.hook_name))?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        debug!(
            hook = %self.hook_name,
            exit_code,
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            "shell hook completed"
        );

        match exit_code {
            0 => Ok(self.interpret_stdout(stdout.trim())),
            1 => {
                let reason = match stderr.trim() {
                    "" => format!("hook '{}' blocked the action", self.hook_name),
                    msg => msg.to_string(),
                };
                Ok(HookAction::Block(reason))
            },
            code => bail!(
                "hook '{}' exited with code {}: {}",
                self.hook_name,
                code,
                stderr.trim()
            ),
        }
    }
}

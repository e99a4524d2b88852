use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bridge::{BridgeClient, BridgeError, BridgeEvent};

/// One JSON object per stdout line of the sidecar.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WireEvent {
    Qr {
        code: String,
    },
    Authenticated,
    Ready,
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    Message {
        from: String,
        #[serde(default)]
        body: String,
    },
}

impl From<WireEvent> for BridgeEvent {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::Qr { code } => Self::Qr(code),
            WireEvent::Authenticated => Self::Authenticated,
            WireEvent::Ready => Self::Ready,
            WireEvent::Disconnected { reason } => Self::Disconnected(reason),
            WireEvent::Message { from, body } => Self::Message { from, body },
        }
    }
}

/// One JSON object per stdin line of the sidecar.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum WireCommand<'a> {
    Send { chat_id: &'a str, text: &'a str },
    Logout,
}

pub(crate) fn parse_event(line: &str) -> Option<BridgeEvent> {
    serde_json::from_str::<WireEvent>(line).ok().map(BridgeEvent::from)
}

/// Drives a WhatsApp Web session through an external program that speaks
/// newline-delimited JSON over its standard streams.
pub struct SidecarBridgeClient {
    program: String,
    args: Vec<String>,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Mutex<Option<Lines<BufReader<ChildStdout>>>>,
}

impl SidecarBridgeClient {
    pub fn new(command: &[String]) -> Result<Self, BridgeError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| BridgeError::Start("bridge command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            stdout: Mutex::new(None),
        })
    }

    async fn write_command(&self, command: &WireCommand<'_>) -> Result<(), String> {
        let mut line = serde_json::to_string(command).map_err(|error| error.to_string())?;
        line.push('\n');

        let mut stdin = self.stdin.lock().await;
        let writer = stdin.as_mut().ok_or_else(|| "bridge is not running".to_string())?;
        writer.write_all(line.as_bytes()).await.map_err(|error| error.to_string())?;
        writer.flush().await.map_err(|error| error.to_string())
    }
}

#[async_trait]
impl BridgeClient for SidecarBridgeClient {
    async fn initialize(&self) -> Result<(), BridgeError> {
        let mut child_slot = self.child.lock().await;
        if let Some(mut previous) = child_slot.take() {
            debug!(event_name = "ingress.bridge.sidecar_replaced", "stopping previous sidecar");
            let _ = previous.kill().await;
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| BridgeError::Start(format!("{}: {error}", self.program)))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(|stdout| BufReader::new(stdout).lines());
        *self.stdin.lock().await = stdin;
        *self.stdout.lock().await = stdout;
        *child_slot = Some(child);

        info!(event_name = "ingress.bridge.sidecar_started", program = %self.program, "bridge sidecar started");
        Ok(())
    }

    async fn next_event(&self) -> Result<Option<BridgeEvent>, BridgeError> {
        let mut stdout = self.stdout.lock().await;
        let Some(lines) = stdout.as_mut() else {
            return Ok(None);
        };

        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|error| BridgeError::Receive(error.to_string()))?
                .ok_or_else(|| BridgeError::Receive("bridge sidecar exited".to_string()))?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_event(trimmed) {
                Some(event) => return Ok(Some(event)),
                None => debug!(
                    event_name = "ingress.bridge.sidecar_line_skipped",
                    line = trimmed,
                    "unrecognized sidecar output"
                ),
            }
        }
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), BridgeError> {
        self.write_command(&WireCommand::Send { chat_id, text }).await.map_err(BridgeError::Send)
    }

    async fn logout(&self) -> Result<(), BridgeError> {
        self.write_command(&WireCommand::Logout).await.map_err(BridgeError::Logout)
    }
}

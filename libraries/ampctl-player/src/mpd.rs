//! MPD text protocol client
//!
//! Only the subset needed by the controller is spoken: transport commands,
//! `status` and `idle player`. Every request is one line; every response is a
//! sequence of `key: value` lines terminated by `OK` or an `ACK` line.

use crate::error::{PlayerError, Result};
use crate::traits::{PlayerConnection, PlayerConnector};
use ampctl_core::{PlayerCommand, PlayerState};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, trace};

const GREETING_PREFIX: &str = "OK MPD ";

/// Opens connections to an MPD server
#[derive(Debug, Clone)]
pub struct MpdConnector {
    host: String,
    port: u16,
    timeout: Duration,
}

impl MpdConnector {
    /// Create a connector for `host:port` with a per-attempt connect timeout
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// `host:port` as used in log messages
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open a concrete MPD connection
    pub async fn open(&self) -> Result<MpdConnection> {
        let stream = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .map_err(|_| PlayerError::Timeout {
            address: self.address(),
        })??;

        let (reader, writer) = stream.into_split();
        let mut connection = MpdConnection {
            reader: BufReader::new(reader),
            writer,
            version: String::new(),
        };

        let greeting = connection.read_line().await?;
        let version = greeting
            .strip_prefix(GREETING_PREFIX)
            .ok_or_else(|| PlayerError::Protocol(format!("unexpected greeting: {greeting}")))?;
        connection.version = version.to_string();

        debug!(address = %self.address(), version, "Connected to MPD");
        Ok(connection)
    }
}

#[async_trait]
impl PlayerConnector for MpdConnector {
    async fn connect(&self) -> Result<Box<dyn PlayerConnection>> {
        Ok(Box::new(self.open().await?))
    }
}

/// One open MPD connection
#[derive(Debug)]
pub struct MpdConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    version: String,
}

impl MpdConnection {
    /// Protocol version announced in the server greeting
    pub fn version(&self) -> &str {
        &self.version
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(PlayerError::Closed);
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        trace!(%line, "<- mpd");
        Ok(line)
    }

    async fn send(&mut self, request: &str) -> Result<()> {
        trace!(request, "-> mpd");
        self.writer.write_all(request.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read a full response, returning its `key: value` pairs
    async fn read_response(&mut self) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line == "OK" {
                return Ok(pairs);
            }
            if let Some(ack) = line.strip_prefix("ACK ") {
                return Err(PlayerError::Ack(ack.to_string()));
            }
            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| PlayerError::Protocol(format!("malformed line: {line}")))?;
            pairs.push((key.to_string(), value.to_string()));
        }
    }

    async fn request(&mut self, request: &str) -> Result<Vec<(String, String)>> {
        self.send(request).await?;
        self.read_response().await
    }
}

/// Wire form of a player command
pub fn command_line(command: PlayerCommand) -> String {
    match command {
        PlayerCommand::Stop => "stop".to_string(),
        PlayerCommand::Play => "play".to_string(),
        PlayerCommand::Pause(true) => "pause 1".to_string(),
        PlayerCommand::Pause(false) => "pause 0".to_string(),
        PlayerCommand::ChangeVolume(delta) => format!("volume {delta}"),
        PlayerCommand::NextTrack => "next".to_string(),
    }
}

/// Parse the `state` value of a `status` response
pub fn parse_state(value: &str) -> Result<PlayerState> {
    match value {
        "play" => Ok(PlayerState::Playing),
        "pause" => Ok(PlayerState::Paused),
        "stop" => Ok(PlayerState::Stopped),
        other => Err(PlayerError::Protocol(format!("unknown player state: {other}"))),
    }
}

#[async_trait]
impl PlayerConnection for MpdConnection {
    async fn run_command(&mut self, command: PlayerCommand) -> Result<()> {
        self.request(&command_line(command)).await.map(|_| ())
    }

    async fn current_state(&mut self) -> Result<PlayerState> {
        let pairs = self.request("status").await?;
        let (_, state) = pairs
            .iter()
            .find(|(key, _)| key == "state")
            .ok_or_else(|| PlayerError::Protocol("status without state".to_string()))?;
        parse_state(state)
    }

    async fn wait_state_change(&mut self) -> Result<PlayerState> {
        self.request("idle player").await?;
        self.current_state().await
    }
}

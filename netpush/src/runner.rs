//! Sequential run over an inventory.
//!
//! Hosts are processed one after the other: open a session, send every
//! command of the device, print each transcript, close. A host that cannot
//! be reached is reported and skipped; the run goes on with the next one.

use std::io::{self, Write};

use log::{error, info, warn};

use crate::driver::{Connector, Session, SessionOptions};
use crate::error::{ConnectError, Result};
use crate::inventory::{Host, Inventory};

/// Width of the status banners.
const BANNER_WIDTH: usize = 80;

/// What happened to one host.
#[derive(Debug)]
pub enum HostOutcome {
    /// Every command was sent. `truncated` transcripts were incomplete.
    Completed { commands: usize, truncated: usize },

    /// The session could not be opened; no command was sent.
    Failed(ConnectError),
}

/// Outcome for one host.
#[derive(Debug)]
pub struct HostReport {
    pub host: String,
    pub outcome: HostOutcome,
}

/// Outcome of a whole run, in inventory order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub hosts: Vec<HostReport>,
}

impl RunReport {
    /// Check if any host failed to connect.
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Hosts that failed to connect.
    pub fn failures(&self) -> impl Iterator<Item = &ConnectError> {
        self.hosts.iter().filter_map(|h| match &h.outcome {
            HostOutcome::Failed(e) => Some(e),
            HostOutcome::Completed { .. } => None,
        })
    }

    /// Total number of incomplete transcripts.
    pub fn truncated(&self) -> usize {
        self.hosts
            .iter()
            .map(|h| match h.outcome {
                HostOutcome::Completed { truncated, .. } => truncated,
                HostOutcome::Failed(_) => 0,
            })
            .sum()
    }
}

/// Drives sessions over every host of an inventory.
pub struct Runner<K: Connector> {
    connector: K,
    options: SessionOptions,
}

impl<K: Connector> Runner<K> {
    /// Create a runner.
    pub fn new(connector: K, options: SessionOptions) -> Self {
        Self { connector, options }
    }

    /// Process every host in order, writing transcripts to `out`.
    ///
    /// Only failures to write to `out` end the run early.
    pub async fn run<W: Write>(&self, inventory: &Inventory, out: &mut W) -> Result<RunReport> {
        let mut report = RunReport::default();

        for host in inventory.hosts() {
            let outcome = self.run_host(host, out).await?;
            report.hosts.push(HostReport {
                host: host.id().to_string(),
                outcome,
            });
        }

        info!(
            "run finished: {} host(s), {} failed, {} incomplete transcript(s)",
            report.hosts.len(),
            report.failures().count(),
            report.truncated()
        );
        Ok(report)
    }

    /// Process one host.
    pub async fn run_host<W: Write>(&self, host: &Host, out: &mut W) -> Result<HostOutcome> {
        writeln!(out)?;
        writeln!(out, "{}", banner(&format!(" {} ({}) ", host.id(), host)))?;

        let mut session = Session::new(host.id(), self.options.clone());

        if let Err(e) = session.connect(&self.connector, host).await {
            error!("{}", e);
            session.close().await;
            writeln!(
                out,
                "{}",
                banner(&format!(" Connection to {} failed: {} ", host.address(), e.source))
            )?;
            return Ok(HostOutcome::Failed(e));
        }

        writeln!(
            out,
            "{}",
            banner(&format!(" Connection to {} successfully set up. ", host.address()))
        )?;

        let result = Self::execute(&mut session, host, out).await;
        session.close().await;
        let truncated = result?;

        let commands = host.device().commands().len();
        if truncated == 0 {
            writeln!(
                out,
                "{}",
                banner(&format!(
                    "Executed all commands successfully for the host {}",
                    host.address()
                ))
            )?;
        } else {
            warn!(
                "{}: {} of {} transcript(s) incomplete",
                host.id(),
                truncated,
                commands
            );
            writeln!(
                out,
                "{}",
                banner(&format!(
                    "Executed all commands for the host {} ({} incomplete)",
                    host.address(),
                    truncated
                ))
            )?;
        }
        out.flush()?;

        Ok(HostOutcome::Completed {
            commands,
            truncated,
        })
    }

    /// Send each command and print its transcript. Returns the number of
    /// incomplete transcripts.
    async fn execute<W: Write>(
        session: &mut Session<K::Channel>,
        host: &Host,
        out: &mut W,
    ) -> io::Result<usize> {
        let mut truncated = 0;

        for command in host.device().commands() {
            writeln!(out, "Executing command: {}", command)?;
            let transcript = session.send(command).await;
            writeln!(out, "{}", transcript)?;

            if let Some(ref e) = transcript.error {
                writeln!(out, "[transcript incomplete: {}]", e)?;
                truncated += 1;
            }
        }

        Ok(truncated)
    }
}

/// Center `text` in a line of asterisks.
pub fn banner(text: &str) -> String {
    format!("{text:*^width$}", width = BANNER_WIDTH)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::channel::scripted::ScriptedChannel;
    use crate::error::TransportError;

    struct ScriptedConnector {
        /// Hosts that refuse connections.
        unreachable: Vec<String>,
        connects: Arc<Mutex<Vec<String>>>,
    }

    impl Connector for ScriptedConnector {
        type Channel = ScriptedChannel;

        async fn connect(&self, host: &Host) -> std::result::Result<ScriptedChannel, TransportError> {
            self.connects.lock().unwrap().push(host.id().to_string());
            if self.unreachable.iter().any(|h| h == host.id()) {
                return Err(TransportError::Timeout(Duration::from_secs(1)));
            }
            Ok(ScriptedChannel::from_chunks(&["banner", "ok#", "ok#"]))
        }
    }

    fn inventory() -> Inventory {
        Inventory::from_json_str(
            r#"{"hosts": {
                "a": {"hostname": "10.0.0.1", "password": "p",
                      "device": {"replace": {"{V}": "1"}, "commands": ["vlan {V}", "exit"]}},
                "b": {"hostname": "10.0.0.2", "password": "p",
                      "device": {"commands": ["show version"]}}
            }}"#,
        )
        .unwrap()
    }

    fn options() -> SessionOptions {
        SessionOptions::default()
            .with_pacing_delay(Duration::ZERO)
            .with_read_timeout(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_failed_host_is_skipped() {
        let connects = Arc::new(Mutex::new(Vec::new()));
        let runner = Runner::new(
            ScriptedConnector {
                unreachable: vec!["a".to_string()],
                connects: connects.clone(),
            },
            options(),
        );

        let mut out = Vec::new();
        let report = runner.run(&inventory(), &mut out).await.unwrap();

        assert!(report.has_failures());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.failures().next().unwrap().host, "a");
        assert!(matches!(
            report.hosts[1].outcome,
            HostOutcome::Completed {
                commands: 1,
                truncated: 0
            }
        ));
        assert_eq!(*connects.lock().unwrap(), vec!["a", "b"]);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Connection to 10.0.0.1 failed"));
        assert!(!text.contains("Executing command: vlan 1"));
        assert!(text.contains("Executing command: show version"));
    }

    #[tokio::test]
    async fn test_truncated_transcripts_are_counted() {
        // Only one response for two commands: the second read times out.
        struct ShortConnector;
        impl Connector for ShortConnector {
            type Channel = ScriptedChannel;
            async fn connect(
                &self,
                _host: &Host,
            ) -> std::result::Result<ScriptedChannel, TransportError> {
                Ok(ScriptedChannel::from_chunks(&["banner", "ok#"]))
            }
        }

        let inv = inventory();
        let runner = Runner::new(ShortConnector, options());
        let mut out = Vec::new();
        let outcome = runner.run_host(&inv.hosts()[0], &mut out).await.unwrap();

        assert!(matches!(
            outcome,
            HostOutcome::Completed {
                commands: 2,
                truncated: 1
            }
        ));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[transcript incomplete: No output within"));
        assert!(text.contains("(1 incomplete)"));
    }

    #[test]
    fn test_banner_centered() {
        let line = banner(" hi ");
        assert_eq!(line.len(), BANNER_WIDTH);
        assert!(line.starts_with("************"));
        assert!(line.contains(" hi "));
    }
}

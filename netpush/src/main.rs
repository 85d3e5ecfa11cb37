use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{debug, error};

use netpush::{
    HostKeyVerification, Inventory, Runner, SessionOptions, SshConnector, SshOptions,
};

/// Push templated configuration commands to network devices over SSH.
#[derive(Debug, Parser)]
#[command(name = "netpush", version, about)]
struct Cli {
    /// Host inventory file (JSON)
    #[arg(short = 'f', long, default_value = "hosts.json")]
    hostfile: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Delay after each write before reading, in milliseconds
    #[arg(long, default_value_t = 500)]
    pacing_ms: u64,

    /// Maximum pager continuations per command
    #[arg(long, default_value_t = 1000)]
    max_pages: usize,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Seconds to wait for output after each write
    #[arg(long, default_value_t = 10)]
    read_timeout: u64,

    /// Host key policy: warn, strict or off
    #[arg(long = "host-key", default_value = "warn")]
    host_key: HostKeyVerification,

    /// known_hosts file to check host keys against
    #[arg(long)]
    known_hosts: Option<PathBuf>,
}

impl Cli {
    fn session_options(&self) -> SessionOptions {
        SessionOptions::default()
            .with_pacing_delay(Duration::from_millis(self.pacing_ms))
            .with_max_continuations(self.max_pages)
            .with_read_timeout(Duration::from_secs(self.read_timeout))
    }

    fn ssh_options(&self) -> SshOptions {
        SshOptions {
            timeout: Duration::from_secs(self.timeout),
            host_key_verification: self.host_key,
            known_hosts_path: self.known_hosts.clone(),
            ..SshOptions::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("{:?}", cli);

    let inventory = match Inventory::load(&cli.hostfile) {
        Ok(inventory) => inventory,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    let runner = Runner::new(SshConnector::new(cli.ssh_options()), cli.session_options());
    let mut stdout = std::io::stdout();

    match runner.run(&inventory, &mut stdout).await {
        Ok(report) if report.has_failures() => {
            for failure in report.failures() {
                eprintln!("Error: {failure}");
            }
            ExitCode::from(2)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

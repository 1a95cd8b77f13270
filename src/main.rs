//! Childwarden - supervise one child process and never let it outlive its controller.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use childwarden::config::{ConfigLoader, SupervisorConfig};
use childwarden::process::EXIT_FAILURE;
use childwarden::supervisor::Supervisor;

#[derive(Parser, Debug)]
#[command(
    name = "childwarden",
    about = "Run a program and make sure it never outlives its controller",
    long_about = "Run a program and make sure it never outlives its controller.\n\n\
        The program inherits stdin, stdout and stderr. When stdin hangs up, or \
        childwarden receives SIGINT, SIGQUIT or SIGTERM, the program is sent \
        SIGTERM and, if it is still running after --delay-to-sigkill \
        milliseconds, SIGKILL.",
    version
)]
struct Cli {
    /// Milliseconds to wait after SIGTERM before sending SIGKILL [default: 500]
    #[arg(short = 'k', long, value_name = "MILLISECONDS")]
    delay_to_sigkill: Option<u64>,

    /// Program name the child sees as argv[0]
    #[arg(short = '0', long, value_name = "ARG0")]
    arg0: Option<OsString>,

    /// TOML file with default settings
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// The program to run and its arguments
    #[arg(
        value_name = "PROGRAM",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<OsString>,
}

impl Cli {
    fn into_config(self) -> Result<SupervisorConfig, String> {
        let loader = self
            .config
            .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
        let file = loader.load().map_err(|e| e.to_string())?;

        let mut command = self.command.into_iter();
        let program = command
            .next()
            .ok_or_else(|| "Specify a program to run".to_string())?;

        let mut config = SupervisorConfig::new(program)
            .with_args(command)
            .with_delay_to_sigkill_ms(self.delay_to_sigkill.unwrap_or(file.delay_to_sigkill_ms));
        if let Some(arg0) = self.arg0 {
            config = config.with_arg0(arg0);
        }
        Ok(config)
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let code = if err.use_stderr() { EXIT_FAILURE } else { 0 };
        let _ = err.print();
        std::process::exit(code);
    });
    init_tracing(cli.verbose);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(message) => {
            tracing::error!("{message}");
            std::process::exit(EXIT_FAILURE);
        }
    };
    tracing::debug!(
        program = ?config.program,
        args = ?config.args,
        delay_to_sigkill_ms = config.delay_to_sigkill_ms,
        "Starting childwarden"
    );

    let exit_code = match Supervisor::new(config).run().await {
        Ok(report) => report.exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Cannot supervise");
            EXIT_FAILURE
        }
    };

    std::process::exit(exit_code);
}

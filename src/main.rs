use mysql_bridge::config::{default_config_path, load_config, Config, DriverKind};
use mysql_bridge::core::db::{Connection, Driver};
use mysql_bridge::drivers::EmbeddedDriver;
use mysql_bridge::repl::{self, OutputFormat};
use mysql_bridge::{BridgeError, Result};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

const USAGE: &str = "usage: mysql-bridge [--config PATH] [--json] [SQL...]";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    json: bool,
    statements: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => match args.next() {
                Some(path) => parsed.config = Some(PathBuf::from(path)),
                None => {
                    return Err(BridgeError::InvalidArgument(
                        "--config needs a path".to_string(),
                    ))
                }
            },
            "--json" => parsed.json = true,
            flag if flag.starts_with("--") => {
                return Err(BridgeError::InvalidArgument(format!("unknown flag {}", flag)))
            }
            _ => parsed.statements.push(arg),
        }
    }
    Ok(parsed)
}

fn resolve_config(args: &Args) -> Result<Config> {
    if let Some(path) = &args.config {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "using default config");
            load_config(path)
        }
        _ => Ok(Config::default()),
    }
}

/// Runs the given statements, or the REPL when there are none.
/// Returns whether every statement succeeded.
fn run<D: Driver>(config: &Config, format: &OutputFormat, statements: &[String]) -> Result<bool> {
    let mut conn = Connection::<D>::new()?;
    conn.connect(&config.connection)?;
    info!(host = %config.connection.host, "connected");

    if statements.is_empty() {
        let stdin = io::stdin();
        repl::run_repl(&mut conn, format, stdin.lock(), io::stdout())?;
        return Ok(true);
    }

    let mut ok = true;
    for sql in statements {
        match conn.execute(sql) {
            Ok(Some(set)) => println!("{}", repl::render_result(&set, format)?),
            Ok(None) => println!("Query OK"),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                ok = false;
            }
        }
    }
    Ok(ok)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let outcome = parse_args(std::env::args().skip(1)).and_then(|args| {
        let config = resolve_config(&args)?;
        let format = OutputFormat {
            json: args.json || config.json_output(),
            null_text: config.null_text().to_string(),
        };
        match config.driver {
            DriverKind::Embedded => run::<EmbeddedDriver>(&config, &format, &args.statements),
            #[cfg(feature = "mysqlclient")]
            DriverKind::Mysql => {
                run::<mysql_bridge::drivers::MysqlDriver>(&config, &format, &args.statements)
            }
            #[cfg(not(feature = "mysqlclient"))]
            DriverKind::Mysql => Err(BridgeError::Config(
                "driver \"mysql\" needs a build with the mysqlclient feature".to_string(),
            )),
        }
    });

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if matches!(e, BridgeError::InvalidArgument(_)) {
                eprintln!("{}", USAGE);
            }
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

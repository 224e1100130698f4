//! probe - run a file of SQL statements and dump every result set.

use std::process::ExitCode;

use db_probe::cli::Cli;
use db_probe::{app, logging};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are reported through the same path.
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init_stdout_logging(cli.log_level());

    match app::run(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e.report());
            error!("Cannot connect to database, check your credentials");
            ExitCode::from(1)
        }
    }
}

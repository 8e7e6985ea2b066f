use tcv3::cli::run_from_env;
use tcv3::logging::{init_logging_with_config, LogConfig};

fn main() {
    if let Err(err) = init_logging_with_config(&LogConfig::from_env()) {
        eprintln!("warning: logging not initialised: {err}");
    }
    if let Err(err) = run_from_env() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

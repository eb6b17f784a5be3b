use std::process::ExitCode;

use env_logger::Env;

fn main() -> ExitCode {
    // `.env` may carry RUST_LOG as well as UDF_* options.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match udf_rgb::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

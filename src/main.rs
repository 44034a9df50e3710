use std::time::Instant;

use anyhow::Result;
use log::{debug, error, info};

use seqreplay::cli::parse;
use seqreplay::config::build_run_config;
use seqreplay::pipelines;
use seqreplay::utils::system::{init_logging, log_level};


#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();
    init_logging(log_level(args.verbose));

    info!("Beginning");

    let run_config = match build_run_config(args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!("Source directory: {}", run_config.src_dir.display());
    info!("Destination directory: {}", run_config.dest_dir.display());
    debug!("{:?}", run_config.args);

    match pipelines::run(&run_config).await {
        Ok(summary) => {
            info!(
                "Replay complete: {} files copied, {:.1}s spent waiting, {} milliseconds total.",
                summary.files_copied,
                summary.total_wait.as_secs_f64(),
                run_start.elapsed().as_millis()
            );
        }
        Err(e) => {
            error!("Replay failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
            std::process::exit(1);
        }
    }

    Ok(())
}

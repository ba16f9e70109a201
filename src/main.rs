// src/main.rs

use pio_mcp::{cli, logging, run};

fn main() {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("pio-mcp error: failed to start async runtime: {err}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run_main());

    // The stdin reader sits in a blocking read that cannot be interrupted;
    // waiting for it would keep the process alive after Ctrl-C.
    runtime.shutdown_background();

    if let Err(err) = result {
        eprintln!("pio-mcp error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

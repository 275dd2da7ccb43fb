#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let guard = ytfetch::logging::init_logging();
    let code = ytfetch::run().await?;

    // exit() skips destructors; flush the log writer first
    drop(guard);
    std::process::exit(code);
}

use panvert_api::setup;
use panvert_core::Config;

// Use mimalloc as the global allocator for lower fragmentation under
// long-running upload and conversion workloads.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (staging, job store, converter, routes)
    let app = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, app).await?;

    Ok(())
}

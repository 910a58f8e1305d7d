#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    // Configured through RUST_LOG
    env_logger::init();

    delivery_grid::run_app()
}

#[cfg(target_arch = "wasm32")]
fn main() {}

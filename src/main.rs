use log::info;
use tokio::net::TcpListener;

use group_messenger::integration::{self, Config};
use group_messenger::{app, state::AppState};

#[tokio::main]
async fn main() -> group_messenger::Result<()> {
    dotenv::dotenv().ok();
    integration::init_logger()?;

    let config = Config::env()?;
    let state = AppState::init(&config).await?;
    let router = app::router(state, &config.env);

    let addr = config.env.addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(integration::Error::from)?;
    info!("listening on {addr}");

    axum::serve(listener, router)
        .await
        .map_err(integration::Error::from)?;

    Ok(())
}

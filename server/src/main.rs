use tokio::net::TcpListener;
use todo_server::{Config, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::load()?;

    let store = match Store::connect(&config.database_url) {
        Ok(store) => {
            tracing::info!("document store connection established ({})", store.location());
            store
        }
        Err(e) => {
            tracing::error!("document store connection failed: {e}");
            return Err(e.into());
        }
    };

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("server is running on {addr}");
    todo_server::serve(listener, store).await?;
    Ok(())
}

use mock_server::Db;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let username = std::env::var("MOCK_USERNAME").unwrap_or_else(|_| "demo".to_string());
    let password = std::env::var("MOCK_PASSWORD").unwrap_or_else(|_| "demo".to_string());

    let db = Db::default();
    {
        let mut store = db.write().await;
        let user = store.add_user(&username, &password);
        let board = store.add_board("Demo", &user);
        let todo = store.add_list(&board, "To Do");
        store.add_list(&board, "Done");
        store.add_card(&board, &todo, "Try the client");
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, user = %username, "mock wekan listening");
    mock_server::run(listener, db).await
}

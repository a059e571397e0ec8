#[tokio::main]
async fn main() -> anyhow::Result<()> {
    consult::start_server().await
}

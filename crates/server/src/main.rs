#[tokio::main]
async fn main() -> anyhow::Result<()> {
    waypoint_server::run().await
}

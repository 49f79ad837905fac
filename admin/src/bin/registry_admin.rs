use admin::Params;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let params = Params::parse();
    log::info!("args: {params:?}");
    let output = admin::run(params).await?;
    println!("{output}");
    Ok(())
}

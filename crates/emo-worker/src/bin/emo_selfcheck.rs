use emo_vision_client::VisionClientConfig;
use emo_worker::WorkerConfig;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env();
    println!(
        "emo-selfcheck: threshold={} max_moments={} max_inflight={}",
        config.sampler.threshold, config.sampler.max_moments, config.max_inflight
    );
    config.validate()?;

    let client = VisionClientConfig::from_env()?;
    println!(
        "emo-selfcheck: vision models {}",
        client.models.join(", ")
    );

    println!("emo-selfcheck: ok");
    Ok(())
}

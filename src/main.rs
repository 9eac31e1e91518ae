use std::sync::Arc;
use std::time::Duration;

use wecker::{
    ActiveSlot, AlarmClock, AlarmRegistry, JsonFileStorage, NullSink, OutputSink, Settings,
    SoundLibrary, TriggerScheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let settings = Settings::load()?;
    log::debug!("settings: {settings:?}");

    let storage = Arc::new(JsonFileStorage::open(&settings.alarms_file).await?);
    let registry = Arc::new(AlarmRegistry::new(
        storage,
        settings.max_alarms,
        settings.default_snooze_minutes,
    ));

    // The hardware display/buzzer driver plugs in here; without it the
    // clock runs in simulation mode and only logs sink commands.
    let sink: Arc<dyn OutputSink> = Arc::new(NullSink);
    let slot = Arc::new(ActiveSlot::new(sink));

    let clock = AlarmClock::new(registry, slot, SoundLibrary::new(&settings.sounds_dir));
    let scheduler = TriggerScheduler::spawn(
        clock,
        settings.poll_period(),
        settings.error_backoff(),
    );

    tokio::signal::ctrl_c().await?;
    log::info!("shutdown requested");
    scheduler.cancel(Duration::from_secs(5)).await;
    Ok(())
}

use lapse::{
    Driver, Stopwatch, SystemClock, Timer, WheelScheduler,
    units::{MINUTE, SECOND},
};
use std::{sync::Arc, thread::sleep, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lapse=debug")),
        )
        .init();

    info!("lapse - version {}", env!("CARGO_PKG_VERSION"));

    let clock = Arc::new(SystemClock);
    let scheduler = Arc::new(WheelScheduler::new(clock.clone()));
    let mut driver = Driver::start(scheduler.clone())?;

    let mut stopwatch = Stopwatch::new(clock.clone(), true);
    let timer = Timer::with_callback(SECOND, true, clock.clone(), scheduler.clone(), || {
        info!("timer finished")
    });
    // Never started, so it only ever reports its full delay.
    let idle = Timer::new(MINUTE, false, clock, scheduler);

    sleep(Duration::from_millis((SECOND / 2) as u64));
    info!("halfway: stopwatch {stopwatch}, timer {timer}, idle {idle}");

    sleep(Duration::from_millis((SECOND / 2 + 100) as u64));
    stopwatch.stop();
    info!("done: stopwatch {stopwatch}, timer {timer}");

    driver.stop();
    Ok(())
}

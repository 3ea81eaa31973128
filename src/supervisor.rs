use std::sync::Arc;

use anyhow::Result;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{Instrument, error, info, info_span, warn};

use crate::collector::DevicePoller;
use crate::context::AppContext;
use crate::housekeeping::Housekeeper;

/// Запускает по опросчику на устройство и очистку, ждет опросчиков.
///
/// Упавший опросчик не перезапускается: устройство остается без опроса до
/// рестарта процесса, остальные продолжают работать.
///
/// Если future `run` бросить (abort задачи, select), все опросчики и очистка
/// останавливаются вместе с ним.
pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let settings = &ctx.config.settings;
    let interval = settings.poll_interval();

    let housekeeper = Housekeeper::new(
        settings.scratch_dir.clone(),
        settings.housekeeping.cleanup_time()?,
        ctx.clock.clone(),
    );
    let housekeeping = tokio::spawn(
        housekeeper
            .run(settings.housekeeping.check_interval())
            .instrument(info_span!("housekeeping")),
    );
    let mut spawned = AbortOnDrop(vec![housekeeping.abort_handle()]);

    // Внешняя задача только ждет внутреннюю, чтобы знать имя устройства при панике
    let mut watchers = JoinSet::new();
    for device in &ctx.config.devices {
        let name = device.name.clone();
        let poller = DevicePoller::new(
            device.clone(),
            ctx.source.clone(),
            ctx.sink.clone(),
            ctx.clock.clone(),
        );
        let span = info_span!("poller", device = %name);
        let task = tokio::spawn(poller.run(interval).instrument(span));
        spawned.0.push(task.abort_handle());

        watchers.spawn(async move { (name, task.await) });
    }
    info!("Запущено опросчиков: {}", watchers.len());

    while let Some(joined) = watchers.join_next().await {
        match joined {
            Ok((name, Ok(()))) => warn!("Опросчик {} завершился", name),
            Ok((name, Err(e))) if e.is_panic() => {
                error!("Опросчик {} упал и не будет перезапущен: {}", name, e)
            }
            Ok((name, Err(e))) => warn!("Опросчик {} остановлен: {}", name, e),
            Err(e) => error!("Задача наблюдения за опросчиком упала: {}", e),
        }
    }

    drop(spawned);
    Ok(())
}

/// Останавливает порожденные задачи, когда `run` завершается или брошен
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

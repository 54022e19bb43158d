use std::sync::Arc;
use std::time::Duration;
use tick_store::{
    CombinedState, LogErrorReporter, LoggerMiddleware, Store, StoreError, ThunkMiddleware,
};
use tokio::time::MissedTickBehavior;

mod actions;
mod config;
mod reducers;

use actions::HostAction;
use config::HostConfig;
use reducers::Todo;

type HostStore = Store<CombinedState, HostAction>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = HostConfig::load();
    log::info!(
        "Starting tick-store-host: {} frames at {} fps",
        config.frames,
        config.frame_rate
    );

    // Middleware in order: logger is outermost so it also sees thunk-dispatched actions
    let store: HostStore = Store::builder(reducers::root())
        .middleware(LoggerMiddleware::with_output(|line: &str| log::debug!("{}", line)))
        .middleware(ThunkMiddleware)
        .error_reporter(LogErrorReporter)
        .config(config.store.clone())
        .build()?;

    let connection = store.changed().connect(log_changes);

    let loading = store.dispatch_thunk(|store: &HostStore| {
        let store = store.clone();
        async move {
            // Simulated background fetch
            tokio::time::sleep(Duration::from_millis(250)).await;
            store.dispatch(HostAction::TodosLoaded(vec![
                "water the plants".to_string(),
                "answer mail".to_string(),
            ]))?;
            Ok::<_, StoreError>(())
        }
    })?;
    let loader = tokio::spawn(loading);

    run_frames(&store, &config).await?;

    loader.await??;
    store.flush()?;

    connection.disconnect()?;
    store.destruct();
    log::info!("Final state: {:?}", store.get_state());

    Ok(())
}

/// Drive the store at the configured frame rate, flushing once per tick
async fn run_frames(store: &HostStore, config: &HostConfig) -> anyhow::Result<()> {
    let mut ticks = tokio::time::interval(config.frame_duration());
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for frame in 0..config.frames {
        ticks.tick().await;
        store.dispatch(HostAction::Tick { frame })?;

        if frame % 30 == 0 {
            store.dispatch(HostAction::Increment)?;
        }
        if frame == 45 {
            store.dispatch(HostAction::AddTodo("ship the release".to_string()))?;
            store.dispatch(HostAction::ToggleTodo(0))?;
        }
        if frame == 90 {
            // Out of range: reported by LogErrorReporter, state is left untouched
            if let Err(e) = store.dispatch(HostAction::ToggleTodo(99)) {
                log::warn!("Frame {}: {}", frame, e);
            }
        }

        store.flush()?;
    }

    Ok(())
}

fn log_changes(new: &Arc<CombinedState>, old: &Arc<CombinedState>) -> anyhow::Result<()> {
    if let Some(frame) = new.get::<u64>("frame") {
        log::trace!("Frame {} published", frame);
    }

    if new.get::<i64>("counter") != old.get::<i64>("counter") {
        log::info!("Counter: {:?}", new.get::<i64>("counter"));
    }

    if new.get::<Vec<Todo>>("todos") != old.get::<Vec<Todo>>("todos") {
        let todos = new.get::<Vec<Todo>>("todos").map(Vec::as_slice).unwrap_or_default();
        for todo in todos {
            log::info!("[{}] {}", if todo.done { "x" } else { " " }, todo.title);
        }
    }

    Ok(())
}

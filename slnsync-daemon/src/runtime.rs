use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use std::time::Duration;

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::Instant;

use slnsync_core::settings::{self, settings_path_at};
use slnsync_core::{Settings, SolutionFile};
use slnsync_project::ProjectDocument;
use slnsync_solution::parse_solution;
use slnsync_sync::{ensure_marker_line, Generator, WriteResult};

use crate::error::{io_err, DaemonError};
use crate::paths::{is_source_file, meta_companion, CREATE_DELAY, DEBOUNCE_WINDOW};

/// What a file system event asks the daemon to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// The solution file changed.
    Resync,
    /// `slnsync.yaml` changed.
    ReloadSettings,
    /// A source file appeared and needs the marker line.
    Patch(PathBuf),
    /// A source file was deleted; its `.meta` companion goes too.
    RemoveMeta(PathBuf),
}

/// Watched project root directories. A directory already covered by a
/// watched ancestor is not watched again.
#[derive(Debug, Default)]
pub struct WatcherRegistry {
    roots: Vec<PathBuf>,
}

impl WatcherRegistry {
    /// `true` when `path` lies inside a watched root (compared
    /// case-insensitively).
    pub fn covers(&self, path: &Path) -> bool {
        let key = prefix_key(path);
        self.roots.iter().any(|root| key.starts_with(&prefix_key(root)))
    }

    /// Record `root`; `false` when it is already covered.
    pub fn add(&mut self, root: &Path) -> bool {
        if self.covers(root) {
            return false;
        }
        self.roots.push(root.to_path_buf());
        true
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn take(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.roots)
    }
}

fn prefix_key(path: &Path) -> String {
    let mut key = path.display().to_string();
    if !key.ends_with(MAIN_SEPARATOR) {
        key.push(MAIN_SEPARATOR);
    }
    key.to_lowercase()
}

/// Start the watcher runtime for `solution` and block the current thread
/// until it exits.
pub fn start_blocking(solution: &Path, verbose: bool) -> Result<(), DaemonError> {
    init_tracing(verbose);
    let solution = SolutionFile::new(solution)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(solution))
}

/// Run the watcher runtime until ctrl-c.
pub async fn run(solution: SolutionFile) -> Result<(), DaemonError> {
    // Event paths arrive canonicalized (e.g. /private/var/... on macOS).
    let solution = fs::canonicalize(solution.path())
        .ok()
        .and_then(|path| SolutionFile::new(path).ok())
        .unwrap_or(solution);
    let generator = Arc::new(Mutex::new(Generator::for_solution(&solution)?));
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        let generator = generator.clone();
        tokio::spawn(async move {
            let result = watcher_task(solution, generator, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down watcher");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(io_err("ctrl-c handler", err)),
                    }
                }
            }
        })
    };

    let (watcher_result, signal_result) = tokio::join!(watcher_handle, signal_handle);
    handle_join("watcher", watcher_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

async fn watcher_task(
    solution: SolutionFile,
    generator: Arc<Mutex<Generator>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    watcher.watch(solution.directory(), RecursiveMode::NonRecursive)?;
    tracing::info!(solution = %solution.path().display(), "watching solution");

    let mut settings = generator.lock().await.settings().clone();
    let mut registry = WatcherRegistry::default();
    refresh_source_watchers(&mut watcher, &mut registry, &solution, &settings).await?;
    resync(&generator, &solution).await;

    let mut debounce = HashMap::<PathBuf, Instant>::new();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watcher event error");
                        continue;
                    }
                };

                for path in event.paths {
                    let Some(action) = classify(&event.kind, &path, &solution, &settings, &registry) else {
                        continue;
                    };
                    tracing::debug!(path = %path.display(), ?action, "file system event");

                    match action {
                        WatchAction::Resync => {
                            if should_process_event(&mut debounce, &path, Instant::now()) {
                                resync(&generator, &solution).await;
                            }
                        }
                        WatchAction::ReloadSettings => {
                            if !should_process_event(&mut debounce, &path, Instant::now()) {
                                continue;
                            }
                            match settings::load_at(solution.directory()) {
                                Ok(reloaded) => {
                                    settings = reloaded.clone();
                                    *generator.lock().await.settings_mut() = reloaded;
                                    refresh_source_watchers(&mut watcher, &mut registry, &solution, &settings).await?;
                                    resync(&generator, &solution).await;
                                }
                                Err(err) => {
                                    tracing::warn!(error = %err, "keeping previous settings");
                                }
                            }
                        }
                        WatchAction::Patch(file) => {
                            tokio::spawn(patch_after_delay(file, CREATE_DELAY));
                        }
                        WatchAction::RemoveMeta(file) => {
                            tokio::spawn(async move {
                                let target = file.clone();
                                match tokio::task::spawn_blocking(move || remove_meta_companion(&target)).await {
                                    Ok(Ok(_)) => {}
                                    Ok(Err(err)) => {
                                        tracing::warn!(path = %file.display(), error = %err, "failed to delete .meta companion");
                                    }
                                    Err(err) => {
                                        tracing::error!(error = %err, "meta deletion task failed");
                                    }
                                }
                            });
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Map one event path to a daemon action.
pub fn classify(
    kind: &EventKind,
    path: &Path,
    solution: &SolutionFile,
    settings: &Settings,
    registry: &WatcherRegistry,
) -> Option<WatchAction> {
    let changed = matches!(kind, EventKind::Create(_) | EventKind::Modify(_));
    if path == solution.path() {
        return changed.then_some(WatchAction::Resync);
    }
    if path == settings_path_at(solution.directory()) {
        return changed.then_some(WatchAction::ReloadSettings);
    }
    if !settings.enabled || !registry.covers(path) {
        return None;
    }
    match kind {
        EventKind::Create(_) if settings.enable_marker_directive && is_source_file(path) => {
            Some(WatchAction::Patch(path.to_path_buf()))
        }
        EventKind::Remove(_) if settings.track_meta_deletion && is_source_file(path) => {
            Some(WatchAction::RemoveMeta(path.to_path_buf()))
        }
        _ => None,
    }
}

/// Source watchers only run when a feature needs them.
fn source_watchers_enabled(settings: &Settings) -> bool {
    settings.enabled && (settings.track_meta_deletion || settings.enable_marker_directive)
}

async fn refresh_source_watchers(
    watcher: &mut RecommendedWatcher,
    registry: &mut WatcherRegistry,
    solution: &SolutionFile,
    settings: &Settings,
) -> Result<(), DaemonError> {
    for root in registry.take() {
        let _ = watcher.unwatch(&root);
    }
    if !source_watchers_enabled(settings) {
        return Ok(());
    }

    let target = solution.clone();
    let roots = tokio::task::spawn_blocking(move || watch_roots(&target))
        .await
        .map_err(|err| DaemonError::Join {
            task: "watch_roots",
            message: err.to_string(),
        })??;

    for root in roots {
        if !registry.add(&root) {
            continue;
        }
        match watcher.watch(&root, RecursiveMode::Recursive) {
            Ok(()) => tracing::debug!(path = %root.display(), "watching project sources"),
            Err(err) => {
                tracing::warn!(path = %root.display(), error = %err, "cannot watch project root");
            }
        }
    }
    Ok(())
}

/// Root directories of every non-package project listed in `solution`.
pub fn watch_roots(solution: &SolutionFile) -> Result<Vec<PathBuf>, DaemonError> {
    let text = fs::read_to_string(solution.path()).map_err(|e| io_err(solution.path(), e))?;
    let parsed = parse_solution(solution, &text, false)?;

    let mut roots = Vec::new();
    for project in &parsed.projects {
        let root = ProjectDocument::load(&project.path).and_then(|model| {
            if model.is_from_package_cache()? {
                Ok(None)
            } else {
                model.root_directory().map(Some)
            }
        });
        match root {
            Ok(Some(root)) if root.is_dir() => roots.push(root),
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(project = %project.path.display(), error = %err, "no project root to watch");
            }
        }
    }
    Ok(roots)
}

async fn resync(generator: &Arc<Mutex<Generator>>, solution: &SolutionFile) {
    let started = Instant::now();
    let mut guard = generator.clone().lock_owned().await;
    let target = solution.clone();
    let result = tokio::task::spawn_blocking(move || guard.sync(&target, false)).await;

    match result {
        Ok(Ok(report)) => {
            let written = report.writes.iter().filter(|w| w.is_change()).count();
            tracing::info!(
                written,
                unchanged = report.writes.len() - written,
                cached = report.cached,
                duration_ms = started.elapsed().as_millis(),
                "watcher-triggered sync completed",
            );
        }
        Ok(Err(err)) => tracing::error!(error = %err, "watcher-triggered sync failed"),
        Err(err) => tracing::error!(error = %err, "sync task join failure"),
    }
}

async fn patch_after_delay(path: PathBuf, delay: Duration) {
    tokio::time::sleep(delay).await;
    let target = path.clone();
    match tokio::task::spawn_blocking(move || ensure_marker_line(&target)).await {
        Ok(Ok(WriteResult::Written { .. })) => {
            tracing::info!(path = %path.display(), "added marker line to new source file");
        }
        Ok(Ok(_)) => {}
        Ok(Err(err)) => tracing::error!(path = %path.display(), error = %err, "failed to patch new source file"),
        Err(err) => tracing::error!(error = %err, "patch task join failure"),
    }
}

/// Delete the `.meta` companion of `path`. `Ok(false)` when it was already
/// gone.
pub fn remove_meta_companion(path: &Path) -> Result<bool, DaemonError> {
    let meta = meta_companion(path);
    match fs::remove_file(&meta) {
        Ok(()) => {
            tracing::debug!(path = %meta.display(), "deleted .meta companion");
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %meta.display(), ".meta companion already deleted");
            Ok(false)
        }
        Err(err) => Err(io_err(&meta, err)),
    }
}

fn should_process_event(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
) -> bool {
    should_process_event_with_threshold(debounce, path, now, DEBOUNCE_WINDOW)
}

fn should_process_event_with_threshold(
    debounce: &mut HashMap<PathBuf, Instant>,
    path: &Path,
    now: Instant,
    threshold: Duration,
) -> bool {
    debounce.retain(|_, seen_at| now.duration_since(*seen_at) <= Duration::from_secs(30));
    match debounce.get(path) {
        Some(last_seen) if now.duration_since(*last_seen) < threshold => false,
        _ => {
            debounce.insert(path.to_path_buf(), now);
            true
        }
    }
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join {
            task,
            message: err.to_string(),
        }),
    }
}

/// Install the `tracing` subscriber: `info` by default, `debug` when
/// verbose, `RUST_LOG` wins over both.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

//! Tray indicator actor. The platform glue spawns [`Tray::run`] with its own
//! [`TrayRenderer`], or [`LogRenderer`] on hosts without a tray.

use std::hash::{Hash, Hasher};
use std::time::Duration;

use rustc_hash::FxHasher;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

use crate::actor;
use crate::ui::grid_icon::GridIcon;

const DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Update {
    pub current: usize,
    pub rows: usize,
    pub columns: usize,
    pub occupied: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Update(Update),
    /// Something the user asked for did not work.
    Alert(String),
}

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

/// Draws the tray icon and shows messages. Implemented by the platform glue.
pub trait TrayRenderer: Send {
    fn render(&mut self, icon: &GridIcon);

    fn alert(&mut self, message: &str);
}

/// Renderer used when no tray is available; alerts still reach the log.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl TrayRenderer for LogRenderer {
    fn render(&mut self, icon: &GridIcon) { debug!("Tray icon\n{icon}") }

    fn alert(&mut self, message: &str) { warn!("{message}") }
}

pub struct Tray<R> {
    rx: Receiver,
    renderer: R,
    last_signature: Option<u64>,
}

impl<R: TrayRenderer> Tray<R> {
    pub fn new(rx: Receiver, renderer: R) -> Self {
        Tray { rx, renderer, last_signature: None }
    }

    /// Runs until every sender is dropped. Updates are debounced; alerts are
    /// shown immediately.
    pub async fn run(mut self) {
        let mut pending: Option<Update> = None;
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                _ = sleep_until(deadline), if pending.is_some() => {
                    if let Some(update) = pending.take() {
                        self.apply_update(&update);
                    }
                }

                maybe = self.rx.recv() => {
                    match maybe {
                        Some((span, event)) => span.in_scope(|| match event {
                            Event::Update(update) => {
                                pending = Some(update);
                                deadline = Instant::now() + DEBOUNCE;
                            }
                            Event::Alert(message) => self.renderer.alert(&message),
                        }),
                        None => {
                            if let Some(update) = pending.take() {
                                self.apply_update(&update);
                            }
                            break;
                        }
                    }
                }
            }
        }
    }

    fn apply_update(&mut self, update: &Update) {
        let sig = signature(update);
        if self.last_signature == Some(sig) {
            return;
        }
        self.last_signature = Some(sig);

        let icon = GridIcon::new(update.rows, update.columns, update.current, &update.occupied);
        self.renderer.render(&icon);
    }
}

fn signature(update: &Update) -> u64 {
    let mut hasher = FxHasher::default();
    update.hash(&mut hasher);
    hasher.finish()
}

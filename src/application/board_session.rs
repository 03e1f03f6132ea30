use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::board_service::BoardService;
use super::input::PointerTracker;
use super::renderer::Renderer;
use crate::domain::change_feed::Subscription;
use crate::domain::command::{ChangeEvent, ChangeKind, Command};
use crate::domain::command_store::CommandStore;
use crate::domain::surface::Surface;

/// Failures the operator has to be told about, not just logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardAlert {
    #[error("error writing data: {0}")]
    WriteFailed(String),
    #[error("error clearing board: {0}")]
    ClearFailed(String),
}

/// One client's view of a shared board.
///
/// Owns the local surface, the pointer state and the feed subscription.
/// Local strokes are drawn immediately and persisted in the background; the
/// feed echoes them back later, which redraws the same pixels.
pub struct BoardSession<S: CommandStore + Clone> {
    service: BoardService<S>,
    renderer: Renderer,
    surface: Surface,
    pointer: PointerTracker,
    subscription: Option<Subscription>,
    in_flight: JoinSet<()>,
    alert_tx: mpsc::UnboundedSender<BoardAlert>,
    alerts: mpsc::UnboundedReceiver<BoardAlert>,
    applied: usize,
}

impl<S: CommandStore + Clone> BoardSession<S> {
    pub fn new(service: BoardService<S>, renderer: Renderer, width: u32, height: u32) -> Self {
        let (alert_tx, alerts) = mpsc::unbounded_channel();
        Self {
            service,
            renderer,
            surface: renderer.new_surface(width, height),
            pointer: PointerTracker::default(),
            subscription: None,
            in_flight: JoinSet::new(),
            alert_tx,
            alerts,
            applied: 0,
        }
    }

    pub async fn start(&mut self) -> anyhow::Result<()> {
        if self.subscription.is_none() {
            self.subscription = Some(self.service.subscribe().await?);
            info!("board feed subscribed");
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            info!("board feed cancelled");
        }
    }

    pub fn is_live(&self) -> bool { self.subscription.is_some() }
    pub fn surface(&self) -> &Surface { &self.surface }
    pub fn service(&self) -> &BoardService<S> { &self.service }
    pub fn pointer_mut(&mut self) -> &mut PointerTracker { &mut self.pointer }
    pub fn pending_writes(&self) -> usize { self.in_flight.len() }
    /// Number of `added` changes rendered from the feed so far.
    pub fn applied(&self) -> usize { self.applied }

    /// Per-frame handler: turns pointer movement since the last frame into a
    /// line, draws it and starts persisting it.
    pub fn draw(&mut self) -> Option<Command> {
        self.reap();
        let command = self.pointer.sample()?;
        self.renderer.apply(&mut self.surface, &command);
        self.persist(command);
        Some(command)
    }

    /// Wipes the local surface right away. Purging the shared collection and
    /// recording the clear command run in the background once this session's
    /// earlier writes have finished; failures come back through `take_alert`.
    pub fn clear(&mut self) {
        self.renderer.apply(&mut self.surface, &Command::Clear);
        let mut earlier = std::mem::take(&mut self.in_flight);
        let service = self.service.clone();
        let alerts = self.alert_tx.clone();
        self.in_flight.spawn(async move {
            while let Some(joined) = earlier.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "persist task aborted");
                }
            }
            if let Err(e) = service.clear_board().await {
                let message = format!("{e:#}");
                error!(error = %message, "error recording clear command");
                let _ = alerts.send(BoardAlert::ClearFailed(message));
            }
        });
    }

    /// Renders every change already delivered by the feed without waiting.
    pub fn apply_feed(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.subscription.as_mut().and_then(Subscription::try_next) {
            self.handle(&event);
            handled += 1;
        }
        handled
    }

    /// Waits for the next change from the feed and renders it.
    pub async fn next_change(&mut self) -> Option<ChangeEvent> {
        let event = self.subscription.as_mut()?.next().await?;
        self.handle(&event);
        Some(event)
    }

    pub fn take_alert(&mut self) -> Option<BoardAlert> {
        self.alerts.try_recv().ok()
    }

    /// Waits until every started write has finished, successfully or not.
    pub async fn flush(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "persist task aborted");
            }
        }
    }

    fn handle(&mut self, event: &ChangeEvent) {
        match event.kind {
            ChangeKind::Added => {
                self.renderer.apply(&mut self.surface, &event.record.command);
                self.applied += 1;
            }
            ChangeKind::Modified => debug!(id = %event.record.id, "modified command ignored"),
            ChangeKind::Removed => debug!(id = %event.record.id, "removed command ignored"),
        }
    }

    fn persist(&mut self, command: Command) {
        let service = self.service.clone();
        let alerts = self.alert_tx.clone();
        self.in_flight.spawn(async move {
            if let Err(e) = service.append(command).await {
                let message = format!("{e:#}");
                error!(error = %message, "error writing board command");
                let _ = alerts.send(BoardAlert::WriteFailed(message));
            }
        });
    }

    fn reap(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            if let Err(e) = joined {
                warn!(error = %e, "persist task aborted");
            }
        }
    }
}

impl<S: CommandStore + Clone> Drop for BoardSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

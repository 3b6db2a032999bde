use std::sync::Arc;

use crate::classify::classify;
use crate::feed::ManualOverrides;
use crate::graph::{GraphInputs, QuestGraph, build_graph};
use crate::ir::{Quest, QuestFeed};
use crate::layout::QuestLayout;
use crate::scheduler::{LayoutScheduler, LayoutTicket, RunOutcome};
use crate::store::{CompletionStore, StoreError};
use crate::view::{FocusReceiver, ViewCommand, ViewEffect, ViewState};

/// Owned application state. Every pipeline input lives here and is passed
/// down explicitly; nothing is read from globals.
pub struct Session {
    quests: Vec<Quest>,
    overrides: ManualOverrides,
    store: CompletionStore,
    view: ViewState,
    scheduler: LayoutScheduler,
    pending: Option<LayoutTicket>,
}

impl Session {
    pub fn new(
        feed: QuestFeed,
        overrides: ManualOverrides,
        store: CompletionStore,
        view: ViewState,
        scheduler: LayoutScheduler,
    ) -> Self {
        Self {
            quests: feed.quests,
            overrides,
            store,
            view,
            scheduler,
            pending: None,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn store(&self) -> &CompletionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CompletionStore {
        &mut self.store
    }

    pub fn scheduler(&self) -> &LayoutScheduler {
        &self.scheduler
    }

    /// Latest committed layout.
    pub fn layout(&self) -> Arc<QuestLayout> {
        self.scheduler.current().layout
    }

    /// Builds and classifies the graph for the current inputs.
    pub fn build_graph(&self) -> QuestGraph {
        let completed = self.store.completed_ids();
        let inputs = GraphInputs {
            zone: self.view.zone,
            hide_completed: self.view.hide_completed,
            completed: Some(&completed),
        };
        let mut graph = build_graph(&self.quests, &self.overrides, &inputs);
        classify(&mut graph);
        graph
    }

    /// Starts a new layout run; any run still in flight becomes stale.
    pub fn relayout(&mut self) -> u64 {
        let ticket = self.scheduler.request(self.build_graph(), self.view.direction);
        let generation = ticket.generation;
        self.pending = Some(ticket);
        generation
    }

    /// Waits for the most recent run and returns its outcome.
    pub async fn settle(&mut self) -> Option<RunOutcome> {
        let ticket = self.pending.take()?;
        Some(ticket.wait().await)
    }

    pub fn apply(&mut self, command: ViewCommand) -> ViewEffect {
        let inputs_changed = match command {
            ViewCommand::SetDirection(direction) => self.view.set_direction(direction),
            ViewCommand::ToggleDirection => {
                let next = self.view.direction.toggled();
                self.view.set_direction(next)
            }
            ViewCommand::SetZone(zone) => self.view.set_zone(zone),
            ViewCommand::SetHideCompleted(hide) => self.view.set_hide_completed(hide),
            ViewCommand::ToggleQuest(id) => match self.store.toggle_quest(&id) {
                Ok(Some(done)) => {
                    tracing::debug!(quest = %id, done, "toggled completion");
                    true
                }
                Ok(None) => false,
                // The in-memory toggle already happened.
                Err(err) => {
                    tracing::warn!(quest = %id, error = %err, "failed to persist completion");
                    true
                }
            },
            ViewCommand::SetActiveCharacter(id) => match self.store.set_active(id) {
                Ok(()) => true,
                Err(StoreError::UnknownCharacter(_)) => {
                    tracing::warn!(character = %id, "cannot switch to unknown character");
                    false
                }
                Err(err) => {
                    tracing::warn!(character = %id, error = %err, "failed to persist active character");
                    true
                }
            },
            ViewCommand::Focus(query) => {
                let layout = self.layout();
                return if self.view.focus(&layout, &query) {
                    ViewEffect::ViewportMoved
                } else {
                    ViewEffect::Unchanged
                };
            }
            ViewCommand::ResetViewport => {
                let layout = self.layout();
                return if self.view.reset_viewport(&layout) {
                    ViewEffect::ViewportMoved
                } else {
                    ViewEffect::Unchanged
                };
            }
        };

        if inputs_changed {
            ViewEffect::Relayout {
                generation: self.relayout(),
            }
        } else {
            ViewEffect::Unchanged
        }
    }

    /// Applies every queued focus request without blocking.
    pub fn drain_focus(&mut self, focus: &mut FocusReceiver) -> usize {
        let mut handled = 0;
        while let Ok(command) = focus.try_recv() {
            self.apply(ViewCommand::Focus(command.query));
            handled += 1;
        }
        handled
    }
}

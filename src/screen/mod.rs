// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Screen models: state + events + one-shot effects
//!
//! Each screen owns one [`ScreenModel`]. State is a `watch` value, so late
//! subscribers see only the latest state. Effects go through a bounded
//! channel and are meant to be consumed once by the shell. Background work
//! runs in a `JoinSet` that is aborted when the screen is dropped.

pub mod filtered_store;
pub mod home;
pub mod location;
pub mod map;
pub mod search;
pub mod setting;
pub mod store;

use crate::error::{OngiError, Result};
use crate::types::{Coordinates, StoreQuery};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

pub use filtered_store::{FilterSheet, FilteredStoreEffect, FilteredStoreEvent, FilteredStoreScreen, FilteredStoreUiState};
pub use home::{HomeEffect, HomeEvent, HomeScreen, HomeUiState};
pub use location::{FixedLocation, LocationProvider};
pub use map::{MapEffect, MapEvent, MapScreen, MapUiState};
pub use search::{SearchEffect, SearchEvent, SearchScreen, SearchUiState};
pub use setting::{SettingEffect, SettingEvent, SettingScreen, SettingUiState};
pub use store::{StoreEffect, StoreEvent, StoreScreen, StoreUiState};

/// Capacity of each screen's effect channel
pub const EFFECT_CAPACITY: usize = 64;

/// Called with every error raised by a screen's background work
pub type ErrorHandler<S, E> = fn(&ScreenContext<S, E>, &OngiError);

/// Values shared by every screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSettings {
    /// Position used when the device location is unavailable
    pub default_location: Coordinates,
    /// Rows per page for listings
    pub page_size: u32,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            default_location: location::SEOUL_CITY_HALL,
            page_size: StoreQuery::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Cloneable handle background tasks use to reach their screen
pub struct ScreenContext<S, E> {
    state: Arc<watch::Sender<S>>,
    effects: mpsc::Sender<E>,
    on_error: ErrorHandler<S, E>,
}

impl<S, E> Clone for ScreenContext<S, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            effects: self.effects.clone(),
            on_error: self.on_error,
        }
    }
}

impl<S: Clone, E: std::fmt::Debug> ScreenContext<S, E> {
    /// Current state
    #[must_use]
    pub fn state(&self) -> S {
        self.state.borrow().clone()
    }

    /// Mutate the state in place and notify subscribers
    pub fn update_state(&self, f: impl FnOnce(&mut S)) {
        self.state.send_modify(f);
    }

    /// Queue a one-shot effect; a full or closed channel drops it with an error log
    pub fn send_effect(&self, effect: E) {
        if let Err(err) = self.effects.try_send(effect) {
            tracing::error!(error = %err, "dropped screen effect");
        }
    }

    /// Hand an error to the screen's error handler
    pub fn fail(&self, err: &OngiError) {
        (self.on_error)(self, err);
    }
}

/// State holder, effect channel and task scope of one screen
pub struct ScreenModel<S, E> {
    ctx: ScreenContext<S, E>,
    effects_rx: Option<mpsc::Receiver<E>>,
    tasks: JoinSet<()>,
}

impl<S, E> std::fmt::Debug for ScreenModel<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenModel")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl<S, E> ScreenModel<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: std::fmt::Debug + Send + 'static,
{
    /// Model starting in `initial`
    #[must_use]
    pub fn new(initial: S, on_error: ErrorHandler<S, E>) -> Self {
        let (state, _) = watch::channel(initial);
        let (effects, effects_rx) = mpsc::channel(EFFECT_CAPACITY);
        Self {
            ctx: ScreenContext {
                state: Arc::new(state),
                effects,
                on_error,
            },
            effects_rx: Some(effects_rx),
            tasks: JoinSet::new(),
        }
    }

    /// Handle for background tasks
    #[must_use]
    pub fn context(&self) -> ScreenContext<S, E> {
        self.ctx.clone()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> S {
        self.ctx.state()
    }

    /// Observe state; the receiver starts with the current value
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.ctx.state.subscribe()
    }

    /// Take the effect receiver. Only the first caller gets it.
    pub fn take_effects(&mut self) -> Option<mpsc::Receiver<E>> {
        self.effects_rx.take()
    }

    /// Run `work` in the background; an `Err` goes to the error handler
    pub fn launch<F>(&mut self, name: &'static str, work: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        while self.tasks.try_join_next().is_some() {}
        let ctx = self.ctx.clone();
        self.tasks.spawn(async move {
            if let Err(err) = work.await {
                tracing::error!(task = name, error = %err, "screen task failed");
                ctx.fail(&err);
            }
        });
    }

    /// Abort all in-flight work
    pub fn abort_all(&mut self) {
        if !self.tasks.is_empty() {
            tracing::debug!(tasks = self.tasks.len(), "aborting screen tasks");
        }
        self.tasks.abort_all();
    }

    /// Wait until every launched task has finished
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                if err.is_panic() {
                    tracing::error!(error = %err, "screen task panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        value: u32,
        failed: bool,
    }

    #[derive(Debug, PartialEq)]
    enum Effect {
        Failed(String),
    }

    fn on_error(ctx: &ScreenContext<Counter, Effect>, err: &OngiError) {
        ctx.update_state(|s| s.failed = true);
        ctx.send_effect(Effect::Failed(err.to_string()));
    }

    #[tokio::test]
    async fn test_task_errors_reach_handler() {
        let mut model = ScreenModel::new(Counter::default(), on_error);
        let mut effects = model.take_effects().unwrap();
        assert!(model.take_effects().is_none());

        let ctx = model.context();
        model.launch("ok", async move {
            ctx.update_state(|s| s.value += 1);
            Ok(())
        });
        model.launch("fail", async { Err(OngiError::NotFound("x".into())) });
        model.settle().await;

        assert_eq!(model.state(), Counter { value: 1, failed: true });
        assert_eq!(effects.recv().await, Some(Effect::Failed("not found: x".into())));
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_latest_only() {
        let model = ScreenModel::new(Counter::default(), on_error);
        let ctx = model.context();
        ctx.update_state(|s| s.value = 1);
        ctx.update_state(|s| s.value = 2);
        let rx = model.subscribe();
        assert_eq!(rx.borrow().value, 2);
    }

    #[tokio::test]
    async fn test_overflowing_effects_are_dropped() {
        let mut model = ScreenModel::new(Counter::default(), on_error);
        let mut effects = model.take_effects().unwrap();
        let ctx = model.context();
        for i in 0..EFFECT_CAPACITY + 5 {
            ctx.send_effect(Effect::Failed(i.to_string()));
        }
        let mut received = 0;
        while effects.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, EFFECT_CAPACITY);
    }

    #[tokio::test]
    async fn test_abort_stops_pending_work() {
        let mut model = ScreenModel::new(Counter::default(), on_error);
        let ctx = model.context();
        model.launch("slow", async move {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            ctx.update_state(|s| s.value = 99);
            Ok(())
        });
        model.abort_all();
        model.settle().await;
        assert_eq!(model.state().value, 0);
    }
}

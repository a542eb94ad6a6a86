// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Replay navigation operations offline and print the resulting state

use super::Output;
use crate::config::Config;
use crate::navigation::{
    BottomBarState, ManualClock, NavGraph, NavGraphUiState, NavigationThrottler, RouteKey, Tab,
};
use crate::types::{StoreCategory, StoreFilter};
use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// One replayable operation
#[derive(Debug, Clone, PartialEq)]
pub enum NavOp {
    /// `navigate:store:<id>`, `navigate:filtered[:<CATEGORY>]`, `navigate:search`
    Navigate(RouteKey),
    /// `select:<tab>`
    Select(Tab),
    /// `pop`
    Pop,
    /// `back`
    Back,
    /// `wait:<ms>`: advance the replay clock
    Wait(Duration),
}

impl NavOp {
    /// Parse one operation. A store id is everything after `navigate:store:`,
    /// so ids containing `:` are kept whole.
    pub fn parse(op: &str) -> Result<Self> {
        let (verb, arg) = match op.split_once(':') {
            Some((verb, arg)) => (verb, Some(arg)),
            None => (op, None),
        };
        let parsed = match (verb, arg) {
            ("navigate", Some(target)) => Self::Navigate(parse_target(op, target)?),
            ("select", Some(name)) => match Tab::from_name(name) {
                Some(tab) => Self::Select(tab),
                None => bail!("Unknown tab: {name}. Valid: home, search, map, setting"),
            },
            ("pop", None) => Self::Pop,
            ("back", None) => Self::Back,
            ("wait", Some(ms)) => Self::Wait(Duration::from_millis(
                ms.parse().map_err(|_| anyhow::anyhow!("Invalid wait duration: {ms}"))?,
            )),
            _ => return Err(unknown_op(op)),
        };
        Ok(parsed)
    }
}

fn parse_target(op: &str, target: &str) -> Result<RouteKey> {
    let (kind, rest) = match target.split_once(':') {
        Some((kind, rest)) => (kind, Some(rest)),
        None => (target, None),
    };
    match (kind, rest) {
        ("store", Some(id)) if !id.is_empty() => Ok(RouteKey::store(id)),
        ("filtered", None) => Ok(RouteKey::filtered(StoreFilter::default())),
        ("filtered", Some(code)) => match StoreCategory::from_code(code) {
            Some(category) => Ok(RouteKey::filtered(
                StoreFilter::default().with_category(category),
            )),
            None => bail!("Unknown category in {op}"),
        },
        ("search", None) => Ok(RouteKey::search()),
        _ => Err(unknown_op(op)),
    }
}

fn unknown_op(op: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Unknown navigation op: {op}. Valid: navigate:store:<id>, navigate:filtered[:<CATEGORY>], navigate:search, select:<tab>, pop, back, wait:<ms>"
    )
}

/// Outcome of one replayed operation
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    /// Operation as typed
    pub op: String,
    /// Whether the state changed
    pub applied: bool,
}

/// Full replay result
#[derive(Debug, Clone, Serialize)]
pub struct Replay {
    /// Per-operation outcomes
    pub steps: Vec<Step>,
    /// Final navigation state
    pub state: NavGraphUiState,
    /// Final bottom bar
    pub bottom_bar: BottomBarState,
}

/// Apply `ops` to a fresh default graph with the given throttle window
pub fn replay(ops: &[String], throttle: Duration) -> Result<Replay> {
    let parsed = ops
        .iter()
        .map(|op| NavOp::parse(op))
        .collect::<Result<Vec<_>>>()?;

    let clock = ManualClock::new();
    let throttler = NavigationThrottler::with_clock(throttle, Arc::new(clock.clone()));
    let mut graph = NavGraph::with_default_catalog(throttler);

    let steps = ops
        .iter()
        .zip(parsed)
        .map(|(raw, op)| {
            let applied = match op {
                NavOp::Navigate(key) => graph.navigate(key),
                NavOp::Select(tab) => graph.select(tab),
                NavOp::Pop => graph.pop_back_stack(),
                NavOp::Back => graph.on_back(),
                NavOp::Wait(d) => {
                    clock.advance(d);
                    true
                }
            };
            Step {
                op: raw.clone(),
                applied,
            }
        })
        .collect();

    let state = graph.ui_state();
    let bottom_bar = match state.top() {
        Some(top) => BottomBarState::present(graph.catalog(), top),
        None => BottomBarState::present(graph.catalog(), &state.current_tab.root_key()),
    };
    Ok(Replay {
        steps,
        state,
        bottom_bar,
    })
}

/// Throttle window for a replay: the flag if given, else the configured one
#[must_use]
pub fn throttle_window(config: &Config, throttle_ms: Option<u64>) -> Duration {
    throttle_ms.map_or_else(|| config.navigation_throttle(), Duration::from_millis)
}

/// Run nav command
pub fn run(config: &Config, ops: &[String], throttle_ms: Option<u64>, out: Output) -> Result<()> {
    let throttle = throttle_window(config, throttle_ms);
    tracing::debug!(?throttle, ops = ops.len(), "replaying navigation");
    let replay = replay(ops, throttle)?;
    if out.json {
        return out.print_json(&replay);
    }

    for step in &replay.steps {
        let mark = if step.applied { "✓" } else { "·" };
        println!("{mark} {}", step.op);
    }
    println!();
    println!("{} {:?}", out.dim("tab  "), replay.state.current_tab);
    let stack: Vec<String> = replay
        .state
        .current_back_stack
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("{} {}", out.dim("stack"), out.strong(&stack.join(" > ")));
    println!("{} {}", out.dim("root "), replay.state.is_root);
    if replay.bottom_bar.visible {
        let items: Vec<String> = replay
            .bottom_bar
            .items
            .iter()
            .map(|item| {
                if item.selected {
                    out.strong(&format!("[{}]", item.name))
                } else {
                    item.name.to_string()
                }
            })
            .collect();
        println!("{} {}", out.dim("bar  "), items.join(" "));
    } else {
        println!("{} hidden", out.dim("bar  "));
    }
    Ok(())
}

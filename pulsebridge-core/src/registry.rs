//! Per-Class Callback Registry
//!
//! ## Overview
//!
//! A registry maps each line to its [`GpioWakeChannel`]. There are two
//! independent registries, one per [`EventClass`], both owned by the event
//! loop and touched only on the consumer thread.
//!
//! ```text
//! CallbackRegistry (Isr)
//! ┌────────┬────────┬────────┬─────┬────────┐
//! │ GPIO0  │ GPIO1  │ GPIO2  │ ... │ GPIO31 │   one channel per line,
//! │ None   │ Some(h)│ None   │     │ None   │   created up front
//! └────────┴────────┴────────┴─────┴────────┘
//! ```
//!
//! Channels are created eagerly and live as long as the registry, in a
//! fixed-capacity `heapless::Vec` sized for the largest addressable line.
//! Registration only swaps the handler inside a channel, so a wake token
//! always refers to a live channel.

use std::sync::Arc;

use heapless::Vec;

use crate::constants::gpio::MAX_ADDRESSABLE_LINE;
use crate::errors::{BridgeError, BridgeResult};
use crate::events::EventClass;
use crate::line::LineId;
use crate::wake::{GpioWakeChannel, Handler, LoopSignal, WakeToken};

/// Capacity of a registry: every addressable line
pub const MAX_CHANNELS: usize = MAX_ADDRESSABLE_LINE as usize + 1;

/// Line-indexed table of wake channels for one event class
#[derive(Debug)]
pub struct CallbackRegistry {
    class: EventClass,
    max_line: u8,
    channels: Vec<GpioWakeChannel, MAX_CHANNELS>,
}

impl CallbackRegistry {
    /// Create one empty channel for every line in `0..=max_line`
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidConfig`] if `max_line` exceeds the addressable
    /// range.
    pub fn new(class: EventClass, signal: &Arc<LoopSignal>, max_line: u8) -> BridgeResult<Self> {
        if max_line > MAX_ADDRESSABLE_LINE {
            return Err(BridgeError::InvalidConfig {
                reason: "max_line exceeds addressable range",
            });
        }

        let mut channels = Vec::new();
        for raw in 0..=u32::from(max_line) {
            let line = LineId::new(raw, max_line)?;
            let channel = GpioWakeChannel::new(WakeToken::new(class, line), Arc::clone(signal));
            channels.push(channel).map_err(|_| BridgeError::InvalidConfig {
                reason: "registry capacity exceeded",
            })?;
        }

        Ok(Self {
            class,
            max_line,
            channels,
        })
    }

    /// Event class this registry serves
    pub fn class(&self) -> EventClass {
        self.class
    }

    /// Highest valid line
    pub fn max_line(&self) -> u8 {
        self.max_line
    }

    /// Number of channels (lines)
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false: channels exist for every line
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Validate a raw line number for this registry
    pub fn line(&self, raw: u32) -> BridgeResult<LineId> {
        LineId::new(raw, self.max_line)
    }

    /// Install `handler` on `line`, or clear it with `None`
    ///
    /// Returns the handler previously installed, if any.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidLine`] if `line` is out of range.
    pub fn register(&mut self, line: u32, handler: Option<Handler>) -> BridgeResult<Option<Handler>> {
        let line = self.line(line)?;
        let installing = handler.is_some();
        let previous = self.channel_mut(line)?.replace_handler(handler);
        log_debug!(
            "{} registry: {} {} (replaced: {})",
            self.class,
            if installing { "set" } else { "cleared" },
            line,
            previous.is_some()
        );
        Ok(previous)
    }

    /// Remove the handler on `line`
    pub fn unregister(&mut self, line: u32) -> BridgeResult<Option<Handler>> {
        self.register(line, None)
    }

    /// Handler slot for dispatch
    ///
    /// `None` if no handler is installed or `line` is beyond this registry.
    pub fn lookup(&mut self, line: LineId) -> Option<&mut Handler> {
        self.channels.get_mut(line.index())?.handler_mut()
    }

    /// Channel for `line`
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidLine`] if `line` is out of range.
    pub fn channel(&self, line: u32) -> BridgeResult<&GpioWakeChannel> {
        let line = self.line(line)?;
        self.channels.get(line.index()).ok_or(BridgeError::InvalidLine {
            line: u32::from(line.get()),
            max: self.max_line,
        })
    }

    /// A `LineId` built against a wider bound is rejected, not indexed.
    pub(crate) fn channel_mut(&mut self, line: LineId) -> BridgeResult<&mut GpioWakeChannel> {
        let max = self.max_line;
        self.channels
            .get_mut(line.index())
            .ok_or(BridgeError::InvalidLine {
                line: u32::from(line.get()),
                max,
            })
    }

    /// Number of lines with a handler installed
    pub fn active_count(&self) -> usize {
        self.channels.iter().filter(|c| c.has_handler()).count()
    }

    /// Lines with a handler installed, ascending
    pub fn active_lines(&self) -> impl Iterator<Item = LineId> + '_ {
        self.channels
            .iter()
            .filter(|c| c.has_handler())
            .map(|c| c.token().line)
    }
}

// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Registry};

/// Maps a `-v` repeat count to a `tracing` level, matching the teacher's
/// fallback-to-INFO convention but generalized to a count instead of a
/// static config string.
fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// A live handle to the installed subscriber's level filter, so `SIGUSR1`/
/// `SIGUSR2` can raise or lower verbosity without reinstalling a subscriber.
#[derive(Clone)]
pub struct VerbosityHandle {
    handle: reload::Handle<LevelFilter, Registry>,
    current: u8,
}

impl VerbosityHandle {
    pub fn increase(&mut self) {
        self.current = self.current.saturating_add(1);
        let _ = self.handle.modify(|f| *f = level_for_verbosity(self.current));
    }

    pub fn decrease(&mut self) {
        self.current = self.current.saturating_sub(1);
        let _ = self.handle.modify(|f| *f = level_for_verbosity(self.current));
    }

    pub fn level(&self) -> u8 {
        self.current
    }
}

/// Initialize logging at the given initial verbosity (repeat count of `-v`),
/// returning a handle that can adjust the level later in response to signals.
pub fn init_logging(verbosity: u8) -> VerbosityHandle {
    let (filter, handle) = reload::Layer::new(level_for_verbosity(verbosity));

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(false));
    let _ = subscriber.try_init();

    VerbosityHandle {
        handle,
        current: verbosity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_mapping_matches_verbosity_count() {
        assert_eq!(level_for_verbosity(0), LevelFilter::WARN);
        assert_eq!(level_for_verbosity(1), LevelFilter::INFO);
        assert_eq!(level_for_verbosity(5), LevelFilter::TRACE);
    }
}

// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The per-channel filter-output + demod worker thread, and the registry
//! reaper thread, both plain `std::thread::spawn` loops coordinated through
//! `FilterInput`'s condvar, matching the hot-DSP-path/`std::thread` split
//! `trx-server/trx-backend-soapysdr/src/dsp.rs`'s `iq_read_loop` uses for
//! its own producer thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::warn;

use crate::channel::{Channel, ChannelRegistry};
use crate::filter_input::FilterInput;

/// How long a worker or the reaper waits for a new block before re-checking
/// its shutdown flag.
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// Runs one channel's filter-output + demod pipeline until the channel's
/// `running` flag clears or the engine requests a stop. Each call to
/// `wait_for_block` blocks this thread alone; no other channel is held up
/// by a slow demodulator.
pub fn spawn_channel_worker(
    filter_input: Arc<FilterInput>,
    handle: Arc<Mutex<Channel>>,
    engine_stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut last_seen = 0u64;
        let mut fm_state = None;

        loop {
            if engine_stop.load(Ordering::Relaxed) {
                return;
            }
            let still_running = handle.lock().unwrap().running.load(Ordering::Relaxed);
            if !still_running {
                return;
            }

            let block = match filter_input.wait_for_block_timeout(last_seen, POLL_TIMEOUT) {
                Some(block) => block,
                None => continue,
            };
            last_seen = block.seq;

            let mut channel = handle.lock().unwrap();
            let ssrc = channel.ssrc;
            let (samples, gap) = channel.filter_output.process_complex(&block);
            if let Some(missed) = gap {
                warn!(ssrc, missed, "channel missed block(s)");
            }

            let demod = channel.params.demod;
            let audio = demod.demodulate(&samples, &mut fm_state);

            channel.stats.blocks_processed += 1;
            channel.stats.samples_produced += audio.len() as u64;
            channel.stats.rtp_timestamp =
                channel.stats.rtp_timestamp.wrapping_add(audio.len() as u32);
            channel.stats.last_gap = gap;
        }
    })
}

/// Ticks the idle-channel reaper once per newly published filter-input
/// block, rather than on a wall-clock timer, so `lifetime_blocks` (counted
/// in blocks) elapses at the configured `blocktime`-derived block rate
/// instead of drifting with an unrelated fixed wall-clock period.
pub fn spawn_reaper(
    filter_input: Arc<FilterInput>,
    channels: Arc<ChannelRegistry>,
    engine_stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut last_seen = 0u64;
        loop {
            if engine_stop.load(Ordering::Relaxed) {
                return;
            }
            match filter_input.wait_for_block_timeout(last_seen, POLL_TIMEOUT) {
                Some(block) => {
                    last_seen = block.seq;
                    channels.reap_idle();
                }
                None => continue,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelParams;
    use crate::notch::NotchSpec;
    use std::time::Instant;

    #[test]
    fn worker_processes_blocks_until_stopped() {
        let fi = Arc::new(FilterInput::new(32, 5, false, 48_000.0, &[] as &[NotchSpec]).unwrap());
        let channels = Arc::new(ChannelRegistry::new());
        let handle = channels
            .create_chan(1, &fi, ChannelParams::default())
            .unwrap();
        handle.lock().unwrap().start_demod();

        let stop = Arc::new(AtomicBool::new(false));
        let worker = spawn_channel_worker(Arc::clone(&fi), Arc::clone(&handle), Arc::clone(&stop));

        let samples = vec![rustfft::num_complex::Complex::new(1.0f32, 0.0); fi.l() * 3];
        fi.ingest(&samples).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            if handle.lock().unwrap().stats.blocks_processed > 0 {
                break;
            }
            assert!(Instant::now() < deadline, "worker never processed a block");
            std::thread::sleep(Duration::from_millis(10));
        }

        stop.store(true, Ordering::Relaxed);
        worker.join().unwrap();
    }

    #[test]
    fn worker_exits_promptly_once_channel_stops_running() {
        let fi = Arc::new(FilterInput::new(16, 5, false, 48_000.0, &[] as &[NotchSpec]).unwrap());
        let channels = Arc::new(ChannelRegistry::new());
        let handle = channels
            .create_chan(2, &fi, ChannelParams::default())
            .unwrap();
        handle.lock().unwrap().start_demod();

        let stop = Arc::new(AtomicBool::new(false));
        let worker = spawn_channel_worker(Arc::clone(&fi), Arc::clone(&handle), stop);

        assert!(channels.destroy(2));
        worker.join().unwrap();
    }

    #[test]
    fn reaper_destroys_idle_channel_after_enough_blocks() {
        let fi = Arc::new(FilterInput::new(16, 5, false, 48_000.0, &[] as &[NotchSpec]).unwrap());
        let channels = Arc::new(ChannelRegistry::new());
        let params = ChannelParams {
            freq_hz: 0.0,
            lifetime_blocks: 2,
            ..Default::default()
        };
        let handle = channels.create_chan(3, &fi, params).unwrap();
        handle.lock().unwrap().start_demod();

        let stop = Arc::new(AtomicBool::new(false));
        let reaper = spawn_reaper(Arc::clone(&fi), Arc::clone(&channels), Arc::clone(&stop));

        let samples = vec![rustfft::num_complex::Complex::new(0.0f32, 0.0); fi.l() * 6];
        fi.ingest(&samples).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while channels.lookup(3).is_some() {
            assert!(Instant::now() < deadline, "channel was never reaped");
            std::thread::sleep(Duration::from_millis(10));
        }

        stop.store(true, Ordering::Relaxed);
        reaper.join().unwrap();
    }
}

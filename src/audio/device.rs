//! Speaker output through cpal
//!
//! The stream follows the session's transport rather than driving it, so the
//! polled position stays authoritative even when the device clock drifts.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::session::AudioSession;
use crate::effects::FilterBank;

const MAX_DRIFT_MS: f64 = 100.0;

pub struct DeviceOutput {
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl DeviceOutput {
    /// Start rendering `session` on the default output device.
    pub fn open(session: Arc<AudioSession>) -> Result<Self> {
        let (stop, stop_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        // cpal streams are not Send; the thread that builds one must own it.
        let thread = thread::Builder::new()
            .name(format!("eqplayer-output-{}", session.id()))
            .spawn(move || run_stream(session, stop_rx, ready_tx))
            .context("Failed to spawn output thread")?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                stop,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(anyhow!("Output thread exited before the stream started"))
            }
        }
    }
}

impl Drop for DeviceOutput {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_stream(session: Arc<AudioSession>, stop: Receiver<()>, ready: Sender<Result<()>>) {
    let stream = match build_stream(session) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready.send(Err(anyhow!("Failed to start output stream: {e}")));
        return;
    }
    let _ = ready.send(Ok(()));

    // Either an explicit stop or the owner going away ends the stream.
    let _ = stop.recv();
    drop(stream);
    tracing::debug!("Output stream closed");
}

fn build_stream(session: Arc<AudioSession>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("No default output device"))?;
    let supported = device
        .default_output_config()
        .context("Failed to query output config")?;

    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(anyhow!(
            "Unsupported device sample format {:?}",
            supported.sample_format()
        ));
    }

    let config: cpal::StreamConfig = supported.into();
    let channels = config.channels as usize;
    let device_rate = config.sample_rate.0 as f64;
    tracing::info!(
        device = %device.name().unwrap_or_default(),
        channels,
        rate = device_rate,
        "Opening output stream"
    );

    let mut renderer = Renderer::new(session, device_rate);
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.fill(data, channels),
            |err| tracing::error!(error = %err, "Output stream error"),
            None,
        )
        .context("Failed to build output stream")?;
    Ok(stream)
}

struct Renderer {
    session: Arc<AudioSession>,
    /// Track frames advanced per device frame
    step: f64,
    cursor: f64,
    max_drift: f64,
}

impl Renderer {
    fn new(session: Arc<AudioSession>, device_rate: f64) -> Self {
        let track_rate = session.audio().sample_rate() as f64;
        Self {
            step: track_rate / device_rate,
            cursor: session.transport().position_frames() as f64,
            max_drift: track_rate * MAX_DRIFT_MS / 1000.0,
            session,
        }
    }

    fn fill(&mut self, data: &mut [f32], channels: usize) {
        let transport = self.session.transport();
        if !transport.is_running() || channels == 0 {
            data.fill(0.0);
            return;
        }

        let target = transport.position_frames() as f64;
        if (self.cursor - target).abs() > self.max_drift {
            self.cursor = target;
        }

        let session = self.session.clone();
        let rendered = session.try_with_insert(|bank| self.render(data, channels, Some(bank)));
        if rendered.is_none() {
            self.render(data, channels, None);
        }
    }

    fn render(&mut self, data: &mut [f32], channels: usize, mut bank: Option<&mut FilterBank>) {
        let audio = self.session.audio();
        for out in data.chunks_mut(channels) {
            let index = self.cursor.floor();
            let frac = (self.cursor - index) as f32;
            let (l0, r0) = audio.frame(index as u64);
            let (l1, r1) = audio.frame(index as u64 + 1);
            let mut l = l0 + (l1 - l0) * frac;
            let mut r = r0 + (r1 - r0) * frac;
            if let Some(bank) = bank.as_deref_mut() {
                (l, r) = bank.process(l, r);
            }

            match out {
                [mono] => *mono = 0.5 * (l + r),
                [left, right, rest @ ..] => {
                    *left = l;
                    *right = r;
                    rest.fill(0.0);
                }
                [] => {}
            }
            self.cursor += self.step;
        }
    }
}

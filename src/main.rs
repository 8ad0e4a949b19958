/*
 *  main.rs
 *
 *  oppa-dmd - dot matrix driver
 *	(c) 2020-25 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, error, info, log_enabled, trace, Level};
use tokio::signal::unix::{signal, SignalKind};

use oppa_dmd::config;
use oppa_dmd::display::{DisplayDriverFactory, DisplayManager};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let (cfg, cli) = config::load().context("loading configuration")?;

    if cli.dump_config {
        println!("{}", config::to_yaml(&cfg)?);
        return Ok(());
    }

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} - dot matrix driver", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let display_cfg = cfg.display.clone().unwrap_or_default();
    let pattern_cfg = cfg.pattern.clone().unwrap_or_default();
    let backend = display_cfg.backend.clone().unwrap_or_default();
    debug!("Backend {:?}, pins {:?}", backend, display_cfg.pins());

    // No GPIO, no display: there is nothing sensible to fall back to
    let (driver, bus) = DisplayDriverFactory::create_with_bus(&display_cfg, &backend)
        .context("GPIO initialization failed")?;

    let mut manager = DisplayManager::new(driver, &pattern_cfg);
    if let Some(bus) = bus {
        manager.on_pattern(move |fb| {
            debug!("Pattern frame, {} pixels lit, {} pin writes so far",
                   fb.count_on_pixels(), bus.write_count());
            if log_enabled!(Level::Trace) {
                trace!("Emulated panel:\n{}", bus.render_ascii());
            }
        });
    }

    let running = Arc::new(AtomicBool::new(true));

    let stop = Arc::clone(&running);
    tokio::spawn(async move {
        match signal_handler().await {
            Ok(()) => stop.store(false, Ordering::Relaxed),
            Err(e) => error!("Signal handlers unavailable: {}", e),
        }
    });

    // one dedicated thread owns the driver for its whole life
    let flag = Arc::clone(&running);
    let stats = tokio::task::spawn_blocking(move || manager.run(&flag))
        .await
        .context("DMD update loop panicked")?
        .context("DMD update loop failed")?;

    info!("Scanned {} frames ({} pattern steps)", stats.frames, stats.patterns);
    Ok(())
}

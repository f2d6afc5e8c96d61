// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! anglecast probe
//!
//! Drives synthetic angle traffic into a running hub and checks its health,
//! without a device or bridge attached.
//!
//! # Usage
//!
//! ```bash
//! # Is the hub up?
//! anglecast-probe health
//!
//! # One sample
//! anglecast-probe single --theta 15.5 --psi -22.3 --phi 45
//!
//! # Ten seconds of circular motion, five samples a second
//! anglecast-probe circular --duration 10 --interval 0.2
//!
//! # Random noise
//! anglecast-probe random --duration 5
//!
//! # Send a sample as a viewer over the WebSocket, three times
//! anglecast-probe websocket --theta 10 --count 3
//! ```

mod motion;

use anglecast::{AngleSample, HealthResponse, IngestReply, ServerMessage};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use motion::Circular;
use std::thread;
use std::time::{Duration, Instant};
use tungstenite::Message;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const WS_SEND_INTERVAL: Duration = Duration::from_millis(500);

/// anglecast probe
#[derive(Parser, Debug)]
#[command(name = "anglecast-probe")]
#[command(about = "Synthetic traffic and health checks for the anglecast hub")]
#[command(version)]
struct Args {
    /// Hub host
    #[arg(long, default_value = "localhost", global = true)]
    host: String,

    /// Hub port
    #[arg(long, default_value = "3000", global = true)]
    port: u16,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check hub health
    Health,

    /// Push one sample
    Single {
        /// Theta angle in degrees
        #[arg(long, default_value = "15.5", allow_negative_numbers = true)]
        theta: f64,

        /// Psi angle in degrees
        #[arg(long, default_value = "-22.3", allow_negative_numbers = true)]
        psi: f64,

        /// Phi angle in degrees
        #[arg(long, default_value = "45.0", allow_negative_numbers = true)]
        phi: f64,
    },

    /// Push a circular sweep
    Circular {
        /// Duration in seconds
        #[arg(long, default_value = "10")]
        duration: f64,

        /// Update interval in seconds
        #[arg(long, default_value = "0.1")]
        interval: f64,
    },

    /// Push random noise
    Random {
        /// Duration in seconds
        #[arg(long, default_value = "10")]
        duration: f64,

        /// Update interval in seconds
        #[arg(long, default_value = "0.1")]
        interval: f64,

        /// Largest angle magnitude in degrees
        #[arg(long, default_value = "30")]
        max_angle: f64,
    },

    /// Send a sample as a viewer over the WebSocket channel
    Websocket {
        /// Theta angle in degrees
        #[arg(long, default_value = "15.5", allow_negative_numbers = true)]
        theta: f64,

        /// Psi angle in degrees
        #[arg(long, default_value = "-22.3", allow_negative_numbers = true)]
        psi: f64,

        /// Phi angle in degrees
        #[arg(long, default_value = "45.0", allow_negative_numbers = true)]
        phi: f64,

        /// Number of times to send the sample
        #[arg(long, default_value = "1")]
        count: u32,
    },
}

struct Probe {
    client: reqwest::blocking::Client,
    base: String,
    ws_url: String,
}

impl Probe {
    fn new(host: &str, port: u16) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base: format!("http://{}:{}", host, port),
            ws_url: format!("ws://{}:{}/ws", host, port),
        })
    }

    fn health(&self) -> Result<HealthResponse, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/health", self.base))
            .send()?
            .error_for_status()?;
        Ok(resp.json()?)
    }

    /// Push one sample and print the outcome. Returns whether the hub accepted it.
    fn push(&self, sample: &AngleSample) -> bool {
        let url = format!("{}/api/angles", self.base);
        match self.client.post(&url).json(sample).send() {
            Ok(resp) => {
                let status = resp.status();
                match resp.json::<IngestReply>() {
                    Ok(reply) if reply.is_success() => true,
                    Ok(reply) => {
                        println!("  {} {} {}", "x".red(), status, reply.message);
                        false
                    }
                    Err(e) => {
                        println!("  {} {} ({})", "x".red(), status, e);
                        false
                    }
                }
            }
            Err(e) if e.is_connect() => {
                println!("  {} Could not reach {}", "x".red(), url);
                false
            }
            Err(e) => {
                println!("  {} {}", "x".red(), e);
                false
            }
        }
    }
}

fn main() {
    let args = Args::parse();

    println!();
    println!("{}", "anglecast probe".cyan().bold());
    println!("{}", "=".repeat(50));

    let result = match Probe::new(&args.host, args.port) {
        Ok(probe) => run(&probe, args.command),
        Err(e) => Err(e.into()),
    };

    println!("{}", "=".repeat(50));
    println!();

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(probe: &Probe, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Health => cmd_health(probe),
        Commands::Single { theta, psi, phi } => cmd_single(probe, theta, psi, phi),
        Commands::Circular { duration, interval } => {
            let (duration, interval) = timing(duration, interval)?;
            println!("Circular motion for {:.1}s", duration.as_secs_f64());
            println!();
            stream(probe, duration, interval, Circular::new(duration, interval))
        }
        Commands::Random {
            duration,
            interval,
            max_angle,
        } => {
            let (duration, interval) = timing(duration, interval)?;
            if !max_angle.is_finite() || max_angle < 0.0 {
                return Err(format!(
                    "--max-angle must be a non-negative number, got {}",
                    max_angle
                )
                .into());
            }
            println!("Random noise for {:.1}s", duration.as_secs_f64());
            println!();
            let mut rng = rand::thread_rng();
            let samples =
                std::iter::repeat_with(move || motion::random_sample(&mut rng, max_angle));
            stream(probe, duration, interval, samples)
        }
        Commands::Websocket {
            theta,
            psi,
            phi,
            count,
        } => cmd_websocket(probe, theta, psi, phi, count),
    }
}

fn cmd_health(probe: &Probe) -> Result<(), Box<dyn std::error::Error>> {
    let health = probe.health()?;

    let status = if health.is_ok() {
        health.status.green().bold()
    } else {
        health.status.red().bold()
    };

    println!("{}", "Hub Health".cyan().bold());
    println!("  Status:     {}", status);
    println!("  Clients:    {}", health.clients);
    if !health.version.is_empty() {
        println!("  Version:    {}", health.version);
    }
    println!("  Uptime:     {}s", health.uptime_secs);
    println!("  Broadcasts: {}", health.broadcasts);
    Ok(())
}

fn cmd_single(
    probe: &Probe,
    theta: f64,
    psi: f64,
    phi: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let sample = motion::sample(theta, psi, phi);
    println!("Sending one sample");
    print_sample(&sample);

    if probe.push(&sample) {
        println!("  {} Data received", "ok".green());
        Ok(())
    } else {
        Err("hub did not accept the sample".into())
    }
}

/// Join as a viewer and send the sample `count` times over the socket.
///
/// The hub re-broadcasts it to every viewer according to its echo policy.
fn cmd_websocket(
    probe: &Probe,
    theta: f64,
    psi: f64,
    phi: f64,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if count == 0 {
        return Err("--count must be at least 1".into());
    }

    let sample = motion::sample(theta, psi, phi);
    let payload = serde_json::to_string(&sample)?;

    println!("Connecting to {}", probe.ws_url);
    let (mut socket, _) = tungstenite::connect(probe.ws_url.as_str())?;

    let welcome = socket.read()?;
    match serde_json::from_str::<ServerMessage>(welcome.to_text()?) {
        Ok(ServerMessage::Connection { message }) => println!("  {} {}", "ok".green(), message),
        _ => println!("  {} Unexpected greeting: {}", "?".yellow(), welcome),
    }
    println!();

    for i in 0..count {
        if i > 0 {
            thread::sleep(WS_SEND_INTERVAL);
        }
        print_sample(&sample);
        socket.send(Message::Text(payload.clone()))?;
    }

    socket.close(None)?;
    // Drain echoes until the hub acknowledges the close.
    while socket.read().is_ok() {}

    println!();
    println!("Sent {} sample(s) over WebSocket", count);
    Ok(())
}

/// Push samples every `interval` until `duration` has elapsed.
fn stream(
    probe: &Probe,
    duration: Duration,
    interval: Duration,
    samples: impl Iterator<Item = AngleSample>,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let (mut sent, mut failed) = (0u64, 0u64);

    for sample in samples {
        if start.elapsed() >= duration {
            break;
        }
        print_sample(&sample);
        if probe.push(&sample) {
            sent += 1;
        } else {
            failed += 1;
        }
        thread::sleep(interval);
    }

    println!();
    println!("Sent {} sample(s), {} failed", sent, failed);
    Ok(())
}

fn timing(duration: f64, interval: f64) -> Result<(Duration, Duration), String> {
    let duration = Duration::try_from_secs_f64(duration)
        .map_err(|_| format!("--duration must be a non-negative number, got {}", duration))?;
    let interval = Duration::try_from_secs_f64(interval)
        .map_err(|_| format!("--interval must be a non-negative number, got {}", interval))?;
    if interval.is_zero() {
        return Err("--interval must be greater than zero".into());
    }
    Ok((duration, interval))
}

fn print_sample(sample: &AngleSample) {
    println!(
        "[{}] theta={:7.2}° psi={:7.2}° phi={:7.2}°  raw=({}, {}, {})",
        Local::now().format("%H:%M:%S"),
        sample.theta,
        sample.psi,
        sample.phi,
        sample.axraw,
        sample.ayraw,
        sample.azraw
    );
}

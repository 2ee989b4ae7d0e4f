//! Fairness soak check against a running wheel server.
//!
//! Connects one client, loads a preset, then spins repeatedly and verifies:
//! - every cycle of N spins hits each of the N options exactly once
//! - the resting rotation sits over the announced winner
//! - the first spin of a cycle never repeats the previous winner (N > 2)
//!
//! Usage: cargo run --bin spin_check -- [OPTIONS]
//!
//! Options:
//!   --cycles N       Full cycles to run (default: 20)
//!   --preset NAME    yesno | numbers | colors | food (default: colors)
//!   --duration MS    Spin duration to configure (default: 50)
//!   --url URL        Server URL (default: ws://127.0.0.1:9002/ws)

use futures_util::{SinkExt, StreamExt};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use wheel_shared::angle::locate;
use wheel_shared::protocol::{ClientMsg, PresetName, ServerMsg, SpinResultMsg};

type Ws =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Default)]
struct Report {
    spins: u64,
    cycles_ok: u64,
    cycles_bad: u64,
    locate_mismatches: u64,
    refill_repeats: u64,
    frames: u64,
}

async fn send(ws: &mut Ws, msg: &ClientMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    ws.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

async fn next_msg(ws: &mut Ws, timeout: Duration) -> Result<ServerMsg, String> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, ws.next()).await {
            Err(_) => return Err("timed out waiting for server".to_string()),
            Ok(None) => return Err("connection closed".to_string()),
            Ok(Some(Err(e))) => return Err(e.to_string()),
            Ok(Some(Ok(Message::Text(text)))) => {
                return serde_json::from_str(&text).map_err(|e| e.to_string());
            }
            Ok(Some(Ok(_))) => continue,
        }
    }
}

async fn wait_for_state(ws: &mut Ws) -> Result<usize, String> {
    loop {
        if let ServerMsg::WheelState(snapshot) = next_msg(ws, Duration::from_secs(5)).await? {
            return Ok(snapshot.items.len());
        }
    }
}

async fn spin_once(ws: &mut Ws, report: &mut Report) -> Result<SpinResultMsg, String> {
    send(ws, &ClientMsg::Spin).await?;
    loop {
        match next_msg(ws, Duration::from_secs(30)).await? {
            ServerMsg::Frame(_) => report.frames += 1,
            ServerMsg::SpinResult(result) => return Ok(result),
            _ => {}
        }
    }
}

fn parse_preset(name: &str) -> Option<PresetName> {
    match name {
        "yesno" => Some(PresetName::Yesno),
        "numbers" => Some(PresetName::Numbers),
        "colors" => Some(PresetName::Colors),
        "food" => Some(PresetName::Food),
        _ => None,
    }
}

async fn run(url: &str, preset: PresetName, cycles: u64, duration_ms: u32) -> Result<Report, String> {
    let (mut ws, _) = connect_async(url).await.map_err(|e| e.to_string())?;
    match next_msg(&mut ws, Duration::from_secs(5)).await? {
        ServerMsg::Welcome(w) => println!("Connected, server version {}", w.server_version),
        other => return Err(format!("expected welcome, got {:?}", other)),
    }

    send(&mut ws, &ClientMsg::SetSpinDuration { ms: duration_ms }).await?;
    wait_for_state(&mut ws).await?;
    send(&mut ws, &ClientMsg::LoadPreset { preset }).await?;
    let n = wait_for_state(&mut ws).await?;
    println!("Wheel has {} options", n);

    let mut report = Report::default();
    let mut previous: Option<u32> = None;

    for cycle in 0..cycles {
        let mut seen = HashSet::new();
        for i in 0..n {
            let result = spin_once(&mut ws, &mut report).await?;
            report.spins += 1;

            if locate(result.rotation, n) != Some(result.winner_index as usize) {
                report.locate_mismatches += 1;
                eprintln!(
                    "cycle {}: rotation {} does not point at #{}",
                    cycle, result.rotation, result.winner_index
                );
            }
            if i == 0 && n > 2 && previous == Some(result.winner_index) {
                report.refill_repeats += 1;
            }
            seen.insert(result.winner_index);
            previous = Some(result.winner_index);
        }
        if seen.len() == n {
            report.cycles_ok += 1;
        } else {
            report.cycles_bad += 1;
            eprintln!("cycle {}: only {} of {} options won", cycle, seen.len(), n);
        }
    }

    let _ = ws.close(None).await;
    Ok(report)
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut cycles: u64 = 20;
    let mut preset = PresetName::Colors;
    let mut duration_ms: u32 = 50;
    let mut url = "ws://127.0.0.1:9002/ws".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--cycles" => {
                i += 1;
                cycles = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(20);
            }
            "--preset" => {
                i += 1;
                preset = args
                    .get(i)
                    .and_then(|s| parse_preset(s))
                    .unwrap_or(PresetName::Colors);
            }
            "--duration" => {
                i += 1;
                duration_ms = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(50);
            }
            "--url" => {
                i += 1;
                url = args.get(i).cloned().unwrap_or(url);
            }
            _ => {}
        }
        i += 1;
    }

    println!("=== Wheel Spin Check ===");
    println!("Cycles: {}", cycles);
    println!("Preset: {:?}", preset);
    println!("Duration: {}ms", duration_ms);
    println!("URL: {}", url);
    println!();

    let start = Instant::now();
    let report = match run(&url, preset, cycles, duration_ms).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Spin check failed: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("=== Results ===");
    println!("Spins: {} in {:?}", report.spins, start.elapsed());
    println!("Frames received: {}", report.frames);
    println!("Complete cycles: {}", report.cycles_ok);
    println!("Incomplete cycles: {}", report.cycles_bad);
    println!("Locate mismatches: {}", report.locate_mismatches);
    println!("Repeats across refills: {}", report.refill_repeats);

    if report.cycles_bad > 0 || report.locate_mismatches > 0 || report.refill_repeats > 0 {
        std::process::exit(2);
    }
}

//! The `.seq` format: tick-indexed sensory events.
//!
//! ```text
//! # comment
//! DURATION 100
//! LOOP true
//! 0 S0 1.0
//! EVENT 1 S1 0.5
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::ids::NeuronId;
use crate::sequence::InputSequence;

/// Load a `.seq` file into a fresh [`InputSequence`]. A missing file is
/// fatal; malformed lines are logged and skipped.
pub fn load_seq(path: impl AsRef<Path>) -> Result<InputSequence> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|_| CoreError::missing_file(path.display().to_string()))?;
    Ok(parse(&text))
}

/// Write a sequence to a `.seq` file.
pub fn save_seq(sequence: &InputSequence, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, format(sequence)).map_err(CoreError::Io)?;
    Ok(())
}

/// Parse `.seq` text. `DURATION` is recorded but otherwise informational;
/// `LOOP` sets the wrap flag; bare `<TICK> <ID> <VALUE>` and `EVENT <TICK>
/// <ID> <VALUE>` both add an event. Malformed lines are logged and skipped.
pub fn parse(text: &str) -> InputSequence {
    let mut seq = InputSequence::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line_no = lineno + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["DURATION", n] => match n.parse::<u64>() {
                Ok(n) => seq.set_duration(Some(n)),
                Err(_) => log::warn!("{}", CoreError::parse_error(line_no, "DURATION: bad integer")),
            },
            ["LOOP", flag] => match parse_bool(flag) {
                Some(b) => seq.set_loop(b),
                None => log::warn!("{}", CoreError::parse_error(line_no, "LOOP: expected true/false/1/0")),
            },
            ["EVENT", tick, id, value] => add_event(&mut seq, line_no, tick, id, value),
            [tick, id, value] => add_event(&mut seq, line_no, tick, id, value),
            _ => log::warn!("{}", CoreError::parse_error(line_no, format!("unrecognized line: {line}"))),
        }
    }

    seq
}

fn add_event(seq: &mut InputSequence, line_no: usize, tick: &str, id: &str, value: &str) {
    let (tick, value) = match (tick.parse::<u64>(), value.parse::<f32>()) {
        (Ok(t), Ok(v)) => (t, v),
        _ => {
            log::warn!("{}", CoreError::parse_error(line_no, "EVENT: bad tick or value"));
            return;
        }
    };
    seq.add(tick, NeuronId::new(id), value);
}

fn parse_bool(token: &str) -> Option<bool> {
    match token {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Render a sequence back into `.seq` text, events in tick order.
pub fn format(sequence: &InputSequence) -> String {
    let mut out = String::new();
    if let Some(d) = sequence.duration() {
        let _ = writeln!(out, "DURATION {d}");
    }
    let _ = writeln!(out, "LOOP {}", sequence.loop_enabled());
    for (tick, id, value) in sequence.events_in_order() {
        let _ = writeln!(out, "EVENT {tick} {id} {value}");
    }
    out
}

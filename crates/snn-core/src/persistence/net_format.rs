//! The `.net` format: neurons, connections, and an optional default output.
//!
//! ```text
//! # comment
//! NEURON S0 1.0 1.0 0.0
//! NEURON O0 1.0 1.0 0.0 2
//! CONNECTION S0 O0 0.5
//! DEFAULT O0
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::ids::NeuronId;
use crate::network::Network;
use crate::neuron::NeuronSpec;

/// Load a `.net` file into a fresh [`Network`]. A missing file is fatal;
/// malformed lines are logged and skipped.
pub fn load_net(path: impl AsRef<Path>) -> Result<Network> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|_| CoreError::missing_file(path.display().to_string()))?;
    Ok(parse(&text))
}

/// Write a network to a `.net` file.
pub fn save_net(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, format(network)).map_err(CoreError::Io)?;
    Ok(())
}

/// Parse `.net` text into a network. Re-declaring a neuron id updates its
/// parameters rather than creating a duplicate; re-declaring a connection
/// overwrites its weight and delay. Out-of-range `leak` is clamped with a
/// warning rather than rejected.
pub fn parse(text: &str) -> Network {
    let mut order: Vec<NeuronId> = Vec::new();
    let mut specs: HashMap<NeuronId, NeuronSpec> = HashMap::new();
    let mut edges: Vec<(NeuronId, NeuronId, f64, u32)> = Vec::new();
    let mut default_output_id: Option<NeuronId> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line_no = lineno + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["NEURON", id, threshold, leak, resting, rest @ ..] if rest.len() <= 1 => {
                let (threshold, leak, resting) = match (threshold.parse(), leak.parse(), resting.parse()) {
                    (Ok(t), Ok(l), Ok(r)) => (t, l, r),
                    _ => {
                        log::warn!("{}", CoreError::parse_error(line_no, "NEURON: bad numeric field"));
                        continue;
                    }
                };
                let refractory = match rest.first() {
                    Some(tok) => match tok.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            log::warn!("{}", CoreError::parse_error(line_no, "NEURON: bad refractory"));
                            continue;
                        }
                    },
                    None => 0,
                };
                let id = NeuronId::new(*id);
                if !specs.contains_key(&id) {
                    order.push(id.clone());
                }
                specs.insert(id, NeuronSpec::clamped(threshold, leak, resting, refractory));
            }
            ["CONNECTION", from, to, weight, rest @ ..] if rest.len() <= 1 => {
                let weight: f64 = match weight.parse() {
                    Ok(w) => w,
                    Err(_) => {
                        log::warn!("{}", CoreError::parse_error(line_no, "CONNECTION: bad weight"));
                        continue;
                    }
                };
                let delay: u32 = match rest.first() {
                    Some(tok) => match tok.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            log::warn!("{}", CoreError::parse_error(line_no, "CONNECTION: bad delay"));
                            continue;
                        }
                    },
                    None => 1,
                };
                let from = NeuronId::new(*from);
                let to = NeuronId::new(*to);
                edges.retain(|(f, t, _, _)| !(f == &from && t == &to));
                edges.push((from, to, weight, delay.max(1)));
            }
            ["DEFAULT", id] => {
                default_output_id = Some(NeuronId::new(*id));
            }
            _ => {
                log::warn!("{}", CoreError::parse_error(line_no, format!("unrecognized line: {line}")));
            }
        }
    }

    let mut network = Network::new();
    for id in order {
        let spec = specs.remove(&id).expect("every ordered id has a spec");
        if network.add_neuron(id.clone(), spec).is_err() {
            log::warn!("duplicate NEURON id ignored during load: {id}");
        }
    }
    for (from, to, weight, delay) in edges {
        if network.add_edge(&from, &to, weight, delay).is_err() {
            log::warn!("CONNECTION references unknown neuron: {from} -> {to}");
        }
    }
    network.default_output_id = default_output_id;
    network
}

/// Render a network back into `.net` text, in canonical (insertion) order.
pub fn format(network: &Network) -> String {
    let mut out = String::new();
    for neuron in network.neurons() {
        let spec = neuron.spec();
        let _ = writeln!(
            out,
            "NEURON {} {} {} {} {}",
            neuron.id(),
            spec.threshold,
            spec.leak,
            spec.resting,
            spec.refractory
        );
    }
    for (from, to, weight) in network.get_weights() {
        let delay = network
            .edges_from(&from)
            .iter()
            .find(|e| e.to == to)
            .map(|e| e.delay)
            .unwrap_or(1);
        let _ = writeln!(out, "CONNECTION {from} {to} {weight} {delay}");
    }
    if let Some(id) = &network.default_output_id {
        let _ = writeln!(out, "DEFAULT {id}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_neurons_connections_and_default() {
        let text = "\
            # a tiny network\n\
            NEURON S0 1.0 1.0 0.0\n\
            NEURON O0 1.0 1.0 0.0 2\n\
            CONNECTION S0 O0 0.5\n\
            DEFAULT O0\n\
        ";
        let net = parse(text);
        let ids: Vec<_> = net.neuron_ids().cloned().collect();
        assert_eq!(ids, vec![NeuronId::new("S0"), NeuronId::new("O0")]);
        assert_eq!(net.weight(&NeuronId::new("S0"), &NeuronId::new("O0")), Some(0.5));
        assert_eq!(net.default_output_id, Some(NeuronId::new("O0")));
        assert_eq!(net.neuron(&NeuronId::new("O0")).unwrap().spec().refractory, 2);
    }

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        let text = "\n# comment\n   \nNEURON A 1.0 1.0 0.0\n";
        let net = parse(text);
        assert_eq!(net.neurons().len(), 1);
    }

    #[test]
    fn malformed_line_is_skipped_not_fatal() {
        let text = "NEURON A 1.0 1.0 0.0\nNEURON B not-a-number 1.0 0.0\nNEURON C 1.0 1.0 0.0\n";
        let net = parse(text);
        let ids: Vec<_> = net.neuron_ids().cloned().collect();
        assert_eq!(ids, vec![NeuronId::new("A"), NeuronId::new("C")]);
    }

    #[test]
    fn redeclaring_a_neuron_updates_params_in_place() {
        let text = "NEURON A 1.0 1.0 0.0\nNEURON B 1.0 1.0 0.0\nNEURON A 5.0 0.5 0.0\n";
        let net = parse(text);
        let ids: Vec<_> = net.neuron_ids().cloned().collect();
        assert_eq!(ids, vec![NeuronId::new("A"), NeuronId::new("B")]);
        assert_eq!(net.neuron(&NeuronId::new("A")).unwrap().spec().threshold, 5.0);
    }

    #[test]
    fn out_of_range_leak_is_clamped_not_rejected() {
        let text = "NEURON A 1.0 5.0 0.0\n";
        let net = parse(text);
        assert_eq!(net.neuron(&NeuronId::new("A")).unwrap().spec().leak, 1.0);
    }

    #[test]
    fn redeclaring_a_connection_overwrites_weight() {
        let text = "NEURON A 1.0 1.0 0.0\nNEURON B 1.0 1.0 0.0\nCONNECTION A B 1.0\nCONNECTION A B 9.0\n";
        let net = parse(text);
        assert_eq!(net.weight(&NeuronId::new("A"), &NeuronId::new("B")), Some(9.0));
        assert_eq!(net.edges_from(&NeuronId::new("A")).len(), 1);
    }

    #[test]
    fn connection_to_unknown_neuron_is_dropped() {
        let text = "NEURON A 1.0 1.0 0.0\nCONNECTION A B 1.0\n";
        let net = parse(text);
        assert!(net.edges_from(&NeuronId::new("A")).is_empty());
    }

    #[test]
    fn round_trip_preserves_neurons_params_and_weights() {
        let text = "NEURON S0 1.0 1.0 0.0\nNEURON O0 2.0 0.9 0.0 3\nCONNECTION S0 O0 0.25 2\nDEFAULT O0\n";
        let net = parse(text);
        let rendered = format(&net);
        let reloaded = parse(&rendered);

        assert_eq!(net.get_state(), reloaded.get_state());
        assert_eq!(net.get_weights(), reloaded.get_weights());
        assert_eq!(net.default_output_id, reloaded.default_output_id);
    }
}

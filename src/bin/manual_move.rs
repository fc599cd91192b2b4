//! Bring-up tool: type joint angles, watch the arm move. Talks through the
//! same link the orchestrator uses, so it doubles as a wire-format check.

use std::io::{self, BufRead, Write};

use clap::Parser;

use vex_pickbot::command_link::{CommandLink, JointCommand};
use vex_pickbot::transport_factory::TransportFactory;

#[derive(Parser, Debug)]
#[clap(name = "manual_move")]
struct Opts {
    #[clap(long, default_value = "/dev/ttyACM0")]
    port: String,

    #[clap(long)]
    fake_hw: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts: Opts = Opts::parse();

    let transport = TransportFactory::new_maybe_mock(opts.fake_hw).create(&opts.port)?;
    let mut link = CommandLink::new(transport);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let base = match prompt_f64(&mut lines, "base angle (blank to quit): ")? {
            Some(value) => value,
            None => break,
        };
        let shoulder = prompt_f64(&mut lines, "shoulder angle: ")?.unwrap_or(0.0);
        let elbow = prompt_f64(&mut lines, "elbow angle: ")?.unwrap_or(0.0);
        let is_pickup = prompt(&mut lines, "pickup? (t or blank): ")?
            .map(|s| s.starts_with('t'))
            .unwrap_or(false);

        let command = JointCommand { base_deg: base, shoulder_deg: shoulder, elbow_deg: elbow, is_pickup };
        println!("sending: {}", command.to_wire_line());
        match link.request(&command) {
            Ok(ack) => println!("brain says: {ack}"),
            Err(e) => {
                println!("no luck: {e}");
                break;
            }
        }
    }
    Ok(())
}

fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    text: &str,
) -> anyhow::Result<Option<String>> {
    print!("{text}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => {
            let line = line?.trim().to_lowercase();
            Ok(if line.is_empty() { None } else { Some(line) })
        }
        None => Ok(None),
    }
}

fn prompt_f64(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    text: &str,
) -> anyhow::Result<Option<f64>> {
    match prompt(lines, text)? {
        Some(line) => Ok(Some(line.parse()?)),
        None => Ok(None),
    }
}

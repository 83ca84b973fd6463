use anyhow::{anyhow, bail, Result};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use eventband::config::Config;
use eventband::controller::SelectionController;
use eventband::logging::{log, obj, v_str, Domain, Level};
use eventband::model::EventId;
use eventband::render::{ChartRenderer, StdoutRenderer};
use eventband::source::SourceKind;

/// One line of user input, the stand-in for a dropdown change.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Events,
    Event(EventId),
    Window(u32),
    Sector(Option<String>),
    State(Option<String>),
    Show,
    Quit,
}

/// `-` clears a filter; anything else is taken verbatim.
fn filter_value(rest: &str) -> Result<Option<String>> {
    match rest {
        "" => Err(anyhow!("missing value (use '-' to clear)")),
        "-" => Ok(None),
        v => Ok(Some(v.to_string())),
    }
}

fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    match word {
        "events" => Ok(Command::Events),
        "event" if !rest.is_empty() => Ok(Command::Event(EventId::new(rest))),
        "window" => rest
            .parse()
            .map(Command::Window)
            .map_err(|_| anyhow!("window must be a whole number of minutes, got '{}'", rest)),
        "sector" => Ok(Command::Sector(filter_value(rest)?)),
        "state" => Ok(Command::State(filter_value(rest)?)),
        "show" => Ok(Command::Show),
        "quit" | "exit" => Ok(Command::Quit),
        _ => bail!("unknown command '{}'", line),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let kind = SourceKind::from_config(&cfg);
    let source = kind.build(&cfg)?;
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("source", v_str(&format!("{:?}", kind))),
            ("base_url", v_str(&cfg.data_base_url)),
            ("default_window", json!(cfg.default_window)),
        ]),
    );

    let controller = SelectionController::new(source, StdoutRenderer, &cfg);
    // Failures are logged at the fetch boundary; the loop keeps running.
    let _ = controller.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(c) => c,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };
        let result = match command {
            Command::Events => {
                controller.renderer().show_events(controller.catalog().ids());
                continue;
            }
            Command::Show => {
                println!("{}", json!({ "view": "selection", "selection": controller.selection() }));
                continue;
            }
            Command::Quit => break,
            Command::Event(id) => controller.select_event(id).await,
            Command::Window(w) => controller.select_window(w).await,
            Command::Sector(s) => controller.select_sector(s).await,
            Command::State(s) => controller.select_state(s).await,
        };
        if let Ok(outcome) = result {
            log(
                Level::Debug,
                Domain::Selection,
                "outcome",
                obj(&[("outcome", v_str(&format!("{:?}", outcome)))]),
            );
        }
    }

    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}

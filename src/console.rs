
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::color::{NamedColor, RgbColor};
use crate::preferences::{self, PreferenceStore, Theme};
use crate::sync::{Input, Intent};

const HELP: &str = "\
commands:
  toggle <device>              flip power
  on <device> | off <device>   set power
  color <device> <value>       value: red|white|cyan|magenta|green|blue, R,G,B or rgb:R,G,B
  status                       show connection and every device
  theme <light|dark|auto|toggle>
  help";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Intent(Intent),
    Status,
    SetTheme(Theme),
    ToggleTheme,
    Help,
}

fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return Ok(None),
        ["help"] => Command::Help,
        ["status"] => Command::Status,
        ["toggle", id] => Command::Intent(Intent::Toggle(id.to_string())),
        ["on", id] => Command::Intent(Intent::SetPower(id.to_string(), true)),
        ["off", id] => Command::Intent(Intent::SetPower(id.to_string(), false)),
        ["color", id, value] => Command::Intent(parse_color(id, value)?),
        ["theme", "toggle"] => Command::ToggleTheme,
        ["theme", theme] => Command::SetTheme(theme.parse()?),
        _ => return Err(format!("unrecognized command '{}' (try 'help')", line.trim())),
    };
    Ok(Some(command))
}

fn parse_color(id: &str, value: &str) -> Result<Intent, String> {
    let id = id.to_string();
    if let Ok(name) = value.parse::<NamedColor>() {
        return Ok(Intent::SetNamedColor(id, name));
    }
    let color = if value.starts_with("rgb:") {
        RgbColor::from_payload(value)
    } else {
        RgbColor::from_components(value)
    }
    .map_err(|e| e.to_string())?;
    Ok(Intent::SetColor(id, color))
}

/// Read stdin until EOF. Device intents and `status` go to the dispatch
/// loop; theme changes are handled here.
pub async fn run(input_tx: mpsc::Sender<Input>, mut preferences: PreferenceStore) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Console input closed");
                return;
            }
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                return;
            }
        };

        let input = match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Intent(intent))) => Input::from(intent),
            Ok(Some(Command::Status)) => Input::Snapshot,
            Ok(Some(Command::SetTheme(theme))) => {
                if let Err(e) = preferences.set_theme(theme) {
                    warn!("Failed to save theme: {}", e);
                }
                println!("theme: {}", describe_theme(&preferences));
                continue;
            }
            Ok(Some(Command::ToggleTheme)) => {
                if let Err(e) = preferences.toggle_theme(preferences::system_prefers_dark()) {
                    warn!("Failed to save theme: {}", e);
                }
                println!("theme: {}", describe_theme(&preferences));
                continue;
            }
            Ok(Some(Command::Help)) => {
                println!("{HELP}");
                continue;
            }
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        if input_tx.send(input).await.is_err() {
            return;
        }
    }
}

fn describe_theme(preferences: &PreferenceStore) -> String {
    let theme = preferences.theme();
    match theme {
        Theme::Auto => format!(
            "auto ({})",
            theme.resolve(preferences::system_prefers_dark()).as_str()
        ),
        _ => theme.as_str().to_string(),
    }
}

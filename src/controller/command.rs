//! Inbound commands and their textual form

use std::fmt;
use std::str::FromStr;

use crate::effects::Preset;
use crate::error::PlayerError;

/// One discrete request from the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    LoadTrack(String),
    PlayPause,
    SeekTo(u64),
    ChangeBand { index: usize, level: f32 },
    Advance,
    Retreat,
    StartPolling,
    ApplyPreset(Preset),
    Suspend,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadTrack(_) => "load",
            Command::PlayPause => "play-pause",
            Command::SeekTo(_) => "seek",
            Command::ChangeBand { .. } => "band",
            Command::Advance => "next",
            Command::Retreat => "prev",
            Command::StartPolling => "poll",
            Command::ApplyPreset(_) => "preset",
            Command::Suspend => "suspend",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::LoadTrack(id) => write!(f, "load {id}"),
            Command::SeekTo(ms) => write!(f, "seek {ms}"),
            Command::ChangeBand { index, level } => write!(f, "band {index} {level}"),
            Command::ApplyPreset(preset) => write!(f, "preset {preset}"),
            other => f.write_str(other.name()),
        }
    }
}

fn invalid(msg: impl Into<String>) -> PlayerError {
    PlayerError::InvalidCommand(msg.into())
}

fn arg<'a>(args: &mut impl Iterator<Item = &'a str>, verb: &str, what: &str) -> Result<&'a str, PlayerError> {
    args.next().ok_or_else(|| invalid(format!("`{verb}` needs {what}")))
}

impl FromStr for Command {
    type Err = PlayerError;

    /// Parses `load <id>`, `play-pause`, `seek <ms>`, `band <index> <level>`,
    /// `next`, `prev`, `poll`, `preset <name>` and `suspend`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| invalid("empty command"))?;

        let command = match verb.to_ascii_lowercase().as_str() {
            "load" => Command::LoadTrack(arg(&mut words, verb, "a track id")?.to_string()),
            "play-pause" | "toggle" => Command::PlayPause,
            "seek" => {
                let ms = arg(&mut words, verb, "a position in ms")?;
                Command::SeekTo(ms.parse().map_err(|_| invalid(format!("bad position '{ms}'")))?)
            }
            "band" => {
                let index = arg(&mut words, verb, "a band index")?;
                let level = arg(&mut words, verb, "a level in millibels")?;
                let index = index.parse().map_err(|_| invalid(format!("bad band index '{index}'")))?;
                let level: f32 = level.parse().map_err(|_| invalid(format!("bad band level '{level}'")))?;
                if !level.is_finite() {
                    return Err(invalid(format!("bad band level '{level}'")));
                }
                Command::ChangeBand { index, level }
            }
            "next" => Command::Advance,
            "prev" | "previous" => Command::Retreat,
            "poll" => Command::StartPolling,
            "preset" => Command::ApplyPreset(arg(&mut words, verb, "a preset name")?.parse()?),
            "suspend" => Command::Suspend,
            _ => return Err(invalid(format!("unknown command '{verb}'"))),
        };

        if let Some(extra) = words.next() {
            return Err(invalid(format!("unexpected argument '{extra}' to `{verb}`")));
        }
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_verb() {
        let cases = [
            ("load intro", Command::LoadTrack("intro".into())),
            ("play-pause", Command::PlayPause),
            ("seek 1500", Command::SeekTo(1_500)),
            ("band 2 -300", Command::ChangeBand { index: 2, level: -300.0 }),
            ("next", Command::Advance),
            ("prev", Command::Retreat),
            ("poll", Command::StartPolling),
            ("preset jazz", Command::ApplyPreset(Preset::Jazz)),
            ("  SUSPEND ", Command::Suspend),
        ];
        for (line, expected) in cases {
            assert_eq!(line.parse::<Command>().unwrap(), expected, "{line}");
        }
    }

    #[test]
    fn malformed_lines_are_rejected() {
        for line in ["", "load", "seek -4", "seek soon", "band 1", "band x 3", "band 1 NaN", "preset metal", "dance", "next now"] {
            assert!(
                matches!(line.parse::<Command>(), Err(PlayerError::InvalidCommand(_))),
                "{line:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let command = Command::ChangeBand { index: 1, level: 250.0 };
        assert_eq!(command.to_string().parse::<Command>().unwrap(), command);
    }
}

use regex::Regex;

/// A recognized spoken command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// "ask <name> ... to join" — start the SMS join workflow
    Join { name: String },

    /// "ask|tell <name> <free text>" — relay a message over SMS
    Relay {
        verb: RelayVerb,
        name: String,
        text: String,
    },

    /// "repeat that" / "say that again"
    Repeat,

    /// "what can you do"
    Capabilities,
}

/// How a relayed message is phrased to the member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayVerb {
    Ask,
    Tell,
}

/// Matches final transcripts against the command patterns, first match wins.
///
/// Precedence is a contract: Join is checked before Relay so that
/// "ask Dave to join" is never mis-read as relaying the message "to join".
pub struct CommandParser {
    join: Regex,
    relay: Regex,
    repeat: Regex,
    capabilities: Regex,
}

impl CommandParser {
    pub fn new(wake_word: &str) -> Self {
        let wake = regex::escape(wake_word);
        Self {
            join: Regex::new(&format!(r"(?i){wake}.*\bask ([a-z]+)[\s?,.]+to join")).unwrap(),
            relay: Regex::new(&format!(r"(?i){wake}.*\b(ask|tell)[\s?,.]+([a-z]+)[\s?,.](.*)$"))
                .unwrap(),
            repeat: Regex::new(&format!(r"(?i){wake}.*(repeat that|say that again)")).unwrap(),
            capabilities: Regex::new(&format!(r"(?i){wake}[\s,]*what can you do")).unwrap(),
        }
    }

    /// Map a final transcript to a command, or `None` if nothing matched.
    pub fn parse(&self, transcript: &str) -> Option<Command> {
        if let Some(caps) = self.join.captures(transcript) {
            return Some(Command::Join {
                name: caps[1].to_string(),
            });
        }

        if let Some(caps) = self.relay.captures(transcript) {
            let verb = if caps[1].eq_ignore_ascii_case("tell") {
                RelayVerb::Tell
            } else {
                RelayVerb::Ask
            };
            return Some(Command::Relay {
                verb,
                name: caps[2].to_string(),
                text: caps[3].trim().to_string(),
            });
        }

        if self.repeat.is_match(transcript) {
            return Some(Command::Repeat);
        }

        if self.capabilities.is_match(transcript) {
            return Some(Command::Capabilities);
        }

        None
    }
}

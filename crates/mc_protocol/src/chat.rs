//! Chat components: the recursive JSON text format used for disconnect
//! reasons, chat messages, and the player-list header/footer.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::{Decode, Encode, VarInt};

/// A single chat component node. Minecraft's chat JSON is a tree of these —
/// `extra` children inherit formatting from their parent unless overridden.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "with")]
    pub with: Vec<ChatComponent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ChatComponent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlined: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfuscated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "clickEvent")]
    pub click_event: Option<ClickEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "hoverEvent")]
    pub hover_event: Option<HoverEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub action: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoverEvent {
    pub action: String,
    pub value: String,
}

impl ChatComponent {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            text: Some(s.into()),
            ..Default::default()
        }
    }

    pub fn translate(key: impl Into<String>, with: Vec<ChatComponent>) -> Self {
        Self {
            translate: Some(key.into()),
            with,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// A run-command click-event wrapped component, used by the `/connect
    /// <id>` profile-listing rows.
    pub fn run_command(text: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            click_event: Some(ClickEvent {
                action: "run_command".to_owned(),
                value: command.into(),
            }),
            ..Default::default()
        }
    }

    /// Flattens this component tree (`text` plus every `extra` child,
    /// recursively) into plain text, ignoring formatting and translation
    /// keys. Used for queue-footer regex matching and the "Connecting to the
    /// server" sentinel, both of which only care about literal text.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain_text(&mut out);
        out
    }

    fn write_plain_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.extra {
            child.write_plain_text(out);
        }
    }
}

impl From<&str> for ChatComponent {
    fn from(s: &str) -> Self {
        ChatComponent::text(s)
    }
}

impl From<String> for ChatComponent {
    fn from(s: String) -> Self {
        ChatComponent::text(s)
    }
}

/// Chat components are encoded on the wire as a VarInt-length-prefixed JSON
/// string.
impl Encode for ChatComponent {
    fn encode(&self, mut w: impl Write) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        VarInt(json.len() as i32).encode(&mut w)?;
        w.write_all(json.as_bytes())?;
        Ok(())
    }
}

impl Decode for ChatComponent {
    fn decode(r: &mut &[u8]) -> anyhow::Result<Self> {
        let len = VarInt::decode(r)?.0;
        anyhow::ensure!(len >= 0, "chat component has negative length");
        let len = len as usize;
        anyhow::ensure!(r.len() >= len, "not enough bytes to decode chat component");
        let (data, rest) = r.split_at(len);
        let component = serde_json::from_slice(data)?;
        *r = rest;
        Ok(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_nested_component() {
        let component = ChatComponent {
            text: Some("queue: ".to_owned()),
            extra: vec![ChatComponent::text("42").with_color("gold")],
            ..Default::default()
        };

        let mut buf = Vec::new();
        component.encode(&mut buf).unwrap();

        let mut slice = buf.as_slice();
        let decoded = ChatComponent::decode(&mut slice).unwrap();
        assert_eq!(decoded, component);
        assert!(slice.is_empty());
    }

    #[test]
    fn plain_text_flattens_extras() {
        let component = ChatComponent {
            text: Some("queue: ".to_owned()),
            extra: vec![
                ChatComponent::text("42"),
                ChatComponent::text(", estimated time: 1h 30m"),
            ],
            ..Default::default()
        };

        assert_eq!(component.plain_text(), "queue: 42, estimated time: 1h 30m");
    }

    #[test]
    fn translate_key_round_trips() {
        let component = ChatComponent::translate(
            "multiplayer.disconnect.outdated_client",
            vec![ChatComponent::text("1.12.2")],
        );

        let json = serde_json::to_string(&component).unwrap();
        assert!(json.contains("multiplayer.disconnect.outdated_client"));

        let decoded: ChatComponent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, component);
    }
}

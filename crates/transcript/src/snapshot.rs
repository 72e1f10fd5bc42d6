//! Render the current tree as markup or as a compact text outline.

use askama::Template;

use crate::error::TranscriptError;
use crate::model::{BlockHeader, DisplaySettings, Message, MessageNode, PresenceItem, ReadMarker};
use crate::timestamp::TimestampLabel;
use crate::tree::{NodeId, NodeKind, VisualTree};

#[derive(Template)]
#[template(path = "transcript.html")]
struct TranscriptTemplate {
    style: String,
    items: Vec<String>,
}

#[derive(Template)]
#[template(path = "block.html")]
struct BlockTemplate<'a> {
    header: &'a BlockHeader,
    messages: Vec<String>,
}

#[derive(Template)]
#[template(path = "message.html")]
struct MessageTemplate<'a> {
    message: &'a Message,
    compact: bool,
    hidden: &'a str,
    shown: &'a str,
}

impl<'a> MessageTemplate<'a> {
    fn new(node: &'a MessageNode) -> Self {
        let (compact, hidden, shown) = match &node.label {
            Some(TimestampLabel::Full { text }) => (false, "", text.as_str()),
            Some(TimestampLabel::Compact { hidden, shown }) => (true, hidden.as_str(), shown.as_str()),
            None => (false, "", ""),
        };
        Self { message: &node.message, compact, hidden, shown }
    }
}

#[derive(Template)]
#[template(path = "marker.html")]
struct MarkerTemplate<'a> {
    marker: &'a ReadMarker,
}

#[derive(Template)]
#[template(path = "presence.html")]
struct PresenceTemplate<'a> {
    items: Vec<&'a PresenceItem>,
}

/// HTML markup of the whole transcript, shaped like the host document.
///
/// Message bodies are already markup and are inserted as-is; everything else
/// is escaped by the templates.
pub fn render_markup(tree: &VisualTree, settings: &DisplaySettings) -> Result<String, TranscriptError> {
    let mut items = Vec::new();
    for id in tree.top_level() {
        let item = match tree.get(id) {
            Some(NodeKind::Block(header)) => render_block(tree, id, header)?,
            Some(NodeKind::Marker(marker)) => MarkerTemplate { marker }.render()?,
            Some(NodeKind::Presence) => {
                let items = tree.children(Some(id)).filter_map(|child| tree.presence_item(child)).collect();
                PresenceTemplate { items }.render()?
            }
            _ => continue,
        };
        items.push(item);
    }

    let style = [("font-family", &settings.font_family), ("font-size", &settings.font_size)]
        .into_iter()
        .filter_map(|(property, value)| value.as_ref().map(|value| format!("{}: {}", property, value)))
        .collect::<Vec<_>>()
        .join("; ");

    Ok(TranscriptTemplate { style, items }.render()?)
}

fn render_block(tree: &VisualTree, id: NodeId, header: &BlockHeader) -> Result<String, TranscriptError> {
    let messages = tree
        .children(Some(id))
        .filter_map(|child| tree.message(child))
        .map(|node| MessageTemplate::new(node).render())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BlockTemplate { header, messages }.render()?)
}

/// One line per top-level node:
///
/// ```text
/// block romeo@montague.example: m1 m2
/// marker juliet@capulet.example
/// presence: +nurse@verona.example -tybalt@capulet.example
/// ```
pub fn render_outline(tree: &VisualTree) -> String {
    tree.top_level()
        .filter_map(|id| match tree.get(id)? {
            NodeKind::Block(header) => {
                let uids: Vec<&str> = tree
                    .children(Some(id))
                    .filter_map(|child| tree.message(child))
                    .map(|node| node.message.uid.as_str())
                    .collect();
                Some(format!("block {}: {}", header.sender_id, uids.join(" ")))
            }
            NodeKind::Marker(marker) => Some(format!("marker {}", marker.sender_id)),
            NodeKind::Presence => {
                let items: Vec<String> = tree
                    .children(Some(id))
                    .filter_map(|child| tree.presence_item(child))
                    .map(|item| format!("{}{}", if item.is_join { '+' } else { '-' }, item.sender_id))
                    .collect();
                Some(format!("presence: {}", items.join(" ")))
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attachment;
    use chrono::{TimeZone, Utc};

    fn sample_tree() -> VisualTree {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut tree = VisualTree::new();

        let message = Message::new("m1", "romeo", ts)
            .with_display_name("Romeo <3")
            .with_colors("#a00", "#fee")
            .with_body("<p>hello</p>")
            .with_attachment(Attachment::Frame { url: "https://example.com/?a=1&b=2".to_string() });
        let header = BlockHeader::from_message(&message, "avatar:///?peer=romeo#".to_string());
        let mut node = MessageNode::new(message);
        node.label = Some(TimestampLabel::Compact { hidden: "10:00".to_string(), shown: ":00".to_string() });

        let block = tree.create(NodeKind::Block(header));
        tree.append(block, None);
        let msg = tree.create(NodeKind::Message(node));
        tree.append(msg, Some(block));

        let marker = tree.create(NodeKind::Marker(ReadMarker {
            sender_id: "juliet".to_string(),
            display_name: "Juliet".to_string(),
            avatar: "avatar:///?peer=juliet#".to_string(),
        }));
        tree.append(marker, None);

        let presence = tree.create(NodeKind::Presence);
        tree.append(presence, None);
        let join = tree.create(NodeKind::PresenceItem(PresenceItem::join("nurse", "Nurse", ts)));
        tree.append(join, Some(presence));
        let part = tree.create(NodeKind::PresenceItem(PresenceItem::part("tybalt", "Tybalt", ts)));
        tree.append(part, Some(presence));
        tree
    }

    #[test]
    fn test_outline() {
        let tree = sample_tree();
        assert_eq!(render_outline(&tree), "block romeo: m1\nmarker juliet\npresence: +nurse -tybalt");
        assert_eq!(render_outline(&VisualTree::new()), "");
    }

    #[test]
    fn test_markup_escapes_text_but_not_bodies() {
        let markup = render_markup(&sample_tree(), &DisplaySettings::default()).unwrap();

        assert!(markup.starts_with("<div class=\"transcript\">\n"));
        assert!(markup.contains("<div class=\"from\" style=\"color: #a00\">Romeo &lt;3</div>"));
        assert!(markup.contains("<div class=\"body\"><p>hello</p></div>"));
        assert!(markup.contains("<span class=\"visual-hidden\">10:00</span><span>:00</span>"));
        assert!(markup.contains("<iframe class=\"attachment\" src=\"https://example.com/?a=1&amp;b=2\"></iframe>"));
        assert!(markup.contains("class=\"read-marker\" data-from=\"juliet\""));
        assert!(markup.contains("class=\"presence part\" data-from=\"tybalt\""));
    }

    #[test]
    fn test_markup_carries_font_settings() {
        let settings = DisplaySettings { font_family: Some("serif".to_string()), font_size: Some("12pt".to_string()) };
        let markup = render_markup(&VisualTree::new(), &settings).unwrap();
        assert_eq!(markup, "<div class=\"transcript\" style=\"font-family: serif; font-size: 12pt\">\n</div>");

        let markup = render_markup(&VisualTree::new(), &DisplaySettings::default()).unwrap();
        assert_eq!(markup, "<div class=\"transcript\">\n</div>");
    }

    #[test]
    fn test_markup_escapes_attributes() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut tree = VisualTree::new();
        let message = Message::new("m\"1", "<script>", ts).with_body("<b>kept</b>");
        let header = BlockHeader::from_message(&message, "avatar:///?peer=x&nick=y#".to_string());
        let block = tree.create(NodeKind::Block(header));
        tree.append(block, None);
        let msg = tree.create(NodeKind::Message(MessageNode::new(message)));
        tree.append(msg, Some(block));

        let markup = render_markup(&tree, &DisplaySettings::default()).unwrap();
        assert!(!markup.contains("<script>"));
        assert!(markup.contains("data-from=\"&lt;script&gt;\""));
        assert!(!markup.contains("data-uid=\"m\"1\""));
        assert!(markup.contains("src=\"avatar:///?peer=x&amp;nick=y#\""));
        assert!(markup.contains("<div class=\"body\"><b>kept</b></div>"));
        assert!(markup.contains("<div class=\"timestamp\"></div>"));
    }
}

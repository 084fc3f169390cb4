//! Element path at a buffer offset
//!
//! Replays the token stream up to the offset, keeping one entry per open
//! element, then renders the entries as `/a/b[2]/c[id=7]/@attr`.

use std::collections::HashMap;

use super::{FormatterParams, PathMode};
use crate::core::token::TokenKind;
use crate::core::Parser;

/// One open element
#[derive(Debug, Default)]
struct PathEntry<'a> {
    name: &'a str,
    /// Position among same-named siblings, 0 when not counted
    position: usize,
    /// Captured identity attributes as (name, unquoted value)
    identities: Vec<(&'a str, &'a str)>,
    /// Attribute name seen last, until the opening tag ends
    pending_attr: &'a str,
}

pub(crate) fn current_path(
    parser: &mut Parser<'_>,
    params: &FormatterParams,
    offset: usize,
    mode: PathMode,
) -> String {
    parser.set_register_linebreaks(false);

    let mut path: Vec<PathEntry<'_>> = Vec::new();
    // Child-name counts, one layer per open element
    let mut siblings: Vec<HashMap<&str, usize>> = Vec::new();
    let mut capture_value = false;

    loop {
        let token = parser.parse_next();
        if token.kind == TokenKind::EndOfFile || token.offset >= offset {
            break;
        }

        match token.kind {
            TokenKind::TagOpening => {
                let name = token.name();
                let position = match siblings.last_mut() {
                    Some(counts) => {
                        let count = counts.entry(name).or_insert(0);
                        *count += 1;
                        *count
                    }
                    None => 0,
                };
                siblings.push(HashMap::new());
                path.push(PathEntry {
                    name,
                    position,
                    ..PathEntry::default()
                });
                capture_value = false;
            }
            TokenKind::TagClosingEnd | TokenKind::TagSelfClosingEnd => {
                path.pop();
                siblings.pop();
                capture_value = false;
            }
            TokenKind::AttrName => {
                capture_value = mode.contains(PathMode::WITH_ID_ATTRIBUTES)
                    && params.is_identity_attribute(token.text);
                if let Some(entry) = path.last_mut() {
                    entry.pending_attr = token.text;
                }
            }
            TokenKind::AttrValue => {
                if capture_value {
                    if let Some(entry) = path.last_mut() {
                        entry.identities.push((entry.pending_attr, token.unquoted()));
                    }
                }
                capture_value = false;
            }
            TokenKind::TagOpeningEnd => {
                if let Some(entry) = path.last_mut() {
                    entry.pending_attr = "";
                }
                capture_value = false;
            }
            TokenKind::DeclarationBeg
            | TokenKind::DeclarationEnd
            | TokenKind::DeclarationSelfClosing
            | TokenKind::Instruction => {
                if !path.is_empty() {
                    tracing::trace!(depth = path.len(), "path reset by declaration");
                }
                path.clear();
                siblings.clear();
                capture_value = false;
            }
            _ => {}
        }
    }

    render(&path, params, mode)
}

fn render(path: &[PathEntry<'_>], params: &FormatterParams, mode: PathMode) -> String {
    let embed_values = params.dump_id_attribute_values && mode.contains(PathMode::WITH_ID_VALUES);
    let mut out = String::new();

    for entry in path {
        out.push('/');
        out.push_str(display_name(entry.name, mode));

        let mut identity = String::new();
        if mode.contains(PathMode::WITH_ID_ATTRIBUTES) {
            for (key, value) in entry.identities.iter().filter(|(_, value)| !value.is_empty()) {
                if !identity.is_empty() {
                    identity.push_str(if embed_values { " " } else { " | " });
                }
                identity.push_str(local_name(key));
                if embed_values {
                    identity.push('=');
                    identity.push_str(value);
                }
            }
        }

        if !identity.is_empty() {
            out.push('[');
            out.push_str(&identity);
            out.push(']');
        } else if mode.contains(PathMode::WITH_NODE_INDEX) && entry.position > 0 {
            out.push('[');
            out.push_str(&entry.position.to_string());
            out.push(']');
        }

        if !entry.pending_attr.is_empty() {
            out.push_str("/@");
            out.push_str(display_name(entry.pending_attr, mode));
        }
    }

    out
}

/// Name without its namespace prefix
fn local_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

fn display_name(name: &str, mode: PathMode) -> &str {
    if mode.contains(PathMode::WITH_NAMESPACE) {
        name
    } else {
        local_name(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::format::{FormatterParams, PathMode, XmlFormatter};
    use rstest::rstest;

    const IDS: PathMode = PathMode::from_bits(
        PathMode::WITH_ID_ATTRIBUTES.bits() | PathMode::WITH_ID_VALUES.bits(),
    );

    fn path_at(input: &str, marker: &str, mode: PathMode) -> String {
        let offset = input.find(marker).expect("marker present");
        XmlFormatter::new(input).current_path(offset, mode)
    }

    #[test]
    fn test_simple_path() {
        let input = "<library><book>text</book></library>";
        let offset = "<library><book>".len();
        assert_eq!(XmlFormatter::new(input).current_path(offset, PathMode::NONE), "/library/book");
    }

    #[test]
    fn test_node_index() {
        let input = "<list><item/><item/><item/></list>";
        let offset = input.rfind("item").expect("third item");
        assert_eq!(
            XmlFormatter::new(input).current_path(offset + 2, PathMode::WITH_NODE_INDEX),
            "/list/item[3]"
        );
    }

    #[test]
    fn test_identity_value() {
        assert_eq!(path_at("<user id=\"42\">content</user>", "tent", IDS), "/user[id=42]");
    }

    #[test]
    fn test_identity_names_only() {
        let input = "<user id=\"42\" xml:id='u42'>content</user>";
        assert_eq!(path_at(input, "tent", PathMode::WITH_ID_ATTRIBUTES), "/user[id | id]");

        let params = FormatterParams {
            dump_id_attribute_values: false,
            ..FormatterParams::default()
        };
        let offset = input.find("tent").expect("marker present");
        assert_eq!(XmlFormatter::with_params(input, params).current_path(offset, IDS), "/user[id | id]");
    }

    #[test]
    fn test_identity_values_joined_and_empty_skipped() {
        let input = "<r><user ID='7' x:id='' ns:Id=\"b\">|</user></r>";
        assert_eq!(path_at(input, "|", IDS), "/r/user[ID=7 Id=b]");
    }

    #[test]
    fn test_identity_wins_over_node_index() {
        let input = "<r><e id='a'/><e id='b'>|</e><e>|</e></r>";
        let mode = IDS | PathMode::WITH_NODE_INDEX;
        assert_eq!(path_at(input, "|", mode), "/r/e[id=b]");
        let offset = input.rfind('|').expect("marker present");
        assert_eq!(XmlFormatter::new(input).current_path(offset, mode), "/r/e[3]");
    }

    #[test]
    fn test_custom_identity_attributes() {
        let params = FormatterParams {
            identity_attributes: vec!["name".to_string(), "key".to_string()],
            ..FormatterParams::default()
        };
        let input = "<cfg><entry key=\"port\" id=\"x\">|</entry></cfg>";
        let offset = input.find('|').expect("marker present");
        assert_eq!(XmlFormatter::with_params(input, params).current_path(offset, IDS), "/cfg/entry[key=port]");
    }

    #[rstest]
    #[case::namespace_stripped(PathMode::NONE, "/root/item/@attr")]
    #[case::namespace_kept(PathMode::WITH_NAMESPACE, "/a:root/b:item/@c:attr")]
    fn test_pending_attribute(#[case] mode: PathMode, #[case] expected: &str) {
        let input = "<a:root><b:item c:attr=\"value\"/></a:root>";
        assert_eq!(path_at(input, "alue", mode), expected);
    }

    #[test]
    fn test_attribute_forgotten_after_tag_end() {
        assert_eq!(path_at("<a x='1'>|</a>", "|", PathMode::NONE), "/a");
    }

    #[test]
    fn test_closed_elements_are_popped() {
        let input = "<r><a><b/></a><c>|</c></r>";
        assert_eq!(path_at(input, "|", PathMode::WITH_NODE_INDEX), "/r/c[1]");
    }

    #[test]
    fn test_sibling_counts_are_per_parent() {
        let input = "<r><g><i/><i/></g><g><i/>|</g></r>";
        assert_eq!(path_at(input, "|", PathMode::WITH_NODE_INDEX), "/r/g[2]");
        let offset = input.rfind("<i").expect("marker present") + 1;
        assert_eq!(XmlFormatter::new(input).current_path(offset, PathMode::WITH_NODE_INDEX), "/r/g[2]/i[1]");
    }

    #[test]
    fn test_declaration_resets_path() {
        let input = "<?xml version=\"1.0\"?>\n<!DOCTYPE r>\n<r><a>|</a></r>";
        assert_eq!(path_at(input, "|", PathMode::NONE), "/r/a");
        assert_eq!(path_at("<a><!DOCTYPE x><b>|</b></a>", "|", PathMode::NONE), "/b");
    }

    #[test]
    fn test_offset_past_end_and_at_start() {
        let input = "<a><b>";
        assert_eq!(XmlFormatter::new(input).current_path(100, PathMode::NONE), "/a/b");
        assert_eq!(XmlFormatter::new(input).current_path(0, PathMode::NONE), "");
    }

    #[test]
    fn test_stray_closing_tag_is_harmless() {
        assert_eq!(path_at("</x></y><a>|</a>", "|", PathMode::WITH_NODE_INDEX), "/a");
    }
}

//! Formatter configuration

use std::ops::BitOr;

/// Parameters shared by every formatting pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterParams {
    /// One indentation unit
    pub indent: String,
    /// End-of-line sequence written by the pretty printer
    pub eol: String,
    /// Deepest rendered indentation; deeper nesting reuses it. `0` disables the clamp.
    pub max_indent_level: usize,
    /// Suppress inter-tag whitespace only where dropping it cannot change meaning
    pub ensure_conformity: bool,
    /// Collapse `<a></a>` into `<a/>`
    pub auto_close_tags: bool,
    /// Put each attribute after the first on its own aligned line
    pub indent_attributes: bool,
    /// Keep the original text and line structure, only fix indentation
    pub indent_only: bool,
    /// Honor `xml:space="preserve"`
    pub apply_space_preserve: bool,
    /// Embed identity attribute values in paths (`[id=42]` rather than `[id]`)
    pub dump_id_attribute_values: bool,
    /// Attribute names treated as element identity by `current_path`
    pub identity_attributes: Vec<String>,
}

impl Default for FormatterParams {
    fn default() -> Self {
        FormatterParams {
            indent: "  ".to_string(),
            eol: "\n".to_string(),
            max_indent_level: 255,
            ensure_conformity: true,
            auto_close_tags: false,
            indent_attributes: false,
            indent_only: false,
            apply_space_preserve: false,
            dump_id_attribute_values: true,
            identity_attributes: vec!["id".to_string()],
        }
    }
}

impl FormatterParams {
    /// True when `attr` names an identity attribute: same name ignoring case,
    /// or a namespace-qualified name whose local part matches (`xml:id`).
    pub fn is_identity_attribute(&self, attr: &str) -> bool {
        self.identity_attributes.iter().any(|ident| {
            if attr.eq_ignore_ascii_case(ident) {
                return true;
            }
            let Some(colon) = attr.len().checked_sub(ident.len() + 1) else {
                return false;
            };
            attr.as_bytes()[colon] == b':'
                && attr
                    .get(colon + 1..)
                    .is_some_and(|local| local.eq_ignore_ascii_case(ident))
        })
    }
}

/// What `current_path` includes in the path it builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PathMode(u32);

impl PathMode {
    pub const NONE: PathMode = PathMode(0);
    /// Keep namespace prefixes on element and attribute names
    pub const WITH_NAMESPACE: PathMode = PathMode(1);
    /// Append `[n]` with the element's position among same-named siblings
    pub const WITH_NODE_INDEX: PathMode = PathMode(2);
    /// Append identity attributes as `[name=value]`
    pub const WITH_ID_ATTRIBUTES: PathMode = PathMode(4);
    /// Embed identity attribute values rather than listing names only
    pub const WITH_ID_VALUES: PathMode = PathMode(8);

    const ALL: u32 = 0b1111;

    /// Build from raw bits; unknown bits are ignored
    pub const fn from_bits(bits: u32) -> Self {
        PathMode(bits & Self::ALL)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: PathMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PathMode {
    type Output = PathMode;

    fn bitor(self, rhs: PathMode) -> PathMode {
        PathMode(self.0 | rhs.0)
    }
}

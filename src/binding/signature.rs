//! Declared handler parameters and their classification for binding.

use crate::error::DefinitionError;
use std::collections::BTreeSet;
use std::fmt;

/// Reserved parameter name for the request object.
pub const REQUEST_PARAM: &str = "request";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Positional-or-keyword parameter.
    Positional,
    /// Keyword-only; `has_default` makes it optional.
    KeywordOnly { has_default: bool },
    /// Catch-all positional (`*args`).
    VarPositional,
    /// Catch-all keyword (`**kw`).
    VarKeyword,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

/// A handler's parameter list in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: &str, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn positional(self, name: &str) -> Self {
        self.param(name, ParamKind::Positional)
    }

    /// Required keyword-only parameter.
    pub fn keyword(self, name: &str) -> Self {
        self.param(name, ParamKind::KeywordOnly { has_default: false })
    }

    /// Keyword-only parameter with a default.
    pub fn optional(self, name: &str) -> Self {
        self.param(name, ParamKind::KeywordOnly { has_default: true })
    }

    pub fn var_positional(self, name: &str) -> Self {
        self.param(name, ParamKind::VarPositional)
    }

    pub fn var_keyword(self, name: &str) -> Self {
        self.param(name, ParamKind::VarKeyword)
    }

    /// Positional `request` parameter.
    pub fn request(self) -> Self {
        self.positional(REQUEST_PARAM)
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let mut star = false;
        for p in &self.params {
            match p.kind {
                ParamKind::Positional => parts.push(p.name.clone()),
                ParamKind::VarPositional => {
                    star = true;
                    parts.push(format!("*{}", p.name));
                }
                ParamKind::KeywordOnly { has_default } => {
                    if !star {
                        star = true;
                        parts.push("*".into());
                    }
                    parts.push(if has_default { format!("{}=...", p.name) } else { p.name.clone() });
                }
                ParamKind::VarKeyword => parts.push(format!("**{}", p.name)),
            }
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// What a binding plan needs to know about a handler's parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamClassification {
    /// Keyword-only without a default, in declaration order.
    pub required: Vec<String>,
    /// All keyword-only names.
    pub named: BTreeSet<String>,
    pub var_keyword: bool,
    pub request: bool,
}

impl ParamClassification {
    /// Whether any keyword data has to be read from the query string or body.
    pub fn needs_keywords(&self) -> bool {
        self.var_keyword || !self.named.is_empty() || !self.required.is_empty()
    }
}

/// Classify `signature` without invoking the handler. A `request` parameter may only be followed
/// by keyword-only or catch-all parameters.
pub fn classify(handler: &str, signature: &Signature) -> Result<ParamClassification, DefinitionError> {
    let mut out = ParamClassification::default();
    for p in &signature.params {
        match p.kind {
            ParamKind::KeywordOnly { has_default } => {
                if !has_default {
                    out.required.push(p.name.clone());
                }
                out.named.insert(p.name.clone());
            }
            ParamKind::VarKeyword => out.var_keyword = true,
            ParamKind::Positional | ParamKind::VarPositional => {}
        }
    }
    if let Some(pos) = signature.params.iter().position(|p| p.name == REQUEST_PARAM) {
        out.request = true;
        let misplaced = signature.params[pos + 1..]
            .iter()
            .any(|p| p.kind == ParamKind::Positional);
        if misplaced {
            return Err(DefinitionError::RequestParameterPosition {
                handler: handler.to_string(),
                signature: signature.to_string(),
            });
        }
    }
    Ok(out)
}
